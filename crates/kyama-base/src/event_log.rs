//! Append-only, hash-chained log of committed events.
//!
//! Each digest commits to the previous digest, the event's position and
//! every field of its kind, hashed field by field behind a one-byte tag:
//!
//! ```text
//! digest[n] = SHA-256("kyama:event:v1:" || digest[n-1] || n (BE) || tag || fields)
//! digest[-1] = [0; 32]
//! ```
//!
//! Appending cannot fail, so an event is always recorded for a change that
//! has already been committed.

use chrono::Utc;
use kyama_types::{Address, Amount, EventId, EventKind, ReserveEvent, Shares, constants};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<ReserveEvent>,
    head: [u8; 32],
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seal `kind` onto the end of the chain.
    pub fn append(&mut self, kind: EventKind) -> &ReserveEvent {
        let sequence = self.events.len() as u64;
        let digest = Self::chain_digest(&self.head, sequence, &kind);
        self.head = digest;
        let index = self.events.len();
        self.events.push(ReserveEvent {
            id: EventId::new(),
            sequence,
            kind,
            recorded_at: Utc::now(),
            digest,
        });
        &self.events[index]
    }

    #[must_use]
    pub fn events(&self) -> &[ReserveEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ReserveEvent> {
        self.events.last()
    }

    /// Hex digest of the newest event, or all zeros for an empty log.
    #[must_use]
    pub fn head_hex(&self) -> String {
        hex::encode(self.head)
    }

    /// Recompute every digest from the start.
    ///
    /// Returns `false` on the first tampered or reordered event.
    #[must_use]
    pub fn verify_chain(&self) -> bool {
        let mut prev = [0u8; 32];
        for (position, event) in self.events.iter().enumerate() {
            if event.sequence != position as u64 {
                return false;
            }
            let expected = Self::chain_digest(&prev, event.sequence, &event.kind);
            if expected != event.digest {
                tracing::warn!(
                    sequence = event.sequence,
                    event = %event.id,
                    "Event chain digest mismatch"
                );
                return false;
            }
            prev = event.digest;
        }
        prev == self.head
    }

    fn chain_digest(prev: &[u8; 32], sequence: u64, kind: &EventKind) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(constants::EVENT_CHAIN_DOMAIN);
        hasher.update(prev);
        hasher.update(sequence.to_be_bytes());
        hash_kind(&mut hasher, kind);
        let result = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&result);
        digest
    }
}

fn hash_kind(hasher: &mut Sha256, kind: &EventKind) {
    let address = |hasher: &mut Sha256, a: &Address| hasher.update(a.as_bytes());
    let amount = |hasher: &mut Sha256, a: &Amount| hasher.update(a.get().to_be_bytes());
    let shares = |hasher: &mut Sha256, s: &Shares| hasher.update(s.get().to_be_bytes());

    match kind {
        EventKind::Invest {
            account,
            amount: paid,
            shares: units,
            member_index,
        } => {
            hasher.update([1u8]);
            address(hasher, account);
            amount(hasher, paid);
            shares(hasher, units);
            hasher.update(member_index.to_be_bytes());
        }
        EventKind::Deposit {
            account,
            amount: paid,
            shares: units,
        } => {
            hasher.update([2u8]);
            address(hasher, account);
            amount(hasher, paid);
            shares(hasher, units);
        }
        EventKind::Withdraw {
            account,
            amount: paid,
            shares: units,
        } => {
            hasher.update([3u8]);
            address(hasher, account);
            amount(hasher, paid);
            shares(hasher, units);
        }
        EventKind::Transfer {
            from,
            to,
            amount: paid,
            shares: units,
        } => {
            hasher.update([4u8]);
            address(hasher, from);
            address(hasher, to);
            amount(hasher, paid);
            shares(hasher, units);
        }
        EventKind::DebentureIssued {
            account,
            debenture,
            amount: paid,
            shares: units,
        } => {
            hasher.update([5u8]);
            address(hasher, account);
            hasher.update(debenture.0.as_bytes());
            amount(hasher, paid);
            shares(hasher, units);
        }
        EventKind::DebentureRepaid {
            account,
            amount: paid,
            shares: units,
            settled,
            outstanding,
        } => {
            hasher.update([6u8]);
            address(hasher, account);
            amount(hasher, paid);
            shares(hasher, units);
            hasher.update(settled.to_be_bytes());
            hasher.update(outstanding.to_be_bytes());
        }
        EventKind::PriceStepped { from, to } => {
            hasher.update([7u8]);
            amount(hasher, from);
            amount(hasher, to);
        }
        EventKind::Paused { by } => {
            hasher.update([8u8]);
            address(hasher, by);
        }
        EventKind::Resumed { by } => {
            hasher.update([9u8]);
            address(hasher, by);
        }
        EventKind::PrimaryChanged { from, to } => {
            hasher.update([10u8]);
            address(hasher, from);
            address(hasher, to);
        }
        EventKind::SecondaryChanged { from, to } => {
            hasher.update([11u8]);
            address(hasher, from);
            address(hasher, to);
        }
        EventKind::AuctionOpened { by } => {
            hasher.update([12u8]);
            address(hasher, by);
        }
        EventKind::AuctionClosed { by } => {
            hasher.update([13u8]);
            address(hasher, by);
        }
    }
}
