//! Ledger events for the Kyama audit trail.
//!
//! Every committed state change produces a [`ReserveEvent`]. Issuing and
//! redeeming events carry `{account, amount, shares}` so an external
//! auditor can replay the ledger aggregates from the log alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, DebentureId, EventId, Shares};

/// Why shares are being issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// First buy-in through the offering. Registers a new member.
    Registration,
    /// Deposit by an existing member.
    Deposit,
    /// Debenture repayment.
    Repayment,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registration => write!(f, "REGISTRATION"),
            Self::Deposit => write!(f, "DEPOSIT"),
            Self::Repayment => write!(f, "REPAYMENT"),
        }
    }
}

/// Why shares are being redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedeemKind {
    Withdrawal,
    Debenture,
}

impl std::fmt::Display for RedeemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Withdrawal => write!(f, "WITHDRAWAL"),
            Self::Debenture => write!(f, "DEBENTURE"),
        }
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A new member bought in through the offering ("MInvest").
    Invest {
        account: Address,
        amount: Amount,
        shares: Shares,
        member_index: u64,
    },
    Deposit {
        account: Address,
        amount: Amount,
        shares: Shares,
    },
    Withdraw {
        account: Address,
        amount: Amount,
        shares: Shares,
    },
    Transfer {
        from: Address,
        to: Address,
        amount: Amount,
        shares: Shares,
    },
    DebentureIssued {
        account: Address,
        debenture: DebentureId,
        amount: Amount,
        shares: Shares,
    },
    /// `settled` is the number of loans fully closed by this payment.
    DebentureRepaid {
        account: Address,
        amount: Amount,
        shares: Shares,
        settled: u32,
        outstanding: u32,
    },
    PriceStepped {
        from: Amount,
        to: Amount,
    },
    Paused {
        by: Address,
    },
    Resumed {
        by: Address,
    },
    PrimaryChanged {
        from: Address,
        to: Address,
    },
    SecondaryChanged {
        from: Address,
        to: Address,
    },
    AuctionOpened {
        by: Address,
    },
    AuctionClosed {
        by: Address,
    },
}

impl EventKind {
    /// The account whose share balance this event changed, if any.
    #[must_use]
    pub fn account(&self) -> Option<Address> {
        match self {
            Self::Invest { account, .. }
            | Self::Deposit { account, .. }
            | Self::Withdraw { account, .. }
            | Self::DebentureIssued { account, .. }
            | Self::DebentureRepaid { account, .. } => Some(*account),
            Self::Transfer { from, .. } => Some(*from),
            _ => None,
        }
    }

    /// Share units delta carried by the event, if it moved shares.
    #[must_use]
    pub fn shares(&self) -> Option<Shares> {
        match self {
            Self::Invest { shares, .. }
            | Self::Deposit { shares, .. }
            | Self::Withdraw { shares, .. }
            | Self::Transfer { shares, .. }
            | Self::DebentureIssued { shares, .. }
            | Self::DebentureRepaid { shares, .. } => Some(*shares),
            _ => None,
        }
    }
}

/// A committed, hash-chained ledger event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveEvent {
    pub id: EventId,
    /// Position in the log, starting at 0.
    pub sequence: u64,
    pub kind: EventKind,
    pub recorded_at: DateTime<Utc>,
    /// SHA-256 over the previous digest, the sequence, and the kind.
    pub digest: [u8; 32],
}

impl ReserveEvent {
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_serde_is_tagged() {
        let kind = EventKind::Invest {
            account: Address::numbered(2),
            amount: Amount::new(51),
            shares: Shares::new(51),
            member_index: 1,
        };
        let json = serde_json::to_string(&kind).unwrap();
        assert!(json.contains("\"type\":\"invest\""), "Got: {json}");
        let back: EventKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, back);
    }

    #[test]
    fn account_and_shares_accessors() {
        let kind = EventKind::Transfer {
            from: Address::numbered(1),
            to: Address::numbered(2),
            amount: Amount::new(30),
            shares: Shares::new(15),
        };
        assert_eq!(kind.account(), Some(Address::numbered(1)));
        assert_eq!(kind.shares(), Some(Shares::new(15)));
        assert_eq!(
            EventKind::Paused {
                by: Address::numbered(1)
            }
            .shares(),
            None
        );
    }

    #[test]
    fn issue_kind_display() {
        assert_eq!(IssueKind::Registration.to_string(), "REGISTRATION");
        assert_eq!(RedeemKind::Debenture.to_string(), "DEBENTURE");
    }
}
