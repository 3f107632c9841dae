//! Explicit membership records and the borrowing eligibility seam.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use kyama_types::Address;
use serde::{Deserialize, Serialize};

/// One registered member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// 1-based registration order (value of the member index after joining).
    pub index: u64,
    pub joined_at: DateTime<Utc>,
    /// Deposits made through core banking since registration.
    pub deposits: u64,
}

/// Set of addresses that passed through the offering.
///
/// Membership never lapses, even when the member's balance reaches zero.
#[derive(Debug, Clone, Default)]
pub struct MembershipRegistry {
    members: HashMap<Address, MemberRecord>,
}

impl MembershipRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_registered(&self, account: Address) -> bool {
        self.members.contains_key(&account)
    }

    #[must_use]
    pub fn get(&self, account: Address) -> Option<&MemberRecord> {
        self.members.get(&account)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Insert a new member. The ledger rejects duplicates while planning,
    /// so an existing record is left untouched here.
    pub(crate) fn admit(&mut self, account: Address, index: u64) -> &MemberRecord {
        self.members.entry(account).or_insert(MemberRecord {
            index,
            joined_at: Utc::now(),
            deposits: 0,
        })
    }

    /// Count one deposit. Unknown accounts are ignored.
    pub(crate) fn note_deposit(&mut self, account: Address) {
        if let Some(record) = self.members.get_mut(&account) {
            record.deposits = record.deposits.saturating_add(1);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Address, &MemberRecord)> + '_ {
        self.members.iter().map(|(account, record)| (*account, record))
    }
}

/// External eligibility gate consulted before a member may borrow.
pub trait Harmonization: Send + Sync + fmt::Debug {
    fn is_harmonized(&self, account: Address, members: &MembershipRegistry) -> bool;
}

/// Eligible once the member made `min_deposits` deposits after joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositConsensus {
    pub min_deposits: u64,
}

impl DepositConsensus {
    #[must_use]
    pub fn new(min_deposits: u64) -> Self {
        Self { min_deposits }
    }
}

impl Default for DepositConsensus {
    fn default() -> Self {
        Self::new(kyama_types::constants::DEFAULT_MIN_DEPOSITS_FOR_HARMONIZATION)
    }
}

impl Harmonization for DepositConsensus {
    fn is_harmonized(&self, account: Address, members: &MembershipRegistry) -> bool {
        members
            .get(account)
            .is_some_and(|record| record.deposits >= self.min_deposits)
    }
}

/// Eligibility decided elsewhere and pushed in as a fixed list.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    accounts: HashSet<Address>,
}

impl Allowlist {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, account: Address) {
        self.accounts.insert(account);
    }

    pub fn revoke(&mut self, account: Address) {
        self.accounts.remove(&account);
    }
}

impl FromIterator<Address> for Allowlist {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self {
            accounts: iter.into_iter().collect(),
        }
    }
}

impl Harmonization for Allowlist {
    fn is_harmonized(&self, account: Address, members: &MembershipRegistry) -> bool {
        members.is_registered(account) && self.accounts.contains(&account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admit_keeps_first_record() {
        let mut registry = MembershipRegistry::new();
        let record = registry.admit(Address::numbered(1), 1);
        assert_eq!(record.index, 1);
        assert_eq!(record.deposits, 0);
        let record = registry.admit(Address::numbered(1), 2);
        assert_eq!(record.index, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn deposits_counted_for_members_only() {
        let mut registry = MembershipRegistry::new();
        registry.note_deposit(Address::numbered(3));
        assert!(registry.get(Address::numbered(3)).is_none());
        registry.admit(Address::numbered(3), 1);
        registry.note_deposit(Address::numbered(3));
        registry.note_deposit(Address::numbered(3));
        assert_eq!(registry.get(Address::numbered(3)).unwrap().deposits, 2);
    }

    #[test]
    fn fresh_member_is_not_harmonized() {
        let mut registry = MembershipRegistry::new();
        let gate = DepositConsensus::default();
        let account = Address::numbered(4);
        assert!(!gate.is_harmonized(account, &registry));
        registry.admit(account, 1);
        assert!(!gate.is_harmonized(account, &registry));
        registry.note_deposit(account);
        assert!(gate.is_harmonized(account, &registry));
    }

    #[test]
    fn allowlist_requires_registration() {
        let mut registry = MembershipRegistry::new();
        let account = Address::numbered(5);
        let mut gate: Allowlist = [account].into_iter().collect();
        assert!(!gate.is_harmonized(account, &registry));
        registry.admit(account, 1);
        assert!(gate.is_harmonized(account, &registry));
        gate.revoke(account);
        assert!(!gate.is_harmonized(account, &registry));
    }
}
