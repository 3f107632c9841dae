//! Per-member loan records.
//!
//! Loans are settled oldest-first. A member's outstanding debenture count
//! is the number of records that still carry a remaining principal.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use kyama_types::{Address, Amount, DebentureId, Result};
use serde::{Deserialize, Serialize};

/// One open loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debenture {
    pub id: DebentureId,
    pub principal: Amount,
    /// Principal not yet repaid. Always `> 0` while the record is open.
    pub remaining: Amount,
    pub issued_at: DateTime<Utc>,
}

impl Debenture {
    #[must_use]
    pub fn new(id: DebentureId, principal: Amount) -> Self {
        Self {
            id,
            principal,
            remaining: principal,
            issued_at: Utc::now(),
        }
    }
}

/// Effect of one repayment on a member's loans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentOutcome {
    /// Loans fully closed by the payment.
    pub settled: u32,
    /// Open loans left afterwards.
    pub outstanding_after: u32,
    /// Portion of the payment that reduced principal.
    pub applied: Amount,
    /// Portion beyond everything owed; kept by the member as shares.
    pub surplus: Amount,
}

/// All open loans, grouped by member, oldest first.
#[derive(Debug, Clone, Default)]
pub struct DebentureBook {
    loans: HashMap<Address, VecDeque<Debenture>>,
}

impl DebentureBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open loans held by `account`.
    #[must_use]
    pub fn count(&self, account: Address) -> u32 {
        self.loans
            .get(&account)
            .map_or(0, |queue| u32::try_from(queue.len()).unwrap_or(u32::MAX))
    }

    /// Number of open loans across all members.
    #[must_use]
    pub fn total_open(&self) -> u64 {
        self.loans.values().map(|queue| queue.len() as u64).sum()
    }

    pub fn loans(&self, account: Address) -> impl Iterator<Item = &Debenture> + '_ {
        self.loans.get(&account).into_iter().flatten()
    }

    /// Every member holding at least one open loan, with its count.
    pub fn borrowers(&self) -> impl Iterator<Item = (Address, u32)> + '_ {
        self.loans
            .keys()
            .map(|account| (*account, self.count(*account)))
            .filter(|(_, count)| *count > 0)
    }

    /// Sum of remaining principal over `account`'s open loans.
    pub fn outstanding_principal(&self, account: Address) -> Result<Amount> {
        self.loans(account).try_fold(Amount::ZERO, |sum, loan| {
            sum.try_add(loan.remaining, "outstanding principal")
        })
    }

    /// What [`Self::settle`] would do, without doing it.
    #[must_use]
    pub fn preview_repay(&self, account: Address, payment: Amount) -> RepaymentOutcome {
        let mut left = payment.get();
        let mut settled = 0u32;
        let mut open = 0u32;
        for loan in self.loans(account) {
            let owed = loan.remaining.get();
            if left >= owed {
                left -= owed;
                settled += 1;
            } else {
                left = 0;
                open += 1;
            }
        }
        RepaymentOutcome {
            settled,
            outstanding_after: open,
            applied: Amount::new(payment.get() - left),
            surplus: Amount::new(left),
        }
    }

    /// Add a new loan at the back of `account`'s queue.
    pub fn open(&mut self, account: Address, debenture: Debenture) {
        tracing::debug!(
            account = %account,
            debenture = %debenture.id,
            principal = %debenture.principal,
            "Debenture opened"
        );
        self.loans.entry(account).or_default().push_back(debenture);
    }

    /// Apply `payment` oldest-first: close every loan it covers, then
    /// reduce the next one. The count never goes below zero.
    pub fn settle(&mut self, account: Address, payment: Amount) -> RepaymentOutcome {
        let outcome = self.preview_repay(account, payment);
        let Some(queue) = self.loans.get_mut(&account) else {
            return outcome;
        };
        let mut left = outcome.applied.get();
        while left > 0 {
            let Some(front) = queue.front_mut() else {
                break;
            };
            let owed = front.remaining.get();
            if left >= owed {
                left -= owed;
                if let Some(closed) = queue.pop_front() {
                    tracing::debug!(account = %account, debenture = %closed.id, "Debenture settled");
                }
            } else {
                front.remaining = Amount::new(owed - left);
                left = 0;
            }
        }
        if queue.is_empty() {
            self.loans.remove(&account);
        }
        outcome
    }
}
