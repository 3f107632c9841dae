//! Currency boundary: paying members out of the treasury.
//!
//! Collections arrive with the call and cannot fail. Payouts can: a
//! recipient may be unable to accept funds. A failed payout aborts the
//! whole operation before the ledger posting is applied.

use std::collections::{HashMap, HashSet};
use std::fmt;

use kyama_types::{Address, Amount, KyamaError, Result};

/// Host primitive that moves currency from the treasury to a recipient.
pub trait Disbursement: fmt::Debug {
    fn disburse(&mut self, to: Address, amount: Amount) -> Result<()>;
}

/// In-process wallets: records what each address received.
///
/// Addresses marked with [`InMemoryWallets::refuse`] reject every payout,
/// standing in for recipients that cannot accept funds.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWallets {
    received: HashMap<Address, Amount>,
    refusing: HashSet<Address>,
}

impl InMemoryWallets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total paid out to `account` so far.
    #[must_use]
    pub fn received(&self, account: Address) -> Amount {
        self.received.get(&account).copied().unwrap_or_default()
    }

    /// Make every future payout to `account` fail.
    pub fn refuse(&mut self, account: Address) {
        self.refusing.insert(account);
    }

    pub fn accept(&mut self, account: Address) {
        self.refusing.remove(&account);
    }
}

impl Disbursement for InMemoryWallets {
    fn disburse(&mut self, to: Address, amount: Amount) -> Result<()> {
        if self.refusing.contains(&to) {
            tracing::warn!(to = %to, amount = %amount, "Disbursement refused by recipient");
            return Err(KyamaError::DisbursementFailed {
                to,
                reason: "recipient cannot accept funds".to_string(),
            });
        }
        let total = self.received(to).try_add(amount, "wallet balance")?;
        self.received.insert(to, total);
        tracing::debug!(to = %to, amount = %amount, "Funds disbursed");
        Ok(())
    }
}
