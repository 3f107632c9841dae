//! The shared stores every operation module runs against.

use kyama_base::{AccessControl, CircuitBreaker, Ledger, ShareToken};
use kyama_types::{Address, Amount, KyamaError, Operation, Result, Shares};

/// Admin state, ledger and token, owned together so one `&mut` borrow
/// covers a whole operation.
#[derive(Debug)]
pub struct ReserveState {
    pub admin: AccessControl,
    pub ledger: Ledger,
    pub token: ShareToken,
}

impl ReserveState {
    #[must_use]
    pub fn new(admin: AccessControl, ledger: Ledger, token: ShareToken) -> Self {
        Self {
            admin,
            ledger,
            token,
        }
    }

    #[must_use]
    pub fn is_member(&self, account: Address) -> bool {
        self.ledger.members().is_registered(account)
    }

    #[must_use]
    pub fn balance_of(&self, account: Address) -> Shares {
        self.token.balance_of(account)
    }

    /// Currency value of `account`'s balance at the current price.
    pub fn value_of(&self, account: Address) -> Result<Amount> {
        self.ledger.total_value(self.balance_of(account))
    }

    /// The shared preamble: operational, then caller is a member.
    pub(crate) fn ensure_member_operation(&self, caller: Address, operation: Operation) -> Result<()> {
        self.admin.ensure_operational()?;
        if !self.is_member(caller) {
            tracing::debug!(caller = %caller, operation = %operation, "Rejected: not a member");
            return Err(KyamaError::NotAMember { operation });
        }
        Ok(())
    }
}
