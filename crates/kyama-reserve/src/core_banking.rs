//! Core banking ("MCore"): deposits and withdrawals by existing members.

use kyama_base::Posting;
use kyama_types::{Address, Amount, IssueKind, KyamaError, Operation, RedeemKind, Result};

use crate::payout::Disbursement;
use crate::state::ReserveState;

#[derive(Debug, Clone, Copy)]
pub struct CoreBanking {
    address: Address,
}

impl CoreBanking {
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Issue `shares_for(amount)` to `caller`; `amount` goes to the treasury.
    ///
    /// # Errors
    /// - `NotOperational` while paused
    /// - `NotAMember` if `caller` never registered
    /// - `AmountTooLow` if `amount` is below the current price
    pub fn deposit(&self, state: &mut ReserveState, caller: Address, amount: Amount) -> Result<Posting> {
        state.ensure_member_operation(caller, Operation::Deposit)?;
        let pps = state.ledger.current_pps();
        if amount < pps {
            return Err(KyamaError::AmountTooLow { amount, pps });
        }
        state.ledger.record_issue(
            self.address,
            &mut state.token,
            caller,
            amount,
            IssueKind::Deposit,
        )
    }

    /// Burn `shares_for(amount)` from `caller` and pay out exactly `amount`.
    ///
    /// # Errors
    /// - `NotOperational` while paused
    /// - `NotAMember` if `caller` never registered
    /// - `InvalidAmount` for a zero amount
    /// - `AboveQuota` if `amount` exceeds the withdrawal quota or the pro-rata treasury claim
    /// - `BelowQuota` if `amount` is below the current price
    /// - `DisbursementFailed` if the payout is refused
    pub fn withdraw(
        &self,
        state: &mut ReserveState,
        payout: &mut dyn Disbursement,
        caller: Address,
        amount: Amount,
    ) -> Result<Posting> {
        state.ensure_member_operation(caller, Operation::Withdrawal)?;
        if amount.is_zero() {
            return Err(KyamaError::InvalidAmount {
                operation: Operation::Withdrawal,
            });
        }
        let quota = state.ledger.max_withdrawable(state.balance_of(caller))?;
        if amount > quota {
            return Err(KyamaError::AboveQuota {
                operation: Operation::Withdrawal,
                amount,
                quota,
            });
        }
        let pps = state.ledger.current_pps();
        if amount < pps {
            return Err(KyamaError::BelowQuota {
                operation: Operation::Withdrawal,
                amount,
                pps,
            });
        }

        let posting = state.ledger.plan_redeem(
            self.address,
            &state.token,
            caller,
            amount,
            RedeemKind::Withdrawal,
        )?;
        payout.disburse(caller, amount)?;
        state.ledger.apply(self.address, &mut state.token, &posting)?;
        Ok(posting)
    }
}
