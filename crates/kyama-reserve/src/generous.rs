//! Peer transfers and debenture issuance ("MGenerous").

use std::sync::Arc;

use kyama_base::{Harmonization, Posting};
use kyama_types::{Address, Amount, KyamaError, Operation, RedeemKind, Result, Shares};

use crate::payout::Disbursement;
use crate::state::ReserveState;

#[derive(Debug, Clone)]
pub struct Generous {
    address: Address,
    harmonization: Arc<dyn Harmonization>,
}

impl Generous {
    #[must_use]
    pub fn new(address: Address, harmonization: Arc<dyn Harmonization>) -> Self {
        Self {
            address,
            harmonization,
        }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Swap the eligibility gate consulted by [`Self::request_debenture`].
    pub fn set_harmonization(&mut self, harmonization: Arc<dyn Harmonization>) {
        self.harmonization = harmonization;
    }

    #[must_use]
    pub fn is_harmonized(&self, state: &ReserveState, account: Address) -> bool {
        self.harmonization
            .is_harmonized(account, state.ledger.members())
    }

    /// Move `shares_for(amount)` from `caller` to `to`. Returns the units moved.
    ///
    /// # Errors
    /// - `NotOperational` while paused
    /// - `NotAMember` / `RecipientNotAMember` for unregistered parties
    /// - `InvalidAmount` if `amount` buys no whole share, zero included
    /// - `InsufficientFunds` if `amount` exceeds the caller's total value
    pub fn transfer(
        &self,
        state: &mut ReserveState,
        caller: Address,
        to: Address,
        amount: Amount,
    ) -> Result<Shares> {
        state.ensure_member_operation(caller, Operation::Transfer)?;
        if !state.is_member(to) {
            return Err(KyamaError::RecipientNotAMember { recipient: to });
        }
        let shares = state.ledger.shares_for(amount);
        if shares.is_zero() {
            return Err(KyamaError::InvalidAmount {
                operation: Operation::Transfer,
            });
        }
        let available = state.value_of(caller)?;
        if amount > available {
            return Err(KyamaError::InsufficientFunds {
                requested: amount,
                available,
            });
        }
        state.token.transfer(self.address, caller, to, shares)?;
        tracing::info!(
            from = %caller,
            to = %to,
            amount = %amount,
            shares = %shares,
            "M-Bills transferred"
        );
        Ok(shares)
    }

    /// Lend `amount` to `caller` against their balance: burn
    /// `shares_for(amount)`, open a debenture, pay out exactly `amount`.
    ///
    /// # Errors
    /// - `NotOperational` while paused
    /// - `NotAMember` if `caller` never registered
    /// - `InvalidAmount` for a zero amount
    /// - `NotHarmonized` if the eligibility gate refuses `caller`
    /// - `AboveQuota` if `amount` exceeds the debenture quota
    /// - `BelowQuota` if `amount` is below the current price
    /// - `TooManyOutstanding` at the per-member loan cap
    /// - `DisbursementFailed` if the payout is refused
    pub fn request_debenture(
        &self,
        state: &mut ReserveState,
        payout: &mut dyn Disbursement,
        caller: Address,
        amount: Amount,
    ) -> Result<Posting> {
        state.ensure_member_operation(caller, Operation::DebentureRequest)?;
        if amount.is_zero() {
            return Err(KyamaError::InvalidAmount {
                operation: Operation::DebentureRequest,
            });
        }
        if !self.is_harmonized(state, caller) {
            tracing::debug!(account = %caller, "Debenture refused: not harmonized");
            return Err(KyamaError::NotHarmonized);
        }
        let quota = state.ledger.max_debenture(state.balance_of(caller))?;
        if amount > quota {
            return Err(KyamaError::AboveQuota {
                operation: Operation::DebentureRequest,
                amount,
                quota,
            });
        }
        let pps = state.ledger.current_pps();
        if amount < pps {
            return Err(KyamaError::BelowQuota {
                operation: Operation::DebentureRequest,
                amount,
                pps,
            });
        }

        let posting = state.ledger.plan_redeem(
            self.address,
            &state.token,
            caller,
            amount,
            RedeemKind::Debenture,
        )?;
        payout.disburse(caller, amount)?;
        state.ledger.apply(self.address, &mut state.token, &posting)?;
        tracing::info!(
            account = %caller,
            amount = %amount,
            outstanding = state.ledger.outstanding_debentures(caller),
            "Debenture issued"
        );
        Ok(posting)
    }
}
