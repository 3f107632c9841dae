//! Debenture repayment ("MPayment").

use kyama_base::{DebentureEffect, Posting};
use kyama_types::{Address, Amount, IssueKind, KyamaError, Operation, Result};

use crate::state::ReserveState;

#[derive(Debug, Clone, Copy)]
pub struct Payment {
    address: Address,
}

impl Payment {
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Pay `amount` towards `caller`'s loans. Shares for the full amount are
    /// minted back; loans are settled oldest-first and any surplus simply
    /// stays on the member's balance.
    ///
    /// # Errors
    /// - `NotOperational` while paused
    /// - `NotAMember` if `caller` never registered
    /// - `InvalidAmount` for a zero amount
    /// - `NoOutstandingLoan` if `caller` has no open debenture
    pub fn repay_debenture(
        &self,
        state: &mut ReserveState,
        caller: Address,
        amount: Amount,
    ) -> Result<Posting> {
        state.ensure_member_operation(caller, Operation::DebentureRepayment)?;
        if amount.is_zero() {
            return Err(KyamaError::InvalidAmount {
                operation: Operation::DebentureRepayment,
            });
        }
        if state.ledger.outstanding_debentures(caller) == 0 {
            return Err(KyamaError::NoOutstandingLoan);
        }
        let posting = state.ledger.record_issue(
            self.address,
            &mut state.token,
            caller,
            amount,
            IssueKind::Repayment,
        )?;
        if let DebentureEffect::Repay(outcome) = posting.debenture {
            tracing::info!(
                account = %caller,
                amount = %amount,
                settled = outcome.settled,
                outstanding = outcome.outstanding_after,
                surplus = %outcome.surplus,
                "Debenture repayment received"
            );
        }
        Ok(posting)
    }
}

#[cfg(test)]
mod tests {
    use kyama_base::{AccessControl, Ledger, ShareToken};
    use kyama_types::{RedeemKind, ReserveConfig, Shares};

    use super::*;

    const DEPLOYER: u8 = 1;
    const CFO: u8 = 2;

    fn setup() -> (Payment, ReserveState, Address) {
        let deployer = Address::numbered(DEPLOYER);
        let payment = Payment::new(Address::derive("payment"));
        let registrar = Address::derive("registrar");
        let mut ledger = Ledger::new(deployer, &ReserveConfig::default()).unwrap();
        let mut token = ShareToken::new(deployer);
        for module in [payment.address(), registrar] {
            ledger.approve(deployer, module).unwrap();
            token.approve(deployer, module).unwrap();
        }
        let admin = AccessControl::new(deployer, Address::numbered(CFO)).unwrap();
        (payment, ReserveState::new(admin, ledger, token), registrar)
    }

    fn borrow(state: &mut ReserveState, registrar: Address, who: Address, amount: u128) {
        state
            .ledger
            .record_redeem(
                registrar,
                &mut state.token,
                who,
                Amount::new(amount),
                RedeemKind::Debenture,
            )
            .unwrap();
    }

    fn join(state: &mut ReserveState, registrar: Address, who: Address, amount: u128) {
        state
            .ledger
            .record_issue(
                registrar,
                &mut state.token,
                who,
                Amount::new(amount),
                IssueKind::Registration,
            )
            .unwrap();
    }

    #[test]
    fn repayment_without_loan_rejected() {
        let (payment, mut state, registrar) = setup();
        let who = Address::numbered(10);
        join(&mut state, registrar, who, 100);
        let err = payment
            .repay_debenture(&mut state, who, Amount::new(10))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "KY_ERR_501: Account holder does not have any outstanding M-Bill loan balance."
        );
    }

    #[test]
    fn zero_repayment_rejected() {
        let (payment, mut state, registrar) = setup();
        let who = Address::numbered(10);
        join(&mut state, registrar, who, 100);
        borrow(&mut state, registrar, who, 20);
        assert!(matches!(
            payment.repay_debenture(&mut state, who, Amount::ZERO),
            Err(KyamaError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn repayment_settles_oldest_and_mints() {
        let (payment, mut state, registrar) = setup();
        let who = Address::numbered(10);
        join(&mut state, registrar, who, 400);
        borrow(&mut state, registrar, who, 100);
        borrow(&mut state, registrar, who, 200);
        let balance = state.balance_of(who);

        let posting = payment
            .repay_debenture(&mut state, who, Amount::new(120))
            .unwrap();
        assert_eq!(posting.shares, Shares::new(60));
        assert_eq!(state.ledger.outstanding_debentures(who), 1);
        assert_eq!(
            state.balance_of(who),
            balance.try_add(Shares::new(60), "test").unwrap()
        );
        let remaining: Vec<_> = state
            .ledger
            .debentures()
            .loans(who)
            .map(|loan| loan.remaining)
            .collect();
        assert_eq!(remaining, vec![Amount::new(180)]);
    }

    #[test]
    fn overpayment_clears_counter_without_going_negative() {
        let (payment, mut state, registrar) = setup();
        let who = Address::numbered(10);
        join(&mut state, registrar, who, 400);
        borrow(&mut state, registrar, who, 50);
        payment
            .repay_debenture(&mut state, who, Amount::new(500))
            .unwrap();
        assert_eq!(state.ledger.outstanding_debentures(who), 0);
        assert!(matches!(
            payment.repay_debenture(&mut state, who, Amount::new(5)),
            Err(KyamaError::NoOutstandingLoan)
        ));
    }
}
