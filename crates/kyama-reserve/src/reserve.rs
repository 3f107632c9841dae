//! The assembled reserve: shared stores, the four operation modules, and
//! the event log.
//!
//! [`Reserve::bootstrap`] performs the one-time wiring: it derives an
//! address for each module and approves it on both the ledger and the
//! token as the deployer. Every public operation then delegates to its
//! module and appends the matching event once the posting has committed.

use std::sync::Arc;

use kyama_base::{
    AccessControl, CircuitBreaker, DebentureEffect, DepositConsensus, EventLog, Harmonization, Ledger, Posting,
    ShareToken, SupplyAudit,
};
use kyama_types::{
    Address, Amount, EventKind, KyamaError, LedgerSnapshot, Result, ReserveConfig, ReserveEvent,
    Shares, constants,
};

use crate::auction::Auction;
use crate::core_banking::CoreBanking;
use crate::generous::Generous;
use crate::payment::Payment;
use crate::payout::Disbursement;
use crate::state::ReserveState;

/// A fully wired Kyama deployment.
#[derive(Debug)]
pub struct Reserve {
    config: ReserveConfig,
    state: ReserveState,
    auction: Auction,
    core: CoreBanking,
    generous: Generous,
    payment: Payment,
    events: EventLog,
}

impl Reserve {
    /// Deploy with the default harmonization rule from `config`.
    ///
    /// `deployer` becomes the primary administrator and the owner of the
    /// ledger and token access lists.
    pub fn bootstrap(deployer: Address, secondary: Address, config: ReserveConfig) -> Result<Self> {
        let gate = Arc::new(DepositConsensus::new(config.harmonization.min_deposits));
        Self::with_harmonization(deployer, secondary, config, gate)
    }

    /// Deploy with a caller-supplied eligibility gate.
    pub fn with_harmonization(
        deployer: Address,
        secondary: Address,
        config: ReserveConfig,
        harmonization: Arc<dyn Harmonization>,
    ) -> Result<Self> {
        config.validate()?;
        let admin = AccessControl::new(deployer, secondary)?;
        let mut ledger = Ledger::new(deployer, &config)?;
        let mut token = ShareToken::new(deployer);

        let auction = Auction::new(Address::derive("auction"));
        let core = CoreBanking::new(Address::derive("core-banking"));
        let generous = Generous::new(Address::derive("generous"), harmonization);
        let payment = Payment::new(Address::derive("payment"));
        for module in [
            auction.address(),
            core.address(),
            generous.address(),
            payment.address(),
        ] {
            ledger.approve(deployer, module)?;
            token.approve(deployer, module)?;
        }

        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            primary = %deployer,
            secondary = %secondary,
            auction = %auction.address(),
            core_banking = %core.address(),
            generous = %generous.address(),
            payment = %payment.address(),
            "Reserve bootstrapped"
        );

        Ok(Self {
            config,
            state: ReserveState::new(admin, ledger, token),
            auction,
            core,
            generous,
            payment,
            events: EventLog::new(),
        })
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &ReserveConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &ReserveState {
        &self.state
    }

    #[must_use]
    pub fn admin(&self) -> &AccessControl {
        &self.state.admin
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    #[must_use]
    pub fn token(&self) -> &ShareToken {
        &self.state.token
    }

    #[must_use]
    pub fn auction(&self) -> &Auction {
        &self.auction
    }

    #[must_use]
    pub fn is_auction_open(&self) -> bool {
        self.auction.is_open()
    }

    #[must_use]
    pub fn balance_of(&self, account: Address) -> Shares {
        self.state.balance_of(account)
    }

    pub fn value_of(&self, account: Address) -> Result<Amount> {
        self.state.value_of(account)
    }

    #[must_use]
    pub fn is_member(&self, account: Address) -> bool {
        self.state.is_member(account)
    }

    #[must_use]
    pub fn is_harmonized(&self, account: Address) -> bool {
        self.generous.is_harmonized(&self.state, account)
    }

    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.ledger.snapshot()
    }

    #[must_use]
    pub fn events(&self) -> &[ReserveEvent] {
        self.events.events()
    }

    #[must_use]
    pub fn event_head(&self) -> String {
        self.events.head_hex()
    }

    /// The event log as a JSON array.
    pub fn export_events_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self.events.events())?)
    }

    /// Verify the event chain, then replay it against the stores.
    ///
    /// # Errors
    /// `SupplyInvariantViolation` on a broken chain or any store mismatch.
    pub fn audit(&self) -> Result<()> {
        if !self.events.verify_chain() {
            return Err(KyamaError::SupplyInvariantViolation {
                reason: "event chain does not verify".to_string(),
            });
        }
        SupplyAudit::from_events(self.events.events())?.verify(&self.state.ledger, &self.state.token)
    }

    // -----------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------

    pub fn set_primary(&mut self, caller: Address, new: Address) -> Result<()> {
        let from = self.state.admin.set_primary(caller, new)?;
        self.record(EventKind::PrimaryChanged { from, to: new });
        Ok(())
    }

    pub fn set_secondary(&mut self, caller: Address, new: Address) -> Result<()> {
        let from = self.state.admin.set_secondary(caller, new)?;
        self.record(EventKind::SecondaryChanged { from, to: new });
        Ok(())
    }

    pub fn pause(&mut self, caller: Address) -> Result<()> {
        self.state.admin.pause(caller)?;
        self.record(EventKind::Paused { by: caller });
        Ok(())
    }

    pub fn resume(&mut self, caller: Address) -> Result<()> {
        self.state.admin.resume(caller)?;
        self.record(EventKind::Resumed { by: caller });
        Ok(())
    }

    /// Replace the borrowing eligibility gate. Primary administrator only.
    pub fn set_harmonization(
        &mut self,
        caller: Address,
        harmonization: Arc<dyn Harmonization>,
    ) -> Result<()> {
        self.state.admin.ensure_primary(caller)?;
        self.generous.set_harmonization(harmonization);
        tracing::info!(by = %caller, "Harmonization gate replaced");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Offering
    // -----------------------------------------------------------------

    pub fn open_auction(&mut self, caller: Address) -> Result<()> {
        self.auction.open_auction(&self.state.admin, caller)?;
        self.record(EventKind::AuctionOpened { by: caller });
        Ok(())
    }

    pub fn close_auction(&mut self, caller: Address) -> Result<()> {
        self.auction.close_auction(&self.state.admin, caller)?;
        self.record(EventKind::AuctionClosed { by: caller });
        Ok(())
    }

    /// Buy in as a new member during the offering.
    pub fn register_and_fund(&mut self, caller: Address, amount: Amount) -> Result<Posting> {
        let posting = self
            .auction
            .register_and_fund(&mut self.state, caller, amount)?;
        self.record(EventKind::Invest {
            account: caller,
            amount,
            shares: posting.shares,
            member_index: posting.index_after,
        });
        self.record_price_step(&posting);
        Ok(posting)
    }

    // -----------------------------------------------------------------
    // Core banking
    // -----------------------------------------------------------------

    pub fn deposit(&mut self, caller: Address, amount: Amount) -> Result<Posting> {
        let posting = self.core.deposit(&mut self.state, caller, amount)?;
        self.record(EventKind::Deposit {
            account: caller,
            amount,
            shares: posting.shares,
        });
        self.record_price_step(&posting);
        Ok(posting)
    }

    pub fn withdraw(
        &mut self,
        payout: &mut dyn Disbursement,
        caller: Address,
        amount: Amount,
    ) -> Result<Posting> {
        let posting = self
            .core
            .withdraw(&mut self.state, payout, caller, amount)?;
        self.record(EventKind::Withdraw {
            account: caller,
            amount,
            shares: posting.shares,
        });
        Ok(posting)
    }

    // -----------------------------------------------------------------
    // Transfers and debentures
    // -----------------------------------------------------------------

    pub fn transfer(&mut self, caller: Address, to: Address, amount: Amount) -> Result<Shares> {
        let shares = self
            .generous
            .transfer(&mut self.state, caller, to, amount)?;
        self.record(EventKind::Transfer {
            from: caller,
            to,
            amount,
            shares,
        });
        Ok(shares)
    }

    pub fn request_debenture(
        &mut self,
        payout: &mut dyn Disbursement,
        caller: Address,
        amount: Amount,
    ) -> Result<Posting> {
        let posting = self
            .generous
            .request_debenture(&mut self.state, payout, caller, amount)?;
        if let DebentureEffect::Open { id, .. } = posting.debenture {
            self.record(EventKind::DebentureIssued {
                account: caller,
                debenture: id,
                amount,
                shares: posting.shares,
            });
        }
        Ok(posting)
    }

    pub fn repay_debenture(&mut self, caller: Address, amount: Amount) -> Result<Posting> {
        let posting = self
            .payment
            .repay_debenture(&mut self.state, caller, amount)?;
        let (settled, outstanding) = match posting.debenture {
            DebentureEffect::Repay(outcome) => (outcome.settled, outcome.outstanding_after),
            _ => (0, self.state.ledger.outstanding_debentures(caller)),
        };
        self.record(EventKind::DebentureRepaid {
            account: caller,
            amount,
            shares: posting.shares,
            settled,
            outstanding,
        });
        self.record_price_step(&posting);
        Ok(posting)
    }

    // -----------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------

    fn record(&mut self, kind: EventKind) {
        let event = self.events.append(kind);
        tracing::debug!(
            sequence = event.sequence,
            event = %event.id,
            digest = %event.digest_hex(),
            "Event recorded"
        );
    }

    fn record_price_step(&mut self, posting: &Posting) {
        if posting.price_stepped() {
            self.record(EventKind::PriceStepped {
                from: posting.pps_before,
                to: posting.pps_after,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payout::InMemoryWallets;

    const CEO: u8 = 1;
    const CFO: u8 = 2;

    fn ceo() -> Address {
        Address::numbered(CEO)
    }

    fn cfo() -> Address {
        Address::numbered(CFO)
    }

    fn reserve() -> Reserve {
        Reserve::bootstrap(ceo(), cfo(), ReserveConfig::default()).unwrap()
    }

    #[test]
    fn bootstrap_wires_modules() {
        let reserve = reserve();
        assert!(reserve.admin().is_operational());
        assert!(!reserve.is_auction_open());
        assert!(reserve.ledger().is_approved(reserve.auction().address()));
        assert!(reserve.token().is_approved(reserve.auction().address()));
        assert!(!reserve.ledger().is_approved(ceo()));
        assert!(reserve.events().is_empty());
    }

    #[test]
    fn bootstrap_rejects_bad_config() {
        let config = ReserveConfig {
            initial_pps: Amount::ZERO,
            ..ReserveConfig::default()
        };
        assert!(matches!(
            Reserve::bootstrap(ceo(), cfo(), config),
            Err(KyamaError::Configuration(_))
        ));
    }

    #[test]
    fn operations_append_events() {
        let mut reserve = reserve();
        let member = Address::numbered(10);
        reserve.open_auction(cfo()).unwrap();
        reserve.register_and_fund(member, Amount::new(51)).unwrap();
        reserve.deposit(member, Amount::new(10)).unwrap();

        let kinds: Vec<_> = reserve.events().iter().map(|e| e.kind.clone()).collect();
        assert!(matches!(kinds[0], EventKind::AuctionOpened { .. }));
        assert!(matches!(
            kinds[1],
            EventKind::Invest { shares, member_index: 1, .. } if shares == Shares::new(51)
        ));
        assert!(matches!(
            kinds[2],
            EventKind::PriceStepped { from, to } if from == Amount::ONE && to == Amount::new(2)
        ));
        assert!(matches!(kinds[3], EventKind::Deposit { shares, .. } if shares == Shares::new(5)));
        reserve.audit().unwrap();
    }

    #[test]
    fn failed_operations_leave_no_event() {
        let mut reserve = reserve();
        assert!(reserve.register_and_fund(Address::numbered(10), Amount::new(5)).is_err());
        assert!(reserve.pause(Address::numbered(9)).is_err());
        assert!(reserve.events().is_empty());
    }

    #[test]
    fn debenture_lifecycle_events() {
        let mut reserve = reserve();
        let member = Address::numbered(10);
        let mut wallets = InMemoryWallets::new();
        reserve.open_auction(cfo()).unwrap();
        reserve.register_and_fund(member, Amount::new(100)).unwrap();
        reserve.deposit(member, Amount::new(100)).unwrap();
        reserve
            .request_debenture(&mut wallets, member, Amount::new(40))
            .unwrap();
        reserve.repay_debenture(member, Amount::new(40)).unwrap();

        let repaid = reserve
            .events()
            .iter()
            .find_map(|e| match e.kind {
                EventKind::DebentureRepaid {
                    settled,
                    outstanding,
                    ..
                } => Some((settled, outstanding)),
                _ => None,
            })
            .unwrap();
        assert_eq!(repaid, (1, 0));
        reserve.audit().unwrap();
    }

    #[test]
    fn every_commit_is_logged() {
        let mut reserve = reserve();
        let member = Address::numbered(10);
        let mut wallets = InMemoryWallets::new();
        reserve.open_auction(cfo()).unwrap();
        reserve.register_and_fund(member, Amount::new(100)).unwrap();
        reserve.deposit(member, Amount::new(100)).unwrap();
        reserve
            .withdraw(&mut wallets, member, Amount::new(20))
            .unwrap();
        reserve
            .request_debenture(&mut wallets, member, Amount::new(20))
            .unwrap();
        reserve.repay_debenture(member, Amount::new(20)).unwrap();

        // Five postings, one price step, one auction toggle.
        assert_eq!(reserve.ledger().sequence(), 5);
        assert_eq!(reserve.events().len(), 7);
        reserve.audit().unwrap();
    }

    #[test]
    fn harmonization_gate_is_primary_only() {
        let mut reserve = reserve();
        let gate: Arc<dyn Harmonization> = Arc::new(kyama_base::Allowlist::new());
        assert!(matches!(
            reserve.set_harmonization(cfo(), Arc::clone(&gate)),
            Err(KyamaError::Unauthorized { .. })
        ));
        reserve.set_harmonization(ceo(), gate).unwrap();
    }

    #[test]
    fn events_export_as_json() {
        let mut reserve = reserve();
        reserve.open_auction(cfo()).unwrap();
        let json = reserve.export_events_json().unwrap();
        assert!(json.contains("auction_opened"));
    }
}
