//! Offering ("Auction"): the time-boxed window in which new members buy in.
//!
//! ```text
//! Closed ──open_auction (secondary)──▶ Open ──close_auction (secondary)──▶ Closed
//! ```

use kyama_base::{AccessControl, CircuitBreaker, Posting};
use kyama_types::{Address, Amount, IssueKind, KyamaError, Result};

use crate::state::ReserveState;

#[derive(Debug, Clone)]
pub struct Auction {
    address: Address,
    open: bool,
}

impl Auction {
    /// A closed offering acting on the stores as `address`.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            open: false,
        }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the offering.
    ///
    /// # Errors
    /// - `NotOperational` while paused
    /// - `Unauthorized` unless `caller` is the secondary administrator
    /// - `AlreadyOpen` if the offering is open
    pub fn open_auction(&mut self, admin: &AccessControl, caller: Address) -> Result<()> {
        admin.ensure_operational()?;
        admin.ensure_secondary(caller)?;
        if self.open {
            return Err(KyamaError::AlreadyOpen);
        }
        self.open = true;
        tracing::info!(by = %caller, "Auction opened");
        Ok(())
    }

    /// Close the offering. Same gates as [`Self::open_auction`].
    pub fn close_auction(&mut self, admin: &AccessControl, caller: Address) -> Result<()> {
        admin.ensure_operational()?;
        admin.ensure_secondary(caller)?;
        if !self.open {
            return Err(KyamaError::AlreadyClosed);
        }
        self.open = false;
        tracing::info!(by = %caller, "Auction closed");
        Ok(())
    }

    /// Register `caller` as a member and issue shares for `amount`
    /// ("issue a bond"). `amount` is collected into the treasury.
    ///
    /// # Errors
    /// - `NotOperational` while paused
    /// - `AuctionClosed` outside the offering window
    /// - `AlreadyRegistered` for an existing member
    /// - `AmountTooLow` if `amount` is below the current price
    pub fn register_and_fund(
        &self,
        state: &mut ReserveState,
        caller: Address,
        amount: Amount,
    ) -> Result<Posting> {
        state.admin.ensure_operational()?;
        if !self.open {
            return Err(KyamaError::AuctionClosed);
        }
        if state.is_member(caller) {
            return Err(KyamaError::AlreadyRegistered);
        }
        let pps = state.ledger.current_pps();
        if amount < pps {
            return Err(KyamaError::AmountTooLow { amount, pps });
        }
        let posting = state.ledger.record_issue(
            self.address,
            &mut state.token,
            caller,
            amount,
            IssueKind::Registration,
        )?;
        tracing::info!(
            account = %caller,
            amount = %amount,
            shares = %posting.shares,
            member_index = posting.index_after,
            "Member registered through auction"
        );
        Ok(posting)
    }
}

#[cfg(test)]
mod tests {
    use kyama_base::{Ledger, ShareToken};
    use kyama_types::{ReserveConfig, Role, Shares};

    use super::*;

    const DEPLOYER: u8 = 1;
    const CFO: u8 = 2;

    fn setup() -> (Auction, ReserveState) {
        let deployer = Address::numbered(DEPLOYER);
        let auction = Auction::new(Address::derive("auction"));
        let mut ledger = Ledger::new(deployer, &ReserveConfig::default()).unwrap();
        let mut token = ShareToken::new(deployer);
        ledger.approve(deployer, auction.address()).unwrap();
        token.approve(deployer, auction.address()).unwrap();
        let admin = AccessControl::new(deployer, Address::numbered(CFO)).unwrap();
        (auction, ReserveState::new(admin, ledger, token))
    }

    #[test]
    fn starts_closed() {
        let (auction, _) = setup();
        assert!(!auction.is_open());
    }

    #[test]
    fn secondary_opens_and_closes() {
        let (mut auction, state) = setup();
        auction
            .open_auction(&state.admin, Address::numbered(CFO))
            .unwrap();
        assert!(auction.is_open());
        auction
            .close_auction(&state.admin, Address::numbered(CFO))
            .unwrap();
        assert!(!auction.is_open());
    }

    #[test]
    fn primary_and_strangers_cannot_toggle() {
        let (mut auction, state) = setup();
        for caller in [Address::numbered(DEPLOYER), Address::numbered(77)] {
            let err = auction.open_auction(&state.admin, caller).unwrap_err();
            assert!(matches!(
                err,
                KyamaError::Unauthorized {
                    required: Role::Secondary
                }
            ));
        }
        auction
            .open_auction(&state.admin, Address::numbered(CFO))
            .unwrap();
        // Authorization is checked before the open/closed state.
        let err = auction
            .open_auction(&state.admin, Address::numbered(DEPLOYER))
            .unwrap_err();
        assert_eq!(err.to_string(), "KY_ERR_100: Address must be that of the CFO.");
        let err = auction
            .close_auction(&state.admin, Address::numbered(77))
            .unwrap_err();
        assert!(matches!(err, KyamaError::Unauthorized { .. }));
    }

    #[test]
    fn double_open_and_double_close_rejected() {
        let (mut auction, state) = setup();
        let cfo = Address::numbered(CFO);
        assert!(matches!(
            auction.close_auction(&state.admin, cfo),
            Err(KyamaError::AlreadyClosed)
        ));
        auction.open_auction(&state.admin, cfo).unwrap();
        assert!(matches!(
            auction.open_auction(&state.admin, cfo),
            Err(KyamaError::AlreadyOpen)
        ));
    }

    #[test]
    fn paused_blocks_toggling() {
        let (mut auction, mut state) = setup();
        let cfo = Address::numbered(CFO);
        state.admin.pause(cfo).unwrap();
        assert!(matches!(
            auction.open_auction(&state.admin, cfo),
            Err(KyamaError::NotOperational)
        ));
    }

    #[test]
    fn registration_requires_open_auction() {
        let (auction, mut state) = setup();
        let err = auction
            .register_and_fund(&mut state, Address::numbered(10), Amount::new(50))
            .unwrap_err();
        assert_eq!(err.to_string(), "KY_ERR_205: Auction has to be opened.");
    }

    #[test]
    fn registration_mints_and_collects() {
        let (mut auction, mut state) = setup();
        auction
            .open_auction(&state.admin, Address::numbered(CFO))
            .unwrap();
        let member = Address::numbered(10);
        let posting = auction
            .register_and_fund(&mut state, member, Amount::new(51))
            .unwrap();
        assert_eq!(posting.shares, Shares::new(51));
        assert_eq!(state.balance_of(member), Shares::new(51));
        assert_eq!(state.token.reserves(), Amount::new(51));
        assert_eq!(state.ledger.current_index(), 1);

        let err = auction
            .register_and_fund(&mut state, member, Amount::new(51))
            .unwrap_err();
        assert_eq!(err.to_string(), "KY_ERR_302: User is already registered.");
        assert_eq!(state.ledger.current_index(), 1);
    }

    #[test]
    fn registration_below_price_rejected() {
        let (mut auction, mut state) = setup();
        auction
            .open_auction(&state.admin, Address::numbered(CFO))
            .unwrap();
        auction
            .register_and_fund(&mut state, Address::numbered(10), Amount::new(5))
            .unwrap();
        // Price is now 2.
        let err = auction
            .register_and_fund(&mut state, Address::numbered(11), Amount::ONE)
            .unwrap_err();
        assert!(matches!(err, KyamaError::AmountTooLow { .. }));
        assert!(!state.is_member(Address::numbered(11)));
    }
}
