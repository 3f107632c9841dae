//! # kyama-reserve
//!
//! **Operation modules** of the Kyama reserve and the [`Reserve`] that
//! wires them to the shared stores.
//!
//! ## Modules
//!
//! 1. **Auction** ("Offering"): the secondary administrator opens and
//!    closes the window; new members register and buy their first shares
//! 2. **CoreBanking** ("MCore"): member deposits and quota-bound withdrawals
//! 3. **Generous** ("MGenerous"): member-to-member transfers and debentures
//!    (loans against the borrower's own shares)
//! 4. **Payment** ("MPayment"): debenture repayment, settled oldest-first
//!
//! Every module acts on the stores under its own address, which the
//! deployer approves once during [`Reserve::bootstrap`]. Operations that
//! pay currency out go through a [`Disbursement`]; a refused payout leaves
//! every store untouched.

pub mod auction;
pub mod core_banking;
pub mod generous;
pub mod payment;
pub mod payout;
pub mod reserve;
pub mod state;

pub use auction::Auction;
pub use core_banking::CoreBanking;
pub use generous::Generous;
pub use payment::Payment;
pub use payout::{Disbursement, InMemoryWallets};
pub use reserve::Reserve;
pub use state::ReserveState;
