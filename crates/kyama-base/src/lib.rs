//! # kyama-base
//!
//! **Shared state** of the Kyama reserve: the stores every operation
//! module reads and writes.
//!
//! ## Architecture
//!
//! 1. **AccessControl**: primary/secondary administrators and the single
//!    operational flag, consulted through the [`CircuitBreaker`] capability
//! 2. **ShareToken**: per-account share balances plus the currency reserve,
//!    writable only by approved modules
//! 3. **Ledger**: global aggregates, price-per-share and its step rule,
//!    member registry, debenture book; the only place share/currency
//!    conversion happens
//! 4. **SupplyAudit**: replays the event log and cross-checks the stores
//! 5. **EventLog**: hash-chained audit trail of committed events
//!
//! ## Posting Flow
//!
//! ```text
//! Ledger.plan_issue()/plan_redeem()  (pure: all checks, full post-state)
//!     → external payout (may fail; nothing mutated yet)
//!     → Ledger.apply(token, posting)  (commit ledger + token together)
//! ```

pub mod access_control;
pub mod debenture;
pub mod event_log;
pub mod ledger;
pub mod membership;
pub mod pricing;
pub mod quota;
pub mod share_token;
pub mod supply_audit;

pub use access_control::{AccessControl, CircuitBreaker};
pub use debenture::{Debenture, DebentureBook, RepaymentOutcome};
pub use event_log::EventLog;
pub use ledger::{DebentureEffect, Ledger, Posting, PostingDirection};
pub use membership::{Allowlist, DepositConsensus, Harmonization, MemberRecord, MembershipRegistry};
pub use pricing::{PpsStepPolicy, PriceStep, ThresholdStep};
pub use quota::{LinearQuota, QuotaPolicy};
pub use share_token::ShareToken;
pub use supply_audit::SupplyAudit;
