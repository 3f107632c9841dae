//! # kyama-types
//!
//! Shared types, errors, and configuration for the **Kyama** reserve ledger.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`EventId`], [`DebentureId`]
//! - **Units**: [`Amount`] (base currency units), [`Shares`] (share units)
//! - **Roles and operations**: [`Role`], [`Operation`], [`Component`]
//! - **Events**: [`ReserveEvent`], [`EventKind`], [`IssueKind`], [`RedeemKind`]
//! - **Snapshots**: [`LedgerSnapshot`], [`LedgerTotals`]
//! - **Configuration**: [`ReserveConfig`], [`PriceStepConfig`], [`QuotaConfig`]
//! - **Errors**: [`KyamaError`] with `KY_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod amount;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod role;
pub mod snapshot;

pub use amount::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use role::*;
pub use snapshot::*;

// Constants are accessed via `kyama_types::constants::FOO`
// (not re-exported to avoid name collisions).
