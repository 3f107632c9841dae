//! System-wide constants for the Kyama reserve ledger.

/// Price-per-share at bootstrap when no configuration overrides it.
pub const DEFAULT_INITIAL_PPS: u128 = 1;

/// Maximum number of concurrently outstanding debentures per member.
pub const DEFAULT_MAX_DEBENTURES: u32 = 10;

/// Basis-point denominator used by quota policies (100% = 10 000 bps).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Default withdrawal quota: the full account value.
pub const DEFAULT_WITHDRAWAL_BPS: u32 = 10_000;

/// Default debenture quota: three quarters of the account value.
pub const DEFAULT_DEBENTURE_BPS: u32 = 7_500;

/// Deposits a member must have made before the default harmonization rule
/// considers them eligible to borrow.
pub const DEFAULT_MIN_DEPOSITS_FOR_HARMONIZATION: u64 = 1;

/// Domain separator for the event log hash chain.
pub const EVENT_CHAIN_DOMAIN: &[u8] = b"kyama:event:v1:";

/// Domain separator for deterministic address derivation.
pub const ADDRESS_DERIVATION_DOMAIN: &[u8] = b"kyama:address:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Kyama Reserve";
