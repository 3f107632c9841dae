//! Error types for the Kyama reserve ledger.
//!
//! All errors use the `KY_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Access control errors
//! - 2xx: Circuit breaker / offering state errors
//! - 3xx: Membership errors
//! - 4xx: Value range errors
//! - 5xx: Debenture errors
//! - 6xx: Arithmetic errors
//! - 7xx: Treasury / payout errors
//! - 9xx: General / internal errors
//!
//! Every operation error is a refusal: the call that produced it left no
//! state behind. A supply desynchronization detected while committing
//! aborts the process instead; [`KyamaError::SupplyInvariantViolation`] is
//! only reported by offline audits.

use thiserror::Error;

use crate::{Address, Amount, Component, Operation, Role, Shares};

/// Central error enum for all Kyama operations.
#[derive(Debug, Error)]
pub enum KyamaError {
    // =================================================================
    // Access Control Errors (1xx)
    // =================================================================
    /// Caller does not hold the role the call requires.
    #[error("KY_ERR_100: Address must be that of {required}.")]
    Unauthorized { required: Role },

    /// The null address was offered as an administrator.
    #[error("KY_ERR_101: New {role} address provided must be valid.")]
    InvalidAddress { role: Role },

    /// The offered administrator already holds an administrator seat.
    #[error("KY_ERR_102: New {role} address must not be a current administrator.")]
    AlreadyAdmin { role: Role },

    /// Caller is not on the component's approved-module list.
    #[error("KY_ERR_103: {0} data access denied.")]
    AccessDenied(Component),

    // =================================================================
    // Circuit Breaker / Offering Errors (2xx)
    // =================================================================
    /// A mutating call arrived while the system is paused.
    #[error("KY_ERR_200: Contracts are currently paused.")]
    NotOperational,

    /// `pause` was called while already paused.
    #[error("KY_ERR_201: Contracts are currently paused.")]
    AlreadyPaused,

    /// `resume` was called while operational.
    #[error("KY_ERR_202: Contracts are currently active.")]
    NotPaused,

    /// `open_auction` was called while the auction is open.
    #[error("KY_ERR_203: Auction currently open.")]
    AlreadyOpen,

    /// `close_auction` was called while the auction is closed.
    #[error("KY_ERR_204: Auction currently closed.")]
    AlreadyClosed,

    /// A bond was requested while the auction is closed.
    #[error("KY_ERR_205: Auction has to be opened.")]
    AuctionClosed,

    // =================================================================
    // Membership Errors (3xx)
    // =================================================================
    /// Caller has never registered.
    #[error("KY_ERR_300: Address provided for {operation} is not linked to a Kyama account.")]
    NotAMember { operation: Operation },

    /// Transfer recipient has never registered.
    #[error("KY_ERR_301: Recipient address provided for M-Bill transfer has no linked account.")]
    RecipientNotAMember { recipient: Address },

    /// Caller tried to register a second time.
    #[error("KY_ERR_302: User is already registered.")]
    AlreadyRegistered,

    /// Caller has not met the eligibility gate for borrowing.
    #[error("KY_ERR_303: Account is yet to meet investment consensus.")]
    NotHarmonized,

    // =================================================================
    // Value Range Errors (4xx)
    // =================================================================
    /// A zero amount was supplied.
    #[error("KY_ERR_400: {operation} amount provided is invalid.")]
    InvalidAmount { operation: Operation },

    /// Amount is below the current price-per-share.
    #[error("KY_ERR_401: Amount {amount} is too low for this transaction (PPS {pps}).")]
    AmountTooLow { amount: Amount, pps: Amount },

    /// Amount exceeds the account's quota for the operation.
    #[error("KY_ERR_402: {operation} amount {amount} is above account quota {quota}.")]
    AboveQuota {
        operation: Operation,
        amount: Amount,
        quota: Amount,
    },

    /// Amount is below the minimum (one share at current PPS).
    #[error("KY_ERR_403: {operation} amount {amount} is below account quota (PPS {pps}).")]
    BelowQuota {
        operation: Operation,
        amount: Amount,
        pps: Amount,
    },

    /// Transfer amount exceeds the sender's total value.
    #[error("KY_ERR_404: Insufficient M-Bills for this transfer: requested {requested}, value {available}.")]
    InsufficientFunds { requested: Amount, available: Amount },

    /// A token burn or transfer exceeds the holder's balance.
    #[error("KY_ERR_405: Insufficient share balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Shares, available: Shares },

    // =================================================================
    // Debenture Errors (5xx)
    // =================================================================
    /// Member already holds the maximum number of open loans.
    #[error("KY_ERR_500: Account has too many outstanding loans at the moment ({outstanding}/{max}).")]
    TooManyOutstanding { outstanding: u32, max: u32 },

    /// Repayment from a member with no open loan.
    #[error("KY_ERR_501: Account holder does not have any outstanding M-Bill loan balance.")]
    NoOutstandingLoan,

    // =================================================================
    // Arithmetic Errors (6xx)
    // =================================================================
    /// An integer bound would be exceeded.
    #[error("KY_ERR_600: Arithmetic overflow in {what}")]
    Overflow { what: &'static str },

    /// A quantity would go negative.
    #[error("KY_ERR_601: Arithmetic underflow in {what}")]
    Underflow { what: &'static str },

    // =================================================================
    // Treasury / Payout Errors (7xx)
    // =================================================================
    /// The host refused to deliver funds to the recipient.
    #[error("KY_ERR_700: Disbursement to {to} failed: {reason}")]
    DisbursementFailed { to: Address, reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// An audit found the share supply or reserves out of step with the
    /// ledger aggregates.
    #[error("KY_ERR_904: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    /// A posting was applied to a ledger that moved on since planning.
    #[error("KY_ERR_900: Stale posting: planned at sequence {planned}, ledger at {current}")]
    StalePosting { planned: u64, current: u64 },

    /// Serialization / deserialization error.
    #[error("KY_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, out-of-range values, etc.).
    #[error("KY_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("KY_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, KyamaError>;

impl From<std::io::Error> for KyamaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for KyamaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_display() {
        let err = KyamaError::Unauthorized {
            required: Role::Primary,
        };
        assert_eq!(
            err.to_string(),
            "KY_ERR_100: Address must be that of the CEO."
        );
    }

    #[test]
    fn not_a_member_names_operation() {
        let err = KyamaError::NotAMember {
            operation: Operation::Deposit,
        };
        let msg = err.to_string();
        assert!(msg.contains("KY_ERR_300"));
        assert!(msg.contains("deposit is not linked to a Kyama account"));
    }

    #[test]
    fn access_denied_display() {
        let err = KyamaError::AccessDenied(Component::Token);
        assert_eq!(err.to_string(), "KY_ERR_103: Token data access denied.");
    }

    #[test]
    fn all_errors_have_ky_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(KyamaError::NotOperational),
            Box::new(KyamaError::AlreadyRegistered),
            Box::new(KyamaError::NoOutstandingLoan),
            Box::new(KyamaError::Overflow { what: "test" }),
            Box::new(KyamaError::TooManyOutstanding {
                outstanding: 10,
                max: 10,
            }),
            Box::new(KyamaError::Configuration("bad".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(msg.starts_with("KY_ERR_"), "Error missing KY_ERR_ prefix: {msg}");
        }
    }
}
