//! Roles, operation labels, and gated components.
//!
//! These enums exist mostly so errors carry machine-checkable context:
//! which role was required, which member-facing operation refused the
//! caller, which data store denied access.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An administrative role required by a privileged call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The primary administrator ("CEO").
    Primary,
    /// The secondary administrator ("CFO").
    Secondary,
    /// Either administrator.
    Administrator,
    /// The deploying identity that owns a data store's access list.
    Owner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "the CEO"),
            Self::Secondary => write!(f, "the CFO"),
            Self::Administrator => write!(f, "an administrator"),
            Self::Owner => write!(f, "the owner"),
        }
    }
}

/// A member-facing operation, used to label membership and value errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Registration,
    Deposit,
    Withdrawal,
    Transfer,
    DebentureRequest,
    DebentureRepayment,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registration => write!(f, "registration"),
            Self::Deposit => write!(f, "deposit"),
            Self::Withdrawal => write!(f, "withdrawal"),
            Self::Transfer => write!(f, "M-Bill transfer"),
            Self::DebentureRequest => write!(f, "loan request"),
            Self::DebentureRepayment => write!(f, "loan payment"),
        }
    }
}

/// A shared data store guarded by an approved-module list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    /// The share token balance store.
    Token,
    /// The ledger aggregates.
    Ledger,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token => write!(f, "Token"),
            Self::Ledger => write!(f, "Ledger"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_display_matches_revert_wording() {
        assert_eq!(Role::Primary.to_string(), "the CEO");
        assert_eq!(Role::Secondary.to_string(), "the CFO");
        assert_eq!(Role::Administrator.to_string(), "an administrator");
    }

    #[test]
    fn operation_display() {
        assert_eq!(Operation::Transfer.to_string(), "M-Bill transfer");
        assert_eq!(Operation::DebentureRequest.to_string(), "loan request");
    }
}
