//! Integer units: currency [`Amount`] and share [`Shares`].
//!
//! All bookkeeping is done in whole base units. There is no fractional
//! currency: conversions between the two units floor and leave dust.
//! Arithmetic is checked: callers get [`KyamaError::Overflow`] or
//! [`KyamaError::Underflow`] instead of a wrapped value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{KyamaError, Result};

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// A quantity of the reserve currency, in base units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);

    #[must_use]
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u128 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition. `what` names the quantity for the error message.
    pub fn try_add(self, rhs: Self, what: &'static str) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(KyamaError::Overflow { what })
    }

    /// Checked subtraction. `what` names the quantity for the error message.
    pub fn try_sub(self, rhs: Self, what: &'static str) -> Result<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(KyamaError::Underflow { what })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Shares
// ---------------------------------------------------------------------------

/// A quantity of share units ("M-Bills").
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Shares(pub u128);

impl Shares {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u128 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn try_add(self, rhs: Self, what: &'static str) -> Result<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(KyamaError::Overflow { what })
    }

    pub fn try_sub(self, rhs: Self, what: &'static str) -> Result<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(KyamaError::Underflow { what })
    }
}

impl fmt::Display for Shares {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Shares {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_checked_add_overflows() {
        let err = Amount::new(u128::MAX)
            .try_add(Amount::ONE, "total capital")
            .unwrap_err();
        assert!(matches!(err, KyamaError::Overflow { what: "total capital" }));
    }

    #[test]
    fn amount_checked_sub_underflows() {
        let err = Amount::new(5)
            .try_sub(Amount::new(6), "total capital")
            .unwrap_err();
        assert!(matches!(err, KyamaError::Underflow { .. }));
        assert_eq!(
            Amount::new(6).try_sub(Amount::new(5), "x").unwrap(),
            Amount::ONE
        );
    }

    #[test]
    fn shares_arithmetic() {
        let s = Shares::new(10).try_add(Shares::new(5), "supply").unwrap();
        assert_eq!(s, Shares::new(15));
        assert!(Shares::ZERO.try_sub(Shares::new(1), "balance").is_err());
    }

    #[test]
    fn units_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&Amount::new(51)).unwrap();
        assert_eq!(json, "51");
        let back: Shares = serde_json::from_str("42").unwrap();
        assert_eq!(back, Shares::new(42));
    }
}
