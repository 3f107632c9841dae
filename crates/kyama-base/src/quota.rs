//! Withdrawal and debenture quota curves.
//!
//! A quota policy maps an account's total value (share balance at the
//! current price) to the largest amount it may withdraw or borrow. The
//! ledger clamps every policy result to the total value and to the
//! account's pro-rata claim on the treasury (`Ledger::treasury_claim`).

use std::fmt;

use kyama_types::{Amount, KyamaError, QuotaConfig, Result, constants};

/// Replaceable quota curve.
pub trait QuotaPolicy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn max_withdrawable(&self, total_value: Amount) -> Amount;

    fn max_debenture(&self, total_value: Amount) -> Amount;
}

/// Fixed fractions of total value, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearQuota {
    withdrawal_bps: u32,
    debenture_bps: u32,
}

impl LinearQuota {
    /// Both fractions must be at most `BPS_DENOMINATOR`.
    pub fn new(withdrawal_bps: u32, debenture_bps: u32) -> Result<Self> {
        let config = QuotaConfig {
            withdrawal_bps,
            debenture_bps,
        };
        config.validate()?;
        Ok(Self {
            withdrawal_bps,
            debenture_bps,
        })
    }

    pub fn from_config(config: &QuotaConfig) -> Result<Self> {
        Self::new(config.withdrawal_bps, config.debenture_bps)
    }

    #[must_use]
    pub fn withdrawal_bps(&self) -> u32 {
        self.withdrawal_bps
    }

    #[must_use]
    pub fn debenture_bps(&self) -> u32 {
        self.debenture_bps
    }
}

impl Default for LinearQuota {
    fn default() -> Self {
        Self {
            withdrawal_bps: constants::DEFAULT_WITHDRAWAL_BPS,
            debenture_bps: constants::DEFAULT_DEBENTURE_BPS,
        }
    }
}

impl QuotaPolicy for LinearQuota {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn max_withdrawable(&self, total_value: Amount) -> Amount {
        scale_bps(total_value, self.withdrawal_bps)
    }

    fn max_debenture(&self, total_value: Amount) -> Amount {
        scale_bps(total_value, self.debenture_bps)
    }
}

/// `floor(value * bps / 10_000)` without forming the full product.
fn scale_bps(value: Amount, bps: u32) -> Amount {
    let denom = u128::from(constants::BPS_DENOMINATOR);
    let bps = u128::from(bps.min(constants::BPS_DENOMINATOR));
    let v = value.get();
    Amount::new((v / denom) * bps + (v % denom) * bps / denom)
}

impl From<LinearQuota> for QuotaConfig {
    fn from(quota: LinearQuota) -> Self {
        Self {
            withdrawal_bps: quota.withdrawal_bps,
            debenture_bps: quota.debenture_bps,
        }
    }
}

impl TryFrom<QuotaConfig> for LinearQuota {
    type Error = KyamaError;

    fn try_from(config: QuotaConfig) -> Result<Self> {
        Self::from_config(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allows_full_withdrawal_and_three_quarter_loans() {
        let quota = LinearQuota::default();
        assert_eq!(quota.max_withdrawable(Amount::new(400)), Amount::new(400));
        assert_eq!(quota.max_debenture(Amount::new(400)), Amount::new(300));
    }

    #[test]
    fn scaling_floors() {
        let quota = LinearQuota::new(3_333, 7_500).unwrap();
        assert_eq!(quota.max_withdrawable(Amount::new(10)), Amount::new(3));
        assert_eq!(quota.max_debenture(Amount::new(3)), Amount::new(2));
    }

    #[test]
    fn huge_values_do_not_overflow() {
        let quota = LinearQuota::default();
        let max = Amount::new(u128::MAX);
        assert_eq!(quota.max_withdrawable(max), max);
        assert!(quota.max_debenture(max) < max);
    }

    #[test]
    fn above_full_value_rejected() {
        let err = LinearQuota::new(10_001, 0).unwrap_err();
        assert!(matches!(err, KyamaError::Configuration(_)));
    }

    #[test]
    fn config_conversion() {
        let quota = LinearQuota::try_from(QuotaConfig {
            withdrawal_bps: 5_000,
            debenture_bps: 2_500,
        })
        .unwrap();
        assert_eq!(quota.withdrawal_bps(), 5_000);
        assert_eq!(QuotaConfig::from(quota).debenture_bps, 2_500);
    }
}
