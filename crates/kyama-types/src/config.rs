//! Configuration types for a Kyama reserve deployment.
//!
//! Every field has a default, so a deployment can start from
//! `ReserveConfig::default()` or from a partial JSON document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Amount, KyamaError, Result, constants};

/// Top-level configuration for a reserve deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReserveConfig {
    /// Price-per-share at bootstrap. Must be at least 1.
    pub initial_pps: Amount,
    /// Cap on a member's concurrently outstanding debentures.
    pub max_debentures: u32,
    /// Price step policy selection.
    pub price_step: PriceStepConfig,
    /// Withdrawal and debenture quota curve.
    pub quota: QuotaConfig,
    /// Default eligibility rule for borrowing.
    pub harmonization: HarmonizationConfig,
}

impl Default for ReserveConfig {
    fn default() -> Self {
        Self {
            initial_pps: Amount::new(constants::DEFAULT_INITIAL_PPS),
            max_debentures: constants::DEFAULT_MAX_DEBENTURES,
            price_step: PriceStepConfig::default(),
            quota: QuotaConfig::default(),
            harmonization: HarmonizationConfig::default(),
        }
    }
}

impl ReserveConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| KyamaError::Configuration(format!("invalid reserve config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Reject values the ledger cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.initial_pps.is_zero() {
            return Err(KyamaError::Configuration(
                "initial_pps must be at least 1".to_string(),
            ));
        }
        if self.max_debentures == 0 {
            return Err(KyamaError::Configuration(
                "max_debentures must be at least 1".to_string(),
            ));
        }
        self.quota.validate()
    }
}

/// Which issue events count toward the next price step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepTrigger {
    /// Only first-time registrations through the offering.
    #[default]
    Registration,
    /// Every issuance: registrations, deposits and repayments.
    AnyIssue,
}

/// Price step policy configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceStepConfig {
    pub trigger: StepTrigger,
}

/// Quota curve, in basis points of an account's total value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    pub withdrawal_bps: u32,
    pub debenture_bps: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            withdrawal_bps: constants::DEFAULT_WITHDRAWAL_BPS,
            debenture_bps: constants::DEFAULT_DEBENTURE_BPS,
        }
    }
}

impl QuotaConfig {
    /// Quotas may never concede more than the account's total value.
    pub fn validate(&self) -> Result<()> {
        for (name, bps) in [
            ("withdrawal_bps", self.withdrawal_bps),
            ("debenture_bps", self.debenture_bps),
        ] {
            if bps > constants::BPS_DENOMINATOR {
                return Err(KyamaError::Configuration(format!(
                    "{name} = {bps} exceeds {}",
                    constants::BPS_DENOMINATOR
                )));
            }
        }
        Ok(())
    }
}

/// Default harmonization rule parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonizationConfig {
    /// Deposits required after registration before a member may borrow.
    pub min_deposits: u64,
}

impl Default for HarmonizationConfig {
    fn default() -> Self {
        Self {
            min_deposits: constants::DEFAULT_MIN_DEPOSITS_FOR_HARMONIZATION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment() {
        let cfg = ReserveConfig::default();
        assert_eq!(cfg.initial_pps, Amount::ONE);
        assert_eq!(cfg.max_debentures, 10);
        assert_eq!(cfg.price_step.trigger, StepTrigger::Registration);
        assert_eq!(cfg.quota.withdrawal_bps, 10_000);
        assert_eq!(cfg.quota.debenture_bps, 7_500);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = ReserveConfig::from_json_str(
            r#"{ "initial_pps": 5, "price_step": { "trigger": "any_issue" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.initial_pps, Amount::new(5));
        assert_eq!(cfg.price_step.trigger, StepTrigger::AnyIssue);
        assert_eq!(cfg.max_debentures, 10);
        assert_eq!(cfg.harmonization.min_deposits, 1);
    }

    #[test]
    fn zero_pps_rejected() {
        let err = ReserveConfig::from_json_str(r#"{ "initial_pps": 0 }"#).unwrap_err();
        assert!(matches!(err, KyamaError::Configuration(_)));
    }

    #[test]
    fn quota_above_full_value_rejected() {
        let err = ReserveConfig::from_json_str(r#"{ "quota": { "debenture_bps": 10001 } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("debenture_bps"));
    }

    #[test]
    fn malformed_json_is_configuration_error() {
        let err = ReserveConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, KyamaError::Configuration(_)));
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = ReserveConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ReserveConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
