//! Point-in-time views of the ledger aggregates.

use serde::{Deserialize, Serialize};

use crate::{Amount, Shares};

/// The three monetary aggregates kept by the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Raw currency held: sum of all net contributions.
    pub total_capital: Amount,
    /// Cumulative currency-equivalent of all outstanding issued shares.
    pub total_m_issued: Amount,
    /// Sum of every member's share balance.
    pub total_m_share_capital: Shares,
}

/// Serializable snapshot of the full ledger state (minus per-account maps).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub totals: LedgerTotals,
    pub current_m_pps: Amount,
    pub current_m_index: u64,
    /// Issue events counted toward the next price step.
    pub counted_since_step: u64,
    pub max_m_debentures: u32,
    /// Total number of open debentures across all members.
    pub open_debentures: u64,
    /// Commit sequence; increments once per applied posting.
    pub sequence: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_totals_are_zero() {
        let totals = LedgerTotals::default();
        assert!(totals.total_capital.is_zero());
        assert!(totals.total_m_issued.is_zero());
        assert!(totals.total_m_share_capital.is_zero());
    }

    #[test]
    fn snapshot_serde_roundtrip() {
        let snap = LedgerSnapshot {
            totals: LedgerTotals {
                total_capital: Amount::new(200),
                total_m_issued: Amount::new(200),
                total_m_share_capital: Shares::new(150),
            },
            current_m_pps: Amount::new(3),
            current_m_index: 4,
            counted_since_step: 1,
            max_m_debentures: 10,
            open_debentures: 2,
            sequence: 9,
        };
        let json = serde_json::to_string(&snap).unwrap();
        let back: LedgerSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }
}
