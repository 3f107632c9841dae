//! Offline supply audit.
//!
//! Invariants checked:
//! ```text
//! token.total_supply  == Σ token balances == ledger.total_m_share_capital
//! token.reserves      == ledger.total_capital == ledger.total_m_issued
//! replayed issues − replayed redemptions == ledger aggregates
//! ∀ member: open debentures ≤ max_debentures
//! ```
//!
//! The ledger already aborts on a supply mismatch at commit time. The audit
//! re-derives the aggregates independently from the event log, so it also
//! catches a ledger whose stores agree with each other but not with history.

use kyama_types::{Amount, EventKind, KyamaError, ReserveEvent, Result, Shares};

use crate::ledger::Ledger;
use crate::share_token::ShareToken;

/// Running totals rebuilt from committed events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplyAudit {
    issued_amount: u128,
    redeemed_amount: u128,
    issued_shares: u128,
    redeemed_shares: u128,
}

impl SupplyAudit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay every share-moving event in `events`.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a ReserveEvent>) -> Result<Self> {
        let mut audit = Self::new();
        for event in events {
            audit.observe(&event.kind)?;
        }
        Ok(audit)
    }

    /// Fold one event into the running totals.
    pub fn observe(&mut self, kind: &EventKind) -> Result<()> {
        match kind {
            EventKind::Invest { amount, shares, .. }
            | EventKind::Deposit { amount, shares, .. }
            | EventKind::DebentureRepaid { amount, shares, .. } => {
                self.issued_amount = add(self.issued_amount, amount.get())?;
                self.issued_shares = add(self.issued_shares, shares.get())?;
            }
            EventKind::Withdraw { amount, shares, .. }
            | EventKind::DebentureIssued { amount, shares, .. } => {
                self.redeemed_amount = add(self.redeemed_amount, amount.get())?;
                self.redeemed_shares = add(self.redeemed_shares, shares.get())?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Net currency the replayed history leaves in the treasury.
    pub fn expected_capital(&self) -> Result<Amount> {
        self.issued_amount
            .checked_sub(self.redeemed_amount)
            .map(Amount::new)
            .ok_or(KyamaError::Underflow {
                what: "replayed capital",
            })
    }

    /// Net share units the replayed history leaves outstanding.
    pub fn expected_shares(&self) -> Result<Shares> {
        self.issued_shares
            .checked_sub(self.redeemed_shares)
            .map(Shares::new)
            .ok_or(KyamaError::Underflow {
                what: "replayed share capital",
            })
    }

    /// Cross-check the two stores against each other, ignoring history.
    ///
    /// # Errors
    /// `SupplyInvariantViolation` naming the first broken invariant.
    pub fn check_stores(ledger: &Ledger, token: &ShareToken) -> Result<()> {
        let totals = ledger.totals();

        if token.total_supply() != totals.total_m_share_capital {
            return Err(violation(format!(
                "token supply {} != total M share capital {}",
                token.total_supply(),
                totals.total_m_share_capital
            )));
        }

        let held = token
            .holders()
            .try_fold(0u128, |sum, (_, units)| add(sum, units.get()))?;
        if held != token.total_supply().get() {
            return Err(violation(format!(
                "sum of balances {held} != token supply {}",
                token.total_supply()
            )));
        }

        if token.reserves() != totals.total_capital {
            return Err(violation(format!(
                "treasury reserve {} != total capital {}",
                token.reserves(),
                totals.total_capital
            )));
        }

        if totals.total_m_issued != totals.total_capital {
            return Err(violation(format!(
                "total M issued {} != total capital {}",
                totals.total_m_issued, totals.total_capital
            )));
        }

        let max = ledger.max_debentures();
        if let Some((account, count)) = ledger
            .debentures()
            .borrowers()
            .find(|(_, count)| *count > max)
        {
            return Err(violation(format!(
                "{account} holds {count} debentures, cap is {max}"
            )));
        }
        Ok(())
    }

    /// Full audit: store consistency plus agreement with replayed history.
    pub fn verify(&self, ledger: &Ledger, token: &ShareToken) -> Result<()> {
        Self::check_stores(ledger, token)?;
        let totals = ledger.totals();

        let capital = self.expected_capital()?;
        if capital != totals.total_capital {
            return Err(violation(format!(
                "replayed capital {capital} != total capital {} \
                 (issued={}, redeemed={})",
                totals.total_capital, self.issued_amount, self.redeemed_amount
            )));
        }

        let shares = self.expected_shares()?;
        if shares != totals.total_m_share_capital {
            return Err(violation(format!(
                "replayed shares {shares} != total M share capital {} \
                 (issued={}, redeemed={})",
                totals.total_m_share_capital, self.issued_shares, self.redeemed_shares
            )));
        }

        tracing::debug!(
            capital = %capital,
            shares = %shares,
            "Supply audit passed"
        );
        Ok(())
    }
}

fn add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(KyamaError::Overflow {
        what: "supply audit",
    })
}

fn violation(reason: String) -> KyamaError {
    tracing::error!(reason = %reason, "Supply audit failed");
    KyamaError::SupplyInvariantViolation { reason }
}
