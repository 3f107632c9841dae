//! Price-per-share step rule.
//!
//! The ledger keeps a counter of qualifying issue events since the last
//! step. [`ThresholdStep`] raises the price by one base unit each time that
//! counter reaches the current price, so the number of events needed for
//! the next step grows with the price itself. After `n` steps from a price
//! of 1 the cumulative count is `n(n+1)/2`, i.e. price grows roughly with
//! the square root of qualifying events.

use std::fmt;

use kyama_types::{Amount, IssueKind, KyamaError, Result, StepTrigger};

/// Outcome of evaluating the step rule for one issue event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceStep {
    /// Price after the event.
    pub pps: Amount,
    /// Qualifying events counted since the last step, after the event.
    pub counted_since_step: u64,
}

impl PriceStep {
    /// Whether the price moved relative to `before`.
    #[must_use]
    pub fn stepped_from(&self, before: Amount) -> bool {
        self.pps > before
    }
}

/// Replaceable rule deciding how issue events move the price.
///
/// Implementations must never return a price below `pps`.
pub trait PpsStepPolicy: Send + Sync + fmt::Debug {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Evaluate one issue event of `kind` against the current state.
    fn step(&self, pps: Amount, counted_since_step: u64, kind: IssueKind) -> Result<PriceStep>;
}

/// `counted + 1 >= pps` → `pps + 1`, counter reset to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThresholdStep {
    pub trigger: StepTrigger,
}

impl ThresholdStep {
    #[must_use]
    pub fn new(trigger: StepTrigger) -> Self {
        Self { trigger }
    }

    fn counts(&self, kind: IssueKind) -> bool {
        match self.trigger {
            StepTrigger::Registration => kind == IssueKind::Registration,
            StepTrigger::AnyIssue => true,
        }
    }
}

impl PpsStepPolicy for ThresholdStep {
    fn name(&self) -> &'static str {
        match self.trigger {
            StepTrigger::Registration => "threshold/registration",
            StepTrigger::AnyIssue => "threshold/any-issue",
        }
    }

    fn step(&self, pps: Amount, counted_since_step: u64, kind: IssueKind) -> Result<PriceStep> {
        if !self.counts(kind) {
            return Ok(PriceStep {
                pps,
                counted_since_step,
            });
        }
        let counted = counted_since_step
            .checked_add(1)
            .ok_or(KyamaError::Overflow {
                what: "price step counter",
            })?;
        if u128::from(counted) >= pps.get() {
            let next = pps.try_add(Amount::ONE, "price per share")?;
            tracing::debug!(
                policy = self.name(),
                from = %pps,
                to = %next,
                "Price step threshold reached"
            );
            Ok(PriceStep {
                pps: next,
                counted_since_step: 0,
            })
        } else {
            Ok(PriceStep {
                pps,
                counted_since_step: counted,
            })
        }
    }
}
