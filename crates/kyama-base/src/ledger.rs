//! Global aggregates, the price-per-share rule, and the posting interface.
//!
//! The ledger is the only place currency and share units are converted.
//! Every change to the aggregates goes through a [`Posting`]:
//!
//! 1. `plan_issue` / `plan_redeem` run every check and compute the full
//!    post-state from shared borrows. Nothing is written.
//! 2. The caller moves currency outside the ledger (a payout may fail; the
//!    posting is then simply dropped).
//! 3. `apply` commits the posting to the ledger and the share token
//!    together, then re-checks that token supply matches
//!    `total_m_share_capital`.
//!
//! A supply mismatch after commit is a defect, not a user error: `apply`
//! logs it and panics.

use std::collections::BTreeSet;
use std::sync::Arc;

use kyama_types::{
    Address, Amount, Component, DebentureId, IssueKind, KyamaError, LedgerSnapshot, LedgerTotals,
    Operation, RedeemKind, Result, ReserveConfig, Role, Shares,
};

use crate::debenture::{Debenture, DebentureBook, RepaymentOutcome};
use crate::membership::MembershipRegistry;
use crate::pricing::{PpsStepPolicy, ThresholdStep};
use crate::quota::{LinearQuota, QuotaPolicy};
use crate::share_token::ShareToken;

/// Which way shares move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingDirection {
    Issue(IssueKind),
    Redeem(RedeemKind),
}

/// What a posting does to the member's loans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebentureEffect {
    None,
    Open { id: DebentureId, principal: Amount },
    Repay(RepaymentOutcome),
}

/// A fully validated, not yet committed ledger change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub direction: PostingDirection,
    pub account: Address,
    /// Currency collected (issue) or released (redeem). Exactly the
    /// requested amount, never the share-rounded equivalent.
    pub amount: Amount,
    /// `amount / pps_before`, floored.
    pub shares: Shares,
    pub totals_after: LedgerTotals,
    pub pps_before: Amount,
    pub pps_after: Amount,
    pub counted_after: u64,
    pub index_after: u64,
    pub debenture: DebentureEffect,
    planned_at: u64,
}

impl Posting {
    /// Ledger sequence this posting was computed against.
    #[must_use]
    pub fn planned_at(&self) -> u64 {
        self.planned_at
    }

    #[must_use]
    pub fn price_stepped(&self) -> bool {
        self.pps_after > self.pps_before
    }

    /// Currency lost to floor division: `amount mod pps`.
    #[must_use]
    pub fn dust(&self) -> Amount {
        Amount::new(self.amount.get() % self.pps_before.get())
    }

    /// `shares * pps` lies within one price unit below `amount`.
    #[must_use]
    pub fn reconciles(&self) -> bool {
        let pps = self.pps_before.get();
        self.shares
            .get()
            .checked_mul(pps)
            .and_then(|priced| self.amount.get().checked_sub(priced))
            .is_some_and(|gap| gap < pps)
    }
}

/// The ledger ("Base").
#[derive(Debug)]
pub struct Ledger {
    owner: Address,
    approved: BTreeSet<Address>,
    totals: LedgerTotals,
    current_pps: Amount,
    current_index: u64,
    counted_since_step: u64,
    max_debentures: u32,
    members: MembershipRegistry,
    debentures: DebentureBook,
    step_policy: Arc<dyn PpsStepPolicy>,
    quota_policy: Arc<dyn QuotaPolicy>,
    sequence: u64,
}

impl Ledger {
    /// Build a ledger with the policies `config` selects.
    pub fn new(owner: Address, config: &ReserveConfig) -> Result<Self> {
        let step = Arc::new(ThresholdStep::new(config.price_step.trigger));
        let quota = Arc::new(LinearQuota::from_config(&config.quota)?);
        Self::with_policies(owner, config, step, quota)
    }

    /// Build a ledger with caller-supplied step and quota policies.
    pub fn with_policies(
        owner: Address,
        config: &ReserveConfig,
        step_policy: Arc<dyn PpsStepPolicy>,
        quota_policy: Arc<dyn QuotaPolicy>,
    ) -> Result<Self> {
        config.validate()?;
        if owner.is_zero() {
            return Err(KyamaError::InvalidAddress { role: Role::Owner });
        }
        tracing::info!(
            owner = %owner,
            initial_pps = %config.initial_pps,
            max_debentures = config.max_debentures,
            step_policy = step_policy.name(),
            quota_policy = quota_policy.name(),
            "Ledger initialized"
        );
        Ok(Self {
            owner,
            approved: BTreeSet::new(),
            totals: LedgerTotals::default(),
            current_pps: config.initial_pps,
            current_index: 0,
            counted_since_step: 0,
            max_debentures: config.max_debentures,
            members: MembershipRegistry::new(),
            debentures: DebentureBook::new(),
            step_policy,
            quota_policy,
            sequence: 0,
        })
    }

    // -----------------------------------------------------------------
    // Access list
    // -----------------------------------------------------------------

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Grant record rights to `module`. Only the owner may approve.
    pub fn approve(&mut self, caller: Address, module: Address) -> Result<()> {
        if caller != self.owner {
            return Err(KyamaError::Unauthorized {
                required: Role::Owner,
            });
        }
        if module.is_zero() {
            return Err(KyamaError::InvalidAddress { role: Role::Owner });
        }
        if self.approved.insert(module) {
            tracing::debug!(module = %module, "Ledger write access granted");
        }
        Ok(())
    }

    #[must_use]
    pub fn is_approved(&self, module: Address) -> bool {
        self.approved.contains(&module)
    }

    fn ensure_approved(&self, caller: Address) -> Result<()> {
        if self.is_approved(caller) {
            Ok(())
        } else {
            tracing::warn!(caller = %caller, "Ledger write rejected: module not approved");
            Err(KyamaError::AccessDenied(Component::Ledger))
        }
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    #[must_use]
    pub fn totals(&self) -> LedgerTotals {
        self.totals
    }

    #[must_use]
    pub fn current_pps(&self) -> Amount {
        self.current_pps
    }

    /// Number of members ever registered.
    #[must_use]
    pub fn current_index(&self) -> u64 {
        self.current_index
    }

    #[must_use]
    pub fn counted_since_step(&self) -> u64 {
        self.counted_since_step
    }

    #[must_use]
    pub fn max_debentures(&self) -> u32 {
        self.max_debentures
    }

    #[must_use]
    pub fn members(&self) -> &MembershipRegistry {
        &self.members
    }

    #[must_use]
    pub fn debentures(&self) -> &DebentureBook {
        &self.debentures
    }

    /// Open loans held by `account`.
    #[must_use]
    pub fn outstanding_debentures(&self, account: Address) -> u32 {
        self.debentures.count(account)
    }

    /// Number of postings committed so far.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            totals: self.totals,
            current_m_pps: self.current_pps,
            current_m_index: self.current_index,
            counted_since_step: self.counted_since_step,
            max_m_debentures: self.max_debentures,
            open_debentures: self.debentures.total_open(),
            sequence: self.sequence,
        }
    }

    // -----------------------------------------------------------------
    // Conversions and quotas
    // -----------------------------------------------------------------

    /// `shares * current_pps`.
    pub fn price_of(&self, shares: Shares) -> Result<Amount> {
        shares
            .get()
            .checked_mul(self.current_pps.get())
            .map(Amount::new)
            .ok_or(KyamaError::Overflow { what: "share price" })
    }

    /// `amount / current_pps`, floored. The remainder is dust.
    #[must_use]
    pub fn shares_for(&self, amount: Amount) -> Shares {
        Shares::new(amount.get() / self.current_pps.get())
    }

    /// Currency value of a share balance at the current price.
    pub fn total_value(&self, shares: Shares) -> Result<Amount> {
        self.price_of(shares)
    }

    /// Pro-rata part of the treasury backing `shares`:
    /// `shares * total_capital / total_m_share_capital`, floored.
    ///
    /// Claims of all holders together never exceed `total_capital`.
    pub fn treasury_claim(&self, shares: Shares) -> Result<Amount> {
        let supply = self.totals.total_m_share_capital.get();
        if supply == 0 {
            return Ok(Amount::ZERO);
        }
        let capital = self.totals.total_capital.get();
        let held = shares.get().min(supply);
        let whole = (capital / supply).checked_mul(held);
        let part = (capital % supply)
            .checked_mul(held)
            .map(|product| product / supply);
        whole
            .zip(part)
            .and_then(|(whole, part)| whole.checked_add(part))
            .map(Amount::new)
            .ok_or(KyamaError::Overflow {
                what: "treasury claim",
            })
    }

    /// Value a balance of `shares` may redeem: its total value, capped at
    /// its treasury claim.
    fn redeemable(&self, shares: Shares) -> Result<Amount> {
        Ok(self.total_value(shares)?.min(self.treasury_claim(shares)?))
    }

    /// Largest withdrawal a balance of `shares` allows. Never above
    /// [`Self::total_value`] nor [`Self::treasury_claim`].
    pub fn max_withdrawable(&self, shares: Shares) -> Result<Amount> {
        let value = self.total_value(shares)?;
        let quota = self.quota_policy.max_withdrawable(value);
        Ok(quota.min(self.redeemable(shares)?))
    }

    /// Largest single loan a balance of `shares` allows. Same bounds as
    /// [`Self::max_withdrawable`].
    pub fn max_debenture(&self, shares: Shares) -> Result<Amount> {
        let value = self.total_value(shares)?;
        let quota = self.quota_policy.max_debenture(value);
        Ok(quota.min(self.redeemable(shares)?))
    }

    // -----------------------------------------------------------------
    // Planning
    // -----------------------------------------------------------------

    /// Plan the issuance of `shares_for(amount)` to `account`.
    ///
    /// # Errors
    /// - `AccessDenied(Ledger)` if `caller` is not an approved module
    /// - `AlreadyRegistered` for a registration by a member
    /// - `NotAMember` for a deposit or repayment by a non-member
    /// - `NoOutstandingLoan` for a repayment without open loans
    /// - `Overflow` if an aggregate would exceed its bound
    pub fn plan_issue(
        &self,
        caller: Address,
        account: Address,
        amount: Amount,
        kind: IssueKind,
    ) -> Result<Posting> {
        self.ensure_approved(caller)?;
        let registered = self.members.is_registered(account);
        match kind {
            IssueKind::Registration if registered => return Err(KyamaError::AlreadyRegistered),
            IssueKind::Deposit if !registered => {
                return Err(KyamaError::NotAMember {
                    operation: Operation::Deposit,
                });
            }
            IssueKind::Repayment if !registered => {
                return Err(KyamaError::NotAMember {
                    operation: Operation::DebentureRepayment,
                });
            }
            _ => {}
        }
        let debenture = if kind == IssueKind::Repayment {
            if self.debentures.count(account) == 0 {
                return Err(KyamaError::NoOutstandingLoan);
            }
            DebentureEffect::Repay(self.debentures.preview_repay(account, amount))
        } else {
            DebentureEffect::None
        };

        let shares = self.shares_for(amount);
        let totals_after = LedgerTotals {
            total_capital: self.totals.total_capital.try_add(amount, "total capital")?,
            total_m_issued: self
                .totals
                .total_m_issued
                .try_add(amount, "total M issued")?,
            total_m_share_capital: self
                .totals
                .total_m_share_capital
                .try_add(shares, "total M share capital")?,
        };

        let step = self
            .step_policy
            .step(self.current_pps, self.counted_since_step, kind)?;
        if step.pps < self.current_pps {
            fatal(format!(
                "step policy {} lowered price from {} to {}",
                self.step_policy.name(),
                self.current_pps,
                step.pps
            ));
        }

        let index_after = if kind == IssueKind::Registration {
            self.current_index
                .checked_add(1)
                .ok_or(KyamaError::Overflow {
                    what: "member index",
                })?
        } else {
            self.current_index
        };

        Ok(Posting {
            direction: PostingDirection::Issue(kind),
            account,
            amount,
            shares,
            totals_after,
            pps_before: self.current_pps,
            pps_after: step.pps,
            counted_after: step.counted_since_step,
            index_after,
            debenture,
            planned_at: self.sequence,
        })
    }

    /// Plan the redemption of `shares_for(amount)` from `account`.
    ///
    /// Quota checks belong to the calling module; this only enforces what
    /// the ledger itself must never violate.
    ///
    /// # Errors
    /// - `AccessDenied(Ledger)` if `caller` is not an approved module
    /// - `NotAMember` if `account` never registered
    /// - `TooManyOutstanding` for a loan beyond the per-member cap
    /// - `InsufficientBalance` if the account holds fewer shares
    /// - `Underflow` if an aggregate would go negative
    pub fn plan_redeem(
        &self,
        caller: Address,
        token: &ShareToken,
        account: Address,
        amount: Amount,
        kind: RedeemKind,
    ) -> Result<Posting> {
        self.ensure_approved(caller)?;
        if !self.members.is_registered(account) {
            return Err(KyamaError::NotAMember {
                operation: match kind {
                    RedeemKind::Withdrawal => Operation::Withdrawal,
                    RedeemKind::Debenture => Operation::DebentureRequest,
                },
            });
        }
        let debenture = if kind == RedeemKind::Debenture {
            let outstanding = self.debentures.count(account);
            if outstanding >= self.max_debentures {
                return Err(KyamaError::TooManyOutstanding {
                    outstanding,
                    max: self.max_debentures,
                });
            }
            DebentureEffect::Open {
                id: DebentureId::new(),
                principal: amount,
            }
        } else {
            DebentureEffect::None
        };

        let shares = self.shares_for(amount);
        let available = token.balance_of(account);
        if available < shares {
            return Err(KyamaError::InsufficientBalance {
                needed: shares,
                available,
            });
        }
        let totals_after = LedgerTotals {
            total_capital: self.totals.total_capital.try_sub(amount, "total capital")?,
            total_m_issued: self
                .totals
                .total_m_issued
                .try_sub(amount, "total M issued")?,
            total_m_share_capital: self
                .totals
                .total_m_share_capital
                .try_sub(shares, "total M share capital")?,
        };

        Ok(Posting {
            direction: PostingDirection::Redeem(kind),
            account,
            amount,
            shares,
            totals_after,
            pps_before: self.current_pps,
            pps_after: self.current_pps,
            counted_after: self.counted_since_step,
            index_after: self.current_index,
            debenture,
            planned_at: self.sequence,
        })
    }

    // -----------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------

    /// Commit `posting` to the ledger and `token` together.
    ///
    /// # Errors
    /// - `AccessDenied` if `caller` is not approved on either store
    /// - `StalePosting` if another posting was applied since planning
    /// - any token refusal (`InsufficientBalance`, `Overflow`, `Underflow`)
    ///
    /// On error nothing is written.
    ///
    /// # Panics
    /// If token supply and `total_m_share_capital` disagree after commit.
    pub fn apply(&mut self, caller: Address, token: &mut ShareToken, posting: &Posting) -> Result<()> {
        self.ensure_approved(caller)?;
        if posting.planned_at != self.sequence {
            return Err(KyamaError::StalePosting {
                planned: posting.planned_at,
                current: self.sequence,
            });
        }
        if !posting.reconciles() {
            fatal(format!(
                "posting of {} for {} shares at pps {} does not reconcile",
                posting.amount, posting.shares, posting.pps_before
            ));
        }

        match posting.direction {
            PostingDirection::Issue(_) => {
                token.credit(caller, posting.account, posting.shares, posting.amount)?;
            }
            PostingDirection::Redeem(_) => {
                token.debit(caller, posting.account, posting.shares, posting.amount)?;
            }
        }

        // Token side committed; everything below is infallible.
        self.totals = posting.totals_after;
        self.current_pps = posting.pps_after;
        self.counted_since_step = posting.counted_after;
        self.current_index = posting.index_after;
        match posting.direction {
            PostingDirection::Issue(IssueKind::Registration) => {
                self.members.admit(posting.account, posting.index_after);
            }
            PostingDirection::Issue(IssueKind::Deposit) => {
                self.members.note_deposit(posting.account);
            }
            _ => {}
        }
        match posting.debenture {
            DebentureEffect::None => {}
            DebentureEffect::Open { id, principal } => {
                self.debentures
                    .open(posting.account, Debenture::new(id, principal));
            }
            DebentureEffect::Repay(planned) => {
                let outcome = self.debentures.settle(posting.account, posting.amount);
                if outcome != planned {
                    fatal(format!(
                        "repayment by {} settled {outcome:?}, planned {planned:?}",
                        posting.account
                    ));
                }
            }
        }
        self.sequence += 1;

        if token.total_supply() != self.totals.total_m_share_capital {
            fatal(format!(
                "token supply {} != total M share capital {}",
                token.total_supply(),
                self.totals.total_m_share_capital
            ));
        }

        match posting.direction {
            PostingDirection::Issue(kind) => tracing::info!(
                kind = %kind,
                account = %posting.account,
                amount = %posting.amount,
                shares = %posting.shares,
                pps = %posting.pps_before,
                sequence = self.sequence,
                "Shares issued"
            ),
            PostingDirection::Redeem(kind) => tracing::info!(
                kind = %kind,
                account = %posting.account,
                amount = %posting.amount,
                shares = %posting.shares,
                pps = %posting.pps_before,
                sequence = self.sequence,
                "Shares redeemed"
            ),
        }
        if posting.price_stepped() {
            tracing::info!(
                from = %posting.pps_before,
                to = %posting.pps_after,
                members = self.current_index,
                "Price per share stepped"
            );
        }
        Ok(())
    }

    /// Plan and apply an issuance in one call.
    pub fn record_issue(
        &mut self,
        caller: Address,
        token: &mut ShareToken,
        account: Address,
        amount: Amount,
        kind: IssueKind,
    ) -> Result<Posting> {
        let posting = self.plan_issue(caller, account, amount, kind)?;
        self.apply(caller, token, &posting)?;
        Ok(posting)
    }

    /// Plan and apply a redemption in one call.
    pub fn record_redeem(
        &mut self,
        caller: Address,
        token: &mut ShareToken,
        account: Address,
        amount: Amount,
        kind: RedeemKind,
    ) -> Result<Posting> {
        let posting = self.plan_redeem(caller, token, account, amount, kind)?;
        self.apply(caller, token, &posting)?;
        Ok(posting)
    }
}

fn fatal(reason: String) -> ! {
    tracing::error!(reason = %reason, "Ledger invariant violated, aborting");
    panic!("ledger invariant violated: {reason}");
}
