//! Share unit ("M-Bill") balances and the currency reserve behind them.
//!
//! Every write is restricted to modules the token owner approved at
//! bootstrap. Compound writes (`credit`, `debit`, `transfer`) validate the
//! whole movement before touching any field, so a refused call leaves the
//! token unchanged.

use std::collections::{BTreeSet, HashMap};

use kyama_types::{Address, Amount, Component, KyamaError, Result, Role, Shares};

/// Balance store for share units plus the treasury reserve.
#[derive(Debug, Clone)]
pub struct ShareToken {
    owner: Address,
    approved: BTreeSet<Address>,
    balances: HashMap<Address, Shares>,
    total_supply: Shares,
    /// Currency collected and not yet disbursed.
    reserves: Amount,
}

impl ShareToken {
    /// Create an empty token owned by `owner` (the deployer).
    #[must_use]
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            approved: BTreeSet::new(),
            balances: HashMap::new(),
            total_supply: Shares::ZERO,
            reserves: Amount::ZERO,
        }
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Grant write access to `module`. Only the owner may approve.
    ///
    /// Approving an already-approved module is a no-op.
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
            tracing::debug!(module = %module, "Token write access granted");
        }
        Ok(())
    }

    #[must_use]
    pub fn is_approved(&self, module: Address) -> bool {
        self.approved.contains(&module)
    }

    /// Fails with `AccessDenied(Token)` unless `caller` was approved.
    pub fn ensure_approved(&self, caller: Address) -> Result<()> {
        if self.is_approved(caller) {
            Ok(())
        } else {
            tracing::warn!(caller = %caller, "Token write rejected: module not approved");
            Err(KyamaError::AccessDenied(Component::Token))
        }
    }

    #[must_use]
    pub fn balance_of(&self, account: Address) -> Shares {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn total_supply(&self) -> Shares {
        self.total_supply
    }

    #[must_use]
    pub fn reserves(&self) -> Amount {
        self.reserves
    }

    /// Accounts with a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (Address, Shares)> + '_ {
        self.balances
            .iter()
            .filter(|(_, units)| !units.is_zero())
            .map(|(account, units)| (*account, *units))
    }

    /// Create `units` on `to`.
    pub fn mint(&mut self, caller: Address, to: Address, units: Shares) -> Result<()> {
        self.credit(caller, to, units, Amount::ZERO)
    }

    /// Destroy `units` held by `from`.
    ///
    /// # Errors
    /// `InsufficientBalance` if `from` holds fewer than `units`.
    pub fn burn(&mut self, caller: Address, from: Address, units: Shares) -> Result<()> {
        self.debit(caller, from, units, Amount::ZERO)
    }

    /// Mint `units` to `account` and take `collected` into the reserve.
    pub fn credit(
        &mut self,
        caller: Address,
        account: Address,
        units: Shares,
        collected: Amount,
    ) -> Result<()> {
        self.ensure_approved(caller)?;
        let balance = self.balance_of(account).try_add(units, "share balance")?;
        let supply = self.total_supply.try_add(units, "share supply")?;
        let reserves = self.reserves.try_add(collected, "treasury reserve")?;

        self.balances.insert(account, balance);
        self.total_supply = supply;
        self.reserves = reserves;
        tracing::debug!(
            account = %account,
            units = %units,
            collected = %collected,
            "Shares minted"
        );
        Ok(())
    }

    /// Burn `units` from `account` and release `released` from the reserve.
    pub fn debit(
        &mut self,
        caller: Address,
        account: Address,
        units: Shares,
        released: Amount,
    ) -> Result<()> {
        self.ensure_approved(caller)?;
        let available = self.balance_of(account);
        if available < units {
            return Err(KyamaError::InsufficientBalance {
                needed: units,
                available,
            });
        }
        let balance = available.try_sub(units, "share balance")?;
        let supply = self.total_supply.try_sub(units, "share supply")?;
        let reserves = self.reserves.try_sub(released, "treasury reserve")?;

        self.balances.insert(account, balance);
        self.total_supply = supply;
        self.reserves = reserves;
        tracing::debug!(
            account = %account,
            units = %units,
            released = %released,
            "Shares burned"
        );
        Ok(())
    }

    /// Move `units` from `from` to `to`. Supply is unchanged.
    ///
    /// A transfer to self only checks the balance.
    pub fn transfer(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        units: Shares,
    ) -> Result<()> {
        self.ensure_approved(caller)?;
        let available = self.balance_of(from);
        if available < units {
            return Err(KyamaError::InsufficientBalance {
                needed: units,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let from_after = available.try_sub(units, "share balance")?;
        let to_after = self.balance_of(to).try_add(units, "share balance")?;

        self.balances.insert(from, from_after);
        self.balances.insert(to, to_after);
        tracing::debug!(from = %from, to = %to, units = %units, "Shares transferred");
        Ok(())
    }
}
