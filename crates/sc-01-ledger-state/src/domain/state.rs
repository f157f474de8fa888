//! Canonical ledger: balances at the current canonical head.

use super::errors::LedgerError;
use super::overlay::StagedView;
use crate::ports::BalanceView;
use shared_types::{Balance, BalancePatch, PublicKey};
use std::collections::HashMap;
use tracing::debug;

/// Account table. Only stores non-empty balances.
#[derive(Clone, Debug, Default)]
pub struct LedgerState {
    accounts: HashMap<PublicKey, Balance>,
    total_supply: u128,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, public_key: &PublicKey) -> Balance {
        self.accounts.get(public_key).copied().unwrap_or_default()
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Number of non-empty accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PublicKey, &Balance)> {
        self.accounts.iter()
    }

    /// Apply one block's patch set on top of the current state.
    ///
    /// Fails without writing anything if any `before` disagrees with the
    /// current balance.
    pub fn commit(&mut self, patches: &[BalancePatch]) -> Result<(), LedgerError> {
        self.apply_reorg(&[], &[patches])
    }

    /// Restore every account a block touched to its `before` value.
    ///
    /// Fails without writing anything if any `after` disagrees with the
    /// current balance.
    pub fn revert(&mut self, patches: &[BalancePatch]) -> Result<(), LedgerError> {
        self.apply_reorg(&[patches], &[])
    }

    /// Move the ledger from one head to another.
    ///
    /// `revert` lists the patch sets from the old head down to (excluding)
    /// the common ancestor, newest first. `replay` lists the new branch from
    /// just above the ancestor up to the new head, oldest first. All steps
    /// are staged and checked before the first write, so the ledger either
    /// ends at the new head or stays at the old one.
    pub fn apply_reorg(
        &mut self,
        revert: &[&[BalancePatch]],
        replay: &[&[BalancePatch]],
    ) -> Result<(), LedgerError> {
        let mut staged = StagedView::new(&*self);
        for patches in revert {
            staged.revert(patches)?;
        }
        for patches in replay {
            staged.replay(patches)?;
        }
        let changes = staged.into_changes();

        for (public_key, balance) in changes {
            self.write(public_key, balance);
        }

        debug!(
            reverted = revert.len(),
            replayed = replay.len(),
            accounts = self.accounts.len(),
            "ledger moved"
        );
        Ok(())
    }

    fn write(&mut self, public_key: PublicKey, balance: Balance) {
        let old = self.balance(&public_key);
        self.total_supply = (self.total_supply + balance.tokens as u128)
            .saturating_sub(old.tokens as u128);
        if balance.is_empty() {
            self.accounts.remove(&public_key);
        } else {
            self.accounts.insert(public_key, balance);
        }
    }
}

impl BalanceView for LedgerState {
    fn balance(&self, public_key: &PublicKey) -> Balance {
        LedgerState::balance(self, public_key)
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }
}
