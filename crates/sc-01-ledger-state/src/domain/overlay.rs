//! # Copy-on-write Views
//!
//! Two views layered over a base snapshot. Neither ever writes to the base.
//!
//! - [`Overlay`]: scratch space for `apply_block`, records before/after
//!   pairs and turns them into a patch set
//! - [`StagedView`]: walks stored patch sets backwards and forwards, used to
//!   reach a parent snapshot and to stage a reorg

use super::errors::LedgerError;
use crate::ports::BalanceView;
use shared_types::{Balance, BalancePatch, PublicKey};
use std::collections::{BTreeMap, HashMap};

fn adjust_supply(supply: u128, old: Balance, new: Balance) -> u128 {
    (supply + new.tokens as u128).saturating_sub(old.tokens as u128)
}

/// Scratch ledger for applying one block.
pub struct Overlay<'a> {
    base: &'a dyn BalanceView,
    /// `(before, after)` per touched account. Ordered, so patch sets come
    /// out sorted by public key.
    touched: BTreeMap<PublicKey, (Balance, Balance)>,
    supply: u128,
}

impl<'a> Overlay<'a> {
    pub fn new(base: &'a dyn BalanceView) -> Self {
        Self {
            base,
            touched: BTreeMap::new(),
            supply: base.total_supply(),
        }
    }

    pub fn get(&self, public_key: &PublicKey) -> Balance {
        match self.touched.get(public_key) {
            Some((_, after)) => *after,
            None => self.base.balance(public_key),
        }
    }

    pub fn set(&mut self, public_key: PublicKey, balance: Balance) {
        let current = self.get(&public_key);
        self.supply = adjust_supply(self.supply, current, balance);
        let before = self.base.balance(&public_key);
        self.touched
            .entry(public_key)
            .and_modify(|(_, after)| *after = balance)
            .or_insert((before, balance));
    }

    /// Remove `tokens` from `public_key` without touching its `op_index`.
    pub fn debit(&mut self, public_key: &PublicKey, tokens: u64) -> Result<(), LedgerError> {
        let mut balance = self.get(public_key);
        if tokens > balance.tokens {
            return Err(LedgerError::InsufficientBalance {
                public_key: *public_key,
                required: tokens,
                available: balance.tokens,
            });
        }
        balance.tokens -= tokens;
        self.set(*public_key, balance);
        Ok(())
    }

    /// Add `tokens` to `public_key` without touching its `op_index`.
    pub fn credit(&mut self, public_key: &PublicKey, tokens: u64) -> Result<(), LedgerError> {
        let mut balance = self.get(public_key);
        balance.tokens = balance.tokens.checked_add(tokens).ok_or_else(|| {
            LedgerError::MalformedCommitment("credit overflows destination balance".into())
        })?;
        self.set(*public_key, balance);
        Ok(())
    }

    /// Patch set of every account whose balance actually changed.
    pub fn into_patches(self) -> Vec<BalancePatch> {
        self.touched
            .into_iter()
            .filter(|(_, (before, after))| before != after)
            .map(|(public_key, (before, after))| BalancePatch {
                public_key,
                before,
                after,
            })
            .collect()
    }
}

impl BalanceView for Overlay<'_> {
    fn balance(&self, public_key: &PublicKey) -> Balance {
        self.get(public_key)
    }

    fn total_supply(&self) -> u128 {
        self.supply
    }
}

/// Base snapshot plus a stack of reverted and replayed patch sets.
///
/// Every step checks that the patch matches the balance it replaces, so a
/// patch set applied out of order fails with `SnapshotMismatch` instead of
/// producing a corrupt view.
pub struct StagedView<'a> {
    base: &'a dyn BalanceView,
    changes: HashMap<PublicKey, Balance>,
    supply: u128,
}

impl<'a> StagedView<'a> {
    pub fn new(base: &'a dyn BalanceView) -> Self {
        Self {
            base,
            changes: HashMap::new(),
            supply: base.total_supply(),
        }
    }

    fn current(&self, public_key: &PublicKey) -> Balance {
        self.changes
            .get(public_key)
            .copied()
            .unwrap_or_else(|| self.base.balance(public_key))
    }

    fn step(&mut self, public_key: PublicKey, expect: Balance, next: Balance) -> Result<(), LedgerError> {
        let current = self.current(&public_key);
        if current != expect {
            return Err(LedgerError::SnapshotMismatch { public_key });
        }
        self.supply = adjust_supply(self.supply, current, next);
        self.changes.insert(public_key, next);
        Ok(())
    }

    /// Undo one block's patch set.
    pub fn revert(&mut self, patches: &[BalancePatch]) -> Result<(), LedgerError> {
        for patch in patches.iter().rev() {
            self.step(patch.public_key, patch.after, patch.before)?;
        }
        Ok(())
    }

    /// Redo one block's patch set.
    pub fn replay(&mut self, patches: &[BalancePatch]) -> Result<(), LedgerError> {
        for patch in patches {
            self.step(patch.public_key, patch.before, patch.after)?;
        }
        Ok(())
    }

    /// Final value of every account the staged patches touched.
    pub fn into_changes(self) -> HashMap<PublicKey, Balance> {
        self.changes
    }
}

impl BalanceView for StagedView<'_> {
    fn balance(&self, public_key: &PublicKey) -> Balance {
        self.current(public_key)
    }

    fn total_supply(&self) -> u128 {
        self.supply
    }
}
