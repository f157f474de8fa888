//! # Shared Blocktree
//!
//! Thread-safe front of [`Blocktree`]. Hash and signature checks run before
//! the write lock; everything that reads or moves the head runs under it.

use crate::domain::{Ancestors, BlockStatus, Blocktree, BlocktreeError, HeadInfo, InsertError, InsertOutcome};
use parking_lot::{RwLock, RwLockReadGuard};
use sc_02_block_validator::BlockValidator;
use shared_types::{Balance, GetBlocksStatus, Hash, HashedBlock, PublicKey};
use std::sync::Arc;

pub struct SharedBlocktree {
    inner: RwLock<Blocktree>,
    validator: Arc<BlockValidator>,
}

impl SharedBlocktree {
    pub fn new(tree: Blocktree) -> Self {
        Self {
            validator: tree.validator().clone(),
            inner: RwLock::new(tree),
        }
    }

    /// Insert one block.
    pub fn insert(&self, block: HashedBlock) -> Result<InsertOutcome, InsertError> {
        if let Some(settled) = self.inner.read().settled(&block.hash) {
            return settled;
        }
        match self.validator.precheck(&block) {
            Ok(hash) => self.inner.write().insert_prechecked(block, hash),
            Err(e) => {
                self.inner.write().record_precheck_failure(&block, &e);
                Err(e.into())
            }
        }
    }

    /// Insert several blocks, prechecking them in parallel first.
    ///
    /// Results are in input order. Order within the batch does not affect
    /// the final tree: children seen before their parent are buffered.
    pub fn insert_batch(&self, blocks: Vec<HashedBlock>) -> Vec<Result<InsertOutcome, InsertError>> {
        let checks = self.validator.precheck_batch(&blocks);
        let mut tree = self.inner.write();
        blocks
            .into_iter()
            .zip(checks)
            .map(|(block, check)| match check {
                Ok(hash) => tree.insert_prechecked(block, hash),
                Err(e) => {
                    tree.record_precheck_failure(&block, &e);
                    Err(e.into())
                }
            })
            .collect()
    }

    /// Shared read access for multi-step queries that need one consistent
    /// view.
    pub fn read(&self) -> RwLockReadGuard<'_, Blocktree> {
        self.inner.read()
    }

    pub fn validator(&self) -> &Arc<BlockValidator> {
        &self.validator
    }

    pub fn head(&self) -> HeadInfo {
        self.inner.read().head()
    }

    pub fn status(&self, hash: &Hash) -> BlockStatus {
        self.inner.read().status(hash)
    }

    pub fn get_blocks(&self, hashes: &[Hash]) -> (GetBlocksStatus, Vec<HashedBlock>) {
        self.inner.read().get_blocks(hashes)
    }

    pub fn get_ancestors(&self, start_height: u64) -> Result<Ancestors, BlocktreeError> {
        self.inner.read().get_ancestors(start_height)
    }

    pub fn balance(&self, public_key: &PublicKey) -> Balance {
        self.inner.read().balance(public_key)
    }

    pub fn gc_pending(&self) -> Vec<Hash> {
        self.inner.write().gc_pending()
    }
}
