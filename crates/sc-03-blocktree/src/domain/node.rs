//! Arena entries and status values.

use shared_types::{BalancePatch, Hash, HashedBlock};
use std::sync::Arc;

/// An accepted block in the arena.
#[derive(Clone, Debug)]
pub struct BlockNode {
    pub block: Arc<HashedBlock>,
    /// `None` only for genesis.
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub height: u64,
    pub timestamp: u64,
    /// Diff produced against the parent snapshot.
    pub patches: Vec<BalancePatch>,
    /// Sum of eligibility margins from genesis to this block.
    pub cumulative_weight: u128,
    pub canonical: bool,
}

impl BlockNode {
    pub fn hash(&self) -> Hash {
        self.block.hash
    }
}

/// Observable state of a block hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockStatus {
    Canonical,
    Orphaned,
    PendingParent,
    Rejected,
    Pruned,
    Unknown,
}

/// Terminal states remembered by the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminal {
    Rejected,
    Pruned,
}

/// Summary of the canonical head.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadInfo {
    pub hash: Hash,
    pub height: u64,
    pub timestamp: u64,
    pub cumulative_weight: u128,
}

/// Result of a successful insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored. `released` counts buffered descendants accepted along with it.
    Accepted { head_changed: bool, released: usize },
    /// Parent unknown; buffered until it arrives.
    Pending,
    AlreadyKnown,
}

/// Canonical hashes from a start height up to the head.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ancestors {
    pub head: Hash,
    pub head_height: u64,
    /// Ascending by height, ending with `head`.
    pub hashes: Vec<Hash>,
}
