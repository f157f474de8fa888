//! # Pending-Parent Buffer
//!
//! Holds blocks whose parent has not been accepted yet.
//!
//! ## Bounds
//!
//! - Entries older than `retention_secs` are dropped by [`gc_expired`]
//! - At most `max_blocks` entries; the oldest go first on overflow
//!
//! Entries are keyed by their verified hash and indexed by parent hash so
//! that accepting a block releases its waiting children in one lookup.
//!
//! [`gc_expired`]: PendingBuffer::gc_expired

use shared_types::{Hash, HashedBlock};
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct PendingBlock {
    pub block: HashedBlock,
    /// Unix seconds at which the block was buffered.
    pub received_at: u64,
}

impl PendingBlock {
    fn is_expired(&self, now: u64, retention_secs: u64) -> bool {
        now.saturating_sub(self.received_at) > retention_secs
    }
}

#[derive(Debug)]
pub struct PendingBuffer {
    blocks: HashMap<Hash, PendingBlock>,
    by_parent: HashMap<Hash, Vec<Hash>>,
    max_blocks: usize,
    retention_secs: u64,
}

impl PendingBuffer {
    pub fn new(max_blocks: usize, retention_secs: u64) -> Self {
        Self {
            blocks: HashMap::new(),
            by_parent: HashMap::new(),
            max_blocks,
            retention_secs,
        }
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.blocks.contains_key(hash)
    }

    /// Buffer `block`, keyed by its verified `hash`.
    ///
    /// Returns the hashes evicted to stay within bounds, oldest first.
    pub fn insert(&mut self, hash: Hash, block: HashedBlock, now: u64) -> Vec<Hash> {
        if self.blocks.contains_key(&hash) {
            return vec![];
        }
        self.by_parent.entry(block.previous()).or_default().push(hash);
        self.blocks.insert(
            hash,
            PendingBlock {
                block,
                received_at: now,
            },
        );
        self.enforce_max()
    }

    /// Remove and return every block waiting on `parent`.
    pub fn take_children(&mut self, parent: &Hash) -> Vec<(Hash, HashedBlock)> {
        let Some(children) = self.by_parent.remove(parent) else {
            return vec![];
        };
        children
            .into_iter()
            .filter_map(|h| self.blocks.remove(&h).map(|p| (h, p.block)))
            .collect()
    }

    /// Drop entries that waited longer than the retention window.
    pub fn gc_expired(&mut self, now: u64) -> Vec<Hash> {
        let retention = self.retention_secs;
        let expired: Vec<Hash> = self
            .blocks
            .iter()
            .filter(|(_, p)| p.is_expired(now, retention))
            .map(|(h, _)| *h)
            .collect();

        for hash in &expired {
            self.remove(hash);
        }
        expired
    }

    fn enforce_max(&mut self) -> Vec<Hash> {
        if self.blocks.len() <= self.max_blocks {
            return vec![];
        }

        let mut entries: Vec<_> = self
            .blocks
            .iter()
            .map(|(h, p)| (p.received_at, *h))
            .collect();
        entries.sort();

        let to_remove = self.blocks.len() - self.max_blocks;
        let evicted: Vec<Hash> = entries.iter().take(to_remove).map(|(_, h)| *h).collect();
        for hash in &evicted {
            self.remove(hash);
        }
        evicted
    }

    fn remove(&mut self, hash: &Hash) -> Option<PendingBlock> {
        let pending = self.blocks.remove(hash)?;
        let parent = pending.block.previous();
        if let Some(siblings) = self.by_parent.get_mut(&parent) {
            siblings.retain(|h| h != hash);
            if siblings.is_empty() {
                self.by_parent.remove(&parent);
            }
        }
        Some(pending)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
