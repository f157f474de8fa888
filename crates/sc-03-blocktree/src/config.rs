//! Blocktree configuration.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlocktreeConfig {
    /// Blocks waiting for their parent. Oldest are evicted first.
    pub max_pending_blocks: usize,
    /// How long a block may wait for its parent (seconds).
    pub pending_retention_secs: u64,
    /// Orphan branches trailing the head by more weight than this many
    /// maximum-weight blocks are pruned.
    pub prune_depth: u64,
    /// Remembered `Rejected`/`Pruned` hashes.
    pub terminal_cache_capacity: usize,
}

impl Default for BlocktreeConfig {
    fn default() -> Self {
        Self {
            max_pending_blocks: 1_024,
            pending_retention_secs: 120,
            prune_depth: 64,
            terminal_cache_capacity: 8_192,
        }
    }
}

impl BlocktreeConfig {
    /// Small limits so eviction and pruning are easy to reach in tests.
    pub fn for_testing() -> Self {
        Self {
            max_pending_blocks: 8,
            pending_retention_secs: 30,
            prune_depth: 4,
            terminal_cache_capacity: 64,
        }
    }
}
