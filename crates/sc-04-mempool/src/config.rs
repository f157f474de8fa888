//! Mempool configuration.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MempoolConfig {
    /// Maximum pooled transactions.
    pub max_transactions: usize,
    /// Maximum pooled transactions touching one source account.
    pub max_per_account: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_transactions: 4096,
            max_per_account: 64,
        }
    }
}

impl MempoolConfig {
    /// Small limits for tests.
    pub fn for_testing() -> Self {
        Self {
            max_transactions: 8,
            max_per_account: 2,
        }
    }
}
