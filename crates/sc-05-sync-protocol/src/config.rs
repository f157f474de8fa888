//! Sync protocol configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Check `SignedRpcRequest.signature` before anything else.
    pub require_authenticated_requests: bool,
    /// Requests admitted per identity per window.
    pub rate_limit_requests: u32,
    pub rate_limit_window_ms: u64,
    /// Upper bound on hashes in one `GET_BLOCKS`.
    pub max_hashes_per_request: usize,
    /// Concurrent dispatches in the request pool.
    pub worker_threads: usize,
    pub request_timeout_ms: u64,
    /// Decoder refuses envelopes larger than this.
    pub max_message_bytes: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            require_authenticated_requests: false,
            rate_limit_requests: 100,
            rate_limit_window_ms: 1_000,
            max_hashes_per_request: 512,
            worker_threads: 8,
            request_timeout_ms: 5_000,
            max_message_bytes: 4 * 1024 * 1024,
        }
    }
}

impl SyncConfig {
    /// Generous limits so tests only hit the ones they set.
    pub fn for_testing() -> Self {
        Self {
            require_authenticated_requests: false,
            rate_limit_requests: 1_000,
            rate_limit_window_ms: 1_000,
            max_hashes_per_request: 16,
            worker_threads: 2,
            request_timeout_ms: 2_000,
            max_message_bytes: 1024 * 1024,
        }
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
