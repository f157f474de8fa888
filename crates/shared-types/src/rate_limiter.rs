//! # Rate Limiter
//!
//! Sliding-window rate limiter keyed by caller identity.
//!
//! ## Security
//!
//! Rate limiting prevents:
//! - A single identity flooding the protocol handler
//! - Resource exhaustion through cheap repeated reads
//!
//! The counters sit behind their own lock, so a flood from one identity never
//! contends with ledger reads or writes.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Sliding-window limiter.
///
/// # Algorithm
///
/// - Each key keeps the instants of its admitted requests
/// - Instants older than `window` fall out of the window
/// - A request is admitted iff fewer than `limit` instants remain
///
/// Refused requests are not recorded, so a blocked caller regains access
/// exactly `window` after its oldest admitted request.
pub struct SlidingWindowLimiter<K> {
    /// Maximum admitted requests per window.
    limit: usize,
    /// Window length.
    window: Duration,
    /// Admitted instants per key, oldest first.
    hits: Mutex<HashMap<K, VecDeque<Instant>>>,
}

impl<K: Eq + Hash + Clone> SlidingWindowLimiter<K> {
    /// Create a new limiter admitting `limit` requests per `window`.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit as usize,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Try to admit a request from `key` now.
    ///
    /// Returns `true` if the request is allowed, `false` if rate limited.
    pub fn try_acquire(&self, key: &K) -> bool {
        self.try_acquire_at(key, Instant::now())
    }

    /// Try to admit a request from `key` at `now`.
    pub fn try_acquire_at(&self, key: &K, now: Instant) -> bool {
        let mut hits = self.hits.lock();
        let entry = hits.entry(key.clone()).or_default();

        while let Some(oldest) = entry.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                entry.pop_front();
            } else {
                break;
            }
        }

        if entry.len() >= self.limit {
            return false;
        }

        entry.push_back(now);
        true
    }

    /// Drop keys whose every admitted request has left the window.
    ///
    /// Returns the number of keys removed.
    pub fn cleanup(&self, now: Instant) -> usize {
        let mut hits = self.hits.lock();
        let before = hits.len();
        hits.retain(|_, entry| {
            entry
                .back()
                .map(|newest| now.saturating_duration_since(*newest) < self.window)
                .unwrap_or(false)
        });
        before - hits.len()
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.hits.lock().len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
