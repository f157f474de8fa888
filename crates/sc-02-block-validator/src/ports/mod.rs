//! Ports of the validator subsystem.

use sc_01_ledger_state::BalanceView;
use shared_types::{Block, CryptoProvider, Hash, PublicKey};
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of wall-clock time, in unix seconds.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> u64;
}

/// Default time source using system time.
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct FixedTimeSource(AtomicU64);

impl FixedTimeSource {
    pub fn new(now: u64) -> Self {
        Self(AtomicU64::new(now))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Proof-of-stake eligibility rule.
///
/// Consensus-critical: every node on a network must run the same policy.
pub trait EligibilityPolicy: Send + Sync {
    /// The `target_hash` a staker must present for a block on top of
    /// `previous` at `timestamp`.
    fn target_for(
        &self,
        previous: &Hash,
        timestamp: u64,
        staker: &PublicKey,
        crypto: &dyn CryptoProvider,
    ) -> Hash;

    /// Weight the block earns if its staker is eligible at `parent`, `None`
    /// if it is not.
    fn evaluate(
        &self,
        block: &Block,
        parent: &dyn BalanceView,
        crypto: &dyn CryptoProvider,
    ) -> Option<u128>;

    /// Upper bound on the weight any single block can earn.
    fn max_weight(&self) -> u128;

    /// Stable identifier for logs.
    fn name(&self) -> &'static str;
}
