//! # Stake-Weighted Eligibility
//!
//! A staker may extend a parent when a pseudo-random draw, fixed by the
//! parent hash, the block timestamp and the staker key, falls under a
//! threshold proportional to the staker's share of total supply.
//!
//! ```text
//! target    = hash(previous || timestamp_be || staker_pk)
//! draw      = u64 from the first 8 bytes of target (big-endian)
//! threshold = floor(stake * 2^64 / total)
//! eligible  = draw < threshold
//! weight    = threshold - draw
//! ```
//!
//! Since `stake <= total`, no block earns more than `2^64`.
//!
//! `stake` and `total` are read at the parent snapshot. A staker holding
//! the whole supply is always eligible. A staker with no tokens never is.

use crate::ports::EligibilityPolicy;
use sc_01_ledger_state::BalanceView;
use shared_types::{Block, CryptoProvider, Hash, PublicKey};

#[derive(Clone, Copy, Debug, Default)]
pub struct StakeWeightedEligibility;

impl StakeWeightedEligibility {
    /// Upper bound on the draw for `stake` out of `total`.
    pub fn threshold(stake: u64, total: u128) -> u128 {
        if stake == 0 || total == 0 {
            return 0;
        }
        ((stake as u128) << 64) / total
    }

    fn draw(target: &Hash) -> u128 {
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&target[..8]);
        u64::from_be_bytes(prefix) as u128
    }
}

impl EligibilityPolicy for StakeWeightedEligibility {
    fn target_for(
        &self,
        previous: &Hash,
        timestamp: u64,
        staker: &PublicKey,
        crypto: &dyn CryptoProvider,
    ) -> Hash {
        let mut seed = Vec::with_capacity(32 + 8 + 32);
        seed.extend_from_slice(previous);
        seed.extend_from_slice(&timestamp.to_be_bytes());
        seed.extend_from_slice(staker);
        crypto.hash(&seed)
    }

    fn evaluate(
        &self,
        block: &Block,
        parent: &dyn BalanceView,
        crypto: &dyn CryptoProvider,
    ) -> Option<u128> {
        let expected = self.target_for(&block.previous, block.timestamp, &block.staker_pk, crypto);
        if expected != block.target_hash {
            return None;
        }

        let stake = parent.balance(&block.staker_pk).tokens;
        let threshold = Self::threshold(stake, parent.total_supply());
        let draw = Self::draw(&block.target_hash);

        (draw < threshold).then(|| threshold - draw)
    }

    fn max_weight(&self) -> u128 {
        1 << 64
    }

    fn name(&self) -> &'static str {
        "stake_weighted"
    }
}
