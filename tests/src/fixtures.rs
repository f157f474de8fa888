//! Shared fixtures: deterministic keys, a genesis with known allocations
//! and a search for eligible blocks.

use sc_01_ledger_state::{BalanceView, BountyPolicy};
use sc_02_block_validator::{BlockValidator, FixedTimeSource, StakeWeightedEligibility, ValidatorConfig};
use sc_03_blocktree::{Blocktree, BlocktreeConfig};
use shared_crypto::{BlockBuilder, Ed25519Blake3, Ed25519KeyPair, GenesisBuilder, TransactionBuilder};
use shared_types::{Balance, CryptoProvider, HashedBlock, PublicKey, Transaction};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const GENESIS_TIME: u64 = 1_000;
/// Local clock for every fixture; far enough ahead that no block is early.
pub const NOW: u64 = GENESIS_TIME + 100_000;

pub const STAKER_STAKE: u64 = 1_000;
pub const CAROL_TOKENS: u64 = 500;

pub fn key(seed: u8) -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed([seed; 32])
}

/// The staker. Holds [`STAKER_STAKE`] at genesis.
pub fn alice() -> Ed25519KeyPair {
    key(1)
}

/// A funded non-staking account. Holds [`CAROL_TOKENS`] at genesis.
pub fn carol() -> Ed25519KeyPair {
    key(3)
}

pub fn genesis_key() -> Ed25519KeyPair {
    key(0xEE)
}

pub fn pk(seed: u8) -> PublicKey {
    key(seed).public_key_bytes()
}

pub fn transfer(from: &Ed25519KeyPair, to: PublicKey, tokens: u64, op_index: u32) -> Transaction {
    TransactionBuilder::new()
        .add_transfer(from, to, tokens, op_index)
        .build()
        .unwrap()
}

/// Search timestamps from `min_ts` upward for a child of `parent` that
/// `staker` may publish, judged against the parent snapshot `view`.
pub fn eligible_child(
    validator: &BlockValidator,
    parent: &HashedBlock,
    view: &dyn BalanceView,
    staker: &Ed25519KeyPair,
    min_ts: u64,
    transactions: Vec<Transaction>,
) -> HashedBlock {
    let crypto = validator.crypto().as_ref();
    let eligibility = validator.eligibility();
    let staker_pk = staker.public_key_bytes();
    let parent_hash = parent.hash;

    let mut ts = min_ts.max(parent.block().timestamp + 1);
    loop {
        let target = eligibility.target_for(&parent_hash, ts, &staker_pk, crypto);
        let block = BlockBuilder::new(staker, parent_hash, parent.height() + 1)
            .timestamp(ts)
            .target_hash(target)
            .transactions(transactions.clone())
            .build(crypto);
        if eligibility.evaluate(block.block(), view, crypto).is_some() {
            return block;
        }
        ts += 1;
    }
}

/// Non-empty balances in key order.
pub fn balances(tree: &Blocktree) -> BTreeMap<PublicKey, Balance> {
    tree.ledger()
        .iter()
        .filter(|(_, balance)| !balance.is_empty())
        .map(|(pk, balance)| (*pk, *balance))
        .collect()
}

/// A genesis shared by any number of fresh trees.
pub struct Chain {
    pub time: Arc<FixedTimeSource>,
    pub validator: Arc<BlockValidator>,
    pub genesis: HashedBlock,
    pub staker: Ed25519KeyPair,
}

impl Chain {
    /// Genesis funding alice and carol.
    pub fn new(bounty: Arc<dyn BountyPolicy>) -> Self {
        let crypto: Arc<dyn CryptoProvider> = Arc::new(Ed25519Blake3);
        let time = Arc::new(FixedTimeSource::new(NOW));
        let staker = alice();

        let genesis = GenesisBuilder::new()
            .allocate(staker.public_key_bytes(), STAKER_STAKE)
            .allocate(carol().public_key_bytes(), CAROL_TOKENS)
            .timestamp(GENESIS_TIME)
            .build_with_key(&genesis_key(), crypto.as_ref())
            .unwrap();
        let validator = Arc::new(BlockValidator::new(
            crypto,
            Arc::new(StakeWeightedEligibility),
            bounty,
            time.clone(),
            ValidatorConfig::for_testing(),
        ));

        Self {
            time,
            validator,
            genesis,
            staker,
        }
    }

    pub fn tree(&self) -> Blocktree {
        Blocktree::new(
            self.genesis.clone(),
            self.validator.clone(),
            self.time.clone(),
            BlocktreeConfig::for_testing(),
        )
        .unwrap()
    }

    /// Eligible child of `parent` staked by alice.
    pub fn child(
        &self,
        parent: &HashedBlock,
        view: &dyn BalanceView,
        min_ts: u64,
        transactions: Vec<Transaction>,
    ) -> HashedBlock {
        eligible_child(
            &self.validator,
            parent,
            view,
            &self.staker,
            min_ts,
            transactions,
        )
    }
}
