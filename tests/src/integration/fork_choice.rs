//! # Fork Choice Convergence
//!
//! Any arrival order of the same block set must end at the same head with
//! the same balances, and those balances must equal a straight replay of
//! the canonical chain. This holds for forks taller than `prune_depth`
//! too, as long as the lighter side is still within reach.

use crate::fixtures::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sc_01_ledger_state::{BalanceView, SourceFundedBounty};
use sc_02_block_validator::StakeWeightedEligibility;
use sc_03_blocktree::{Blocktree, BlocktreeConfig, HeadInfo, InsertOutcome, SharedBlocktree};
use shared_types::{Balance, Hash, HashedBlock, PublicKey, Transaction};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

const DAVE: u8 = 4;
const ERIN: u8 = 5;

/// ```text
/// G ── a1 ── a2 ── a3
/// │     └── c1 (carol → erin)
/// └── b1 ── b2 (carol → dave)
/// ```
fn forked_blocks(chain: &Chain) -> Vec<HashedBlock> {
    // Only carol moves tokens, so the staker's share never changes and the
    // genesis ledger judges eligibility for every parent.
    let view = chain.tree();
    let ledger = view.ledger();
    let carol = carol();

    let a1 = chain.child(&chain.genesis, ledger, GENESIS_TIME + 10, vec![]);
    let a2 = chain.child(&a1, ledger, 0, vec![]);
    let a3 = chain.child(&a2, ledger, 0, vec![]);
    let c1 = chain.child(
        &a1,
        ledger,
        a1.block().timestamp + 50,
        vec![transfer(&carol, pk(ERIN), 30, 1)],
    );
    let b1 = chain.child(&chain.genesis, ledger, GENESIS_TIME + 20, vec![]);
    let b2 = chain.child(&b1, ledger, 0, vec![transfer(&carol, pk(DAVE), 40, 1)]);

    vec![a1, a2, a3, c1, b1, b2]
}

type Settled = (Blocktree, HeadInfo, BTreeMap<PublicKey, Balance>);

fn settle(chain: &Chain, blocks: &[HashedBlock]) -> Settled {
    let mut tree = chain.tree();
    for block in blocks {
        tree.insert(block.clone()).unwrap();
    }
    assert_eq!(tree.pending_len(), 0);
    assert_eq!(tree.len(), blocks.len() + 1);
    let head = tree.head();
    let balances = balances(&tree);
    (tree, head, balances)
}

#[test]
fn test_arrival_order_does_not_change_outcome() {
    let chain = Chain::new(Arc::new(SourceFundedBounty));
    let blocks = forked_blocks(&chain);
    let (_, head, expected) = settle(&chain, &blocks);

    let mut reversed = blocks.clone();
    reversed.reverse();
    let (_, reversed_head, reversed_balances) = settle(&chain, &reversed);
    assert_eq!(reversed_head, head);
    assert_eq!(reversed_balances, expected);

    for seed in 0..16 {
        let mut shuffled = blocks.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));
        let (_, shuffled_head, shuffled_balances) = settle(&chain, &shuffled);
        assert_eq!(shuffled_head, head, "seed {seed}");
        assert_eq!(shuffled_balances, expected, "seed {seed}");
    }
}

#[test]
fn test_ledger_equals_canonical_replay() {
    let chain = Chain::new(Arc::new(SourceFundedBounty));
    let blocks = forked_blocks(&chain);
    let by_hash: HashMap<Hash, HashedBlock> =
        blocks.iter().map(|b| (b.hash, b.clone())).collect();

    let mut reversed = blocks.clone();
    reversed.reverse();
    let (tree, head, settled) = settle(&chain, &reversed);

    let canonical = tree.get_ancestors(1).unwrap();
    assert_eq!(canonical.head, head.hash);
    assert_eq!(canonical.hashes.len() as u64, head.height);

    let mut replay = chain.tree();
    for hash in &canonical.hashes {
        let outcome = replay.insert(by_hash[hash].clone()).unwrap();
        assert!(matches!(outcome, InsertOutcome::Accepted { head_changed: true, .. }));
    }
    assert_eq!(replay.head(), head);
    assert_eq!(balances(&replay), settled);
}

fn threshold() -> u128 {
    StakeWeightedEligibility::threshold(STAKER_STAKE, (STAKER_STAKE + CAROL_TOKENS) as u128)
}

fn block_weight(block: &HashedBlock) -> u128 {
    let threshold = threshold();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&block.block().target_hash[..8]);
    threshold - u64::from_be_bytes(prefix) as u128
}

#[test]
fn test_heaviest_branch_wins() {
    let chain = Chain::new(Arc::new(SourceFundedBounty));
    let blocks = forked_blocks(&chain);
    let by_hash: HashMap<Hash, &HashedBlock> = blocks.iter().map(|b| (b.hash, b)).collect();
    let (_, head, _) = settle(&chain, &blocks);
    let base = chain.tree().head().cumulative_weight;

    let cumulative = |tip: &HashedBlock| {
        let mut total = 0u128;
        let mut cursor = Some(tip);
        while let Some(block) = cursor {
            total += block_weight(block);
            cursor = by_hash.get(&block.previous()).copied();
        }
        total
    };

    let best = blocks
        .iter()
        .filter(|b| !blocks.iter().any(|c| c.previous() == b.hash))
        .max_by(|x, y| {
            cumulative(x)
                .cmp(&cumulative(y))
                .then_with(|| y.hash.cmp(&x.hash))
        })
        .unwrap();

    assert_eq!(head.hash, best.hash);
    assert_eq!(head.cumulative_weight, base + cumulative(best));
}

#[test]
fn test_batch_insert_matches_sequential() {
    let chain = Chain::new(Arc::new(SourceFundedBounty));
    let blocks = forked_blocks(&chain);
    let (_, head, expected) = settle(&chain, &blocks);

    let shared = SharedBlocktree::new(chain.tree());
    let mut reversed = blocks.clone();
    reversed.reverse();
    let results = shared.insert_batch(reversed);

    assert_eq!(results.len(), blocks.len());
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(shared.head(), head);
    assert_eq!(balances(&shared.read()), expected);
}

/// Next eligible child of `parent` whose own weight satisfies `accept`.
fn weighted_child(
    chain: &Chain,
    parent: &HashedBlock,
    view: &dyn BalanceView,
    transactions: Vec<Transaction>,
    accept: impl Fn(u128) -> bool,
) -> HashedBlock {
    let mut min_ts = 0;
    loop {
        let block = chain.child(parent, view, min_ts, transactions.clone());
        if accept(block_weight(&block)) {
            return block;
        }
        min_ts = block.block().timestamp + 1;
    }
}

#[test]
fn test_heavy_fork_beats_chain_taller_than_prune_depth() {
    let chain = Chain::new(Arc::new(SourceFundedBounty));
    let view = chain.tree();
    let ledger = view.ledger();
    let carol = carol();
    let prune_depth = BlocktreeConfig::for_testing().prune_depth as usize;
    let threshold = threshold();

    let mut long = Vec::new();
    let mut tip = chain.genesis.clone();
    for i in 0..prune_depth + 2 {
        let transactions = if i == 0 {
            vec![transfer(&carol, pk(DAVE), 40, 1)]
        } else {
            vec![]
        };
        let next = weighted_child(&chain, &tip, ledger, transactions, |w| w < threshold / 64);
        long.push(next.clone());
        tip = next;
    }
    let short = weighted_child(
        &chain,
        &chain.genesis,
        ledger,
        vec![transfer(&carol, pk(ERIN), 30, 1)],
        |w| w > threshold / 2,
    );

    let mut long_first = long.clone();
    long_first.push(short.clone());
    let mut short_first = vec![short.clone()];
    short_first.extend(long.iter().cloned());

    let (_, head, expected) = settle(&chain, &long_first);
    let (_, other_head, other) = settle(&chain, &short_first);

    assert_eq!(head.hash, short.hash);
    assert_eq!(other_head, head);
    assert_eq!(other, expected);
    assert_eq!(expected.get(&pk(ERIN)), Some(&Balance::new(30, 0)));
    assert_eq!(expected.get(&carol.public_key_bytes()), Some(&Balance::new(CAROL_TOKENS - 30, 1)));
    assert!(!expected.contains_key(&pk(DAVE)));
}
