//! # Ledger Flows
//!
//! Blocks carrying transactions through validation, the blocktree and the
//! ledger:
//!
//! 1. **Bounties**: source-funded keeps supply fixed, minted grows it by
//!    exactly the bounty
//! 2. **Replay**: a transaction applies once per branch
//! 3. **Atomicity**: a failing transfer leaves every account untouched

use crate::fixtures::*;
use sc_01_ledger_state::{LedgerError, MintedBounty, SourceFundedBounty};
use sc_02_block_validator::ValidationError;
use sc_03_blocktree::{BlockStatus, InsertError, InsertOutcome};
use shared_crypto::TransactionBuilder;
use shared_types::Balance;
use std::sync::Arc;

const DAVE: u8 = 4;
const ERIN: u8 = 5;

#[test]
fn test_source_funded_bounty_conserves_supply() {
    let chain = Chain::new(Arc::new(SourceFundedBounty));
    let mut tree = chain.tree();
    let carol = carol();
    let alice_pk = chain.staker.public_key_bytes();
    let supply = tree.ledger().total_supply();

    let tx = TransactionBuilder::new()
        .add_transfer(&carol, pk(DAVE), 100, 1)
        .bounty(alice_pk, 7)
        .build()
        .unwrap();
    let b1 = chain.child(&chain.genesis, tree.ledger(), 0, vec![tx]);
    tree.insert(b1.clone()).unwrap();

    let tx = TransactionBuilder::new()
        .add_transfer(&carol, pk(ERIN), 50, 2)
        .bounty(alice_pk, 3)
        .build()
        .unwrap();
    let b2 = chain.child(&b1, tree.ledger(), 0, vec![tx]);
    tree.insert(b2.clone()).unwrap();

    assert_eq!(tree.head().hash, b2.hash);
    assert_eq!(tree.ledger().total_supply(), supply);
    assert_eq!(tree.balance(&carol.public_key_bytes()), Balance::new(340, 2));
    assert_eq!(tree.balance(&alice_pk).tokens, STAKER_STAKE + 10);
    assert_eq!(tree.balance(&pk(DAVE)).tokens, 100);
    assert_eq!(tree.balance(&pk(ERIN)).tokens, 50);
}

#[test]
fn test_minted_bounty_grows_supply_by_bounty() {
    let chain = Chain::new(Arc::new(MintedBounty));
    let mut tree = chain.tree();
    let carol = carol();
    let supply = tree.ledger().total_supply();

    let tx = TransactionBuilder::new()
        .add_transfer(&carol, pk(DAVE), 100, 1)
        .bounty(pk(ERIN), 7)
        .build()
        .unwrap();
    let b1 = chain.child(&chain.genesis, tree.ledger(), 0, vec![tx]);
    tree.insert(b1).unwrap();

    assert_eq!(tree.ledger().total_supply(), supply + 7);
    assert_eq!(tree.balance(&carol.public_key_bytes()).tokens, CAROL_TOKENS - 100);
    assert_eq!(tree.balance(&pk(ERIN)).tokens, 7);
}

#[test]
fn test_replay_rejected_on_same_branch_only() {
    let chain = Chain::new(Arc::new(SourceFundedBounty));
    let mut tree = chain.tree();
    let tx = transfer(&carol(), pk(DAVE), 50, 1);
    // Transfers between non-stakers leave the staker's share unchanged, so
    // the genesis ledger is a valid eligibility view for every block here.
    let view = chain.tree();

    let b1 = chain.child(&chain.genesis, view.ledger(), 0, vec![tx.clone()]);
    tree.insert(b1.clone()).unwrap();

    let replay = chain.child(&b1, view.ledger(), 0, vec![tx.clone()]);
    let result = tree.insert(replay.clone());
    assert!(
        matches!(
            result,
            Err(InsertError::Invalid(ValidationError::LedgerRejected(
                LedgerError::StaleOpIndex { expected: 2, actual: 1, .. }
            )))
        ),
        "got {result:?}"
    );
    assert_eq!(tree.status(&replay.hash), BlockStatus::Rejected);
    assert_eq!(tree.insert(replay), Err(InsertError::PreviouslyRejected));

    // The same transaction is still valid on a sibling branch.
    let sibling = chain.child(
        &chain.genesis,
        view.ledger(),
        b1.block().timestamp + 1,
        vec![tx],
    );
    assert!(matches!(
        tree.insert(sibling.clone()),
        Ok(InsertOutcome::Accepted { .. })
    ));
    assert_ne!(tree.status(&sibling.hash), BlockStatus::Rejected);
    assert_eq!(tree.balance(&pk(DAVE)).tokens, 50);
}

#[test]
fn test_overspending_block_rejected() {
    let chain = Chain::new(Arc::new(SourceFundedBounty));
    let mut tree = chain.tree();
    let before = balances(&tree);

    let tx = transfer(&carol(), pk(DAVE), CAROL_TOKENS + 1, 1);
    let block = chain.child(&chain.genesis, tree.ledger(), 0, vec![tx]);
    let result = tree.insert(block);

    assert!(matches!(
        result,
        Err(InsertError::Invalid(ValidationError::LedgerRejected(
            LedgerError::InsufficientBalance { required, available, .. }
        ))) if required == CAROL_TOKENS + 1 && available == CAROL_TOKENS
    ));
    assert_eq!(tree.head().hash, chain.genesis.hash);
    assert_eq!(balances(&tree), before);
}

#[test]
fn test_multi_source_transaction_is_all_or_nothing() {
    let chain = Chain::new(Arc::new(SourceFundedBounty));
    let mut tree = chain.tree();
    let carol = carol();
    let before = balances(&tree);

    // Carol's leg is fine; alice's overdraws.
    let tx = TransactionBuilder::new()
        .add_transfer(&carol, pk(DAVE), 10, 1)
        .add_transfer(&chain.staker, pk(DAVE), STAKER_STAKE + 1, 1)
        .build()
        .unwrap();
    let block = chain.child(&chain.genesis, tree.ledger(), 0, vec![tx]);

    assert!(tree.insert(block).is_err());
    assert_eq!(balances(&tree), before);
    assert!(tree.balance(&pk(DAVE)).is_empty());
}
