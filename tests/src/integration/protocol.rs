//! # Protocol Flows
//!
//! Envelopes through a fully wired node: codec, request pool, handler,
//! blocktree and mempool.

use crate::fixtures::*;
use node_runtime::{GenesisAllocation, NodeConfig, SubsystemContainer};
use sc_02_block_validator::FixedTimeSource;
use sc_03_blocktree::BlockStatus;
use sc_05_sync_protocol::{BincodeCodec, EnvelopeCodec, SyncConfig};
use shared_crypto::sign_request;
use shared_types::{
    GetBlocksStatus, HashedBlock, PubBlockStatus, PubTransactionStatus, RpcRequest, RpcResponse,
    RpcStatus, Transaction,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

const BOB: u8 = 2;
const DAVE: u8 = 4;

fn node(sync: SyncConfig) -> SubsystemContainer {
    let mut config = NodeConfig::default();
    config.sync = sync;
    config.genesis.timestamp = GENESIS_TIME;
    config.genesis.key_seed = Some(hex::encode([0xEE; 32]));
    config.genesis.allocations = vec![
        GenesisAllocation {
            public_key: hex::encode(alice().public_key_bytes()),
            tokens: STAKER_STAKE,
        },
        GenesisAllocation {
            public_key: hex::encode(carol().public_key_bytes()),
            tokens: CAROL_TOKENS,
        },
    ];
    SubsystemContainer::with_time(config, Arc::new(FixedTimeSource::new(NOW))).unwrap()
}

fn genesis(node: &SubsystemContainer) -> HashedBlock {
    let tree = node.blocktree.read();
    tree.block(&tree.genesis_hash()).unwrap().as_ref().clone()
}

/// Eligible child of the current head staked by alice.
fn next_block(node: &SubsystemContainer, transactions: Vec<Transaction>) -> HashedBlock {
    let tree = node.blocktree.read();
    let head = tree.block(&tree.head().hash).unwrap();
    eligible_child(
        node.blocktree.validator(),
        &head,
        tree.ledger(),
        &alice(),
        0,
        transactions,
    )
}

async fn send(node: &SubsystemContainer, request: RpcRequest) -> RpcResponse {
    node.requests
        .submit(sign_request(&key(BOB), request))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_partial_get_blocks_over_the_wire() {
    let node = node(SyncConfig::for_testing());
    let codec = BincodeCodec::new(1 << 20);
    let genesis = genesis(&node);

    let request = RpcRequest::get_blocks(vec![genesis.hash, [0xAB; 32]]);
    let bytes = codec
        .encode_request(&sign_request(&key(BOB), request.clone()))
        .unwrap();
    let reply = node.requests.submit_bytes(bytes).await.unwrap();
    let response = codec.decode_response(&reply).unwrap();

    assert_eq!(response.status, RpcStatus::Ok);
    assert_eq!(response.original_request, Some(request));
    let body = response.get_blocks.unwrap();
    assert_eq!(body.status, GetBlocksStatus::UnknownBlock);
    assert_eq!(body.blocks, vec![genesis]);
}

#[tokio::test]
async fn test_garbage_bytes_answered_invalid_message() {
    let node = node(SyncConfig::for_testing());
    let codec = BincodeCodec::new(1 << 20);

    let reply = node.requests.submit_bytes(vec![0xFF; 7]).await.unwrap();
    let response = codec.decode_response(&reply).unwrap();
    assert_eq!(response.status, RpcStatus::InvalidMessage);
    assert!(response.original_request.is_none());
}

#[tokio::test]
async fn test_rate_limit_three_per_window() {
    let node = node(SyncConfig {
        rate_limit_requests: 3,
        rate_limit_window_ms: 60_000,
        ..SyncConfig::for_testing()
    });

    for _ in 0..3 {
        let response = send(&node, RpcRequest::get_blocktree(0)).await;
        assert_eq!(response.status, RpcStatus::Ok);
    }
    let limited = send(&node, RpcRequest::get_blocktree(0)).await;
    assert_eq!(limited.status, RpcStatus::RequestLimitReached);
    assert_eq!(limited.original_request, Some(RpcRequest::get_blocktree(0)));
    assert!(limited.get_blocktree.is_none());

    // Other identities keep their own budget.
    let other = node
        .requests
        .submit(sign_request(&carol(), RpcRequest::get_blocktree(0)))
        .await
        .unwrap();
    assert_eq!(other.status, RpcStatus::Ok);
}

#[test]
fn test_rate_limit_budget_returns_after_window() {
    let window = Duration::from_millis(500);
    let node = node(SyncConfig {
        rate_limit_requests: 3,
        rate_limit_window_ms: window.as_millis() as u64,
        ..SyncConfig::for_testing()
    });
    let request = || sign_request(&key(BOB), RpcRequest::get_blocktree(0));
    let start = Instant::now();

    for i in 0..3 {
        let at = start + Duration::from_millis(i * 10);
        assert_eq!(node.handler.dispatch_at(request(), at).status, RpcStatus::Ok);
    }
    let blocked = node.handler.dispatch_at(request(), start + Duration::from_millis(100));
    assert_eq!(blocked.status, RpcStatus::RequestLimitReached);

    let later = node.handler.dispatch_at(request(), start + window);
    assert_eq!(later.status, RpcStatus::Ok);
}

#[tokio::test]
async fn test_tampered_block_signature_rejected() {
    let node = node(SyncConfig::for_testing());
    let valid = next_block(&node, vec![]);
    let crypto = node.crypto.clone();

    // Signature flipped, cached hash left stale.
    let mut stale = valid.clone();
    stale.signed_block.signature[0] ^= 0x01;
    let response = send(&node, RpcRequest::pub_block(stale)).await;
    assert_eq!(response.pub_block.unwrap().status, PubBlockStatus::InvalidBlock);

    // Signature flipped and hash recomputed over the forged content.
    let mut forged = valid.clone();
    forged.signed_block.signature[0] ^= 0x01;
    forged.compute_hash(crypto.as_ref());
    let response = send(&node, RpcRequest::pub_block(forged.clone())).await;
    assert_eq!(response.status, RpcStatus::Ok);
    assert_eq!(response.pub_block.unwrap().status, PubBlockStatus::InvalidBlock);
    assert_eq!(node.blocktree.status(&forged.hash), BlockStatus::Rejected);
    assert!(!node.blocktree.read().contains(&forged.hash));

    let response = send(&node, RpcRequest::pub_block(valid.clone())).await;
    assert_eq!(response.pub_block.unwrap().status, PubBlockStatus::Ok);
    assert_eq!(node.blocktree.head().hash, valid.hash);
}

#[tokio::test]
async fn test_insufficient_balance_transaction_refused() {
    let node = node(SyncConfig::for_testing());
    let carol = carol();

    let overdraw = transfer(&carol, pk(DAVE), CAROL_TOKENS + 1, 1);
    let response = send(&node, RpcRequest::pub_transaction(overdraw)).await;
    assert_eq!(response.status, RpcStatus::Ok);
    assert_eq!(
        response.pub_transaction.unwrap().status,
        PubTransactionStatus::InvalidRequest
    );
    assert!(response.description.contains("Insufficient balance"));
    assert!(node.mempool.lock().is_empty());
}

#[tokio::test]
async fn test_pooled_transaction_leaves_pool_once_included() {
    let node = node(SyncConfig::for_testing());
    let tx = transfer(&carol(), pk(DAVE), 25, 1);

    let response = send(&node, RpcRequest::pub_transaction(tx.clone())).await;
    assert_eq!(
        response.pub_transaction.unwrap().status,
        PubTransactionStatus::Ok
    );
    let again = send(&node, RpcRequest::pub_transaction(tx.clone())).await;
    assert_eq!(again.pub_transaction.unwrap().status, PubTransactionStatus::Ok);
    assert_eq!(node.mempool.lock().len(), 1);

    let block = next_block(&node, vec![tx]);
    let response = send(&node, RpcRequest::pub_block(block)).await;
    assert_eq!(response.pub_block.unwrap().status, PubBlockStatus::Ok);
    assert!(node.mempool.lock().is_empty());
    assert_eq!(node.blocktree.balance(&pk(DAVE)).tokens, 25);
}

#[tokio::test]
async fn test_unsigned_request_refused_when_authentication_required() {
    let node = node(SyncConfig {
        require_authenticated_requests: true,
        ..SyncConfig::for_testing()
    });

    let mut forged = sign_request(&key(BOB), RpcRequest::get_blocktree(0));
    forged.request = Some(RpcRequest::get_blocktree(1));
    let response = node.requests.submit(forged).await.unwrap();
    assert_eq!(response.status, RpcStatus::InvalidMessage);
    assert!(response.get_blocktree.is_none());

    let honest = send(&node, RpcRequest::get_blocktree(0)).await;
    assert_eq!(honest.status, RpcStatus::Ok);
    assert_eq!(honest.get_blocktree.unwrap().ancestors.len(), 1);
}
