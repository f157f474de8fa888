//! # Canonical Encoding
//!
//! Deterministic byte layout used for every signature and every hash.
//!
//! ## Layout
//!
//! - Integers: fixed width, big-endian
//! - Fixed-size byte arrays: raw
//! - Sequences: `u32` length prefix, then each element
//! - `Option<T>`: one presence byte (`0`/`1`), then the value if present
//!
//! The wire codec may reorder or compress fields freely; these bytes never
//! change for the same logical value.

use crate::entities::{
    Block, Commitment, DetachedSignature, HashedBlock, SignedBlock, Transaction, Transfer,
};
use crate::rpc::{
    GetBlocksRequest, GetBlocktreeRequest, PubBlockRequest, PubTransactionRequest, RpcRequest,
};

/// Types with a single, deterministic byte representation.
pub trait CanonicalEncode {
    /// Append the canonical bytes of `self` to `out`.
    fn encode_to(&self, out: &mut Vec<u8>);

    /// Canonical bytes of `self`.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128);
        self.encode_to(&mut out);
        out
    }
}

fn put_len(out: &mut Vec<u8>, len: usize) {
    out.extend_from_slice(&(len as u32).to_be_bytes());
}

fn put_seq<T: CanonicalEncode>(out: &mut Vec<u8>, items: &[T]) {
    put_len(out, items.len());
    for item in items {
        item.encode_to(out);
    }
}

fn put_option<T: CanonicalEncode>(out: &mut Vec<u8>, value: &Option<T>) {
    match value {
        Some(v) => {
            out.push(1);
            v.encode_to(out);
        }
        None => out.push(0),
    }
}

impl CanonicalEncode for [u8; 32] {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self);
    }
}

impl CanonicalEncode for Transfer {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.op_index.to_be_bytes());
        out.extend_from_slice(&self.tokens.to_be_bytes());
        out.extend_from_slice(&self.source_pk);
        out.extend_from_slice(&self.destination_pk);
    }
}

impl CanonicalEncode for Commitment {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.tx_type.to_be_bytes());
        put_option(out, &self.bounty_pk);
        out.extend_from_slice(&self.bounty.to_be_bytes());
        put_seq(out, &self.transfers);
    }
}

impl CanonicalEncode for DetachedSignature {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.public_key);
        out.extend_from_slice(&self.signature);
    }
}

impl CanonicalEncode for Transaction {
    fn encode_to(&self, out: &mut Vec<u8>) {
        put_seq(out, &self.signatures);
        self.commit.encode_to(out);
    }
}

impl CanonicalEncode for Block {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.staker_pk);
        out.extend_from_slice(&self.previous);
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&self.target_hash);
        put_seq(out, &self.transactions);
    }
}

impl CanonicalEncode for SignedBlock {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.signature);
        self.block.encode_to(out);
    }
}

impl CanonicalEncode for HashedBlock {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.hash);
        self.signed_block.encode_to(out);
    }
}

impl CanonicalEncode for GetBlocksRequest {
    fn encode_to(&self, out: &mut Vec<u8>) {
        put_seq(out, &self.hashes);
    }
}

impl CanonicalEncode for GetBlocktreeRequest {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.start_height.to_be_bytes());
    }
}

impl CanonicalEncode for PubBlockRequest {
    fn encode_to(&self, out: &mut Vec<u8>) {
        put_option(out, &self.block);
    }
}

impl CanonicalEncode for PubTransactionRequest {
    fn encode_to(&self, out: &mut Vec<u8>) {
        put_option(out, &self.transaction);
    }
}

impl CanonicalEncode for RpcRequest {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.method.to_be_bytes());
        put_option(out, &self.get_blocks);
        put_option(out, &self.get_blocktree);
        put_option(out, &self.pub_block);
        put_option(out, &self.pub_transaction);
    }
}
