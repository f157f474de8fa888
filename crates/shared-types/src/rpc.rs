//! # RPC Envelope
//!
//! Request/response messages of the peer synchronization protocol. Numeric
//! enum values are part of the wire contract and must not be renumbered.
//!
//! `RpcRequest` mirrors the schema: a raw `method` value plus one optional
//! payload per method. Turning it into something exhaustive is the
//! protocol handler's job.

use crate::entities::{Hash, HashedBlock, PublicKey, Signature, Transaction};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// RPC methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Method {
    Invalid = 0,
    GetBlocks = 1,
    GetBlocktree = 2,
    PubBlock = 3,
    PubTransaction = 4,
}

impl Method {
    /// Decode a raw wire value.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Invalid),
            1 => Some(Self::GetBlocks),
            2 => Some(Self::GetBlocktree),
            3 => Some(Self::PubBlock),
            4 => Some(Self::PubTransaction),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "INVALID",
            Self::GetBlocks => "GET_BLOCKS",
            Self::GetBlocktree => "GET_BLOCKTREE",
            Self::PubBlock => "PUB_BLOCK",
            Self::PubTransaction => "PUB_TRANSACTION",
        }
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlocksRequest {
    pub hashes: Vec<Hash>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlocktreeRequest {
    pub start_height: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubBlockRequest {
    pub block: Option<HashedBlock>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubTransactionRequest {
    pub transaction: Option<Transaction>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Raw `Method` value; unknown values are answered `INVALID_METHOD`.
    pub method: i32,
    pub get_blocks: Option<GetBlocksRequest>,
    pub get_blocktree: Option<GetBlocktreeRequest>,
    pub pub_block: Option<PubBlockRequest>,
    pub pub_transaction: Option<PubTransactionRequest>,
}

impl RpcRequest {
    pub fn get_blocks(hashes: Vec<Hash>) -> Self {
        Self {
            method: Method::GetBlocks as i32,
            get_blocks: Some(GetBlocksRequest { hashes }),
            ..Default::default()
        }
    }

    pub fn get_blocktree(start_height: u64) -> Self {
        Self {
            method: Method::GetBlocktree as i32,
            get_blocktree: Some(GetBlocktreeRequest { start_height }),
            ..Default::default()
        }
    }

    pub fn pub_block(block: HashedBlock) -> Self {
        Self {
            method: Method::PubBlock as i32,
            pub_block: Some(PubBlockRequest { block: Some(block) }),
            ..Default::default()
        }
    }

    pub fn pub_transaction(transaction: Transaction) -> Self {
        Self {
            method: Method::PubTransaction as i32,
            pub_transaction: Some(PubTransactionRequest {
                transaction: Some(transaction),
            }),
            ..Default::default()
        }
    }
}

/// A request together with the sender's identity.
///
/// `signature` covers the canonical bytes of `request` and is only checked
/// when the deployment requires authenticated requests.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRpcRequest {
    pub public_key: PublicKey,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
    pub request: Option<RpcRequest>,
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Envelope-level outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum RpcStatus {
    Invalid = 0,
    Ok = 1,
    InvalidMessage = 2,
    InvalidMethod = 3,
    RequestLimitReached = 4,
    InternalError = 5,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum GetBlocksStatus {
    Invalid = 0,
    Ok = 1,
    UnknownBlock = 2,
    InvalidRequest = 3,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlocksResponse {
    pub status: GetBlocksStatus,
    pub blocks: Vec<HashedBlock>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum GetBlocktreeStatus {
    Invalid = 0,
    Ok = 1,
    InvalidRequest = 2,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlocktreeResponse {
    pub status: GetBlocktreeStatus,
    pub head: Hash,
    pub head_height: u64,
    /// Canonical hashes from `start_height` up to and including the head.
    pub ancestors: Vec<Hash>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum PubBlockStatus {
    Invalid = 0,
    Ok = 1,
    InvalidBlock = 2,
    InvalidRequest = 3,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubBlockResponse {
    pub status: PubBlockStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum PubTransactionStatus {
    Invalid = 0,
    Ok = 1,
    InvalidRequest = 2,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubTransactionResponse {
    pub status: PubTransactionStatus,
}

/// Response to any request. `original_request` echoes the decoded request
/// verbatim; it is `None` only when nothing could be decoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub status: RpcStatus,
    pub description: String,
    pub original_request: Option<RpcRequest>,
    pub get_blocks: Option<GetBlocksResponse>,
    pub get_blocktree: Option<GetBlocktreeResponse>,
    pub pub_block: Option<PubBlockResponse>,
    pub pub_transaction: Option<PubTransactionResponse>,
}

impl RpcResponse {
    pub fn new(status: RpcStatus, original_request: Option<RpcRequest>) -> Self {
        Self {
            status,
            description: String::new(),
            original_request,
            get_blocks: None,
            get_blocktree: None,
            pub_block: None,
            pub_transaction: None,
        }
    }

    /// Builder method to set the human-readable description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == RpcStatus::Ok
    }
}
