//! Exhaustive view of an [`RpcRequest`].
//!
//! The wire form carries a raw method number and one optional payload per
//! method. [`RpcCall`] pairs the method with its payload so handlers match
//! on a closed set.

use super::errors::EnvelopeError;
use shared_types::{Hash, HashedBlock, Method, RpcRequest, Transaction};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RpcCall {
    GetBlocks { hashes: Vec<Hash> },
    GetBlocktree { start_height: u64 },
    /// `block` may be absent; that is the method's own `INVALID_REQUEST`.
    PubBlock { block: Option<HashedBlock> },
    PubTransaction { transaction: Option<Transaction> },
}

impl RpcCall {
    pub fn method(&self) -> Method {
        match self {
            Self::GetBlocks { .. } => Method::GetBlocks,
            Self::GetBlocktree { .. } => Method::GetBlocktree,
            Self::PubBlock { .. } => Method::PubBlock,
            Self::PubTransaction { .. } => Method::PubTransaction,
        }
    }
}

fn payload<T: Clone>(method: Method, field: &Option<T>) -> Result<T, EnvelopeError> {
    field.clone().ok_or(EnvelopeError::MissingPayload {
        method: method.as_str(),
    })
}

impl TryFrom<&RpcRequest> for RpcCall {
    type Error = EnvelopeError;

    fn try_from(request: &RpcRequest) -> Result<Self, Self::Error> {
        let method = match Method::from_i32(request.method) {
            Some(Method::Invalid) | None => {
                return Err(EnvelopeError::UnknownMethod(request.method))
            }
            Some(m) => m,
        };

        Ok(match method {
            Method::GetBlocks => Self::GetBlocks {
                hashes: payload(method, &request.get_blocks)?.hashes,
            },
            Method::GetBlocktree => Self::GetBlocktree {
                start_height: payload(method, &request.get_blocktree)?.start_height,
            },
            Method::PubBlock => Self::PubBlock {
                block: payload(method, &request.pub_block)?.block,
            },
            Method::PubTransaction => Self::PubTransaction {
                transaction: payload(method, &request.pub_transaction)?.transaction,
            },
            Method::Invalid => return Err(EnvelopeError::UnknownMethod(request.method)),
        })
    }
}
