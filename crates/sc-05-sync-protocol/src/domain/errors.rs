//! Sync protocol error types.

use shared_types::RpcStatus;
use std::time::Duration;
use thiserror::Error;

/// Envelope-level failures. Each maps to one `RpcStatus`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("Cannot decode envelope: {0}")]
    Decode(String),

    #[error("Cannot encode envelope: {0}")]
    Encode(String),

    #[error("Envelope carries no request")]
    MissingRequest,

    #[error("Request signature does not verify")]
    Unauthenticated,

    #[error("{method} request carries no payload")]
    MissingPayload { method: &'static str },

    #[error("Unknown method {0}")]
    UnknownMethod(i32),
}

impl EnvelopeError {
    pub fn status(&self) -> RpcStatus {
        match self {
            Self::UnknownMethod(_) => RpcStatus::InvalidMethod,
            Self::Encode(_) => RpcStatus::InternalError,
            _ => RpcStatus::InvalidMessage,
        }
    }
}

/// Request pool failures.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Worker dropped the request")]
    WorkerLost,

    #[error("Request pool is shut down")]
    Closed,

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}
