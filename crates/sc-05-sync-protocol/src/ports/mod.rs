//! Sync protocol ports.

use crate::domain::EnvelopeError;
use shared_types::{RpcResponse, SignedRpcRequest};

/// Byte encoding of request and response envelopes.
///
/// The core only sees decoded structures; signatures never cover these
/// bytes, so an adapter may use any encoding.
pub trait EnvelopeCodec: Send + Sync {
    fn decode_request(&self, bytes: &[u8]) -> Result<SignedRpcRequest, EnvelopeError>;

    fn encode_request(&self, request: &SignedRpcRequest) -> Result<Vec<u8>, EnvelopeError>;

    fn decode_response(&self, bytes: &[u8]) -> Result<RpcResponse, EnvelopeError>;

    fn encode_response(&self, response: &RpcResponse) -> Result<Vec<u8>, EnvelopeError>;
}
