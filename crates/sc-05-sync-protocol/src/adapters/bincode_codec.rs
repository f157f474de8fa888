//! `bincode` envelope codec.

use crate::domain::EnvelopeError;
use crate::ports::EnvelopeCodec;
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{RpcResponse, SignedRpcRequest};

/// Bincode with a size limit, so a hostile length prefix cannot make the
/// decoder allocate unbounded memory.
#[derive(Clone, Debug)]
pub struct BincodeCodec {
    max_bytes: u64,
}

impl BincodeCodec {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    fn options(&self) -> impl Options {
        bincode::DefaultOptions::new()
            .with_limit(self.max_bytes)
            .with_fixint_encoding()
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, EnvelopeError> {
        self.options()
            .deserialize(bytes)
            .map_err(|e| EnvelopeError::Decode(e.to_string()))
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, EnvelopeError> {
        self.options()
            .serialize(value)
            .map_err(|e| EnvelopeError::Encode(e.to_string()))
    }
}

impl EnvelopeCodec for BincodeCodec {
    fn decode_request(&self, bytes: &[u8]) -> Result<SignedRpcRequest, EnvelopeError> {
        self.decode(bytes)
    }

    fn encode_request(&self, request: &SignedRpcRequest) -> Result<Vec<u8>, EnvelopeError> {
        self.encode(request)
    }

    fn decode_response(&self, bytes: &[u8]) -> Result<RpcResponse, EnvelopeError> {
        self.decode(bytes)
    }

    fn encode_response(&self, response: &RpcResponse) -> Result<Vec<u8>, EnvelopeError> {
        self.encode(response)
    }
}
