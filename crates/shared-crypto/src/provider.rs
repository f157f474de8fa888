//! # Crypto Provider Adapter
//!
//! Binds the core's `verify`/`hash` port to Ed25519 and BLAKE3.

use crate::hashing::blake3_hash;
use crate::signatures::{Ed25519PublicKey, Ed25519Signature};
use shared_types::{CryptoProvider, Hash, PublicKey, Signature};

/// Production [`CryptoProvider`].
///
/// Malformed public keys verify as `false`; they never error.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Blake3;

impl CryptoProvider for Ed25519Blake3 {
    fn verify(&self, public_key: &PublicKey, payload: &[u8], signature: &Signature) -> bool {
        match Ed25519PublicKey::from_bytes(*public_key) {
            Ok(pk) => pk
                .verify(payload, &Ed25519Signature::from_bytes(*signature))
                .is_ok(),
            Err(_) => false,
        }
    }

    fn hash(&self, bytes: &[u8]) -> Hash {
        blake3_hash(bytes)
    }
}
