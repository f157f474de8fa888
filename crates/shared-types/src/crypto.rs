//! # Crypto Port
//!
//! The only cryptographic capability the ledger core consumes. Signing is a
//! wallet concern and is deliberately absent from this trait.

use crate::entities::{Hash, PublicKey, Signature};

/// Verification and hashing over opaque byte payloads.
///
/// Implementations must be deterministic: the same inputs always produce the
/// same verdict and the same digest on every node.
pub trait CryptoProvider: Send + Sync {
    /// Returns `true` iff `signature` is a valid signature of `payload` by
    /// `public_key`. Malformed keys or signatures verify as `false`.
    fn verify(&self, public_key: &PublicKey, payload: &[u8], signature: &Signature) -> bool;

    /// Hashes `bytes` into a fixed-length digest.
    fn hash(&self, bytes: &[u8]) -> Hash;
}
