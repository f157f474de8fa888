//! # Shared Types Crate
//!
//! This crate contains the ledger messages, the diff messages and the RPC
//! envelope exchanged with peers, together with the pieces every subsystem
//! needs to agree on byte-for-byte.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Decoded Structures Only**: Wire decoding is delegated to an external
//!   codec; the core only ever sees decoded values.
//! - **Narrow Crypto Port**: The core consumes `verify` and `hash` through
//!   [`CryptoProvider`] and never reimplements cryptography.
//! - **Canonical Bytes**: Signatures and hashes are always computed over the
//!   output of [`CanonicalEncode`], never over a codec's output.

pub mod crypto;
pub mod encoding;
pub mod entities;
pub mod rate_limiter;
pub mod rpc;

pub use crypto::CryptoProvider;
pub use encoding::CanonicalEncode;
pub use entities::*;
pub use rate_limiter::SlidingWindowLimiter;
pub use rpc::*;

/// Short hex rendering of a hash or key for log fields.
pub fn short_hex(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(8)])
}
