//! # Shared Crypto - Ledger Cryptography
//!
//! Concrete implementation of the [`CryptoProvider`] port and the wallet-side
//! helpers that produce signed ledger objects.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | BLAKE3 | Block, transaction and seed hashing |
//! | `signatures` | Ed25519 | Staker, transfer and request signatures |
//! | `provider` | Ed25519 + BLAKE3 | The `verify`/`hash` port used by the core |
//! | `builders` | - | Signed transactions, blocks, genesis and requests |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **BLAKE3**: 256-bit output, collision resistant
//!
//! [`CryptoProvider`]: shared_types::CryptoProvider

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builders;
pub mod errors;
pub mod hashing;
pub mod provider;
pub mod signatures;

// Re-exports
pub use builders::{sign_request, BlockBuilder, GenesisBuilder, TransactionBuilder};
pub use errors::CryptoError;
pub use hashing::{blake3_hash, blake3_hash_many, Blake3Hasher};
pub use provider::Ed25519Blake3;
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
