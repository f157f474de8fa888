use shared_types::{short_hex, PublicKey};
use thiserror::Error;

/// Reasons a block's transactions cannot be applied.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error(
        "Insufficient balance for {}: required {required}, available {available}",
        short_hex(.public_key)
    )]
    InsufficientBalance {
        public_key: PublicKey,
        required: u64,
        available: u64,
    },

    #[error(
        "Stale op_index for {}: expected {expected}, got {actual}",
        short_hex(.public_key)
    )]
    StaleOpIndex {
        public_key: PublicKey,
        expected: u32,
        actual: u32,
    },

    #[error("Missing or invalid signature from {}", short_hex(.public_key))]
    SignatureInvalid { public_key: PublicKey },

    #[error("Malformed commitment: {0}")]
    MalformedCommitment(String),

    #[error("Unknown commitment type: {0}")]
    UnknownCommitmentType(i32),

    /// A stored patch does not match the balance it is applied to. Only
    /// reachable through a caller bug; never caused by peer input.
    #[error("Patch does not match ledger for {}", short_hex(.public_key))]
    SnapshotMismatch { public_key: PublicKey },
}
