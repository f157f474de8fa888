use sc_01_ledger_state::LedgerError;
use shared_types::{short_hex, Hash, PublicKey};
use thiserror::Error;

/// Why a block was refused. Variants are listed in check order.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(
        "Hash mismatch: claimed {}, computed {}",
        short_hex(.claimed),
        short_hex(.computed)
    )]
    HashMismatch { claimed: Hash, computed: Hash },

    #[error("Invalid staker signature")]
    BadSignature,

    #[error("Unknown parent block: {}", short_hex(.0))]
    UnknownParent(Hash),

    #[error("Invalid block height: expected {expected}, got {actual}")]
    HeightMismatch { expected: u64, actual: u64 },

    #[error("Invalid timestamp {timestamp}: parent is {parent}, latest accepted is {latest}")]
    BadTimestamp {
        timestamp: u64,
        parent: u64,
        latest: u64,
    },

    #[error("Staker {} is not eligible for this slot", short_hex(.staker))]
    IneligibleStaker { staker: PublicKey },

    #[error("Ledger rejected block: {0}")]
    LedgerRejected(#[from] LedgerError),
}
