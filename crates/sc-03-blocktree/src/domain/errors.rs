use sc_01_ledger_state::LedgerError;
use sc_02_block_validator::ValidationError;
use shared_types::{short_hex, Hash};
use thiserror::Error;

/// Why a block was not added to the tree.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("Invalid block: {0}")]
    Invalid(#[from] ValidationError),

    #[error("Block was already rejected")]
    PreviouslyRejected,

    #[error("Block was pruned or cannot catch up with the head")]
    Pruned,

    #[error("Parent {} was rejected", short_hex(.parent))]
    RejectedAncestor { parent: Hash },

    /// Stored patches disagree with the ledger. Never caused by peer input.
    #[error("Internal blocktree fault: {0}")]
    Internal(String),
}

impl From<LedgerError> for InsertError {
    fn from(e: LedgerError) -> Self {
        Self::Internal(e.to_string())
    }
}

/// Query errors.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BlocktreeError {
    #[error("Start height {start} is above head height {head}")]
    StartAboveHead { start: u64, head: u64 },
}
