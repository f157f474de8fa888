//! Mempool error types.

use sc_01_ledger_state::LedgerError;
use shared_types::{short_hex, Hash, PublicKey};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MempoolError {
    #[error("Transaction {} is already pooled", short_hex(.0))]
    DuplicateTransaction(Hash),

    #[error("Pool is full ({capacity} transactions)")]
    PoolFull { capacity: usize },

    #[error("Account {} has {limit} pooled transactions", short_hex(.public_key))]
    AccountLimitReached { public_key: PublicKey, limit: usize },

    /// Another pooled transaction already spends this `op_index`.
    #[error("op_index {op_index} of {} is already pooled", short_hex(.public_key))]
    ConflictingOpIndex { public_key: PublicKey, op_index: u32 },

    /// Does not apply to the canonical ledger.
    #[error("Rejected by ledger: {0}")]
    Rejected(#[from] LedgerError),
}
