//! # Mempool Service
//!
//! Ledger-aware front of [`TransactionPool`]. Admission runs the same
//! transfer rules a block would, against the canonical ledger, without
//! committing anything.

use crate::config::MempoolConfig;
use crate::domain::{MempoolError, TransactionPool};
use sc_01_ledger_state::{apply_block, BalanceView, BountyPolicy};
use shared_types::{short_hex, CryptoProvider, Hash, Transaction};
use std::slice;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Mempool {
    pool: TransactionPool,
    crypto: Arc<dyn CryptoProvider>,
    bounty: Arc<dyn BountyPolicy>,
}

impl Mempool {
    pub fn new(
        config: MempoolConfig,
        crypto: Arc<dyn CryptoProvider>,
        bounty: Arc<dyn BountyPolicy>,
    ) -> Self {
        Self {
            pool: TransactionPool::new(config),
            crypto,
            bounty,
        }
    }

    /// Check `transaction` against `ledger` and pool it.
    ///
    /// Returns the transaction hash.
    pub fn submit(
        &mut self,
        transaction: Transaction,
        ledger: &dyn BalanceView,
        now: u64,
    ) -> Result<Hash, MempoolError> {
        let hash = transaction.hash(self.crypto.as_ref());
        if self.pool.contains(&hash) {
            return Err(MempoolError::DuplicateTransaction(hash));
        }

        if let Err(e) = self.check(&transaction, ledger) {
            debug!(hash = %short_hex(&hash), error = %e, "transaction refused");
            return Err(e.into());
        }
        self.pool.add(hash, transaction, now)?;

        debug!(hash = %short_hex(&hash), pooled = self.pool.len(), "transaction admitted");
        Ok(hash)
    }

    fn check(
        &self,
        transaction: &Transaction,
        ledger: &dyn BalanceView,
    ) -> Result<(), sc_01_ledger_state::LedgerError> {
        apply_block(
            ledger,
            slice::from_ref(transaction),
            self.crypto.as_ref(),
            self.bounty.as_ref(),
        )
        .map(|_| ())
    }

    /// Drop pooled transactions that a block included.
    pub fn remove_included(&mut self, transactions: &[Transaction]) -> usize {
        let removed = transactions
            .iter()
            .filter(|tx| self.pool.remove(&tx.hash(self.crypto.as_ref())).is_some())
            .count();
        if removed > 0 {
            debug!(removed, pooled = self.pool.len(), "included transactions removed");
        }
        removed
    }

    /// Re-check every pooled transaction against a new canonical ledger and
    /// drop those that no longer apply. Returns the dropped hashes.
    pub fn revalidate(&mut self, ledger: &dyn BalanceView) -> Vec<Hash> {
        let crypto = self.crypto.clone();
        let bounty = self.bounty.clone();
        let dropped = self.pool.retain(|entry| {
            apply_block(
                ledger,
                slice::from_ref(&entry.transaction),
                crypto.as_ref(),
                bounty.as_ref(),
            )
            .is_ok()
        });
        if !dropped.is_empty() {
            info!(
                dropped = dropped.len(),
                pooled = self.pool.len(),
                "stale transactions evicted after head change"
            );
        }
        dropped
    }

    /// Up to `limit` pooled transactions, oldest first.
    pub fn select(&self, limit: usize) -> Vec<Transaction> {
        self.pool.select(limit)
    }

    pub fn pool(&self) -> &TransactionPool {
        &self.pool
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
