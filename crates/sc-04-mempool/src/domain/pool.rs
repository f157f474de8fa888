//! # Transaction Pool
//!
//! Index structure only: no signature or balance checks happen here. The
//! [`Mempool`](crate::Mempool) service checks against the ledger first.

use super::errors::MempoolError;
use crate::config::MempoolConfig;
use shared_types::{Hash, PublicKey, Transaction};
use std::collections::{BTreeMap, HashMap};

/// A transaction with its pool bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PooledTransaction {
    pub hash: Hash,
    pub transaction: Transaction,
    /// Seconds since the Unix epoch at admission.
    pub added_at: u64,
    /// Admission sequence number.
    seq: u64,
}

impl PooledTransaction {
    /// `(source, op_index)` pairs this transaction spends.
    fn claims(&self) -> impl Iterator<Item = (PublicKey, u32)> + '_ {
        claims(&self.transaction)
    }
}

fn claims(tx: &Transaction) -> impl Iterator<Item = (PublicKey, u32)> + '_ {
    tx.commit.transfers.iter().map(|t| (t.source_pk, t.op_index))
}

#[derive(Debug)]
pub struct TransactionPool {
    config: MempoolConfig,
    by_hash: HashMap<Hash, PooledTransaction>,
    by_source: HashMap<PublicKey, BTreeMap<u32, Hash>>,
    by_arrival: BTreeMap<u64, Hash>,
    next_seq: u64,
}

impl TransactionPool {
    pub fn new(config: MempoolConfig) -> Self {
        Self {
            config,
            by_hash: HashMap::new(),
            by_source: HashMap::new(),
            by_arrival: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub fn config(&self) -> &MempoolConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.by_hash.contains_key(hash)
    }

    pub fn get(&self, hash: &Hash) -> Option<&PooledTransaction> {
        self.by_hash.get(hash)
    }

    /// Pooled transactions spending from `source`, by `op_index`.
    pub fn by_source(&self, source: &PublicKey) -> Vec<&PooledTransaction> {
        self.by_source
            .get(source)
            .map(|m| m.values().filter_map(|h| self.by_hash.get(h)).collect())
            .unwrap_or_default()
    }

    /// Adds a transaction to the pool.
    ///
    /// # Errors
    /// - `DuplicateTransaction` if the hash is already pooled
    /// - `ConflictingOpIndex` if a pooled transaction spends the same
    ///   `(source, op_index)`
    /// - `AccountLimitReached` if a source already has `max_per_account`
    ///   pooled transactions
    /// - `PoolFull` at capacity
    pub fn add(&mut self, hash: Hash, transaction: Transaction, now: u64) -> Result<(), MempoolError> {
        if self.by_hash.contains_key(&hash) {
            return Err(MempoolError::DuplicateTransaction(hash));
        }

        for (source, op_index) in claims(&transaction) {
            let pooled = self.by_source.get(&source);
            if pooled.is_some_and(|m| m.contains_key(&op_index)) {
                return Err(MempoolError::ConflictingOpIndex {
                    public_key: source,
                    op_index,
                });
            }
            if pooled.map_or(0, BTreeMap::len) >= self.config.max_per_account {
                return Err(MempoolError::AccountLimitReached {
                    public_key: source,
                    limit: self.config.max_per_account,
                });
            }
        }

        if self.by_hash.len() >= self.config.max_transactions {
            return Err(MempoolError::PoolFull {
                capacity: self.config.max_transactions,
            });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let entry = PooledTransaction {
            hash,
            transaction,
            added_at: now,
            seq,
        };
        for (source, op_index) in entry.claims() {
            self.by_source.entry(source).or_default().insert(op_index, hash);
        }
        self.by_arrival.insert(seq, hash);
        self.by_hash.insert(hash, entry);
        Ok(())
    }

    pub fn remove(&mut self, hash: &Hash) -> Option<PooledTransaction> {
        let entry = self.by_hash.remove(hash)?;
        for (source, op_index) in entry.claims() {
            if let Some(m) = self.by_source.get_mut(&source) {
                m.remove(&op_index);
                if m.is_empty() {
                    self.by_source.remove(&source);
                }
            }
        }
        self.by_arrival.remove(&entry.seq);
        Some(entry)
    }

    /// Remove every transaction for which `keep` returns false, in
    /// admission order. Returns the removed hashes.
    pub fn retain(&mut self, mut keep: impl FnMut(&PooledTransaction) -> bool) -> Vec<Hash> {
        let doomed: Vec<Hash> = self
            .by_arrival
            .values()
            .filter(|h| self.by_hash.get(*h).is_some_and(|e| !keep(e)))
            .copied()
            .collect();
        for hash in &doomed {
            self.remove(hash);
        }
        doomed
    }

    /// Up to `limit` transactions, oldest admission first.
    pub fn select(&self, limit: usize) -> Vec<Transaction> {
        self.by_arrival
            .values()
            .filter_map(|h| self.by_hash.get(h))
            .take(limit)
            .map(|e| e.transaction.clone())
            .collect()
    }
}
