//! # Block Validator Service
//!
//! Wires the crypto port, the eligibility and bounty policies and the clock
//! into the seven-step check.

use crate::config::ValidatorConfig;
use crate::domain::ValidationError;
use crate::ports::{EligibilityPolicy, TimeSource};
use rayon::prelude::*;
use sc_01_ledger_state::{apply_block, apply_genesis, BalanceView, BountyPolicy, LedgerState};
use shared_types::{short_hex, BalancePatch, CryptoProvider, Hash, HashedBlock, ZERO_HASH};
use std::sync::Arc;
use tracing::debug;

/// What the validator needs to know about the parent of a candidate block.
pub struct ParentContext<'a> {
    pub hash: Hash,
    pub height: u64,
    pub timestamp: u64,
    /// Balances after the parent was applied.
    pub snapshot: &'a dyn BalanceView,
}

/// A block that passed every check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedBlock {
    /// Recomputed hash, equal to the claimed one.
    pub hash: Hash,
    /// Diff produced against the parent snapshot.
    pub patches: Vec<BalancePatch>,
    /// Eligibility margin; zero for genesis.
    pub weight: u128,
}

pub struct BlockValidator {
    crypto: Arc<dyn CryptoProvider>,
    eligibility: Arc<dyn EligibilityPolicy>,
    bounty: Arc<dyn BountyPolicy>,
    time: Arc<dyn TimeSource>,
    config: ValidatorConfig,
}

impl BlockValidator {
    pub fn new(
        crypto: Arc<dyn CryptoProvider>,
        eligibility: Arc<dyn EligibilityPolicy>,
        bounty: Arc<dyn BountyPolicy>,
        time: Arc<dyn TimeSource>,
        config: ValidatorConfig,
    ) -> Self {
        Self {
            crypto,
            eligibility,
            bounty,
            time,
            config,
        }
    }

    pub fn crypto(&self) -> &Arc<dyn CryptoProvider> {
        &self.crypto
    }

    pub fn eligibility(&self) -> &Arc<dyn EligibilityPolicy> {
        &self.eligibility
    }

    pub fn bounty(&self) -> &Arc<dyn BountyPolicy> {
        &self.bounty
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Steps 1-2. Needs no chain state.
    ///
    /// Returns the recomputed hash so callers never key anything by an
    /// unchecked claimed hash.
    pub fn precheck(&self, block: &HashedBlock) -> Result<Hash, ValidationError> {
        let computed = block.recompute_hash(self.crypto.as_ref());
        if computed != block.hash {
            return Err(ValidationError::HashMismatch {
                claimed: block.hash,
                computed,
            });
        }

        let signed = &block.signed_block;
        let payload = signed.block.signing_payload();
        if !self
            .crypto
            .verify(&signed.block.staker_pk, &payload, &signed.signature)
        {
            return Err(ValidationError::BadSignature);
        }

        Ok(computed)
    }

    /// Run [`precheck`](Self::precheck) over a batch in parallel.
    pub fn precheck_batch(&self, blocks: &[HashedBlock]) -> Vec<Result<Hash, ValidationError>> {
        blocks.par_iter().map(|b| self.precheck(b)).collect()
    }

    /// Full validation, steps 1-7.
    pub fn validate(
        &self,
        block: &HashedBlock,
        parent: &ParentContext<'_>,
    ) -> Result<ValidatedBlock, ValidationError> {
        self.precheck(block)?;
        self.validate_prechecked(block, parent)
    }

    /// Steps 3-7 for a block that already passed [`precheck`](Self::precheck).
    pub fn validate_prechecked(
        &self,
        block: &HashedBlock,
        parent: &ParentContext<'_>,
    ) -> Result<ValidatedBlock, ValidationError> {
        let result = self.check_against_parent(block, parent);
        if let Err(e) = &result {
            debug!(
                hash = %short_hex(&block.hash),
                parent = %short_hex(&parent.hash),
                error = %e,
                "block failed validation"
            );
        }
        result
    }

    fn check_against_parent(
        &self,
        block: &HashedBlock,
        parent: &ParentContext<'_>,
    ) -> Result<ValidatedBlock, ValidationError> {
        let inner = block.block();

        if inner.previous != parent.hash || inner.previous == ZERO_HASH {
            return Err(ValidationError::UnknownParent(inner.previous));
        }

        let expected = parent.height + 1;
        if inner.height != expected {
            return Err(ValidationError::HeightMismatch {
                expected,
                actual: inner.height,
            });
        }

        let latest = self.time.now().saturating_add(self.config.allowed_skew_secs);
        if inner.timestamp <= parent.timestamp || inner.timestamp > latest {
            return Err(ValidationError::BadTimestamp {
                timestamp: inner.timestamp,
                parent: parent.timestamp,
                latest,
            });
        }

        let weight = self
            .eligibility
            .evaluate(inner, parent.snapshot, self.crypto.as_ref())
            .ok_or(ValidationError::IneligibleStaker {
                staker: inner.staker_pk,
            })?;

        let patches = apply_block(
            parent.snapshot,
            &inner.transactions,
            self.crypto.as_ref(),
            self.bounty.as_ref(),
        )?;

        Ok(ValidatedBlock {
            hash: block.hash,
            patches,
            weight,
        })
    }

    /// Validate the block a chain starts from.
    ///
    /// Genesis names the zero hash as parent, sits at height 0 and mints its
    /// transfers into an empty ledger. It needs no eligibility.
    pub fn validate_genesis(&self, block: &HashedBlock) -> Result<ValidatedBlock, ValidationError> {
        let hash = self.precheck(block)?;
        let inner = block.block();

        if !inner.is_genesis() {
            return Err(ValidationError::UnknownParent(inner.previous));
        }
        if inner.height != 0 {
            return Err(ValidationError::HeightMismatch {
                expected: 0,
                actual: inner.height,
            });
        }

        let patches = apply_genesis(&LedgerState::new(), &inner.transactions, self.crypto.as_ref())?;
        Ok(ValidatedBlock {
            hash,
            patches,
            weight: 0,
        })
    }
}
