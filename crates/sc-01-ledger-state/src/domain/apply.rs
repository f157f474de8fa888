//! # Block Application
//!
//! Pure state transition: reads a snapshot, returns the patch set. Nothing
//! is written until the caller commits the patches, so a failing
//! transaction leaves no trace.

use super::errors::LedgerError;
use super::overlay::Overlay;
use crate::ports::{BalanceView, BountyPolicy};
use shared_types::{
    BalancePatch, Commitment, CommitmentType, CryptoProvider, PublicKey, Transaction, Transfer,
};
use std::collections::HashSet;
use tracing::debug;

/// Apply a block's transactions on top of `view`.
///
/// Transactions apply in order, each seeing the effects of the previous
/// ones. The first failure aborts the whole block.
pub fn apply_block(
    view: &dyn BalanceView,
    transactions: &[Transaction],
    crypto: &dyn CryptoProvider,
    bounty: &dyn BountyPolicy,
) -> Result<Vec<BalancePatch>, LedgerError> {
    let mut overlay = Overlay::new(view);
    for (index, tx) in transactions.iter().enumerate() {
        if let Err(e) = apply_transaction(&mut overlay, tx, crypto, bounty) {
            debug!(tx_index = index, error = %e, "transaction rejected");
            return Err(e);
        }
    }
    Ok(overlay.into_patches())
}

/// Apply a single transaction to an overlay.
pub fn apply_transaction(
    overlay: &mut Overlay<'_>,
    tx: &Transaction,
    crypto: &dyn CryptoProvider,
    bounty: &dyn BountyPolicy,
) -> Result<(), LedgerError> {
    check_commitment(&tx.commit)?;

    let payload = tx.commit.signing_payload();
    let mut signed = SignedSources::new(tx, &payload, crypto);

    for transfer in &tx.commit.transfers {
        signed.require(&transfer.source_pk)?;
        apply_transfer(overlay, transfer)?;
    }

    if tx.commit.bounty > 0 {
        bounty.apply(&tx.commit, overlay)?;
    }
    Ok(())
}

/// Apply the transactions of a genesis block.
///
/// Genesis transfers mint their tokens: destinations are credited, sources
/// are neither debited nor have their `op_index` checked. Every source
/// signature must still verify, and no commitment may carry a bounty.
pub fn apply_genesis(
    view: &dyn BalanceView,
    transactions: &[Transaction],
    crypto: &dyn CryptoProvider,
) -> Result<Vec<BalancePatch>, LedgerError> {
    let mut overlay = Overlay::new(view);
    for tx in transactions {
        check_commitment(&tx.commit)?;
        if tx.commit.bounty != 0 || tx.commit.bounty_pk.is_some() {
            return Err(LedgerError::MalformedCommitment(
                "genesis commitments carry no bounty".into(),
            ));
        }

        let payload = tx.commit.signing_payload();
        let mut signed = SignedSources::new(tx, &payload, crypto);
        for transfer in &tx.commit.transfers {
            signed.require(&transfer.source_pk)?;
            overlay.credit(&transfer.destination_pk, transfer.tokens)?;
        }
    }
    Ok(overlay.into_patches())
}

fn check_commitment(commit: &Commitment) -> Result<(), LedgerError> {
    if commit.commitment_type() != Some(CommitmentType::Transfer) {
        return Err(LedgerError::UnknownCommitmentType(commit.tx_type));
    }
    if commit.transfers.is_empty() {
        return Err(LedgerError::MalformedCommitment("no transfers".into()));
    }
    if commit.transfers.iter().any(|t| t.tokens == 0) {
        return Err(LedgerError::MalformedCommitment(
            "transfer of zero tokens".into(),
        ));
    }
    if commit.bounty > 0 && commit.bounty_pk.is_none() {
        return Err(LedgerError::MalformedCommitment(
            "bounty without bounty_pk".into(),
        ));
    }
    Ok(())
}

fn apply_transfer(overlay: &mut Overlay<'_>, transfer: &Transfer) -> Result<(), LedgerError> {
    let mut source = overlay.get(&transfer.source_pk);

    let expected = source
        .op_index
        .checked_add(1)
        .ok_or_else(|| LedgerError::MalformedCommitment("op_index exhausted".into()))?;
    if transfer.op_index != expected {
        return Err(LedgerError::StaleOpIndex {
            public_key: transfer.source_pk,
            expected,
            actual: transfer.op_index,
        });
    }

    if transfer.tokens > source.tokens {
        return Err(LedgerError::InsufficientBalance {
            public_key: transfer.source_pk,
            required: transfer.tokens,
            available: source.tokens,
        });
    }

    source.tokens -= transfer.tokens;
    source.op_index = expected;
    overlay.set(transfer.source_pk, source);
    overlay.credit(&transfer.destination_pk, transfer.tokens)
}

/// Signature coverage check, verifying each source at most once.
struct SignedSources<'t> {
    tx: &'t Transaction,
    payload: &'t [u8],
    crypto: &'t dyn CryptoProvider,
    verified: HashSet<PublicKey>,
}

impl<'t> SignedSources<'t> {
    fn new(tx: &'t Transaction, payload: &'t [u8], crypto: &'t dyn CryptoProvider) -> Self {
        Self {
            tx,
            payload,
            crypto,
            verified: HashSet::new(),
        }
    }

    fn require(&mut self, source: &PublicKey) -> Result<(), LedgerError> {
        if self.verified.contains(source) {
            return Ok(());
        }
        let covered = self
            .tx
            .signatures_by(source)
            .any(|sig| self.crypto.verify(source, self.payload, sig));
        if !covered {
            return Err(LedgerError::SignatureInvalid {
                public_key: *source,
            });
        }
        self.verified.insert(*source);
        Ok(())
    }
}
