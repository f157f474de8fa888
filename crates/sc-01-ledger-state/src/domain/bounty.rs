//! Bounty funding policies.

use super::errors::LedgerError;
use super::overlay::Overlay;
use crate::ports::BountyPolicy;
use shared_types::{Commitment, PublicKey};

fn bounty_recipient(commit: &Commitment) -> Result<PublicKey, LedgerError> {
    commit
        .bounty_pk
        .ok_or_else(|| LedgerError::MalformedCommitment("bounty without bounty_pk".into()))
}

/// Debits the bounty from the source of the commitment's first transfer.
///
/// The debit is on top of that transfer and does not consume an
/// `op_index`. Total supply is unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct SourceFundedBounty;

impl BountyPolicy for SourceFundedBounty {
    fn apply(&self, commit: &Commitment, overlay: &mut Overlay<'_>) -> Result<(), LedgerError> {
        let recipient = bounty_recipient(commit)?;
        let payer = commit
            .transfers
            .first()
            .map(|t| t.source_pk)
            .ok_or_else(|| LedgerError::MalformedCommitment("bounty without transfers".into()))?;

        overlay.debit(&payer, commit.bounty)?;
        overlay.credit(&recipient, commit.bounty)
    }

    fn name(&self) -> &'static str {
        "source_funded"
    }
}

/// Mints the bounty. Total supply grows by exactly `bounty`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MintedBounty;

impl BountyPolicy for MintedBounty {
    fn apply(&self, commit: &Commitment, overlay: &mut Overlay<'_>) -> Result<(), LedgerError> {
        let recipient = bounty_recipient(commit)?;
        overlay.credit(&recipient, commit.bounty)
    }

    fn name(&self) -> &'static str {
        "minted"
    }
}
