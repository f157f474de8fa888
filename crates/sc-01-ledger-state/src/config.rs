//! Ledger configuration.

use crate::domain::{MintedBounty, SourceFundedBounty};
use crate::ports::BountyPolicy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How commitment bounties are funded. Consensus-critical: every node on a
/// network must run the same policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BountyPolicyKind {
    /// Debited from the first transfer's source. Supply is conserved.
    #[default]
    SourceFunded,
    /// Minted on top of the transfers. Supply grows by the bounty.
    Minted,
}

/// Configuration for the ledger subsystem.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub bounty_policy: BountyPolicyKind,
}

impl LedgerConfig {
    /// Instantiate the configured bounty policy.
    pub fn bounty_policy(&self) -> Arc<dyn BountyPolicy> {
        match self.bounty_policy {
            BountyPolicyKind::SourceFunded => Arc::new(SourceFundedBounty),
            BountyPolicyKind::Minted => Arc::new(MintedBounty),
        }
    }
}
