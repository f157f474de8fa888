//! Ports of the ledger subsystem.
//!
//! - [`BalanceView`]: read access to a ledger snapshot
//! - [`BountyPolicy`]: how a commitment's bounty moves tokens

use crate::domain::{LedgerError, Overlay};
use shared_types::{Balance, Commitment, PublicKey};

/// Read-only view of account balances at some point in the chain.
///
/// Absent accounts read as `Balance::default()`.
pub trait BalanceView {
    fn balance(&self, public_key: &PublicKey) -> Balance;

    /// Sum of all account tokens.
    fn total_supply(&self) -> u128;
}

impl<T: BalanceView + ?Sized> BalanceView for &T {
    fn balance(&self, public_key: &PublicKey) -> Balance {
        (**self).balance(public_key)
    }

    fn total_supply(&self) -> u128 {
        (**self).total_supply()
    }
}

/// Funding rule for `Commitment::bounty`.
///
/// Called once per commitment, after all of its transfers have applied to
/// `overlay`. Commitments with `bounty == 0` never reach the policy.
pub trait BountyPolicy: Send + Sync {
    fn apply(&self, commit: &Commitment, overlay: &mut Overlay<'_>) -> Result<(), LedgerError>;

    /// Stable identifier for logs and config.
    fn name(&self) -> &'static str;
}
