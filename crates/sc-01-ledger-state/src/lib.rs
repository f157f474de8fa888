//! # sc-01-ledger-state
//!
//! Ledger State subsystem for Stakechain.
//!
//! ## Role in System
//!
//! - **State Transition Function**: `apply_block` turns a parent snapshot and
//!   a block's transactions into a patch set, or rejects the whole block
//! - **Patch Log**: every change is a `BalancePatch` with its before/after
//!   pair, so rollback is a pure function of stored patches
//! - **Canonical Ledger**: `LedgerState` holds the balances at the canonical
//!   head and moves between heads with `apply_reorg`
//!
//! ## Transfer Rules
//!
//! For each transfer, in order:
//!
//! 1. The source signed the commitment payload
//! 2. `op_index == source.op_index + 1`
//! 3. `tokens <= source.tokens`
//! 4. Debit the source, bump its `op_index`, credit the destination
//!
//! The bounty is handled by a pluggable [`BountyPolicy`] once the transfers
//! of its commitment have applied.

pub mod config;
pub mod domain;
pub mod ports;

pub use config::{BountyPolicyKind, LedgerConfig};
pub use domain::*;
pub use ports::*;
