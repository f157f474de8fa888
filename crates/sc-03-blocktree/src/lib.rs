//! # sc-03-blocktree
//!
//! Blocktree subsystem for Stakechain.
//!
//! ## Role in System
//!
//! - **Arena**: every accepted block lives in a slot with its parent index,
//!   height, cumulative weight and the patch set it produced
//! - **Fork Choice**: the head is the block with the greatest cumulative
//!   eligibility weight, ties going to the smaller hash
//! - **Reorg**: the canonical ledger follows the head by reverting and
//!   replaying stored patch sets, never by re-validating
//! - **Pending Parents**: blocks that arrive before their parent wait in a
//!   bounded buffer and are released when the parent is accepted
//!
//! ## Block Lifecycle
//!
//! ```text
//! Unseen ──→ PendingParent ──→ Rejected
//!    │             │
//!    └─────────────┴─────────→ Accepted ──→ Canonical ⇄ Orphaned ──→ Pruned
//! ```
//!
//! `Rejected` and `Pruned` are terminal and remembered by hash, so the same
//! content is never validated twice.
//!
//! ## Concurrency
//!
//! [`SharedBlocktree`] is the single mutation entry point. Hash and
//! signature checks run before the write lock is taken; reads share the
//! lock and never observe a half-applied block.

pub mod config;
pub mod domain;
pub mod service;

pub use config::BlocktreeConfig;
pub use domain::*;
pub use service::SharedBlocktree;
