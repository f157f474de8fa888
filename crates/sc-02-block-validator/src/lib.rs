//! # sc-02-block-validator
//!
//! Block Validator subsystem for Stakechain.
//!
//! ## Validation Order (fail-fast)
//!
//! | Step | Check | Error |
//! |------|-------|-------|
//! | 1 | Recomputed hash equals claimed hash | `HashMismatch` |
//! | 2 | Staker signature over the block | `BadSignature` |
//! | 3 | `previous` names the given parent | `UnknownParent` |
//! | 4 | `height == parent.height + 1` | `HeightMismatch` |
//! | 5 | `parent.timestamp < timestamp <= now + skew` | `BadTimestamp` |
//! | 6 | Stake eligibility of `target_hash` | `IneligibleStaker` |
//! | 7 | Transactions apply to the parent snapshot | `LedgerRejected` |
//!
//! Steps 1-2 only look at the block itself and run through
//! [`BlockValidator::precheck`], in parallel for batches and outside any
//! blocktree lock. Steps 3-7 need the parent snapshot.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::ValidatorConfig;
pub use domain::*;
pub use ports::*;
pub use service::{BlockValidator, ParentContext, ValidatedBlock};
