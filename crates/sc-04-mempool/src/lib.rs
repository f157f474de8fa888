//! # sc-04-mempool
//!
//! Transaction pool for Stakechain.
//!
//! ## Role in System
//!
//! - Holds transactions published with `PUB_TRANSACTION` that applied
//!   cleanly to the canonical ledger at submission time
//! - Drops transactions once a block includes them
//! - Re-checks every pooled transaction when the canonical head moves
//!
//! ## Data Structures
//!
//! - `by_hash`: lookup by transaction hash
//! - `by_source`: per source account, `op_index` to hash
//! - `by_arrival`: admission sequence to hash, used by `select`
//!
//! Two pooled transactions never claim the same `(source, op_index)`.

pub mod config;
pub mod domain;
pub mod service;

pub use config::MempoolConfig;
pub use domain::*;
pub use service::Mempool;
