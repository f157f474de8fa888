//! # sc-05-sync-protocol
//!
//! Sync Protocol Handler subsystem for Stakechain.
//!
//! ## Request Path
//!
//! ```text
//! bytes ──→ EnvelopeCodec ──→ SignedRpcRequest
//!                                   │
//!        authenticate (optional) ───┤ INVALID_MESSAGE
//!        rate limit by public key ──┤ REQUEST_LIMIT_REACHED
//!        RpcCall::try_from ─────────┤ INVALID_MESSAGE / INVALID_METHOD
//!                                   ▼
//!          GET_BLOCKS │ GET_BLOCKTREE │ PUB_BLOCK │ PUB_TRANSACTION
//! ```
//!
//! Every response echoes the decoded request. A panic inside a method
//! handler is caught at the dispatch boundary and answered
//! `INTERNAL_ERROR`.
//!
//! ## Concurrency
//!
//! [`RequestPool`] runs dispatches on tokio's blocking pool. Mutations go
//! through [`SharedBlocktree`](sc_03_blocktree::SharedBlocktree), so at most
//! one block insertion is in flight; rate-limit counters have their own
//! lock.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod worker;

pub use adapters::BincodeCodec;
pub use config::SyncConfig;
pub use domain::*;
pub use ports::EnvelopeCodec;
pub use service::SyncProtocolHandler;
pub use worker::RequestPool;
