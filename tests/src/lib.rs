//! # Stakechain Test Suite
//!
//! Unified test crate for flows that cross subsystem boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Deterministic keys, genesis and eligible blocks
//! └── integration/
//!     ├── ledger_flows.rs   # Supply conservation, replay, overspend
//!     ├── fork_choice.rs    # Order-independent convergence
//!     └── protocol.rs       # Envelope handling through the node runtime
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sc-tests
//! cargo test -p sc-tests integration::fork_choice::
//! ```

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod integration;
