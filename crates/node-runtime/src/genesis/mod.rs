//! # Genesis Module
//!
//! Builds the block a chain starts from.
//!
//! The genesis block has special properties:
//!
//! - Height: 0
//! - Previous: 32 zero bytes
//! - One transaction minting every configured allocation
//! - No eligibility requirement
//!
//! With `key_seed` set the block, and therefore the chain identity, is
//! reproducible across nodes.

pub mod builder;

pub use builder::{build_genesis, GenesisAllocation, GenesisConfig, GenesisError};
