//! # Node Runtime Library
//!
//! Exposes the node's building blocks for the binary and for tests.
//!
//! - `container/` - configuration and the wired subsystem set
//! - `genesis/` - genesis block construction from configuration
//! - `maintenance` - periodic background upkeep

pub mod container;
pub mod genesis;
pub mod maintenance;

pub use container::{ConfigError, NodeConfig, SubsystemContainer};
pub use genesis::{build_genesis, GenesisAllocation, GenesisConfig, GenesisError};
