//! # Subsystem Container
//!
//! Holds every subsystem instance, wired in dependency order:
//!
//! 1. Crypto provider and clock
//! 2. Block validator (eligibility and bounty policies)
//! 3. Blocktree, seeded with genesis
//! 4. Mempool
//! 5. Sync protocol handler and its request pool

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, MaintenanceConfig, NodeConfig};
pub use subsystems::SubsystemContainer;
