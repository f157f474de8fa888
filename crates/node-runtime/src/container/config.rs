//! # Node Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! ## Sources, in order
//!
//! 1. Defaults
//! 2. JSON file named by `SC_CONFIG`, if set
//! 3. `SC_*` environment overrides
//!
//! [`NodeConfig::validate`] runs last and refuses values the node cannot
//! run with.

use crate::genesis::GenesisConfig;
use sc_01_ledger_state::LedgerConfig;
use sc_02_block_validator::ValidatorConfig;
use sc_03_blocktree::BlocktreeConfig;
use sc_04_mempool::MempoolConfig;
use sc_05_sync_protocol::SyncConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_ENV: &str = "SC_CONFIG";

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub ledger: LedgerConfig,
    pub validator: ValidatorConfig,
    pub blocktree: BlocktreeConfig,
    pub mempool: MempoolConfig,
    pub sync: SyncConfig,
    pub genesis: GenesisConfig,
    pub maintenance: MaintenanceConfig,
}

/// Background task periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    pub pending_gc_interval_secs: u64,
    pub rate_limit_cleanup_interval_secs: u64,
    pub status_log_interval_secs: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            pending_gc_interval_secs: 10,
            rate_limit_cleanup_interval_secs: 30,
            status_log_interval_secs: 60,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Environment variable {name} has invalid value {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl NodeConfig {
    /// Defaults, then `SC_CONFIG`, then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `SC_*` overrides read through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = parse_env(&lookup, "SC_RATE_LIMIT")? {
            self.sync.rate_limit_requests = v;
        }
        if let Some(v) = parse_env(&lookup, "SC_RATE_WINDOW_MS")? {
            self.sync.rate_limit_window_ms = v;
        }
        if let Some(v) = parse_env(&lookup, "SC_ALLOWED_SKEW_SECS")? {
            self.validator.allowed_skew_secs = v;
        }
        if let Some(v) = parse_env(&lookup, "SC_REQUIRE_AUTH")? {
            self.sync.require_authenticated_requests = v;
        }
        Ok(())
    }

    /// Refuse configurations the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.sync.rate_limit_requests == 0 {
            return invalid("sync.rate_limit_requests must be positive");
        }
        if self.sync.rate_limit_window_ms == 0 {
            return invalid("sync.rate_limit_window_ms must be positive");
        }
        if self.sync.worker_threads == 0 {
            return invalid("sync.worker_threads must be positive");
        }
        if self.sync.request_timeout_ms == 0 {
            return invalid("sync.request_timeout_ms must be positive");
        }
        if self.blocktree.terminal_cache_capacity == 0 {
            return invalid("blocktree.terminal_cache_capacity must be positive");
        }
        if self.mempool.max_transactions == 0 {
            return invalid("mempool.max_transactions must be positive");
        }
        if self.genesis.allocations.is_empty() {
            return invalid("genesis.allocations is empty");
        }
        if self.genesis.allocations.iter().any(|a| a.tokens == 0) {
            return invalid("genesis allocation of zero tokens");
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { name, value }),
    }
}
