//! # Genesis Block Builder

use serde::{Deserialize, Serialize};
use shared_crypto::{CryptoError, Ed25519KeyPair, GenesisBuilder};
use shared_types::{CryptoProvider, HashedBlock, PublicKey};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Genesis block creation errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Invalid genesis configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot sign genesis: {0}")]
    Signing(#[from] CryptoError),
}

/// Initial tokens for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAllocation {
    /// Hex-encoded Ed25519 public key.
    pub public_key: String,
    pub tokens: u64,
}

/// Genesis block configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Unix seconds. `0` means the current time.
    pub timestamp: u64,
    pub allocations: Vec<GenesisAllocation>,
    /// Hex-encoded 32-byte seed of the key that signs genesis. A random key
    /// is used when absent.
    pub key_seed: Option<String>,
}

fn decode_32(field: &str, value: &str) -> Result<[u8; 32], GenesisError> {
    let bytes = hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| GenesisError::InvalidConfig(format!("{field}: {e}")))?;
    <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
        GenesisError::InvalidConfig(format!("{field}: expected 32 bytes, got {}", bytes.len()))
    })
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Build and sign the genesis block described by `config`.
pub fn build_genesis(
    config: &GenesisConfig,
    crypto: &dyn CryptoProvider,
) -> Result<HashedBlock, GenesisError> {
    if config.allocations.is_empty() {
        return Err(GenesisError::InvalidConfig("no allocations".into()));
    }

    let timestamp = match config.timestamp {
        0 => now_secs(),
        ts => ts,
    };

    let mut builder = GenesisBuilder::new().timestamp(timestamp);
    for (i, allocation) in config.allocations.iter().enumerate() {
        let public_key: PublicKey =
            decode_32(&format!("allocations[{i}].public_key"), &allocation.public_key)?;
        builder = builder.allocate(public_key, allocation.tokens);
    }

    let block = match &config.key_seed {
        Some(seed) => {
            let key = Ed25519KeyPair::from_seed(decode_32("key_seed", seed)?);
            builder.build_with_key(&key, crypto)?
        }
        None => builder.build(crypto)?,
    };
    Ok(block)
}
