//! # Subsystem Instances
//!
//! Owns the wired subsystem graph. Everything shared across tasks sits
//! behind an `Arc`.

use super::config::NodeConfig;
use crate::genesis::build_genesis;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use sc_02_block_validator::{
    BlockValidator, EligibilityPolicy, StakeWeightedEligibility, SystemTimeSource, TimeSource,
};
use sc_03_blocktree::{Blocktree, SharedBlocktree};
use sc_04_mempool::Mempool;
use sc_05_sync_protocol::{BincodeCodec, RequestPool, SyncProtocolHandler};
use shared_crypto::Ed25519Blake3;
use shared_types::{short_hex, CryptoProvider};
use std::sync::Arc;
use tracing::info;

pub struct SubsystemContainer {
    pub config: NodeConfig,
    pub crypto: Arc<dyn CryptoProvider>,
    pub time: Arc<dyn TimeSource>,
    pub blocktree: Arc<SharedBlocktree>,
    pub mempool: Arc<Mutex<Mempool>>,
    pub handler: Arc<SyncProtocolHandler>,
    pub requests: RequestPool,
}

impl SubsystemContainer {
    /// Wire all subsystems on the system clock.
    pub fn new(config: NodeConfig) -> Result<Self> {
        Self::with_time(config, Arc::new(SystemTimeSource))
    }

    pub fn with_time(config: NodeConfig, time: Arc<dyn TimeSource>) -> Result<Self> {
        config.validate().context("invalid node configuration")?;

        let crypto: Arc<dyn CryptoProvider> = Arc::new(Ed25519Blake3);
        let bounty = config.ledger.bounty_policy();
        let eligibility = Arc::new(StakeWeightedEligibility);

        let validator = Arc::new(BlockValidator::new(
            crypto.clone(),
            eligibility.clone(),
            bounty.clone(),
            time.clone(),
            config.validator.clone(),
        ));
        info!(
            eligibility = eligibility.name(),
            bounty = bounty.name(),
            skew_secs = config.validator.allowed_skew_secs,
            "block validator ready"
        );

        let genesis = build_genesis(&config.genesis, crypto.as_ref())
            .context("failed to build genesis block")?;
        let genesis_hash = genesis.hash;
        let tree = Blocktree::new(genesis, validator, time.clone(), config.blocktree.clone())
            .context("genesis block rejected")?;
        let blocktree = Arc::new(SharedBlocktree::new(tree));
        info!(genesis = %short_hex(&genesis_hash), "blocktree ready");

        let mempool = Arc::new(Mutex::new(Mempool::new(
            config.mempool.clone(),
            crypto.clone(),
            bounty,
        )));

        let handler = Arc::new(SyncProtocolHandler::new(
            blocktree.clone(),
            mempool.clone(),
            Arc::new(BincodeCodec::new(config.sync.max_message_bytes)),
            time.clone(),
            config.sync.clone(),
        ));
        let requests = RequestPool::new(handler.clone());
        info!(
            workers = config.sync.worker_threads,
            rate_limit = config.sync.rate_limit_requests,
            window_ms = config.sync.rate_limit_window_ms,
            authenticated = config.sync.require_authenticated_requests,
            "sync protocol handler ready"
        );

        Ok(Self {
            config,
            crypto,
            time,
            blocktree,
            mempool,
            handler,
            requests,
        })
    }
}
