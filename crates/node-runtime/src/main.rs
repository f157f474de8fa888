//! # Stakechain Node Runtime
//!
//! Entry point for a Stakechain node.
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`RUST_LOG`, default `info`)
//! 2. Load configuration (`SC_CONFIG` file, then `SC_*` overrides)
//! 3. Build genesis and wire the subsystems
//! 4. Spawn maintenance tasks
//! 5. Run until Ctrl+C, then signal shutdown

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::maintenance;
use node_runtime::{NodeConfig, SubsystemContainer};
use shared_types::short_hex;

/// The running node: wired subsystems plus their background tasks.
pub struct NodeRuntime {
    container: Arc<SubsystemContainer>,
    tasks: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Result<Self> {
        info!("Creating Stakechain node runtime");
        let container = Arc::new(SubsystemContainer::new(config)?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            container,
            tasks: Vec::new(),
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn start(&mut self) {
        let head = self.container.blocktree.head();
        info!(
            head = %short_hex(&head.hash),
            height = head.height,
            "Stakechain node runtime v{}",
            env!("CARGO_PKG_VERSION")
        );

        self.tasks = maintenance::spawn_all(
            Arc::clone(&self.container),
            &self.container.config.maintenance,
            self.shutdown_rx.clone(),
        );
        info!(tasks = self.tasks.len(), "maintenance tasks started");
    }

    /// Signal every task and wait briefly for them to finish.
    pub async fn shutdown(self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        self.container.requests.close();

        for task in self.tasks {
            if tokio::time::timeout(Duration::from_secs(2), task).await.is_err() {
                warn!("maintenance task did not stop in time");
            }
        }
        maintenance::log_status(&self.container);
        info!("Shutdown complete");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    let config = NodeConfig::load().context("failed to load configuration")?;

    let mut runtime = NodeRuntime::new(config)?;
    runtime.start();

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
