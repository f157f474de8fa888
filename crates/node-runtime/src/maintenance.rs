//! # Maintenance Tasks
//!
//! Periodic upkeep spawned by the runtime:
//!
//! | Task | Action |
//! |------|--------|
//! | pending-gc | Drop blocks whose parent never arrived |
//! | rate-limit-cleanup | Forget identities idle for a full window |
//! | status | Log head, pending and mempool sizes |
//!
//! Every task stops when the shutdown channel flips to `true`.

use crate::container::{MaintenanceConfig, SubsystemContainer};
use shared_types::short_hex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Spawn all maintenance tasks.
pub fn spawn_all(
    container: Arc<SubsystemContainer>,
    config: &MaintenanceConfig,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let gc = container.clone();
    let limits = container.clone();
    let status = container;

    vec![
        spawn_periodic(
            "pending-gc",
            config.pending_gc_interval_secs,
            shutdown.clone(),
            move || {
                let expired = gc.blocktree.gc_pending();
                if !expired.is_empty() {
                    debug!(count = expired.len(), "pending blocks expired");
                }
            },
        ),
        spawn_periodic(
            "rate-limit-cleanup",
            config.rate_limit_cleanup_interval_secs,
            shutdown.clone(),
            move || {
                let removed = limits.handler.cleanup_rate_limits();
                if removed > 0 {
                    debug!(removed, "idle rate-limit entries dropped");
                }
            },
        ),
        spawn_periodic(
            "status",
            config.status_log_interval_secs,
            shutdown,
            move || log_status(&status),
        ),
    ]
}

/// Log a one-line summary of node state.
pub fn log_status(container: &SubsystemContainer) {
    let (head, blocks, pending) = {
        let tree = container.blocktree.read();
        (tree.head(), tree.len(), tree.pending_len())
    };
    let pooled = container.mempool.lock().len();
    info!(
        head = %short_hex(&head.hash),
        height = head.height,
        blocks,
        pending,
        pooled,
        "node status"
    );
}

fn spawn_periodic(
    name: &'static str,
    interval_secs: u64,
    shutdown: watch::Receiver<bool>,
    mut tick: impl FnMut() + Send + 'static,
) -> JoinHandle<()> {
    run_until_shutdown(name, shutdown, async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            tick();
        }
    })
}

fn run_until_shutdown(
    name: &'static str,
    shutdown: watch::Receiver<bool>,
    task: impl Future<Output = ()> + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = task => {}
            _ = stopped(shutdown) => {
                debug!(task = name, "shutdown signal received");
            }
        }
    })
}

/// Resolves once the flag is `true` or the sender is gone.
async fn stopped(mut shutdown: watch::Receiver<bool>) {
    loop {
        let stop = *shutdown.borrow_and_update();
        if stop || shutdown.changed().await.is_err() {
            return;
        }
    }
}
