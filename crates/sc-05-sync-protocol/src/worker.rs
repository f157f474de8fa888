//! # Request Pool
//!
//! Runs dispatches on tokio's blocking thread pool, at most
//! `worker_threads` at a time. The caller waits on a oneshot with a
//! timeout; a caller that gives up only discards the response, the
//! dispatch itself always runs to completion.

use crate::domain::PoolError;
use crate::service::SyncProtocolHandler;
use shared_types::{RpcResponse, SignedRpcRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Semaphore};
use tracing::warn;

#[derive(Clone)]
pub struct RequestPool {
    handler: Arc<SyncProtocolHandler>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl RequestPool {
    pub fn new(handler: Arc<SyncProtocolHandler>) -> Self {
        let config = handler.config();
        Self {
            permits: Arc::new(Semaphore::new(config.worker_threads.max(1))),
            timeout: config.request_timeout(),
            handler,
        }
    }

    pub fn handler(&self) -> &Arc<SyncProtocolHandler> {
        &self.handler
    }

    /// Dispatch one encoded envelope, returning the encoded response.
    pub async fn submit_bytes(&self, bytes: Vec<u8>) -> Result<Vec<u8>, PoolError> {
        self.run(move |handler| handler.dispatch_bytes(&bytes))
            .await?
            .map_err(PoolError::from)
    }

    /// Dispatch one decoded request.
    pub async fn submit(&self, request: SignedRpcRequest) -> Result<RpcResponse, PoolError> {
        self.run(move |handler| handler.dispatch(request)).await
    }

    async fn run<T, F>(&self, job: F) -> Result<T, PoolError>
    where
        T: Send + 'static,
        F: FnOnce(&SyncProtocolHandler) -> T + Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;
        let handler = self.handler.clone();
        let (tx, rx) = oneshot::channel();

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            // The receiver is gone if the caller timed out.
            let _ = tx.send(job(handler.as_ref()));
        });

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(PoolError::WorkerLost),
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "request timed out");
                Err(PoolError::Timeout(self.timeout))
            }
        }
    }

    /// Stop admitting requests. In-flight dispatches finish normally.
    pub fn close(&self) {
        self.permits.close();
    }
}
