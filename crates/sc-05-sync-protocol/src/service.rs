//! # Sync Protocol Handler
//!
//! Turns one `SignedRpcRequest` into one `RpcResponse`.
//!
//! ## Status Mapping
//!
//! | Failure | Envelope status | Method status |
//! |---------|-----------------|--------------|
//! | Undecodable bytes, missing request or payload | `INVALID_MESSAGE` | - |
//! | Bad request signature (when required) | `INVALID_MESSAGE` | - |
//! | Unknown method | `INVALID_METHOD` | - |
//! | Rate limit | `REQUEST_LIMIT_REACHED` | - |
//! | `GET_BLOCKS` with unknown hashes | `OK` | `UNKNOWN_BLOCK` |
//! | `GET_BLOCKTREE` above head | `OK` | `INVALID_REQUEST` |
//! | `PUB_BLOCK` without block | `OK` | `INVALID_REQUEST` |
//! | `PUB_BLOCK` failing validation | `OK` | `INVALID_BLOCK` |
//! | `PUB_TRANSACTION` refused | `OK` | `INVALID_REQUEST` |
//! | Panic or blocktree fault | `INTERNAL_ERROR` | - |

use crate::config::SyncConfig;
use crate::domain::{EnvelopeError, RpcCall};
use crate::ports::EnvelopeCodec;
use parking_lot::Mutex;
use sc_02_block_validator::TimeSource;
use sc_03_blocktree::{InsertError, InsertOutcome, SharedBlocktree};
use sc_04_mempool::{Mempool, MempoolError};
use shared_types::{
    short_hex, CanonicalEncode, GetBlocksResponse, GetBlocksStatus, GetBlocktreeResponse,
    GetBlocktreeStatus, Hash, HashedBlock, PubBlockResponse, PubBlockStatus,
    PubTransactionResponse, PubTransactionStatus, PublicKey, RpcRequest, RpcResponse, RpcStatus,
    SignedRpcRequest, SlidingWindowLimiter, Transaction,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

pub struct SyncProtocolHandler {
    blocktree: Arc<SharedBlocktree>,
    mempool: Arc<Mutex<Mempool>>,
    limiter: SlidingWindowLimiter<PublicKey>,
    codec: Arc<dyn EnvelopeCodec>,
    time: Arc<dyn TimeSource>,
    config: SyncConfig,
}

impl SyncProtocolHandler {
    pub fn new(
        blocktree: Arc<SharedBlocktree>,
        mempool: Arc<Mutex<Mempool>>,
        codec: Arc<dyn EnvelopeCodec>,
        time: Arc<dyn TimeSource>,
        config: SyncConfig,
    ) -> Self {
        Self {
            limiter: SlidingWindowLimiter::new(
                config.rate_limit_requests,
                config.rate_limit_window(),
            ),
            blocktree,
            mempool,
            codec,
            time,
            config,
        }
    }

    pub fn blocktree(&self) -> &Arc<SharedBlocktree> {
        &self.blocktree
    }

    pub fn mempool(&self) -> &Arc<Mutex<Mempool>> {
        &self.mempool
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Drop rate-limit entries for idle identities.
    pub fn cleanup_rate_limits(&self) -> usize {
        self.limiter.cleanup(Instant::now())
    }

    /// Decode, dispatch and encode one envelope.
    ///
    /// Fails only if the response itself cannot be encoded.
    pub fn dispatch_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
        let response = match self.codec.decode_request(bytes) {
            Ok(signed) => self.dispatch(signed),
            Err(e) => {
                debug!(error = %e, len = bytes.len(), "undecodable envelope");
                reject(None, &e)
            }
        };
        self.codec.encode_response(&response)
    }

    pub fn dispatch(&self, signed: SignedRpcRequest) -> RpcResponse {
        self.dispatch_at(signed, Instant::now())
    }

    /// [`dispatch`](Self::dispatch) with an explicit clock for the rate
    /// limiter.
    pub fn dispatch_at(&self, signed: SignedRpcRequest, now: Instant) -> RpcResponse {
        let Some(request) = signed.request.as_ref() else {
            return reject(None, &EnvelopeError::MissingRequest);
        };
        let original = Some(request.clone());

        if self.config.require_authenticated_requests && !self.authenticate(&signed, request) {
            warn!(peer = %short_hex(&signed.public_key), "request signature rejected");
            return reject(original, &EnvelopeError::Unauthenticated);
        }

        if !self.limiter.try_acquire_at(&signed.public_key, now) {
            warn!(
                peer = %short_hex(&signed.public_key),
                limit = self.limiter.limit(),
                window_ms = self.config.rate_limit_window_ms,
                "rate limit reached"
            );
            return RpcResponse::new(RpcStatus::RequestLimitReached, original)
                .with_description("request limit reached");
        }

        let call = match RpcCall::try_from(request) {
            Ok(call) => call,
            Err(e) => return reject(original, &e),
        };
        debug!(
            peer = %short_hex(&signed.public_key),
            method = call.method().as_str(),
            "dispatching request"
        );

        match catch_unwind(AssertUnwindSafe(|| self.handle(call, request))) {
            Ok(response) => response,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown".to_string());
                error!(reason = %reason, "request handler panicked");
                RpcResponse::new(RpcStatus::InternalError, original)
                    .with_description("internal error")
            }
        }
    }

    fn authenticate(&self, signed: &SignedRpcRequest, request: &RpcRequest) -> bool {
        self.blocktree.validator().crypto().verify(
            &signed.public_key,
            &request.canonical_bytes(),
            &signed.signature,
        )
    }

    fn handle(&self, call: RpcCall, request: &RpcRequest) -> RpcResponse {
        let original = Some(request.clone());
        match call {
            RpcCall::GetBlocks { hashes } => self.get_blocks(&hashes, original),
            RpcCall::GetBlocktree { start_height } => self.get_blocktree(start_height, original),
            RpcCall::PubBlock { block } => self.pub_block(block, original),
            RpcCall::PubTransaction { transaction } => self.pub_transaction(transaction, original),
        }
    }

    // =========================================================================
    // METHODS
    // =========================================================================

    /// A well-formed request over `max_hashes_per_request` is answered
    /// per method with `INVALID_REQUEST`, like a bad GET_BLOCKTREE height.
    fn get_blocks(&self, hashes: &[Hash], original: Option<RpcRequest>) -> RpcResponse {
        let mut response = RpcResponse::new(RpcStatus::Ok, original);
        let max = self.config.max_hashes_per_request;
        if hashes.len() > max {
            response.description =
                format!("{} hashes requested, at most {max} allowed", hashes.len());
            response.get_blocks = Some(GetBlocksResponse {
                status: GetBlocksStatus::InvalidRequest,
                blocks: Vec::new(),
            });
            return response;
        }

        let (status, blocks) = self.blocktree.get_blocks(hashes);
        if status == GetBlocksStatus::UnknownBlock {
            let missing = hashes.len() - blocks.len();
            response.description = format!("{missing} of {} blocks unknown", hashes.len());
        }
        response.get_blocks = Some(GetBlocksResponse { status, blocks });
        response
    }

    fn get_blocktree(&self, start_height: u64, original: Option<RpcRequest>) -> RpcResponse {
        let mut response = RpcResponse::new(RpcStatus::Ok, original);
        response.get_blocktree = Some(match self.blocktree.get_ancestors(start_height) {
            Ok(a) => GetBlocktreeResponse {
                status: GetBlocktreeStatus::Ok,
                head: a.head,
                head_height: a.head_height,
                ancestors: a.hashes,
            },
            Err(e) => {
                let head = self.blocktree.head();
                response.description = e.to_string();
                GetBlocktreeResponse {
                    status: GetBlocktreeStatus::InvalidRequest,
                    head: head.hash,
                    head_height: head.height,
                    ancestors: Vec::new(),
                }
            }
        });
        response
    }

    fn pub_block(&self, block: Option<HashedBlock>, original: Option<RpcRequest>) -> RpcResponse {
        let mut response = RpcResponse::new(RpcStatus::Ok, original);
        let Some(block) = block else {
            response.pub_block = Some(PubBlockResponse {
                status: PubBlockStatus::InvalidRequest,
            });
            return response.with_description("request carries no block");
        };

        let transactions = block.block().transactions.clone();
        let status = match self.blocktree.insert(block) {
            Ok(InsertOutcome::Accepted { head_changed, .. }) => {
                self.after_block(&transactions, head_changed);
                PubBlockStatus::Ok
            }
            Ok(InsertOutcome::Pending) => {
                response.description = "block is pending its parent".into();
                PubBlockStatus::Ok
            }
            Ok(InsertOutcome::AlreadyKnown) => {
                response.description = "block already known".into();
                PubBlockStatus::Ok
            }
            Err(InsertError::Internal(reason)) => {
                error!(reason = %reason, "blocktree fault while inserting block");
                response.status = RpcStatus::InternalError;
                return response.with_description("internal error");
            }
            Err(e) => {
                response.description = e.to_string();
                PubBlockStatus::InvalidBlock
            }
        };
        response.pub_block = Some(PubBlockResponse { status });
        response
    }

    /// Mempool upkeep once a block is accepted.
    fn after_block(&self, included: &[Transaction], head_changed: bool) {
        let mut mempool = self.mempool.lock();
        mempool.remove_included(included);
        if head_changed {
            let tree = self.blocktree.read();
            mempool.revalidate(tree.ledger());
        }
    }

    fn pub_transaction(
        &self,
        transaction: Option<Transaction>,
        original: Option<RpcRequest>,
    ) -> RpcResponse {
        let mut response = RpcResponse::new(RpcStatus::Ok, original);
        let Some(transaction) = transaction else {
            response.pub_transaction = Some(PubTransactionResponse {
                status: PubTransactionStatus::InvalidRequest,
            });
            return response.with_description("request carries no transaction");
        };

        let now = self.time.now();
        let outcome = {
            let mut mempool = self.mempool.lock();
            let tree = self.blocktree.read();
            mempool.submit(transaction, tree.ledger(), now)
        };

        let status = match outcome {
            Ok(_) => PubTransactionStatus::Ok,
            Err(MempoolError::DuplicateTransaction(_)) => {
                response.description = "transaction already pooled".into();
                PubTransactionStatus::Ok
            }
            Err(e) => {
                response.description = e.to_string();
                PubTransactionStatus::InvalidRequest
            }
        };
        response.pub_transaction = Some(PubTransactionResponse { status });
        response
    }
}

fn reject(original: Option<RpcRequest>, error: &EnvelopeError) -> RpcResponse {
    RpcResponse::new(error.status(), original).with_description(error.to_string())
}
