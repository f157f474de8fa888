//! # Signing Builders
//!
//! Wallet and staker side helpers that assemble signed ledger objects:
//!
//! - [`TransactionBuilder`]: transfers signed by each distinct source
//! - [`BlockBuilder`]: a block signed by its staker and wrapped with its hash
//! - [`GenesisBuilder`]: the height-0 block minting the initial allocation
//! - [`sign_request`]: an RPC request bound to the caller's identity
//!
//! The builders never decide eligibility. Callers supply `target_hash`
//! from whichever eligibility policy the network runs.

use crate::signatures::Ed25519KeyPair;
use crate::CryptoError;
use shared_types::{
    Block, CanonicalEncode, Commitment, CryptoProvider, DetachedSignature, Hash, HashedBlock,
    PublicKey, RpcRequest, SignedBlock, SignedRpcRequest, Transaction, Transfer, ZERO_HASH,
};

/// Assembles a `TRANSFER` transaction.
///
/// Every keypair passed to [`add_transfer`](Self::add_transfer) signs the
/// commitment once, however many transfers it funds.
#[derive(Default)]
pub struct TransactionBuilder<'a> {
    transfers: Vec<Transfer>,
    signers: Vec<&'a Ed25519KeyPair>,
    bounty: Option<(PublicKey, u64)>,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transfer funded by `source`.
    pub fn add_transfer(
        mut self,
        source: &'a Ed25519KeyPair,
        destination_pk: PublicKey,
        tokens: u64,
        op_index: u32,
    ) -> Self {
        let source_pk = source.public_key_bytes();
        self.transfers.push(Transfer {
            op_index,
            tokens,
            source_pk,
            destination_pk,
        });
        if !self
            .signers
            .iter()
            .any(|s| s.public_key_bytes() == source_pk)
        {
            self.signers.push(source);
        }
        self
    }

    /// Pay `bounty` tokens to `bounty_pk`.
    pub fn bounty(mut self, bounty_pk: PublicKey, bounty: u64) -> Self {
        self.bounty = Some((bounty_pk, bounty));
        self
    }

    /// Sign the commitment with every source.
    pub fn build(self) -> Result<Transaction, CryptoError> {
        if self.transfers.is_empty() {
            return Err(CryptoError::InvalidInput(
                "transaction has no transfers".into(),
            ));
        }

        let mut commit = Commitment::transfer(self.transfers);
        if let Some((pk, amount)) = self.bounty {
            commit = commit.with_bounty(pk, amount);
        }

        let payload = commit.signing_payload();
        let signatures = self
            .signers
            .iter()
            .map(|signer| DetachedSignature {
                public_key: signer.public_key_bytes(),
                signature: signer.sign(&payload).into_bytes(),
            })
            .collect();

        Ok(Transaction { signatures, commit })
    }
}

/// Assembles a block on top of `previous`.
pub struct BlockBuilder<'a> {
    staker: &'a Ed25519KeyPair,
    previous: Hash,
    height: u64,
    timestamp: u64,
    target_hash: Hash,
    transactions: Vec<Transaction>,
}

impl<'a> BlockBuilder<'a> {
    pub fn new(staker: &'a Ed25519KeyPair, previous: Hash, height: u64) -> Self {
        Self {
            staker,
            previous,
            height,
            timestamp: 0,
            target_hash: ZERO_HASH,
            transactions: Vec::new(),
        }
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn target_hash(mut self, target_hash: Hash) -> Self {
        self.target_hash = target_hash;
        self
    }

    pub fn transaction(mut self, tx: Transaction) -> Self {
        self.transactions.push(tx);
        self
    }

    pub fn transactions(mut self, txs: impl IntoIterator<Item = Transaction>) -> Self {
        self.transactions.extend(txs);
        self
    }

    /// Sign with the staker key and compute the block hash.
    pub fn build(self, crypto: &dyn CryptoProvider) -> HashedBlock {
        let block = Block {
            staker_pk: self.staker.public_key_bytes(),
            previous: self.previous,
            timestamp: self.timestamp,
            height: self.height,
            target_hash: self.target_hash,
            transactions: self.transactions,
        };
        let signature = self.staker.sign(&block.signing_payload()).into_bytes();
        HashedBlock::new(SignedBlock { signature, block }, crypto)
    }
}

/// Assembles the genesis block.
///
/// All allocations are carried by one transaction signed by a single
/// ephemeral key. The same key stakes the block, so its secret only needs
/// to live for the duration of [`build`](Self::build).
#[derive(Default)]
pub struct GenesisBuilder {
    allocations: Vec<(PublicKey, u64)>,
    timestamp: u64,
}

impl GenesisBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `tokens` to `public_key`.
    pub fn allocate(mut self, public_key: PublicKey, tokens: u64) -> Self {
        self.allocations.push((public_key, tokens));
        self
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Build with a fresh random key.
    pub fn build(self, crypto: &dyn CryptoProvider) -> Result<HashedBlock, CryptoError> {
        self.build_with_key(&Ed25519KeyPair::generate(), crypto)
    }

    /// Build with a caller-provided key, giving a reproducible genesis hash.
    pub fn build_with_key(
        self,
        key: &Ed25519KeyPair,
        crypto: &dyn CryptoProvider,
    ) -> Result<HashedBlock, CryptoError> {
        if self.allocations.iter().any(|(_, tokens)| *tokens == 0) {
            return Err(CryptoError::InvalidInput(
                "genesis allocation of zero tokens".into(),
            ));
        }

        let mut builder = BlockBuilder::new(key, ZERO_HASH, 0).timestamp(self.timestamp);
        if !self.allocations.is_empty() {
            let mut tx = TransactionBuilder::new();
            for (i, (pk, tokens)) in self.allocations.iter().enumerate() {
                tx = tx.add_transfer(key, *pk, *tokens, i as u32);
            }
            builder = builder.transaction(tx.build()?);
        }
        Ok(builder.build(crypto))
    }
}

/// Sign the canonical bytes of `request` with `key`.
pub fn sign_request(key: &Ed25519KeyPair, request: RpcRequest) -> SignedRpcRequest {
    let signature = key.sign(&request.canonical_bytes()).into_bytes();
    SignedRpcRequest {
        public_key: key.public_key_bytes(),
        signature,
        request: Some(request),
    }
}
