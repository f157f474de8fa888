//! # Core Domain Entities
//!
//! Ledger and diff messages exactly as peers exchange them.
//!
//! ## Clusters
//!
//! - **Ledger**: `Block`, `SignedBlock`, `HashedBlock`, `Transaction`,
//!   `Commitment`, `Transfer`, `DetachedSignature`
//! - **Diff**: `Balance`, `BalancePatch`, `BlockWithDiff`
//!
//! Blocks are immutable once constructed. `HashedBlock::hash` is a cached,
//! derived field and is never trusted without recomputation.

use crate::crypto::CryptoProvider;
use crate::encoding::CanonicalEncode;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

// =============================================================================
// PRIMITIVES
// =============================================================================

/// A 32-byte digest.
pub type Hash = [u8; 32];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// `previous` of the genesis block. No other block may name it.
pub const ZERO_HASH: Hash = [0u8; 32];

// =============================================================================
// CLUSTER A: THE LEDGER
// =============================================================================

/// Commitment kinds. Numeric values are fixed by the peer schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum CommitmentType {
    Invalid = 0,
    Transfer = 1,
}

impl CommitmentType {
    /// Decode a raw wire value.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Invalid),
            1 => Some(Self::Transfer),
            _ => None,
        }
    }
}

/// A single token movement authorised by `source_pk`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Must equal the source account's current `op_index + 1`.
    pub op_index: u32,
    pub tokens: u64,
    pub source_pk: PublicKey,
    pub destination_pk: PublicKey,
}

/// The signed payload of a transaction.
///
/// `tx_type` is kept as the raw wire value so that unknown kinds can be
/// reported instead of failing to decode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub tx_type: i32,
    pub bounty_pk: Option<PublicKey>,
    pub bounty: u64,
    pub transfers: Vec<Transfer>,
}

impl Commitment {
    /// A `TRANSFER` commitment without bounty.
    pub fn transfer(transfers: Vec<Transfer>) -> Self {
        Self {
            tx_type: CommitmentType::Transfer as i32,
            bounty_pk: None,
            bounty: 0,
            transfers,
        }
    }

    /// Builder method to attach a bounty.
    pub fn with_bounty(mut self, bounty_pk: PublicKey, bounty: u64) -> Self {
        self.bounty_pk = Some(bounty_pk);
        self.bounty = bounty;
        self
    }

    /// Decoded commitment kind, `None` for values the schema does not define.
    pub fn commitment_type(&self) -> Option<CommitmentType> {
        CommitmentType::from_i32(self.tx_type)
    }

    /// Bytes every transfer source signs.
    pub fn signing_payload(&self) -> Vec<u8> {
        self.canonical_bytes()
    }
}

/// A signature detached from the payload it covers.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachedSignature {
    pub public_key: PublicKey,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

/// A commitment plus the signatures of every account it debits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub signatures: Vec<DetachedSignature>,
    pub commit: Commitment,
}

impl Transaction {
    /// Signatures attached by `public_key`.
    pub fn signatures_by<'a>(
        &'a self,
        public_key: &'a PublicKey,
    ) -> impl Iterator<Item = &'a Signature> + 'a {
        self.signatures
            .iter()
            .filter(move |s| &s.public_key == public_key)
            .map(|s| &s.signature)
    }

    /// Content hash used to identify the transaction in the mempool.
    pub fn hash(&self, crypto: &dyn CryptoProvider) -> Hash {
        crypto.hash(&self.canonical_bytes())
    }
}

/// A block as authored by a staker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub staker_pk: PublicKey,
    pub previous: Hash,
    /// Unix seconds.
    pub timestamp: u64,
    pub height: u64,
    pub target_hash: Hash,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Check if this is a genesis block.
    pub fn is_genesis(&self) -> bool {
        self.previous == ZERO_HASH
    }

    /// Bytes the staker signs.
    pub fn signing_payload(&self) -> Vec<u8> {
        self.canonical_bytes()
    }
}

/// A block plus the staker's signature over its canonical bytes.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlock {
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
    pub block: Block,
}

/// A signed block together with its claimed hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedBlock {
    pub hash: Hash,
    pub signed_block: SignedBlock,
}

impl HashedBlock {
    /// Wrap a signed block, computing its hash.
    pub fn new(signed_block: SignedBlock, crypto: &dyn CryptoProvider) -> Self {
        let hash = crypto.hash(&signed_block.canonical_bytes());
        Self { hash, signed_block }
    }

    /// Recompute and store the hash of the signed block.
    pub fn compute_hash(&mut self, crypto: &dyn CryptoProvider) -> Hash {
        self.hash = self.recompute_hash(crypto);
        self.hash
    }

    /// Hash of the signed block's content, ignoring the cached field.
    pub fn recompute_hash(&self, crypto: &dyn CryptoProvider) -> Hash {
        crypto.hash(&self.signed_block.canonical_bytes())
    }

    /// Check the cached hash against the content.
    pub fn verify_hash(&self, crypto: &dyn CryptoProvider) -> bool {
        self.recompute_hash(crypto) == self.hash
    }

    pub fn block(&self) -> &Block {
        &self.signed_block.block
    }

    pub fn previous(&self) -> Hash {
        self.signed_block.block.previous
    }

    pub fn height(&self) -> u64 {
        self.signed_block.block.height
    }
}

// =============================================================================
// CLUSTER B: DIFFS
// =============================================================================

/// Per-account state. An absent account is `Balance::default()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Balance {
    pub tokens: u64,
    pub op_index: u32,
}

impl Balance {
    pub fn new(tokens: u64, op_index: u32) -> Self {
        Self { tokens, op_index }
    }

    /// True for the implicit value of an account that was never touched.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Before/after record of one account touched by one block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePatch {
    pub public_key: PublicKey,
    pub before: Balance,
    pub after: Balance,
}

/// A stored block together with the diff it produced on acceptance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockWithDiff {
    pub block: HashedBlock,
    pub diff: Vec<BalancePatch>,
}
