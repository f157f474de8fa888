//! # Blocktree
//!
//! Arena of accepted blocks plus the canonical ledger at the head.
//!
//! ## Structure
//!
//! - `nodes`: slots indexed by arena position; pruned slots become `None`
//!   and are never reused
//! - `index`: hash to arena position for live nodes
//! - `canonical`: arena position of the canonical block at each height
//! - `ledger`: balances after applying the canonical chain
//!
//! ## Parent Snapshots
//!
//! A candidate is validated against its parent's balances. These are
//! obtained by layering a [`StagedView`] on the canonical ledger: revert
//! from the head down to the common ancestor, replay up to the parent. The
//! canonical ledger itself is only touched when the head moves.
//!
//! ## Pruning
//!
//! No block earns more than the eligibility policy's `max_weight`, so a
//! branch trailing the head by more than `prune_depth` such blocks can
//! never overtake it. Only those branches are pruned. Pruning is decided
//! by weight alone, never by arrival order or height.

use super::errors::{BlocktreeError, InsertError};
use super::node::{Ancestors, BlockNode, BlockStatus, HeadInfo, InsertOutcome, Terminal};
use super::pending::PendingBuffer;
use crate::config::BlocktreeConfig;
use lru::LruCache;
use sc_01_ledger_state::{LedgerError, LedgerState, StagedView};
use sc_02_block_validator::{
    BlockValidator, ParentContext, TimeSource, ValidatedBlock, ValidationError,
};
use shared_types::{
    short_hex, Balance, BalancePatch, BlockWithDiff, GetBlocksStatus, Hash, HashedBlock, PublicKey,
};
use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Path between two arena nodes through their lowest common ancestor.
struct Route {
    /// From the origin down to (excluding) the ancestor, newest first.
    revert: Vec<usize>,
    /// From just above the ancestor up to the target, oldest first.
    replay: Vec<usize>,
    ancestor: usize,
}

fn slot(nodes: &[Option<BlockNode>], idx: usize) -> &BlockNode {
    match nodes.get(idx).and_then(Option::as_ref) {
        Some(node) => node,
        None => unreachable!("arena slot {idx} is not live"),
    }
}

pub struct Blocktree {
    config: BlocktreeConfig,
    validator: Arc<BlockValidator>,
    time: Arc<dyn TimeSource>,
    nodes: Vec<Option<BlockNode>>,
    index: HashMap<Hash, usize>,
    canonical: Vec<usize>,
    head: usize,
    ledger: LedgerState,
    pending: PendingBuffer,
    terminal: LruCache<Hash, Terminal>,
    /// Live nodes with more than one child.
    forks: BTreeSet<usize>,
}

impl Blocktree {
    /// Start a tree from its genesis block.
    pub fn new(
        genesis: HashedBlock,
        validator: Arc<BlockValidator>,
        time: Arc<dyn TimeSource>,
        config: BlocktreeConfig,
    ) -> Result<Self, InsertError> {
        let validated = validator.validate_genesis(&genesis)?;
        let mut ledger = LedgerState::new();
        ledger.commit(&validated.patches)?;

        info!(
            hash = %short_hex(&validated.hash),
            accounts = ledger.account_count(),
            supply = ledger.total_supply(),
            "blocktree initialised from genesis"
        );

        let root = BlockNode {
            parent: None,
            children: Vec::new(),
            height: 0,
            timestamp: genesis.block().timestamp,
            patches: validated.patches,
            cumulative_weight: 0,
            canonical: true,
            block: Arc::new(genesis),
        };

        let capacity =
            NonZeroUsize::new(config.terminal_cache_capacity).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            pending: PendingBuffer::new(config.max_pending_blocks, config.pending_retention_secs),
            terminal: LruCache::new(capacity),
            index: HashMap::from([(validated.hash, 0)]),
            nodes: vec![Some(root)],
            canonical: vec![0],
            head: 0,
            ledger,
            forks: BTreeSet::new(),
            config,
            validator,
            time,
        })
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Validate and insert one block.
    pub fn insert(&mut self, block: HashedBlock) -> Result<InsertOutcome, InsertError> {
        if let Some(settled) = self.settled(&block.hash) {
            return settled;
        }
        match self.validator.precheck(&block) {
            Ok(hash) => self.insert_prechecked(block, hash),
            Err(e) => {
                self.record_precheck_failure(&block, &e);
                Err(e.into())
            }
        }
    }

    /// Answer for a hash whose fate is already decided, without looking at
    /// content.
    ///
    /// Safe for unverified claimed hashes: content that does not hash to
    /// its claim fails `HashMismatch` anyway, and content that does is the
    /// very block already decided.
    pub fn settled(&self, hash: &Hash) -> Option<Result<InsertOutcome, InsertError>> {
        if self.index.contains_key(hash) {
            return Some(Ok(InsertOutcome::AlreadyKnown));
        }
        if self.pending.contains(hash) {
            return Some(Ok(InsertOutcome::Pending));
        }
        match self.terminal.peek(hash) {
            Some(Terminal::Rejected) => Some(Err(InsertError::PreviouslyRejected)),
            Some(Terminal::Pruned) => Some(Err(InsertError::Pruned)),
            None => None,
        }
    }

    /// Remember a block that failed the stateless checks.
    ///
    /// Only a bad signature is recorded: the hash was verified first, so it
    /// names this exact content. A hash mismatch names nothing.
    pub(crate) fn record_precheck_failure(&mut self, block: &HashedBlock, error: &ValidationError) {
        warn!(
            hash = %short_hex(&block.hash),
            error = %error,
            "block failed precheck"
        );
        if matches!(error, ValidationError::BadSignature) {
            self.terminal.put(block.hash, Terminal::Rejected);
        }
    }

    /// Insert a block whose hash and signature were already verified.
    pub(crate) fn insert_prechecked(
        &mut self,
        block: HashedBlock,
        hash: Hash,
    ) -> Result<InsertOutcome, InsertError> {
        if let Some(settled) = self.settled(&hash) {
            return settled;
        }

        let parent = block.previous();
        match self.terminal.peek(&parent) {
            Some(Terminal::Rejected) => {
                self.terminal.put(hash, Terminal::Rejected);
                warn!(hash = %short_hex(&hash), parent = %short_hex(&parent), "parent was rejected");
                return Err(InsertError::RejectedAncestor { parent });
            }
            Some(Terminal::Pruned) => {
                self.terminal.put(hash, Terminal::Pruned);
                return Err(InsertError::Pruned);
            }
            None => {}
        }

        if !self.index.contains_key(&parent) {
            if block.block().is_genesis() {
                let error = ValidationError::UnknownParent(parent);
                self.reject(hash, &error);
                return Err(error.into());
            }
            return Ok(self.buffer(hash, block));
        }

        let old_head = self.head;
        self.attach(block, hash)?;
        let released = self.release_children(hash);
        self.prune();

        Ok(InsertOutcome::Accepted {
            head_changed: self.head != old_head,
            released,
        })
    }

    fn buffer(&mut self, hash: Hash, block: HashedBlock) -> InsertOutcome {
        let parent = block.previous();
        let height = block.height();
        let evicted = self.pending.insert(hash, block, self.time.now());

        debug!(
            hash = %short_hex(&hash),
            parent = %short_hex(&parent),
            height,
            pending = self.pending.len(),
            "block buffered pending parent"
        );
        for dropped in evicted {
            warn!(hash = %short_hex(&dropped), "pending buffer full, evicted block");
        }
        InsertOutcome::Pending
    }

    /// Validate against the parent snapshot and store. Parent must be live.
    fn attach(&mut self, block: HashedBlock, hash: Hash) -> Result<usize, InsertError> {
        let parent_idx = match self.index.get(&block.previous()) {
            Some(idx) => *idx,
            None => return Err(ValidationError::UnknownParent(block.previous()).into()),
        };
        let parent = self.node(parent_idx);
        let (parent_hash, parent_height, parent_timestamp, parent_weight) = (
            parent.hash(),
            parent.height,
            parent.timestamp,
            parent.cumulative_weight,
        );

        let ceiling = parent_weight.saturating_add(self.validator.eligibility().max_weight());
        if ceiling < self.prune_line() {
            self.terminal.put(hash, Terminal::Pruned);
            self.drop_waiting(hash, Terminal::Pruned);
            debug!(hash = %short_hex(&hash), parent_height, "block cannot catch up with head, refused");
            return Err(InsertError::Pruned);
        }

        let validated = {
            let snapshot = self.snapshot_at(parent_idx)?;
            let context = ParentContext {
                hash: parent_hash,
                height: parent_height,
                timestamp: parent_timestamp,
                snapshot: &snapshot,
            };
            self.validator.validate_prechecked(&block, &context)
        };
        match validated {
            Ok(validated) => self.commit(block, parent_idx, validated),
            Err(e) => {
                self.reject(hash, &e);
                Err(e.into())
            }
        }
    }

    /// Store a validated child of `parent_idx`.
    ///
    /// When the block wins fork choice the ledger is moved first, so a
    /// failed move leaves nothing behind.
    fn commit(
        &mut self,
        block: HashedBlock,
        parent_idx: usize,
        validated: ValidatedBlock,
    ) -> Result<usize, InsertError> {
        let parent = self.node(parent_idx);
        let height = parent.height + 1;
        let cumulative_weight = parent.cumulative_weight.saturating_add(validated.weight);
        let hash = validated.hash;

        let wins = self.beats_head(cumulative_weight, &hash);
        if wins {
            self.move_ledger(parent_idx, &validated.patches)?;
        }

        let idx = self.nodes.len();
        self.nodes.push(Some(BlockNode {
            timestamp: block.block().timestamp,
            block: Arc::new(block),
            parent: Some(parent_idx),
            children: Vec::new(),
            height,
            patches: validated.patches,
            cumulative_weight,
            canonical: false,
        }));
        self.index.insert(hash, idx);
        let parent = self.node_mut(parent_idx);
        parent.children.push(idx);
        if parent.children.len() > 1 {
            self.forks.insert(parent_idx);
        }

        info!(
            hash = %short_hex(&hash),
            height,
            cumulative_weight,
            "block accepted"
        );

        if wins {
            self.mark_head(idx);
        }
        Ok(idx)
    }

    /// Accept buffered descendants of `root`, breadth of the tree first.
    fn release_children(&mut self, root: Hash) -> usize {
        let mut released = 0;
        let mut ready = vec![root];
        while let Some(parent) = ready.pop() {
            for (hash, block) in self.pending.take_children(&parent) {
                match self.attach(block, hash) {
                    Ok(_) => {
                        released += 1;
                        ready.push(hash);
                    }
                    Err(e) => {
                        debug!(hash = %short_hex(&hash), error = %e, "released block refused");
                    }
                }
            }
        }
        released
    }

    fn reject(&mut self, hash: Hash, error: &ValidationError) {
        warn!(hash = %short_hex(&hash), error = %error, "block rejected");
        // A block from slightly in the future may become valid later.
        let transient = matches!(
            error,
            ValidationError::BadTimestamp { timestamp, latest, .. } if timestamp > latest
        );
        if transient {
            return;
        }
        self.terminal.put(hash, Terminal::Rejected);
        self.drop_waiting(hash, Terminal::Rejected);
    }

    /// Drop every buffered descendant of `root`, remembering it as `state`.
    fn drop_waiting(&mut self, root: Hash, state: Terminal) {
        let mut stack = vec![root];
        while let Some(parent) = stack.pop() {
            for (child, _) in self.pending.take_children(&parent) {
                debug!(hash = %short_hex(&child), ?state, "dropping buffered descendant");
                self.terminal.put(child, state);
                stack.push(child);
            }
        }
    }

    // =========================================================================
    // FORK CHOICE
    // =========================================================================

    fn beats_head(&self, weight: u128, hash: &Hash) -> bool {
        let head = self.node(self.head);
        weight > head.cumulative_weight
            || (weight == head.cumulative_weight && *hash < head.hash())
    }

    fn route(&self, from: usize, to: usize) -> Route {
        let parent_of = |i: usize| self.node(i).parent.unwrap_or(i);
        let (mut a, mut b) = (from, to);
        let mut revert = Vec::new();
        let mut replay = Vec::new();

        while self.node(a).height > self.node(b).height {
            revert.push(a);
            a = parent_of(a);
        }
        while self.node(b).height > self.node(a).height {
            replay.push(b);
            b = parent_of(b);
        }
        while a != b {
            revert.push(a);
            replay.push(b);
            a = parent_of(a);
            b = parent_of(b);
        }

        replay.reverse();
        Route {
            revert,
            replay,
            ancestor: a,
        }
    }

    /// Balances after applying the block at `target`.
    fn snapshot_at(&self, target: usize) -> Result<StagedView<'_>, LedgerError> {
        let route = self.route(self.head, target);
        let mut view = StagedView::new(&self.ledger);
        for &i in &route.revert {
            view.revert(&self.node(i).patches)?;
        }
        for &i in &route.replay {
            view.replay(&self.node(i).patches)?;
        }
        Ok(view)
    }

    /// Move the canonical ledger to `parent` with `patches` applied on top.
    fn move_ledger(&mut self, parent: usize, patches: &[BalancePatch]) -> Result<(), LedgerError> {
        let route = self.route(self.head, parent);
        let nodes = &self.nodes;
        let revert: Vec<&[BalancePatch]> = route
            .revert
            .iter()
            .map(|&i| slot(nodes, i).patches.as_slice())
            .collect();
        let mut replay: Vec<&[BalancePatch]> = route
            .replay
            .iter()
            .map(|&i| slot(nodes, i).patches.as_slice())
            .collect();
        replay.push(patches);
        self.ledger.apply_reorg(&revert, &replay)
    }

    /// Point the canonical chain at `new_head`. The ledger must already be
    /// there.
    fn mark_head(&mut self, new_head: usize) {
        let route = self.route(self.head, new_head);

        for &i in &route.revert {
            self.node_mut(i).canonical = false;
        }
        for &i in &route.replay {
            self.node_mut(i).canonical = true;
        }
        let ancestor_height = self.node(route.ancestor).height;
        self.canonical.truncate(ancestor_height as usize + 1);
        self.canonical.extend(route.replay.iter().copied());

        let old_head = self.node(self.head).hash();
        self.head = new_head;
        let head = self.node(new_head);

        if route.revert.is_empty() {
            debug!(hash = %short_hex(&head.hash()), height = head.height, "head extended");
        } else {
            info!(
                old_head = %short_hex(&old_head),
                new_head = %short_hex(&head.hash()),
                height = head.height,
                depth = route.revert.len(),
                "chain reorganised"
            );
        }
    }

    // =========================================================================
    // PRUNING
    // =========================================================================

    /// Cumulative weight a branch needs to stay in contention.
    fn prune_line(&self) -> u128 {
        let margin = self
            .validator
            .eligibility()
            .max_weight()
            .saturating_mul(self.config.prune_depth as u128);
        self.node(self.head).cumulative_weight.saturating_sub(margin)
    }

    fn prune(&mut self) {
        let line = self.prune_line();
        if line == 0 {
            return;
        }

        let forks: Vec<usize> = self.forks.iter().copied().collect();
        for fork in forks {
            let Some(node) = self.nodes.get(fork).and_then(Option::as_ref) else {
                continue;
            };
            if node.cumulative_weight >= line {
                continue;
            }
            let orphans: Vec<usize> = node
                .children
                .iter()
                .copied()
                .filter(|&c| !self.node(c).canonical)
                .collect();
            for root in orphans {
                if self.best_weight(root) < line {
                    self.prune_subtree(fork, root);
                }
            }
        }
    }

    /// Heaviest cumulative weight anywhere in the subtree at `root`.
    fn best_weight(&self, root: usize) -> u128 {
        let mut best = 0;
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            let node = self.node(i);
            best = best.max(node.cumulative_weight);
            stack.extend(node.children.iter().copied());
        }
        best
    }

    fn prune_subtree(&mut self, fork: usize, root: usize) {
        let remaining = {
            let node = self.node_mut(fork);
            node.children.retain(|&c| c != root);
            node.children.len()
        };
        if remaining < 2 {
            self.forks.remove(&fork);
        }
        let root_hash = self.node(root).hash();

        let mut stack = vec![root];
        let mut count = 0usize;
        while let Some(i) = stack.pop() {
            let Some(node) = self.nodes[i].take() else {
                continue;
            };
            let hash = node.hash();
            self.index.remove(&hash);
            self.forks.remove(&i);
            self.terminal.put(hash, Terminal::Pruned);
            self.drop_waiting(hash, Terminal::Pruned);
            stack.extend(node.children);
            count += 1;
        }

        info!(root = %short_hex(&root_hash), blocks = count, "pruned orphan branch");
    }

    /// Drop buffered blocks whose parent never arrived.
    pub fn gc_pending(&mut self) -> Vec<Hash> {
        let expired = self.pending.gc_expired(self.time.now());
        if !expired.is_empty() {
            info!(count = expired.len(), "expired blocks pending parent");
        }
        expired
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    fn node(&self, idx: usize) -> &BlockNode {
        slot(&self.nodes, idx)
    }

    fn node_mut(&mut self, idx: usize) -> &mut BlockNode {
        match self.nodes.get_mut(idx).and_then(Option::as_mut) {
            Some(node) => node,
            None => unreachable!("arena slot {idx} is not live"),
        }
    }

    fn live(&self, hash: &Hash) -> Option<&BlockNode> {
        self.index.get(hash).map(|&i| self.node(i))
    }

    pub fn head(&self) -> HeadInfo {
        let head = self.node(self.head);
        HeadInfo {
            hash: head.hash(),
            height: head.height,
            timestamp: head.timestamp,
            cumulative_weight: head.cumulative_weight,
        }
    }

    pub fn genesis_hash(&self) -> Hash {
        self.node(self.canonical[0]).hash()
    }

    pub fn status(&self, hash: &Hash) -> BlockStatus {
        if let Some(node) = self.live(hash) {
            return if node.canonical {
                BlockStatus::Canonical
            } else {
                BlockStatus::Orphaned
            };
        }
        if self.pending.contains(hash) {
            return BlockStatus::PendingParent;
        }
        match self.terminal.peek(hash) {
            Some(Terminal::Rejected) => BlockStatus::Rejected,
            Some(Terminal::Pruned) => BlockStatus::Pruned,
            None => BlockStatus::Unknown,
        }
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.index.contains_key(hash)
    }

    pub fn block(&self, hash: &Hash) -> Option<Arc<HashedBlock>> {
        self.live(hash).map(|n| n.block.clone())
    }

    /// A stored block with the diff it produced.
    pub fn block_with_diff(&self, hash: &Hash) -> Option<BlockWithDiff> {
        self.live(hash).map(|n| BlockWithDiff {
            block: n.block.as_ref().clone(),
            diff: n.patches.clone(),
        })
    }

    /// Every known block among `hashes`, in request order.
    ///
    /// `Ok` only if all were found; otherwise `UnknownBlock` with the blocks
    /// that were.
    pub fn get_blocks(&self, hashes: &[Hash]) -> (GetBlocksStatus, Vec<HashedBlock>) {
        let blocks: Vec<HashedBlock> = hashes
            .iter()
            .filter_map(|h| self.live(h))
            .map(|n| n.block.as_ref().clone())
            .collect();
        let status = if blocks.len() == hashes.len() {
            GetBlocksStatus::Ok
        } else {
            GetBlocksStatus::UnknownBlock
        };
        (status, blocks)
    }

    /// Canonical hashes from `start_height` up to and including the head.
    pub fn get_ancestors(&self, start_height: u64) -> Result<Ancestors, BlocktreeError> {
        let head = self.head();
        if start_height > head.height {
            return Err(BlocktreeError::StartAboveHead {
                start: start_height,
                head: head.height,
            });
        }
        let hashes = self.canonical[start_height as usize..]
            .iter()
            .map(|&i| self.node(i).hash())
            .collect();
        Ok(Ancestors {
            head: head.hash,
            head_height: head.height,
            hashes,
        })
    }

    /// Balance at the canonical head.
    pub fn balance(&self, public_key: &PublicKey) -> Balance {
        self.ledger.balance(public_key)
    }

    /// Ledger at the canonical head.
    pub fn ledger(&self) -> &LedgerState {
        &self.ledger
    }

    pub fn validator(&self) -> &Arc<BlockValidator> {
        &self.validator
    }

    pub fn config(&self) -> &BlocktreeConfig {
        &self.config
    }

    /// Number of live accepted blocks, genesis included.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc_01_ledger_state::SourceFundedBounty;
    use sc_02_block_validator::{FixedTimeSource, StakeWeightedEligibility, ValidatorConfig};
    use shared_crypto::{BlockBuilder, Ed25519Blake3, Ed25519KeyPair, GenesisBuilder, TransactionBuilder};
    use shared_types::Transaction;

    const GENESIS_TIME: u64 = 1_000;
    const FULL: u128 = 1 << 64;
    const HALF: u128 = 1 << 63;

    struct Harness {
        validator: Arc<BlockValidator>,
        time: Arc<FixedTimeSource>,
        genesis: HashedBlock,
        alice: Ed25519KeyPair,
        bob: Ed25519KeyPair,
    }

    fn harness() -> Harness {
        let alice = Ed25519KeyPair::from_seed([1; 32]);
        let bob = Ed25519KeyPair::from_seed([2; 32]);
        let crypto = Arc::new(Ed25519Blake3);
        let time = Arc::new(FixedTimeSource::new(GENESIS_TIME + 10_000));

        let genesis = GenesisBuilder::new()
            .allocate(alice.public_key_bytes(), 1_000)
            .timestamp(GENESIS_TIME)
            .build_with_key(&Ed25519KeyPair::from_seed([9; 32]), crypto.as_ref())
            .unwrap();

        let validator = Arc::new(BlockValidator::new(
            crypto,
            Arc::new(StakeWeightedEligibility),
            Arc::new(SourceFundedBounty),
            time.clone(),
            ValidatorConfig::for_testing(),
        ));

        Harness {
            validator,
            time,
            genesis,
            alice,
            bob,
        }
    }

    impl Harness {
        fn tree(&self) -> Blocktree {
            Blocktree::new(
                self.genesis.clone(),
                self.validator.clone(),
                self.time.clone(),
                BlocktreeConfig::for_testing(),
            )
            .unwrap()
        }

        /// Build an eligible child of `parent` (which must be in `tree`)
        /// whose own weight satisfies `accept`.
        fn child(
            &self,
            tree: &Blocktree,
            parent: &HashedBlock,
            txs: Vec<Transaction>,
            accept: impl Fn(u128) -> bool,
        ) -> HashedBlock {
            let crypto = self.validator.crypto().as_ref();
            let snapshot = tree.snapshot_at(tree.index[&parent.hash]).unwrap();
            let staker = self.alice.public_key_bytes();

            let mut ts = parent.block().timestamp + 1;
            loop {
                let target = self
                    .validator
                    .eligibility()
                    .target_for(&parent.hash, ts, &staker, crypto);
                let candidate = BlockBuilder::new(&self.alice, parent.hash, parent.height() + 1)
                    .timestamp(ts)
                    .target_hash(target)
                    .transactions(txs.clone())
                    .build(crypto);
                let weight = self
                    .validator
                    .eligibility()
                    .evaluate(candidate.block(), &snapshot, crypto);
                if weight.is_some_and(&accept) {
                    return candidate;
                }
                ts += 1;
            }
        }

        fn any_child(&self, tree: &Blocktree, parent: &HashedBlock) -> HashedBlock {
            self.child(tree, parent, vec![], |_| true)
        }

        fn pay_bob(&self, tokens: u64, op_index: u32) -> Transaction {
            TransactionBuilder::new()
                .add_transfer(&self.alice, self.bob.public_key_bytes(), tokens, op_index)
                .build()
                .unwrap()
        }
    }

    fn accepted(outcome: Result<InsertOutcome, InsertError>) -> bool {
        matches!(outcome, Ok(InsertOutcome::Accepted { .. }))
    }

    #[test]
    fn test_extend_head() {
        let h = harness();
        let mut tree = h.tree();
        let b1 = h.any_child(&tree, &h.genesis);

        assert_eq!(
            tree.insert(b1.clone()),
            Ok(InsertOutcome::Accepted {
                head_changed: true,
                released: 0
            })
        );
        assert_eq!(tree.head().hash, b1.hash);
        assert_eq!(tree.head().height, 1);
        assert_eq!(tree.status(&b1.hash), BlockStatus::Canonical);
        assert_eq!(tree.insert(b1), Ok(InsertOutcome::AlreadyKnown));
    }

    #[test]
    fn test_ledger_follows_head() {
        let h = harness();
        let mut tree = h.tree();
        let b1 = h.child(&tree, &h.genesis, vec![h.pay_bob(100, 1)], |_| true);
        assert!(accepted(tree.insert(b1)));

        assert_eq!(tree.balance(&h.bob.public_key_bytes()), Balance::new(100, 0));
        assert_eq!(tree.balance(&h.alice.public_key_bytes()), Balance::new(900, 1));
        assert_eq!(tree.ledger().total_supply(), 1_000);
    }

    #[test]
    fn test_heavier_branch_reorgs_ledger() {
        let h = harness();
        let mut tree = h.tree();

        let light = h.child(&tree, &h.genesis, vec![h.pay_bob(100, 1)], |w| w < HALF / 2);
        assert!(accepted(tree.insert(light.clone())));
        assert_eq!(tree.balance(&h.bob.public_key_bytes()).tokens, 100);

        let heavy = h.child(&tree, &h.genesis, vec![h.pay_bob(7, 1)], |w| w > HALF);
        assert_eq!(
            tree.insert(heavy.clone()),
            Ok(InsertOutcome::Accepted {
                head_changed: true,
                released: 0
            })
        );

        assert_eq!(tree.head().hash, heavy.hash);
        assert_eq!(tree.status(&light.hash), BlockStatus::Orphaned);
        assert_eq!(tree.balance(&h.bob.public_key_bytes()), Balance::new(7, 0));
        assert_eq!(tree.balance(&h.alice.public_key_bytes()), Balance::new(993, 1));
    }

    #[test]
    fn test_lighter_fork_does_not_move_head() {
        let h = harness();
        let mut tree = h.tree();

        let heavy = h.child(&tree, &h.genesis, vec![], |w| w > HALF);
        tree.insert(heavy.clone()).unwrap();
        let light = h.child(&tree, &h.genesis, vec![], |w| w < HALF / 2);

        assert_eq!(
            tree.insert(light.clone()),
            Ok(InsertOutcome::Accepted {
                head_changed: false,
                released: 0
            })
        );
        assert_eq!(tree.head().hash, heavy.hash);
        assert_eq!(tree.status(&light.hash), BlockStatus::Orphaned);
    }

    #[test]
    fn test_orphan_validated_against_its_own_parent() {
        let h = harness();
        let mut tree = h.tree();

        // Canonical chain spends op_index 1.
        let a1 = h.child(&tree, &h.genesis, vec![h.pay_bob(10, 1)], |w| w > HALF);
        tree.insert(a1).unwrap();

        // A sibling may reuse op_index 1: its parent snapshot is genesis.
        let b1 = h.child(&tree, &h.genesis, vec![h.pay_bob(20, 1)], |w| w < HALF / 2);
        assert!(accepted(tree.insert(b1.clone())));

        let diff = tree.block_with_diff(&b1.hash).unwrap();
        let alice = diff
            .diff
            .iter()
            .find(|p| p.public_key == h.alice.public_key_bytes())
            .unwrap();
        assert_eq!(alice.before, Balance::new(1_000, 0));
        assert_eq!(alice.after, Balance::new(980, 1));
    }

    #[test]
    fn test_out_of_order_children_are_released() {
        let h = harness();
        let mut builder = h.tree();
        let b1 = h.any_child(&builder, &h.genesis);
        builder.insert(b1.clone()).unwrap();
        let b2 = h.any_child(&builder, &b1);
        builder.insert(b2.clone()).unwrap();
        let b3 = h.any_child(&builder, &b2);

        let mut tree = h.tree();
        assert_eq!(tree.insert(b3.clone()), Ok(InsertOutcome::Pending));
        assert_eq!(tree.insert(b2.clone()), Ok(InsertOutcome::Pending));
        assert_eq!(tree.status(&b3.hash), BlockStatus::PendingParent);
        assert_eq!(tree.pending_len(), 2);

        assert_eq!(
            tree.insert(b1),
            Ok(InsertOutcome::Accepted {
                head_changed: true,
                released: 2
            })
        );
        assert_eq!(tree.head().hash, b3.hash);
        assert_eq!(tree.pending_len(), 0);
    }

    #[test]
    fn test_pending_blocks_expire() {
        let h = harness();
        let mut builder = h.tree();
        let b1 = h.any_child(&builder, &h.genesis);
        builder.insert(b1.clone()).unwrap();
        let b2 = h.any_child(&builder, &b1);

        let mut tree = h.tree();
        tree.insert(b2.clone()).unwrap();

        // pending_retention_secs is 30.
        h.time.advance(30);
        assert!(tree.gc_pending().is_empty());
        assert_eq!(tree.status(&b2.hash), BlockStatus::PendingParent);

        h.time.advance(1);
        assert_eq!(tree.gc_pending(), vec![b2.hash]);
        assert_eq!(tree.status(&b2.hash), BlockStatus::Unknown);
        assert_eq!(tree.pending_len(), 0);

        // The parent no longer releases anything.
        assert_eq!(
            tree.insert(b1),
            Ok(InsertOutcome::Accepted {
                head_changed: true,
                released: 0
            })
        );
        assert!(!tree.contains(&b2.hash));
    }

    #[test]
    fn test_pending_overflow_evicts_oldest() {
        let h = harness();
        let mut tree = h.tree();
        let crypto = h.validator.crypto().as_ref();

        // max_pending_blocks is 8; each block is received one second later.
        let waiting: Vec<HashedBlock> = (0..10u64)
            .map(|i| {
                BlockBuilder::new(&h.alice, [0xAB; 32], 5)
                    .timestamp(GENESIS_TIME + i)
                    .build(crypto)
            })
            .collect();
        for block in &waiting {
            assert_eq!(tree.insert(block.clone()), Ok(InsertOutcome::Pending));
            h.time.advance(1);
        }

        assert_eq!(tree.pending_len(), 8);
        for block in &waiting[..2] {
            assert_eq!(tree.status(&block.hash), BlockStatus::Unknown);
        }
        for block in &waiting[2..] {
            assert_eq!(tree.status(&block.hash), BlockStatus::PendingParent);
        }
    }

    #[test]
    fn test_bad_signature_is_rejected_and_remembered() {
        let h = harness();
        let mut tree = h.tree();
        let mut b1 = h.any_child(&tree, &h.genesis);
        b1.signed_block.signature[0] ^= 0x01;
        b1.compute_hash(h.validator.crypto().as_ref());

        assert_eq!(
            tree.insert(b1.clone()),
            Err(InsertError::Invalid(ValidationError::BadSignature))
        );
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.status(&b1.hash), BlockStatus::Rejected);
        assert_eq!(tree.insert(b1), Err(InsertError::PreviouslyRejected));
    }

    #[test]
    fn test_hash_mismatch_does_not_poison_real_hash() {
        let h = harness();
        let mut tree = h.tree();
        let b1 = h.any_child(&tree, &h.genesis);

        let mut forged = b1.clone();
        forged.signed_block.block.timestamp += 1;
        assert!(matches!(
            tree.insert(forged),
            Err(InsertError::Invalid(ValidationError::HashMismatch { .. }))
        ));

        assert!(accepted(tree.insert(b1)));
    }

    #[test]
    fn test_child_of_rejected_block_is_refused() {
        let h = harness();
        let mut tree = h.tree();
        let crypto = h.validator.crypto().as_ref();

        // Eligible and well signed, but overspends.
        let overspend = h.child(&tree, &h.genesis, vec![h.pay_bob(5_000, 1)], |_| true);
        assert!(matches!(
            tree.insert(overspend.clone()),
            Err(InsertError::Invalid(ValidationError::LedgerRejected(_)))
        ));
        assert_eq!(tree.status(&overspend.hash), BlockStatus::Rejected);

        let orphan = BlockBuilder::new(&h.alice, overspend.hash, 2)
            .timestamp(overspend.block().timestamp + 1)
            .build(crypto);
        assert_eq!(
            tree.insert(orphan.clone()),
            Err(InsertError::RejectedAncestor {
                parent: overspend.hash
            })
        );
        assert_eq!(tree.status(&orphan.hash), BlockStatus::Rejected);
    }

    #[test]
    fn test_second_genesis_is_unknown_parent() {
        let h = harness();
        let mut tree = h.tree();
        let other = GenesisBuilder::new()
            .allocate(h.bob.public_key_bytes(), 5)
            .build_with_key(&Ed25519KeyPair::from_seed([8; 32]), h.validator.crypto().as_ref())
            .unwrap();

        assert!(matches!(
            tree.insert(other),
            Err(InsertError::Invalid(ValidationError::UnknownParent(_)))
        ));
    }

    #[test]
    fn test_get_blocks_partial() {
        let h = harness();
        let mut tree = h.tree();
        let b1 = h.any_child(&tree, &h.genesis);
        tree.insert(b1.clone()).unwrap();

        let (status, blocks) = tree.get_blocks(&[b1.hash, [0xAB; 32]]);
        assert_eq!(status, GetBlocksStatus::UnknownBlock);
        assert_eq!(blocks, vec![b1.clone()]);

        let (status, blocks) = tree.get_blocks(&[h.genesis.hash, b1.hash]);
        assert_eq!(status, GetBlocksStatus::Ok);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn test_get_ancestors() {
        let h = harness();
        let mut tree = h.tree();
        let b1 = h.any_child(&tree, &h.genesis);
        tree.insert(b1.clone()).unwrap();
        let b2 = h.any_child(&tree, &b1);
        tree.insert(b2.clone()).unwrap();

        let all = tree.get_ancestors(0).unwrap();
        assert_eq!(all.head, b2.hash);
        assert_eq!(all.head_height, 2);
        assert_eq!(all.hashes, vec![h.genesis.hash, b1.hash, b2.hash]);

        assert_eq!(tree.get_ancestors(2).unwrap().hashes, vec![b2.hash]);
        assert_eq!(
            tree.get_ancestors(3),
            Err(BlocktreeError::StartAboveHead { start: 3, head: 2 })
        );
    }

    #[test]
    fn test_orphan_branch_is_pruned_once_it_cannot_catch_up() {
        let h = harness();
        let mut tree = h.tree();
        let heavy = |w: u128| w > FULL - FULL / 4;

        let main1 = h.child(&tree, &h.genesis, vec![], heavy);
        tree.insert(main1.clone()).unwrap();
        let side = h.child(&tree, &h.genesis, vec![], |w| w < FULL / 4);
        tree.insert(side.clone()).unwrap();
        assert_eq!(tree.status(&side.hash), BlockStatus::Orphaned);

        // prune_depth is 4: three blocks of at most FULL each cannot put
        // the head four full blocks ahead.
        let mut tip = main1;
        for _ in 0..2 {
            let next = h.child(&tree, &tip, vec![], heavy);
            tree.insert(next.clone()).unwrap();
            tip = next;
        }
        assert_eq!(tree.status(&side.hash), BlockStatus::Orphaned);

        // Seven blocks above 3/4 FULL leave side more than four full
        // blocks behind.
        for _ in 0..4 {
            let next = h.child(&tree, &tip, vec![], heavy);
            tree.insert(next.clone()).unwrap();
            tip = next;
        }
        assert_eq!(tree.head().height, 7);
        assert_eq!(tree.status(&side.hash), BlockStatus::Pruned);
        assert!(!tree.contains(&side.hash));
        assert_eq!(tree.insert(side), Err(InsertError::Pruned));

        let late = h.any_child(&tree, &h.genesis);
        assert_eq!(tree.insert(late.clone()), Err(InsertError::Pruned));
        assert_eq!(tree.status(&late.hash), BlockStatus::Pruned);
    }

    #[test]
    fn test_short_heavy_fork_wins_against_longer_chain_in_any_order() {
        let h = harness();

        // Six light blocks: taller than prune_depth, lighter than one
        // heavy block.
        let mut builder = h.tree();
        let mut long = Vec::new();
        let mut tip = h.genesis.clone();
        for _ in 0..6 {
            let next = h.child(&builder, &tip, vec![], |w| w < FULL >> 6);
            builder.insert(next.clone()).unwrap();
            long.push(next.clone());
            tip = next;
        }
        let short = h.child(&h.tree(), &h.genesis, vec![h.pay_bob(40, 1)], |w| w > HALF);

        let mut long_first = h.tree();
        for block in &long {
            tree_insert_ok(&mut long_first, block);
        }
        assert_eq!(long_first.head().height, 6);
        tree_insert_ok(&mut long_first, &short);

        let mut short_first = h.tree();
        tree_insert_ok(&mut short_first, &short);
        for block in &long {
            tree_insert_ok(&mut short_first, block);
        }

        for tree in [&long_first, &short_first] {
            assert_eq!(tree.head().hash, short.hash);
            assert_eq!(tree.status(&long[5].hash), BlockStatus::Orphaned);
            assert_eq!(tree.balance(&h.bob.public_key_bytes()), Balance::new(40, 0));
            assert_eq!(tree.balance(&h.alice.public_key_bytes()), Balance::new(960, 1));
        }
        assert_eq!(long_first.head(), short_first.head());
    }

    fn tree_insert_ok(tree: &mut Blocktree, block: &HashedBlock) {
        assert!(accepted(tree.insert(block.clone())), "{}", short_hex(&block.hash));
    }

    #[test]
    fn test_failed_ledger_move_stores_nothing() {
        let h = harness();
        let mut tree = h.tree();
        let b1 = h.any_child(&tree, &h.genesis);

        // Patches that do not match the ledger at genesis.
        let validated = ValidatedBlock {
            hash: b1.hash,
            patches: vec![BalancePatch {
                public_key: h.bob.public_key_bytes(),
                before: Balance::new(55, 0),
                after: Balance::new(60, 0),
            }],
            weight: HALF,
        };

        assert!(matches!(
            tree.commit(b1.clone(), 0, validated),
            Err(InsertError::Internal(_))
        ));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.nodes.len(), 1);
        assert!(tree.node(0).children.is_empty());
        assert_eq!(tree.head().hash, h.genesis.hash);
        assert_eq!(tree.status(&b1.hash), BlockStatus::Unknown);
        assert_eq!(tree.balance(&h.bob.public_key_bytes()), Balance::default());

        // The genuine block still goes in.
        assert!(accepted(tree.insert(b1)));
    }
}
