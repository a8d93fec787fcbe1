use std::collections::HashMap;

use anyhow::Result;
use primitive_types::U256;

use traits::ChainHeadReader;
use types::block::{BlockHeader, IndexedBlockHeader};
use types::compact::{work_from_target, Compact};
use types::network::{is_older, ChainParams, GENESIS_HEIGHT};
use types::{Hash, ZERO_HASH};

use crate::errors::BlockChainError;

/// Stable handle into the index arena. Ids never move or expire while the
/// index lives, so they can be held across calls by readers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(usize);

/// Validation state bits, opaque to the index itself and surfaced to the
/// collaborators that manage them.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct BlockStatus(u32);

impl BlockStatus {
    pub const VALID_HEADER: BlockStatus = BlockStatus(1);
    pub const VALID_TREE: BlockStatus = BlockStatus(2);
    pub const FAILED: BlockStatus = BlockStatus(32);

    pub fn with(self, other: BlockStatus) -> BlockStatus {
        BlockStatus(self.0 | other.0)
    }

    pub fn has(&self, other: BlockStatus) -> bool {
        self.0 & other.0 == other.0
    }
}

/// One linked header. Structural fields are fixed at insertion; only the
/// status bits change afterwards.
pub struct BlockIndexEntry {
    pub block_hash: Hash,
    pub parent: Option<NodeId>,
    pub skip: Option<NodeId>,
    pub height: u32,
    /// Cumulative work from genesis through this block.
    pub chain_work: U256,
    /// Largest timestamp on the path from genesis, inclusive.
    pub time_max: u32,
    pub status: BlockStatus,
    pub version: i32,
    pub merkle_root: Hash,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockIndexEntry {
    pub fn difficulty(&self) -> Compact {
        Compact::from(self.bits)
    }
}

/// Turn the lowest '1' bit in the binary representation of a number into a '0'.
#[inline]
fn invert_lowest_one(n: u32) -> u32 {
    n & n.wrapping_sub(1)
}

/// Height the skip pointer of a block at `height` aims at. Ancestors live at
/// higher heights, so the jump target is computed on the distance from
/// genesis and mapped back.
pub fn get_skip_height(height: u32) -> u32 {
    if height >= GENESIS_HEIGHT - 1 {
        return GENESIS_HEIGHT;
    }

    let distance = GENESIS_HEIGHT - height;
    let skip_distance = if distance & 1 == 1 {
        invert_lowest_one(invert_lowest_one(distance - 1)) + 1
    } else {
        invert_lowest_one(distance)
    };
    GENESIS_HEIGHT - skip_distance
}

/// Work a block at this target contributes to its chain. Undecodable or
/// zero targets count nothing, matching how peers score such headers.
pub fn block_proof(bits: Compact) -> U256 {
    let target = match bits.to_u256() {
        Ok(target) => target,
        Err(_) => return U256::zero(),
    };
    if target.is_zero() {
        return U256::zero();
    }
    work_from_target(target)
}

/// In-memory tree of all observed headers. Entries are arena-allocated and
/// never removed; parent and skip references are arena ids, which keeps the
/// graph free of ownership cycles and cheap to share with readers.
#[derive(Default)]
pub struct BlockIndex {
    entries: Vec<BlockIndexEntry>,
    by_hash: HashMap<Hash, NodeId>,
}

impl BlockIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, id: NodeId) -> &BlockIndexEntry {
        &self.entries[id.0]
    }

    pub fn lookup(&self, hash: &Hash) -> Option<NodeId> {
        self.by_hash.get(hash).copied()
    }

    pub fn genesis(&self) -> Option<NodeId> {
        (!self.entries.is_empty()).then_some(NodeId(0))
    }

    /// Seeds the index with the root of the tree at the top height.
    pub fn insert_genesis(&mut self, header: &BlockHeader) -> Result<NodeId, BlockChainError> {
        if !self.entries.is_empty() {
            return Err(BlockChainError::GenesisAlreadyPresent);
        }
        let id = NodeId(0);
        self.entries.push(BlockIndexEntry {
            block_hash: header.hash(),
            parent: None,
            skip: None,
            height: GENESIS_HEIGHT,
            chain_work: block_proof(header.difficulty()),
            time_max: header.time,
            status: BlockStatus::VALID_HEADER.with(BlockStatus::VALID_TREE),
            version: header.version,
            merkle_root: header.merkle_root,
            time: header.time,
            bits: header.bits,
            nonce: header.nonce,
        });
        self.by_hash.insert(header.hash(), id);
        Ok(id)
    }

    /// Links a header under its parent. Idempotent on the block hash; the
    /// parent must already be present (orphans are the caller's problem).
    /// The new node takes `parent.height - 1`, accumulates chain work and
    /// the running time maximum, and gets its skip pointer built.
    pub fn insert_header(&mut self, header: &BlockHeader) -> Result<NodeId, BlockChainError> {
        let hash = header.hash();
        if let Some(existing) = self.lookup(&hash) {
            return Ok(existing);
        }

        let parent_id = self
            .lookup(&header.parent_hash)
            .ok_or(BlockChainError::MissingParent(header.parent_hash))?;
        let parent = self.entry(parent_id);
        if parent.height == 0 {
            return Err(BlockChainError::TerminalParent(header.parent_hash));
        }

        let height = parent.height - 1;
        let entry = BlockIndexEntry {
            block_hash: hash,
            parent: Some(parent_id),
            skip: None,
            height,
            chain_work: parent.chain_work + block_proof(header.difficulty()),
            time_max: parent.time_max.max(header.time),
            status: BlockStatus::VALID_HEADER.with(BlockStatus::VALID_TREE),
            version: header.version,
            merkle_root: header.merkle_root,
            time: header.time,
            bits: header.bits,
            nonce: header.nonce,
        };
        let id = NodeId(self.entries.len());
        self.entries.push(entry);
        let skip = self.get_ancestor(parent_id, get_skip_height(height));
        self.entries[id.0].skip = skip;
        self.by_hash.insert(hash, id);
        Ok(id)
    }

    pub fn set_status(&mut self, id: NodeId, status: BlockStatus) {
        self.entries[id.0].status = status;
    }

    /// Ancestor of `id` at exactly `height`, or `None` when the height is
    /// outside the node's lineage. Follows skip pointers where they do not
    /// overshoot, giving O(log distance) walks.
    pub fn get_ancestor(&self, id: NodeId, height: u32) -> Option<NodeId> {
        let node = self.entry(id);
        if height < node.height || height > GENESIS_HEIGHT {
            return None;
        }

        let mut walk = id;
        let mut height_walk = node.height;
        while height_walk < height {
            let height_skip = get_skip_height(height_walk);
            let height_skip_prev = get_skip_height(height_walk + 1);
            let entry = self.entry(walk);
            let take_skip = match entry.skip {
                // Only follow the skip if the parent's skip would not be the
                // strictly better shortcut.
                Some(_) => {
                    height_skip == height
                        || (height_skip < height
                            && !(height_skip_prev > height_skip + 2 && height_skip_prev <= height))
                }
                None => false,
            };
            if take_skip {
                walk = entry.skip.expect("checked above");
                height_walk = height_skip;
            } else {
                walk = entry
                    .parent
                    .expect("non-genesis index entry without parent");
                height_walk += 1;
            }
        }
        Some(walk)
    }

    /// Deepest node that is an ancestor of both arguments. All branches meet
    /// at genesis, so this always resolves.
    pub fn last_common_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        let height_a = self.entry(a).height;
        let height_b = self.entry(b).height;

        // align at the height of the older block
        let (mut walk_a, mut walk_b) = if is_older(height_a, height_b) {
            (a, self.get_ancestor(b, height_a).expect("b reaches a's height"))
        } else if is_older(height_b, height_a) {
            (self.get_ancestor(a, height_b).expect("a reaches b's height"), b)
        } else {
            (a, b)
        };

        while walk_a != walk_b {
            walk_a = self.entry(walk_a).parent.expect("branches meet at genesis");
            walk_b = self.entry(walk_b).parent.expect("branches meet at genesis");
        }
        walk_a
    }

    /// Sparse hash samples from `from` back toward genesis: dense near the
    /// node, exponentially thinning further out, always ending at genesis.
    pub fn locator_entries(&self, from: NodeId) -> Vec<Hash> {
        let mut step: u32 = 1;
        let mut have = Vec::with_capacity(32);

        let mut index = from;
        loop {
            let entry = self.entry(index);
            have.push(entry.block_hash);
            if entry.height == GENESIS_HEIGHT {
                break;
            }
            // Exponentially larger steps back, toward higher heights.
            let height = entry.height.saturating_add(step).min(GENESIS_HEIGHT);
            index = self
                .get_ancestor(index, height)
                .expect("locator target within lineage");
            if have.len() > 10 {
                step = step.saturating_mul(2);
            }
        }
        have
    }

    /// Reconstructs the wire header of an entry. The parent hash lives on
    /// the parent entry; genesis links to the null hash.
    pub fn header_of(&self, id: NodeId) -> BlockHeader {
        let entry = self.entry(id);
        let parent_hash = match entry.parent {
            Some(parent) => self.entry(parent).block_hash,
            None => ZERO_HASH,
        };
        BlockHeader {
            version: entry.version,
            parent_hash,
            merkle_root: entry.merkle_root,
            time: entry.time,
            bits: entry.bits,
            nonce: entry.nonce,
        }
    }

    pub fn indexed_header(&self, id: NodeId) -> IndexedBlockHeader {
        let entry = self.entry(id);
        IndexedBlockHeader::new(entry.block_hash, entry.height, self.header_of(id))
    }

    /// Signed seconds it would take the network, at the tip's block proof,
    /// to redo the work separating two nodes. Positive when `to` carries
    /// more work than `from`.
    pub fn block_proof_equivalent_time(
        &self,
        to: NodeId,
        from: NodeId,
        tip: NodeId,
        params: &ChainParams,
    ) -> i64 {
        let work_to = self.entry(to).chain_work;
        let work_from = self.entry(from).chain_work;
        let (delta, sign) = if work_to > work_from {
            (work_to - work_from, 1i64)
        } else {
            (work_from - work_to, -1i64)
        };
        let proof = block_proof(self.entry(tip).difficulty());
        if proof.is_zero() {
            return sign.saturating_mul(i64::MAX);
        }
        let seconds = delta * U256::from(params.pow_target_spacing as u64) / proof;
        if seconds.bits() > 63 {
            sign * i64::MAX
        } else {
            sign * seconds.low_u64() as i64
        }
    }
}

impl ChainHeadReader for BlockIndex {
    fn get_header(&self, hash: &Hash, _height: u32) -> Result<Option<IndexedBlockHeader>> {
        self.get_header_by_hash(hash)
    }

    fn get_header_by_hash(&self, hash: &Hash) -> Result<Option<IndexedBlockHeader>> {
        Ok(self.lookup(hash).map(|id| self.indexed_header(id)))
    }
}
