use types::network::{is_older, GENESIS_HEIGHT};
use types::Hash;

use crate::index::{BlockIndex, NodeId};

/// The currently-active chain: a dense array over the best-work path,
/// addressed by offset from genesis so any height resolves in O(1).
/// Position 0 is always genesis; position k holds the block at height
/// `GENESIS_HEIGHT - k`, with the tip at the far end.
#[derive(Default)]
pub struct ActiveChain {
    chain: Vec<Option<NodeId>>,
}

impl ActiveChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    fn offset(height: u32) -> usize {
        (GENESIS_HEIGHT - height) as usize
    }

    /// Repoints the view at `tip`, rewriting entries from the tip toward
    /// genesis and stopping at the first slot that already matches: on a
    /// reorganization only the divergent suffix is touched.
    pub fn set_tip(&mut self, index: &BlockIndex, tip: NodeId) {
        let height = index.entry(tip).height;
        assert!(
            height <= GENESIS_HEIGHT,
            "invalid chain depth for height {height}"
        );
        self.chain.resize(Self::offset(height) + 1, None);

        let mut walk = Some(tip);
        while let Some(id) = walk {
            let at = Self::offset(index.entry(id).height);
            if self.chain[at] == Some(id) {
                break;
            }
            self.chain[at] = Some(id);
            walk = index.entry(id).parent;
        }
    }

    pub fn tip(&self) -> Option<NodeId> {
        self.chain.last().copied().flatten()
    }

    pub fn genesis(&self) -> Option<NodeId> {
        self.chain.first().copied().flatten()
    }

    /// Height of the tip, i.e. the lowest height on the active chain.
    pub fn height(&self) -> Option<u32> {
        (!self.chain.is_empty()).then(|| GENESIS_HEIGHT - (self.chain.len() as u32 - 1))
    }

    pub fn at(&self, height: u32) -> Option<NodeId> {
        if height > GENESIS_HEIGHT {
            return None;
        }
        self.chain.get(Self::offset(height)).copied().flatten()
    }

    pub fn contains(&self, index: &BlockIndex, id: NodeId) -> bool {
        self.at(index.entry(id).height) == Some(id)
    }

    /// The active-chain successor of `id`: the block one height below it.
    pub fn next(&self, index: &BlockIndex, id: NodeId) -> Option<NodeId> {
        if !self.contains(index, id) {
            return None;
        }
        let height = index.entry(id).height;
        if height == 0 {
            return None;
        }
        self.at(height - 1)
    }

    /// Highest-work ancestor of `id` that lies on the active chain. Since
    /// every branch roots at genesis this resolves for any indexed node.
    pub fn find_fork(&self, index: &BlockIndex, id: NodeId) -> Option<NodeId> {
        let tip_height = self.height()?;
        // a candidate newer than the tip first climbs to the tip's height
        let mut walk = if is_older(tip_height, index.entry(id).height) {
            index.get_ancestor(id, tip_height)
        } else {
            Some(id)
        };
        while let Some(id) = walk {
            if self.contains(index, id) {
                return Some(id);
            }
            walk = index.entry(id).parent;
        }
        None
    }

    /// First chain entry (closest to genesis) whose running time maximum
    /// reaches `time` and whose height is at least `min_height`. The chain
    /// is stored oldest-first and `time_max` never decreases along it, so a
    /// binary search over the failing prefix finds it.
    pub fn find_earliest_at_least(
        &self,
        index: &BlockIndex,
        time: i64,
        min_height: u32,
    ) -> Option<NodeId> {
        let first = self.chain.partition_point(|slot| {
            let entry = index.entry(slot.expect("active chain slots are filled"));
            i64::from(entry.time_max) < time || entry.height < min_height
        });
        self.chain.get(first).copied().flatten()
    }

    /// Peer-sync locator for the active tip.
    pub fn locator(&self, index: &BlockIndex) -> Vec<Hash> {
        match self.tip() {
            Some(tip) => index.locator_entries(tip),
            None => Vec::new(),
        }
    }
}
