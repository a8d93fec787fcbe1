use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use traits::Consensus;
use types::block::{BlockHeader, IndexedBlockHeader};
use types::compact::Compact;
use types::{hash_to_hex, Hash};

use crate::chain::ActiveChain;
use crate::index::{BlockIndex, NodeId};

/// Owns the header tree and the active view over it, and runs the validated
/// ingest path. Mutation goes through the exclusive receiver, so writes are
/// serialized by construction; readers share the state freely in between.
pub struct ChainState {
    index: BlockIndex,
    active: ActiveChain,
    consensus: Arc<dyn Consensus>,
}

impl ChainState {
    /// Boots an index holding only the network genesis.
    pub fn new(consensus: Arc<dyn Consensus>) -> Result<Self> {
        let genesis = consensus.genesis_header();
        let mut index = BlockIndex::new();
        let genesis_id = index.insert_genesis(&genesis)?;
        let mut active = ActiveChain::new();
        active.set_tip(&index, genesis_id);
        info!(
            network = ?consensus.network(),
            hash = %hash_to_hex(&genesis.hash()),
            "chain state booted at genesis"
        );
        Ok(Self {
            index,
            active,
            consensus,
        })
    }

    /// Full ingest of one externally supplied header: contextual
    /// verification, linking into the tree, and a tip switch whenever the
    /// new node carries strictly more work than the current tip.
    pub fn insert_header(&mut self, header: &BlockHeader) -> Result<NodeId> {
        self.consensus.verify_header(&self.index, header)?;
        let id = self.index.insert_header(header)?;

        let tip = self.active.tip().expect("active chain always has a tip");
        if self.index.entry(id).chain_work > self.index.entry(tip).chain_work {
            let fork = self.active.find_fork(&self.index, id);
            if fork != Some(tip) {
                warn!(
                    from = %hash_to_hex(&self.index.entry(tip).block_hash),
                    to = %hash_to_hex(&self.index.entry(id).block_hash),
                    fork_height = fork.map(|f| self.index.entry(f).height),
                    "reorganizing active chain"
                );
            }
            self.active.set_tip(&self.index, id);
            info!(
                height = self.index.entry(id).height,
                hash = %hash_to_hex(&self.index.entry(id).block_hash),
                "chain tip advanced"
            );
        } else {
            debug!(
                height = self.index.entry(id).height,
                hash = %hash_to_hex(&self.index.entry(id).block_hash),
                "stored header off the best chain"
            );
        }
        Ok(id)
    }

    pub fn index(&self) -> &BlockIndex {
        &self.index
    }

    pub fn active(&self) -> &ActiveChain {
        &self.active
    }

    pub fn current_header(&self) -> IndexedBlockHeader {
        let tip = self.active.tip().expect("active chain always has a tip");
        self.index.indexed_header(tip)
    }

    /// Target the next block on the active chain must meet.
    pub fn next_work_required(&self) -> Result<Compact> {
        let tip = self.current_header();
        self.consensus.work_required(&self.index, &tip.hash)
    }

    pub fn locator(&self) -> Vec<Hash> {
        self.active.locator(&self.index)
    }
}
