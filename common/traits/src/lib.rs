use anyhow::Result;

use types::block::{BlockHeader, IndexedBlockHeader};
use types::compact::Compact;
use types::network::{ChainParams, Network};
use types::Hash;

/// Read access to linked headers, the view the difficulty engine and header
/// verification walk. Implemented by the block index; tests substitute an
/// in-memory map.
pub trait ChainHeadReader: Send + Sync {
    fn get_header(&self, hash: &Hash, height: u32) -> Result<Option<IndexedBlockHeader>>;
    fn get_header_by_hash(&self, hash: &Hash) -> Result<Option<IndexedBlockHeader>>;
}

pub trait Consensus: Send + Sync {
    fn network(&self) -> Network;
    fn params(&self) -> &ChainParams;
    /// Full contextual header check: parent presence, timestamp sanity,
    /// expected target and proof of work.
    fn verify_header(&self, chain: &dyn ChainHeadReader, header: &BlockHeader) -> Result<()>;
    /// Compact target the block extending `parent` must carry.
    fn work_required(&self, chain: &dyn ChainHeadReader, parent: &Hash) -> Result<Compact>;
    fn miner_reward(&self, height: u32) -> i64;
    /// The network's genesis header, checked against the boot literals.
    fn genesis_header(&self) -> BlockHeader;
}
