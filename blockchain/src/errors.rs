use thiserror::Error;

use types::Hash;

#[derive(Error, Debug)]
pub enum BlockChainError {
    /// The parent is not in the index yet. Orphan buffering is the ingest
    /// collaborator's policy; the index only links complete trees.
    #[error("parent block not found in index")]
    MissingParent(Hash),
    /// The parent sits at height 0, where the chain ends.
    #[error("chain is terminated, height 0 blocks have no children")]
    TerminalParent(Hash),
    /// A genesis insert was attempted into an index that already has one.
    #[error("genesis block already present")]
    GenesisAlreadyPresent,
}
