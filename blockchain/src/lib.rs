pub mod chain;
pub mod chain_state;
pub mod errors;
pub mod index;

pub use chain::ActiveChain;
pub use chain_state::ChainState;
pub use errors::BlockChainError;
pub use index::{block_proof, get_skip_height, BlockIndex, BlockIndexEntry, BlockStatus, NodeId};
