use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;

use traits::ChainHeadReader;
use types::block::{BlockHeader, IndexedBlockHeader};
use types::network::GENESIS_HEIGHT;
use types::{Hash, ZERO_HASH};

pub const BASE_TIME: u32 = 1_767_462_992;

/// Header store for consensus tests: a single chain kept in insertion
/// order, heights assigned downward from genesis.
#[derive(Default)]
pub struct MemoryBlockHeaderReader {
    by_order: RwLock<Vec<IndexedBlockHeader>>,
    by_hash: RwLock<HashMap<Hash, usize>>,
}

impl MemoryBlockHeaderReader {
    pub fn insert(&self, header: BlockHeader) -> IndexedBlockHeader {
        let mut by_order = self.by_order.write().unwrap();
        let height = GENESIS_HEIGHT - by_order.len() as u32;
        let indexed = IndexedBlockHeader::from_raw(header, height);
        self.by_hash
            .write()
            .unwrap()
            .insert(indexed.hash, by_order.len());
        by_order.push(indexed.clone());
        indexed
    }

    pub fn tip(&self) -> IndexedBlockHeader {
        self.by_order.read().unwrap().last().unwrap().clone()
    }
}

impl ChainHeadReader for MemoryBlockHeaderReader {
    fn get_header(&self, hash: &Hash, _height: u32) -> Result<Option<IndexedBlockHeader>> {
        self.get_header_by_hash(hash)
    }

    fn get_header_by_hash(&self, hash: &Hash) -> Result<Option<IndexedBlockHeader>> {
        let by_hash = self.by_hash.read().unwrap();
        Ok(by_hash.get(hash).map(|position| {
            let by_order = self.by_order.read().unwrap();
            by_order[*position].clone()
        }))
    }
}

/// Genesis plus `blocks` descendants, every header carrying `bits` and
/// timestamps `spacing` seconds apart.
pub fn build_chain(
    reader: &MemoryBlockHeaderReader,
    blocks: u32,
    bits: u32,
    spacing: u32,
) -> IndexedBlockHeader {
    let mut parent_hash = ZERO_HASH;
    let mut tip = None;
    for i in 0..=blocks {
        let header = BlockHeader {
            version: 1,
            parent_hash,
            merkle_root: ZERO_HASH,
            time: BASE_TIME + i * spacing,
            bits,
            nonce: i,
        };
        let indexed = reader.insert(header);
        parent_hash = indexed.hash;
        tip = Some(indexed);
    }
    tip.unwrap()
}
