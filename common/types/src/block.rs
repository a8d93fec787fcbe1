use std::fmt::Formatter;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use codec::{put_i32_le, put_u32_le, ConsensusCodec, SliceReader};

use crate::compact::Compact;
use crate::{hash_to_hex, Hash};

/// Fixed-layout block header. The serialized form is 80 bytes and its
/// double-SHA-256 is the block identity.
#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: i32,
    pub parent_hash: Hash,
    pub merkle_root: Hash,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub fn hash(&self) -> Hash {
        crypto::dhash256(self.consensus_encode()).to_fixed_bytes()
    }

    pub fn difficulty(&self) -> Compact {
        Compact::from(self.bits)
    }
}

impl ConsensusCodec for BlockHeader {
    fn consensus_encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(80);
        put_i32_le(&mut buf, self.version);
        buf.extend_from_slice(&self.parent_hash);
        buf.extend_from_slice(&self.merkle_root);
        put_u32_le(&mut buf, self.time);
        put_u32_le(&mut buf, self.bits);
        put_u32_le(&mut buf, self.nonce);
        buf
    }

    fn consensus_decode(buf: &[u8]) -> Result<Self> {
        let mut reader = SliceReader::new(buf);
        let header = BlockHeader {
            version: reader.read_i32_le()?,
            parent_hash: reader.read_array()?,
            merkle_root: reader.read_array()?,
            time: reader.read_u32_le()?,
            bits: reader.read_u32_le()?,
            nonce: reader.read_u32_le()?,
        };
        reader.finish()?;
        Ok(header)
    }
}

impl std::fmt::Debug for BlockHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockHeader")
            .field("hash", &hash_to_hex(&self.hash()))
            .field("parent_hash", &hash_to_hex(&self.parent_hash))
            .field("merkle_root", &hash_to_hex(&self.merkle_root))
            .field("version", &self.version)
            .field("time", &self.time)
            .field("bits", &format_args!("{:#010x}", self.bits))
            .field("nonce", &self.nonce)
            .finish()
    }
}

/// A block header together with the identity and height the index assigned
/// to it. Heights are not part of the wire form; they only exist once a
/// header is linked to its parent.
#[derive(Clone)]
pub struct IndexedBlockHeader {
    pub hash: Hash,
    pub height: u32,
    pub raw: BlockHeader,
}

impl IndexedBlockHeader {
    pub fn new(hash: Hash, height: u32, header: BlockHeader) -> Self {
        IndexedBlockHeader {
            hash,
            height,
            raw: header,
        }
    }

    /// Hashes the header contents to form the identity.
    pub fn from_raw(header: BlockHeader, height: u32) -> Self {
        IndexedBlockHeader::new(header.hash(), height, header)
    }
}

impl PartialEq for IndexedBlockHeader {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for IndexedBlockHeader {}

impl std::fmt::Debug for IndexedBlockHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedBlockHeader")
            .field("hash", &hash_to_hex(&self.hash))
            .field("height", &self.height)
            .field("raw", &self.raw)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::hash_from_hex;

    use super::*;

    fn mainnet_genesis_header() -> BlockHeader {
        BlockHeader {
            version: 1,
            parent_hash: crate::ZERO_HASH,
            merkle_root: hash_from_hex(
                "1f0f98b3c9d7b292e2cfd0cac5fcf46d267df410faa6f8e04d06573a5706c012",
            )
            .unwrap(),
            time: 1767462992,
            bits: 0x1d00ffff,
            nonce: 2306512841,
        }
    }

    #[test]
    fn header_serializes_to_80_bytes() {
        assert_eq!(mainnet_genesis_header().consensus_encode().len(), 80);
    }

    #[test]
    fn header_hash_matches_network_literal() {
        assert_eq!(
            hash_to_hex(&mainnet_genesis_header().hash()),
            "00000000ed7c33729f39094d3fa4e362cec181b7f05e3c53adeb097fc784f6bf"
        );
    }

    #[test]
    fn header_round_trips_through_wire_form() {
        let header = mainnet_genesis_header();
        let decoded = BlockHeader::consensus_decode(&header.consensus_encode()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn header_decode_rejects_wrong_length() {
        let bytes = mainnet_genesis_header().consensus_encode();
        assert!(BlockHeader::consensus_decode(&bytes[..79]).is_err());

        let mut long = bytes.clone();
        long.push(0);
        assert!(BlockHeader::consensus_decode(&long).is_err());
    }

    #[test]
    fn indexed_header_equality_is_identity() {
        let header = mainnet_genesis_header();
        let a = IndexedBlockHeader::from_raw(header, 100_000_000);
        // differing height metadata does not change identity
        let b = IndexedBlockHeader::from_raw(header, 5);
        assert_eq!(a, b);
    }
}
