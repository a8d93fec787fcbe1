use anyhow::{ensure, Result};

pub mod block;
pub mod compact;
pub mod network;

pub type Hash = [u8; 32];

pub const ZERO_HASH: Hash = [0; 32];

/// Parses a hash from its display form (big-endian hex, the order block
/// explorers print) into wire byte order.
pub fn hash_from_hex(s: &str) -> Result<Hash> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let raw = hex::decode(s)?;
    ensure!(raw.len() == 32, "expected 32 byte hash, got {}", raw.len());
    let mut hash: Hash = raw.as_slice().try_into()?;
    hash.reverse();
    Ok(hash)
}

/// Formats a wire-order hash the way explorers display it.
pub fn hash_to_hex(hash: &Hash) -> String {
    let mut display = *hash;
    display.reverse();
    hex::encode(display)
}
