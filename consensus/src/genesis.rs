use codec::{put_i32_le, put_i64_le, put_u32_le, put_var_int};
use types::block::BlockHeader;
use types::network::ChainParams;
use types::{hash_from_hex, hash_to_hex, Hash, ZERO_HASH};

use crate::coin::Amount;

/// The classic uncompressed key the genesis coinbase pays to.
const GENESIS_OUTPUT_PUBKEY: &str = "04678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5f";

const OP_CHECKSIG: u8 = 0xac;

/// scriptSig of the genesis coinbase: the customary nBits push, a script
/// number 4, then the timestamp message.
fn genesis_script_sig(timestamp: &str) -> Vec<u8> {
    let mut script = Vec::with_capacity(timestamp.len() + 8);
    script.push(0x04);
    script.extend_from_slice(&486604799u32.to_le_bytes());
    script.extend_from_slice(&[0x01, 0x04]);
    script.push(timestamp.len() as u8);
    script.extend_from_slice(timestamp.as_bytes());
    script
}

fn genesis_script_pubkey() -> Vec<u8> {
    let pubkey = hex::decode(GENESIS_OUTPUT_PUBKEY).expect("genesis pubkey literal");
    let mut script = Vec::with_capacity(pubkey.len() + 2);
    script.push(pubkey.len() as u8);
    script.extend_from_slice(&pubkey);
    script.push(OP_CHECKSIG);
    script
}

/// Serializes the single coinbase transaction of the genesis block. With one
/// transaction in the block, its txid is the merkle root.
fn genesis_coinbase_tx(timestamp: &str, reward: Amount) -> Vec<u8> {
    let script_sig = genesis_script_sig(timestamp);
    let script_pubkey = genesis_script_pubkey();

    let mut tx = Vec::with_capacity(134 + timestamp.len());
    put_i32_le(&mut tx, 1); // tx version
    put_var_int(&mut tx, 1); // inputs
    tx.extend_from_slice(&ZERO_HASH);
    put_u32_le(&mut tx, 0xffffffff); // null prevout index
    put_var_int(&mut tx, script_sig.len() as u64);
    tx.extend_from_slice(&script_sig);
    put_u32_le(&mut tx, 0xffffffff); // sequence
    put_var_int(&mut tx, 1); // outputs
    put_i64_le(&mut tx, reward);
    put_var_int(&mut tx, script_pubkey.len() as u64);
    tx.extend_from_slice(&script_pubkey);
    put_u32_le(&mut tx, 0); // locktime
    tx
}

pub fn genesis_merkle_root(timestamp: &str, reward: Amount) -> Hash {
    crypto::dhash256(genesis_coinbase_tx(timestamp, reward)).to_fixed_bytes()
}

/// Assembles the network's genesis header from its descriptor.
pub fn genesis_block_header(params: &ChainParams) -> BlockHeader {
    let descriptor = &params.genesis;
    BlockHeader {
        version: descriptor.version,
        parent_hash: ZERO_HASH,
        merkle_root: genesis_merkle_root(descriptor.coinbase_timestamp, descriptor.reward),
        time: descriptor.time,
        bits: descriptor.bits,
        nonce: descriptor.nonce,
    }
}

/// Builds the genesis header and checks it against the asserted network
/// literals. A mismatch means the build is not on the network it claims to
/// be, so startup dies here.
pub fn checked_genesis_header(params: &ChainParams) -> BlockHeader {
    let header = genesis_block_header(params);
    let expected_merkle =
        hash_from_hex(params.genesis.merkle_root).expect("genesis merkle literal");
    let expected_hash = hash_from_hex(params.genesis.hash).expect("genesis hash literal");
    assert_eq!(
        header.merkle_root,
        expected_merkle,
        "{:?} genesis merkle root mismatch: built {}",
        params.network,
        hash_to_hex(&header.merkle_root),
    );
    assert_eq!(
        header.hash(),
        expected_hash,
        "{:?} genesis hash mismatch: built {}",
        params.network,
        hash_to_hex(&header.hash()),
    );
    header
}
