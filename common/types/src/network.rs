use clap::ArgEnum;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::compact::Compact;

/// Height assigned to the genesis block. Every later block takes a strictly
/// smaller height until issuance ends at height 0, so "older" always means
/// "higher" here. All networks share the convention.
pub const GENESIS_HEIGHT: u32 = 100_000_000;

/// Blocks between a node and genesis, the quantity the skip list and the
/// difficulty window reason about.
#[inline]
pub fn distance_from_genesis(height: u32) -> u32 {
    debug_assert!(height <= GENESIS_HEIGHT);
    GENESIS_HEIGHT - height
}

/// The ancestor relation in one place: `a` is older than `b` when it sits
/// closer to genesis, i.e. at a higher height.
#[inline]
pub fn is_older(a: u32, b: u32) -> bool {
    a > b
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize, ArgEnum)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Signet,
    Regtest,
}

impl From<Network> for String {
    fn from(network: Network) -> Self {
        match network {
            Network::Mainnet => "mainnet".to_string(),
            Network::Testnet => "testnet".to_string(),
            Network::Signet => "signet".to_string(),
            Network::Regtest => "regtest".to_string(),
        }
    }
}

const MAINNET_POW_LIMIT: U256 = U256([
    0xffffffffffffffffu64,
    0xffffffffffffffffu64,
    0xffffffffffffffffu64,
    0x00000000ffffffffu64,
]);
const TESTNET_POW_LIMIT: U256 = U256([
    0xffffffffffffffffu64,
    0xffffffffffffffffu64,
    0xffffffffffffffffu64,
    0x7fffffffffffffffu64,
]);
const SIGNET_POW_LIMIT: U256 = U256([
    0x0000000000000000u64,
    0x0000000000000000u64,
    0x0000000000000000u64,
    0x00000377ae000000u64,
]);
const REGTEST_POW_LIMIT: U256 = TESTNET_POW_LIMIT;

impl Network {
    pub fn pow_limit(&self) -> U256 {
        self.params().pow_limit
    }

    pub fn pow_limit_compact(&self) -> Compact {
        Compact::from_u256(self.pow_limit())
    }

    pub fn params(&self) -> &'static ChainParams {
        match self {
            Network::Mainnet => &MAINNET_PARAMS,
            Network::Testnet => &TESTNET_PARAMS,
            Network::Signet => &SIGNET_PARAMS,
            Network::Regtest => &REGTEST_PARAMS,
        }
    }
}

/// The literals a network boots from. `hash` and `merkle_root` are display
/// order; any deviation of the constructed block from them is fatal.
#[derive(Clone, Debug)]
pub struct GenesisDescriptor {
    pub version: i32,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
    pub reward: i64,
    pub coinbase_timestamp: &'static str,
    pub hash: &'static str,
    pub merkle_root: &'static str,
}

#[derive(Clone, Debug)]
pub struct ChainParams {
    pub network: Network,
    pub pow_limit: U256,
    pub pow_target_timespan: i64,
    pub pow_target_spacing: i64,
    /// Headers averaged by each difficulty recomputation.
    pub averaging_window: i64,
    pub pow_allow_min_difficulty: bool,
    pub pow_no_retargeting: bool,
    pub magic: [u8; 4],
    pub default_port: u16,
    pub bech32_hrp: &'static str,
    pub base58_pubkey: u8,
    pub base58_script: u8,
    pub base58_secret: u8,
    pub bip32_xpub: [u8; 4],
    pub bip32_xprv: [u8; 4],
    pub dns_seeds: &'static [&'static str],
    pub genesis: GenesisDescriptor,
}

impl ChainParams {
    pub fn pow_limit_compact(&self) -> Compact {
        Compact::from_u256(self.pow_limit)
    }

    /// Legacy retarget boundary spacing, still exported for the
    /// permitted-transition check.
    pub fn difficulty_adjustment_interval(&self) -> i64 {
        self.pow_target_timespan / self.pow_target_spacing
    }
}

const COINBASE_TIMESTAMP: &str =
    "ViceversaChain is the Blockchain that counts backwards from 100M to 0";

static MAINNET_PARAMS: ChainParams = ChainParams {
    network: Network::Mainnet,
    pow_limit: MAINNET_POW_LIMIT,
    pow_target_timespan: 24 * 2 * 60,
    pow_target_spacing: 2 * 60,
    averaging_window: 24,
    pow_allow_min_difficulty: false,
    pow_no_retargeting: false,
    magic: [0x56, 0x49, 0x56, 0x45], // "VIVE"
    default_port: 11111,
    bech32_hrp: "vive",
    base58_pubkey: 70,
    base58_script: 13,
    base58_secret: 128,
    bip32_xpub: [0x04, 0x88, 0xb2, 0x1e],
    bip32_xprv: [0x04, 0x88, 0xad, 0xe4],
    dns_seeds: &[
        "seed.viceversachain.org",
        "seed1.viceversachain.org",
        "seed2.viceversachain.org",
        "seed3.viceversachain.org",
        "94.156.35.84",
        "193.37.212.154",
        "46.224.148.134",
    ],
    genesis: GenesisDescriptor {
        version: 1,
        time: 1767462992,
        bits: 0x1d00ffff,
        nonce: 2306512841,
        reward: 25_000_000,
        coinbase_timestamp: COINBASE_TIMESTAMP,
        hash: "00000000ed7c33729f39094d3fa4e362cec181b7f05e3c53adeb097fc784f6bf",
        merkle_root: "1f0f98b3c9d7b292e2cfd0cac5fcf46d267df410faa6f8e04d06573a5706c012",
    },
};

static TESTNET_PARAMS: ChainParams = ChainParams {
    network: Network::Testnet,
    pow_limit: TESTNET_POW_LIMIT,
    pow_target_timespan: 14 * 24 * 60 * 60,
    pow_target_spacing: 2 * 60,
    averaging_window: 10080,
    pow_allow_min_difficulty: true,
    pow_no_retargeting: true,
    magic: [0x0b, 0x11, 0x09, 0x07],
    default_port: 18333,
    bech32_hrp: "vv",
    base58_pubkey: 111,
    base58_script: 196,
    base58_secret: 239,
    bip32_xpub: [0x04, 0x35, 0x87, 0xcf],
    bip32_xprv: [0x04, 0x35, 0x83, 0x94],
    dns_seeds: &[
        "testnet-seed.viceversachain.org",
        "seed.tbtc.viceversachain.org.",
    ],
    genesis: GenesisDescriptor {
        version: 1,
        time: 1767465514,
        bits: 0x1e0377ae,
        nonce: 540516,
        reward: 25_000_000,
        coinbase_timestamp: COINBASE_TIMESTAMP,
        hash: "0000012a25567a717f50053e3ee5ab5ae5de0c14dba1f91be793438499c6527f",
        merkle_root: "1f0f98b3c9d7b292e2cfd0cac5fcf46d267df410faa6f8e04d06573a5706c012",
    },
};

static SIGNET_PARAMS: ChainParams = ChainParams {
    network: Network::Signet,
    pow_limit: SIGNET_POW_LIMIT,
    pow_target_timespan: 14 * 24 * 60 * 60,
    pow_target_spacing: 10 * 60,
    averaging_window: 2016,
    pow_allow_min_difficulty: false,
    pow_no_retargeting: false,
    magic: [0x0a, 0x03, 0xcf, 0x40],
    default_port: 38333,
    bech32_hrp: "tb",
    base58_pubkey: 111,
    base58_script: 196,
    base58_secret: 239,
    bip32_xpub: [0x04, 0x35, 0x87, 0xcf],
    bip32_xprv: [0x04, 0x35, 0x83, 0x94],
    dns_seeds: &["seed.signet.viceversachain.sprovoost.nl."],
    genesis: GenesisDescriptor {
        version: 1,
        time: 1767465514,
        bits: 0x1e0377ae,
        nonce: 540516,
        reward: 25_000_000,
        coinbase_timestamp: COINBASE_TIMESTAMP,
        hash: "0000012a25567a717f50053e3ee5ab5ae5de0c14dba1f91be793438499c6527f",
        merkle_root: "1f0f98b3c9d7b292e2cfd0cac5fcf46d267df410faa6f8e04d06573a5706c012",
    },
};

static REGTEST_PARAMS: ChainParams = ChainParams {
    network: Network::Regtest,
    pow_limit: REGTEST_POW_LIMIT,
    pow_target_timespan: 14 * 24 * 60 * 60,
    pow_target_spacing: 2 * 60,
    averaging_window: 720,
    pow_allow_min_difficulty: true,
    pow_no_retargeting: true,
    magic: [0xfa, 0xbf, 0xb5, 0xda],
    default_port: 18444,
    bech32_hrp: "bcrt",
    base58_pubkey: 111,
    base58_script: 196,
    base58_secret: 239,
    bip32_xpub: [0x04, 0x35, 0x87, 0xcf],
    bip32_xprv: [0x04, 0x35, 0x83, 0x94],
    dns_seeds: &[],
    genesis: GenesisDescriptor {
        version: 1,
        time: 1767465514,
        bits: 0x1e0377ae,
        nonce: 540516,
        reward: 25_000_000,
        coinbase_timestamp: COINBASE_TIMESTAMP,
        hash: "0000012a25567a717f50053e3ee5ab5ae5de0c14dba1f91be793438499c6527f",
        merkle_root: "1f0f98b3c9d7b292e2cfd0cac5fcf46d267df410faa6f8e04d06573a5706c012",
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_pow_limit_encodes_to_genesis_bits() {
        // mainnet genesis runs at the easiest allowed difficulty
        assert_eq!(
            Network::Mainnet.pow_limit_compact(),
            Compact::new(0x1d00ffff)
        );
        assert_eq!(
            Network::Mainnet.pow_limit_compact(),
            Compact::new(MAINNET_PARAMS.genesis.bits)
        );
    }

    #[test]
    fn non_mainnet_genesis_bits_are_stricter_than_their_limit() {
        for network in [Network::Testnet, Network::Regtest] {
            let params = network.params();
            let genesis_target = Compact::new(params.genesis.bits).to_u256().unwrap();
            assert!(genesis_target < params.pow_limit);
        }
    }

    #[test]
    fn mainnet_adjustment_interval_matches_window() {
        let params = Network::Mainnet.params();
        assert_eq!(params.difficulty_adjustment_interval(), 24);
        assert_eq!(params.averaging_window, 24);
    }

    #[test]
    fn reverse_height_helpers() {
        assert_eq!(distance_from_genesis(GENESIS_HEIGHT), 0);
        assert_eq!(distance_from_genesis(99_999_990), 10);
        assert!(is_older(GENESIS_HEIGHT, 0));
        assert!(!is_older(5, 5));
    }

    #[test]
    fn pow_limits_decode_consistently() {
        for network in [
            Network::Mainnet,
            Network::Testnet,
            Network::Signet,
            Network::Regtest,
        ] {
            let params = network.params();
            let round_tripped = params.pow_limit_compact().to_u256().unwrap();
            // the compact grid may only round down, never up past the limit
            assert!(round_tripped <= params.pow_limit);
            assert!(!round_tripped.is_zero());
        }
    }
}
