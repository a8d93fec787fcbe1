use anyhow::{ensure, Result};
use chrono::Utc;

use traits::{ChainHeadReader, Consensus};
use types::block::BlockHeader;
use types::compact::Compact;
use types::network::{ChainParams, Network};
use types::Hash;

use crate::coin;
use crate::constants::BLOCK_MAX_FUTURE;
use crate::error::Error;
use crate::genesis::checked_genesis_header;
use crate::pow::{check_proof_of_work, dark_gravity_wave};

/// The consensus rules of the reverse chain: gravity-wave retargeting on
/// top of standard header plumbing.
pub struct ViceversaProtocol {
    network: Network,
}

impl ViceversaProtocol {
    pub fn new(network: Network) -> Self {
        Self { network }
    }
}

impl Consensus for ViceversaProtocol {
    fn network(&self) -> Network {
        self.network
    }

    fn params(&self) -> &ChainParams {
        self.network.params()
    }

    fn verify_header(&self, chain: &dyn ChainHeadReader, header: &BlockHeader) -> Result<()> {
        let params = self.params();
        let current_time = Utc::now().timestamp();
        ensure!(
            i64::from(header.time) < BLOCK_MAX_FUTURE + current_time,
            Error::TimeTooNew
        );
        let parent = chain
            .get_header_by_hash(&header.parent_hash)?
            .ok_or(Error::ParentBlockNotFound)?;
        let expected = dark_gravity_wave(chain, &parent, params)?;
        ensure!(
            header.difficulty() == expected,
            Error::BlockBadTarget(expected, header.difficulty())
        );
        ensure!(
            check_proof_of_work(&header.hash(), header.difficulty(), params),
            Error::BadPow
        );
        Ok(())
    }

    fn work_required(&self, chain: &dyn ChainHeadReader, parent: &Hash) -> Result<Compact> {
        let parent = chain
            .get_header_by_hash(parent)?
            .ok_or(Error::ParentBlockNotFound)?;
        dark_gravity_wave(chain, &parent, self.params())
    }

    fn miner_reward(&self, height: u32) -> i64 {
        coin::miner_reward(height)
    }

    fn genesis_header(&self) -> BlockHeader {
        checked_genesis_header(self.params())
    }
}

#[cfg(test)]
mod tests {
    use types::ZERO_HASH;

    use crate::testing::{build_chain, MemoryBlockHeaderReader, BASE_TIME};

    use super::*;

    fn regtest_bits() -> Compact {
        Network::Regtest.params().pow_limit_compact()
    }

    /// Mines a regtest header on `parent_hash`: correct expected bits, nonce
    /// searched until the hash clears the (very easy) regtest target.
    fn mine_header(parent_hash: Hash, time: u32) -> BlockHeader {
        let params = Network::Regtest.params();
        let mut header = BlockHeader {
            version: 1,
            parent_hash,
            merkle_root: ZERO_HASH,
            time,
            bits: regtest_bits().into(),
            nonce: 0,
        };
        while !check_proof_of_work(&header.hash(), header.difficulty(), params) {
            header.nonce += 1;
        }
        header
    }

    #[test]
    fn accepts_a_well_formed_header() {
        let protocol = ViceversaProtocol::new(Network::Regtest);
        let reader = MemoryBlockHeaderReader::default();
        let genesis = build_chain(&reader, 0, regtest_bits().into(), 120);
        let header = mine_header(genesis.hash, BASE_TIME + 120);
        protocol.verify_header(&reader, &header).unwrap();
    }

    #[test]
    fn rejects_unknown_parents() {
        let protocol = ViceversaProtocol::new(Network::Regtest);
        let reader = MemoryBlockHeaderReader::default();
        build_chain(&reader, 0, regtest_bits().into(), 120);
        let header = mine_header([0xab; 32], BASE_TIME + 120);
        let err = protocol.verify_header(&reader, &header).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ParentBlockNotFound)
        ));
    }

    #[test]
    fn rejects_unexpected_bits() {
        let protocol = ViceversaProtocol::new(Network::Regtest);
        let reader = MemoryBlockHeaderReader::default();
        let genesis = build_chain(&reader, 0, regtest_bits().into(), 120);
        let mut header = mine_header(genesis.hash, BASE_TIME + 120);
        header.bits = 0x1d00ffff;
        let err = protocol.verify_header(&reader, &header).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::BlockBadTarget(_, _))
        ));
    }

    #[test]
    fn rejects_headers_from_the_future() {
        let protocol = ViceversaProtocol::new(Network::Regtest);
        let reader = MemoryBlockHeaderReader::default();
        let genesis = build_chain(&reader, 0, regtest_bits().into(), 120);
        let future = (Utc::now().timestamp() + BLOCK_MAX_FUTURE + 600) as u32;
        let header = mine_header(genesis.hash, future);
        let err = protocol.verify_header(&reader, &header).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::TimeTooNew)));
    }

    #[test]
    fn rejects_insufficient_proof_of_work() {
        let protocol = ViceversaProtocol::new(Network::Regtest);
        let reader = MemoryBlockHeaderReader::default();
        let genesis = build_chain(&reader, 0, regtest_bits().into(), 120);
        let params = Network::Regtest.params();
        let mut header = mine_header(genesis.hash, BASE_TIME + 120);
        // search in the other direction: a nonce whose hash misses the target
        while check_proof_of_work(&header.hash(), header.difficulty(), params) {
            header.nonce += 1;
        }
        let err = protocol.verify_header(&reader, &header).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::BadPow)));
    }

    #[test]
    fn work_required_is_the_gravity_wave_of_the_parent() {
        let protocol = ViceversaProtocol::new(Network::Mainnet);
        let reader = MemoryBlockHeaderReader::default();
        let tip = build_chain(&reader, 30, 0x1c0ffff0, 120);
        let via_protocol = protocol.work_required(&reader, &tip.hash).unwrap();
        let direct = dark_gravity_wave(&reader, &tip, Network::Mainnet.params()).unwrap();
        assert_eq!(via_protocol, direct);
    }

    #[test]
    fn genesis_header_boots_every_network() {
        for network in [
            Network::Mainnet,
            Network::Testnet,
            Network::Signet,
            Network::Regtest,
        ] {
            let protocol = ViceversaProtocol::new(network);
            let header = protocol.genesis_header();
            assert_eq!(header.bits, network.params().genesis.bits);
        }
    }

    #[test]
    fn miner_reward_follows_the_schedule() {
        let protocol = ViceversaProtocol::new(Network::Mainnet);
        assert_eq!(
            protocol.miner_reward(types::network::GENESIS_HEIGHT),
            coin::COIN / 4
        );
        assert_eq!(protocol.miner_reward(1), 2 * coin::COIN);
    }
}
