use anyhow::Result;
use primitive_types::{H256, U256};

use traits::ChainHeadReader;
use types::block::{BlockHeader, IndexedBlockHeader};
use types::compact::Compact;
use types::network::{distance_from_genesis, ChainParams};
use types::Hash;

/// DarkGravityWave v3. Retargets every block from the average target of the
/// last `averaging_window` headers, scaled by how long those blocks actually
/// took against the schedule. Responds to hashrate moves within a window
/// instead of a multi-day interval, which is what keeps short-range
/// timestamp games and rented-hashrate spikes from running away with the
/// chain.
pub fn dark_gravity_wave(
    chain: &dyn ChainHeadReader,
    tip: &IndexedBlockHeader,
    params: &ChainParams,
) -> Result<Compact> {
    let pow_limit = params.pow_limit;
    let window = params.averaging_window;

    // Not enough history mined below genesis yet.
    if i64::from(distance_from_genesis(tip.height)) < window {
        return Ok(Compact::from_u256(pow_limit));
    }

    if params.pow_no_retargeting {
        return Ok(tip.raw.difficulty());
    }

    // Average the decoded targets across the window. Walking to the parent
    // moves up in height, toward genesis.
    let mut sum = U256::from(tip.raw.difficulty());
    let mut walk = Some(tip.clone());
    for _ in 1..window {
        walk = match walk {
            Some(ref header) => chain.get_header_by_hash(&header.raw.parent_hash)?,
            None => None,
        };
        match walk {
            Some(ref header) => sum += U256::from(header.raw.difficulty()),
            None => break,
        }
    }
    let avg = sum / U256::from(window as u64);

    // Earliest header of the window: the one with the highest height.
    let mut first = Some(tip.clone());
    for _ in 0..window - 1 {
        first = match first {
            Some(ref header) => chain.get_header_by_hash(&header.raw.parent_hash)?,
            None => None,
        };
    }
    let first = match first {
        Some(header) => header,
        None => return Ok(Compact::from_u256(pow_limit)),
    };

    // Timestamps are not required to be monotone, so this span may be tiny,
    // zero or negative; the clamp bounds the swing to 3x either way.
    let actual_timespan = i64::from(tip.raw.time) - i64::from(first.raw.time);
    let target_timespan = window * params.pow_target_spacing;
    let actual_timespan = actual_timespan.clamp(target_timespan / 3, target_timespan * 3);

    let new_target = avg
        .checked_mul(U256::from(actual_timespan as u64))
        .map(|scaled| scaled / U256::from(target_timespan as u64))
        .unwrap_or(pow_limit);
    let new_target = if new_target > pow_limit {
        pow_limit
    } else {
        new_target
    };

    Ok(Compact::from_u256(new_target))
}

/// Target required for the block extending `tip`. The candidate header is
/// unused by the gravity wave itself; the parameter survives for parity with
/// rules that inspect it.
pub fn get_next_work_required(
    chain: &dyn ChainHeadReader,
    tip: &IndexedBlockHeader,
    _candidate: &BlockHeader,
    params: &ChainParams,
) -> Result<Compact> {
    dark_gravity_wave(chain, tip, params)
}

/// Stateless proof-of-work check: the decoded target must be a sane value
/// for the network and the hash, read as an integer, must not exceed it.
pub fn check_proof_of_work(hash: &Hash, bits: Compact, params: &ChainParams) -> bool {
    let target = match bits.to_u256() {
        Ok(target) => target,
        Err(_) => return false,
    };
    if target.is_zero() || target > params.pow_limit {
        return false;
    }
    crypto::is_valid_proof_of_work_hash(target, &H256::from(*hash))
}

/// Pre-gravity-wave retarget arithmetic. Dead under DGW but exported with
/// its original behavior so external validators agree with unmodified peers.
pub fn calculate_next_work_required(
    tip: &IndexedBlockHeader,
    first_block_time: i64,
    params: &ChainParams,
) -> Compact {
    if params.pow_no_retargeting {
        return tip.raw.difficulty();
    }

    let timespan = i64::from(tip.raw.time) - first_block_time;
    let timespan = timespan.clamp(
        params.pow_target_timespan / 4,
        params.pow_target_timespan * 4,
    );

    let new_target = U256::from(tip.raw.difficulty())
        .checked_mul(U256::from(timespan as u64))
        .map(|scaled| scaled / U256::from(params.pow_target_timespan as u64))
        .unwrap_or(params.pow_limit);
    let new_target = if new_target > params.pow_limit {
        params.pow_limit
    } else {
        new_target
    };

    Compact::from_u256(new_target)
}

/// Sanity bound on a retarget step, kept for wire compatibility. Off
/// adjustment boundaries the target may not move at all; on them it must
/// stay within the classical factor-four window of the previous target,
/// compared after re-encoding to the compact grid.
pub fn permitted_difficulty_transition(
    params: &ChainParams,
    height: u32,
    old_bits: Compact,
    new_bits: Compact,
) -> bool {
    if params.pow_allow_min_difficulty {
        return true;
    }

    if i64::from(height) % params.difficulty_adjustment_interval() == 0 {
        let smallest_timespan = params.pow_target_timespan / 4;
        let largest_timespan = params.pow_target_timespan * 4;
        let observed_new_target = U256::from(new_bits);

        let scale = |timespan: i64| -> U256 {
            let scaled = U256::from(old_bits)
                .checked_mul(U256::from(timespan as u64))
                .map(|scaled| scaled / U256::from(params.pow_target_timespan as u64))
                .unwrap_or(params.pow_limit);
            let scaled = if scaled > params.pow_limit {
                params.pow_limit
            } else {
                scaled
            };
            // round through the compact grid before comparing
            U256::from(Compact::from_u256(scaled))
        };

        if scale(largest_timespan) < observed_new_target {
            return false;
        }
        if scale(smallest_timespan) > observed_new_target {
            return false;
        }
    } else if old_bits != new_bits {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use types::network::Network;
    use types::ZERO_HASH;

    use crate::testing::{build_chain, MemoryBlockHeaderReader, BASE_TIME};

    use super::*;

    const STEADY_BITS: u32 = 0x1c0ffff0;

    #[test]
    fn short_chain_returns_pow_limit() {
        let params = Network::Mainnet.params();
        let reader = MemoryBlockHeaderReader::default();
        // 23 blocks mined: one short of the averaging window
        let tip = build_chain(&reader, 23, STEADY_BITS, 120);
        let bits = dark_gravity_wave(&reader, &tip, params).unwrap();
        assert_eq!(bits, params.pow_limit_compact());
    }

    #[test]
    fn full_window_retargets_for_real() {
        let params = Network::Mainnet.params();
        let reader = MemoryBlockHeaderReader::default();
        // exactly the window mined: the 24-header window spans 23 gaps, so
        // on-schedule blocks still tighten the target slightly
        let tip = build_chain(&reader, 24, STEADY_BITS, 120);
        let bits = dark_gravity_wave(&reader, &tip, params).unwrap();
        assert_eq!(bits, Compact::new(0x1c0f5546));
    }

    #[test]
    fn slow_blocks_clamp_to_triple_target() {
        let params = Network::Mainnet.params();
        let reader = MemoryBlockHeaderReader::default();
        // six times too slow; the swing is capped at x3 easier
        let tip = build_chain(&reader, 30, STEADY_BITS, 720);
        let bits = dark_gravity_wave(&reader, &tip, params).unwrap();
        assert_eq!(bits, Compact::new(0x1c2fffd0));
    }

    #[test]
    fn fast_blocks_clamp_to_third_target() {
        let params = Network::Mainnet.params();
        let reader = MemoryBlockHeaderReader::default();
        let tip = build_chain(&reader, 30, STEADY_BITS, 20);
        let bits = dark_gravity_wave(&reader, &tip, params).unwrap();
        assert_eq!(bits, Compact::new(0x1c055550));
    }

    #[test]
    fn zero_timespan_gives_maximum_tightening() {
        let params = Network::Mainnet.params();
        let reader = MemoryBlockHeaderReader::default();
        let tip = build_chain(&reader, 30, STEADY_BITS, 0);
        let bits = dark_gravity_wave(&reader, &tip, params).unwrap();
        assert_eq!(bits, Compact::new(0x1c055550));
    }

    #[test]
    fn easing_never_crosses_pow_limit() {
        let params = Network::Mainnet.params();
        let reader = MemoryBlockHeaderReader::default();
        // the easiest mainnet target, six times too slow: tripling it would
        // leave the allowed range
        let tip = build_chain(&reader, 30, 0x1d00ffff, 720);
        let bits = dark_gravity_wave(&reader, &tip, params).unwrap();
        assert_eq!(bits, params.pow_limit_compact());
        assert_eq!(bits, Compact::new(0x1d00ffff));
    }

    #[test]
    fn no_retargeting_keeps_parent_bits() {
        let mut params = Network::Mainnet.params().clone();
        params.pow_no_retargeting = true;
        let reader = MemoryBlockHeaderReader::default();
        let tip = build_chain(&reader, 30, STEADY_BITS, 720);
        let bits = dark_gravity_wave(&reader, &tip, &params).unwrap();
        assert_eq!(bits, Compact::new(STEADY_BITS));
    }

    #[test]
    fn next_work_ignores_the_candidate_header() {
        let params = Network::Mainnet.params();
        let reader = MemoryBlockHeaderReader::default();
        let tip = build_chain(&reader, 30, STEADY_BITS, 120);
        let candidate = BlockHeader {
            version: 1,
            parent_hash: tip.hash,
            merkle_root: ZERO_HASH,
            time: BASE_TIME,
            bits: 0,
            nonce: 0,
        };
        assert_eq!(
            get_next_work_required(&reader, &tip, &candidate, params).unwrap(),
            dark_gravity_wave(&reader, &tip, params).unwrap()
        );
    }

    #[test]
    fn check_proof_of_work_range_rules() {
        let params = Network::Mainnet.params();
        let zero_hash = ZERO_HASH;
        // zero target
        assert!(!check_proof_of_work(&zero_hash, Compact::new(0), params));
        // negative target
        assert!(!check_proof_of_work(
            &zero_hash,
            Compact::new(0x04923456),
            params
        ));
        // decodes above the mainnet limit
        assert!(!check_proof_of_work(
            &zero_hash,
            Compact::new(0x1e00ffff),
            params
        ));
        // the zero hash beats any sane target
        assert!(check_proof_of_work(
            &zero_hash,
            Compact::new(0x1d00ffff),
            params
        ));
    }

    #[test]
    fn check_proof_of_work_compares_hash_against_target() {
        let params = Network::Regtest.params();
        let bits = params.pow_limit_compact();
        // regtest limit is 2^255 - ish: a hash with the top wire byte clear
        // passes, one with the top bit set does not
        let mut hash = [0xffu8; 32];
        hash[31] = 0x00;
        assert!(check_proof_of_work(&hash, bits, params));
        hash[31] = 0xff;
        assert!(!check_proof_of_work(&hash, bits, params));
    }

    #[test]
    fn legacy_retarget_clamps_both_ways() {
        let params = Network::Mainnet.params();
        let reader = MemoryBlockHeaderReader::default();
        let tip = build_chain(&reader, 30, STEADY_BITS, 120);

        // stalled chain: capped at four times easier
        let slow = calculate_next_work_required(
            &tip,
            i64::from(tip.raw.time) - params.pow_target_timespan * 100,
            params,
        );
        assert_eq!(slow, Compact::new(0x1c3fffc0));

        // racing chain: capped at four times harder
        let fast = calculate_next_work_required(&tip, i64::from(tip.raw.time), params);
        assert_eq!(fast, Compact::new(0x1c03fffc));

        // on schedule: unchanged
        let steady = calculate_next_work_required(
            &tip,
            i64::from(tip.raw.time) - params.pow_target_timespan,
            params,
        );
        assert_eq!(steady, Compact::new(STEADY_BITS));
    }

    #[test]
    fn legacy_retarget_honors_no_retargeting() {
        let params = Network::Regtest.params();
        let reader = MemoryBlockHeaderReader::default();
        let tip = build_chain(&reader, 5, STEADY_BITS, 120);
        let bits = calculate_next_work_required(&tip, 0, params);
        assert_eq!(bits, Compact::new(STEADY_BITS));
    }

    #[test]
    fn transition_off_boundary_requires_equal_bits() {
        let params = Network::Mainnet.params();
        let old = Compact::new(STEADY_BITS);
        // 99_999_997 is not a multiple of the 24-block interval
        assert!(permitted_difficulty_transition(params, 99_999_997, old, old));
        assert!(!permitted_difficulty_transition(
            params,
            99_999_997,
            old,
            Compact::new(0x1c0ffff1)
        ));
    }

    #[test]
    fn transition_on_boundary_allows_factor_four() {
        let params = Network::Mainnet.params();
        let old = Compact::new(STEADY_BITS);
        let boundary = 99_999_984; // multiple of 24
        assert!(permitted_difficulty_transition(params, boundary, old, old));
        // exactly four times easier / harder still passes
        assert!(permitted_difficulty_transition(
            params,
            boundary,
            old,
            Compact::new(0x1c3fffc0)
        ));
        assert!(permitted_difficulty_transition(
            params,
            boundary,
            old,
            Compact::new(0x1c03fffc)
        ));
        // past the bound in either direction fails
        assert!(!permitted_difficulty_transition(
            params,
            boundary,
            old,
            Compact::new(0x1c4fffb0)
        ));
        assert!(!permitted_difficulty_transition(
            params,
            boundary,
            old,
            Compact::new(0x1c01fffe)
        ));
    }

    #[test]
    fn transition_is_waved_through_on_min_difficulty_chains() {
        let params = Network::Testnet.params();
        assert!(permitted_difficulty_transition(
            params,
            0,
            Compact::new(STEADY_BITS),
            Compact::new(0x1c01fffe)
        ));
    }
}
