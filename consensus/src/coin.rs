use types::network::{distance_from_genesis, GENESIS_HEIGHT};

/// Amount in base units (can be negative in fee arithmetic).
pub type Amount = i64;

/// Base units in one VIVE.
pub const COIN: Amount = 100_000_000;

/// Blocks per issuance tier for the three opening tiers; the closing tier
/// runs the remaining 96,058,000 blocks down to height 0.
pub const TIER_SPAN: u32 = 1_314_000;

/// Total issuance:
/// - heights 100,000,000..98,686,001: 0.25 VIVE x 1,314,000 =     328,500
/// - heights  98,686,000..97,372,001: 0.5  VIVE x 1,314,000 =     657,000
/// - heights  97,372,000..96,058,001: 1.0  VIVE x 1,314,000 =   1,314,000
/// - heights  96,058,000..1:          2.0  VIVE x 96,058,000 = 192,116,000
pub const MAX_MONEY: Amount = 194_415_500 * COIN;

#[inline]
pub fn money_range(value: Amount) -> bool {
    (0..=MAX_MONEY).contains(&value)
}

/// Per-block reward. The subsidy grows as the chain counts down and stops
/// entirely at height 0, where the chain ends.
pub fn miner_reward(height: u32) -> Amount {
    assert!(height <= GENESIS_HEIGHT);
    if height == 0 {
        return 0;
    }
    match distance_from_genesis(height) {
        d if d < TIER_SPAN => COIN / 4,
        d if d < 2 * TIER_SPAN => COIN / 2,
        d if d < 3 * TIER_SPAN => COIN,
        _ => 2 * COIN,
    }
}

/// Units issued by all blocks from genesis down to `height` inclusive.
pub fn total_supply_at(height: u32) -> Amount {
    let mined = i64::from(distance_from_genesis(height)) + 1;
    let tier = i64::from(TIER_SPAN);
    let full = |n: i64, reward: Amount| n * reward;
    match mined {
        n if n <= tier => full(n, COIN / 4),
        n if n <= 2 * tier => full(tier, COIN / 4) + full(n - tier, COIN / 2),
        n if n <= 3 * tier => full(tier, COIN / 4) + full(tier, COIN / 2) + full(n - 2 * tier, COIN),
        n => {
            let opening = full(tier, COIN / 4) + full(tier, COIN / 2) + full(tier, COIN);
            // height 0 pays nothing
            let closing = (n - 3 * tier).min(i64::from(GENESIS_HEIGHT) - 3 * tier);
            opening + full(closing, 2 * COIN)
        }
    }
}
