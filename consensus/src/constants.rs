/// Seconds a header timestamp may run ahead of wall clock before the header
/// is rejected outright.
pub const BLOCK_MAX_FUTURE: i64 = 2 * 60 * 60;
