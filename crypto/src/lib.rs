pub use sha2::Digest;

use primitive_types::{H256, U256};
use sha2::Sha256;

pub struct SHA256;

impl SHA256 {
    pub fn digest<B: AsRef<[u8]>>(bytes: B) -> H256 {
        let mut sha = Sha256::default();
        sha.update(bytes.as_ref());
        H256::from_slice(sha.finalize().as_ref())
    }
}

#[inline]
pub fn sha256<B: AsRef<[u8]>>(bytes: B) -> H256 {
    let mut hasher = Sha256::default();
    hasher.update(bytes);
    H256::from_slice(hasher.finalize().as_ref())
}

/// Double SHA-256, the block and transaction identity hash.
#[inline]
pub fn dhash256<B: AsRef<[u8]>>(bytes: B) -> H256 {
    sha256(sha256(bytes))
}

/// Returns true if hash is lower or equal than the given target.
///
/// Block hashes come out of `dhash256` in wire order, which reads as a
/// little-endian integer; the displayed hex form is the same value big-endian.
pub fn is_valid_proof_of_work_hash(target: U256, hash: &H256) -> bool {
    let value = U256::from_little_endian(hash.as_bytes());
    value <= target
}
