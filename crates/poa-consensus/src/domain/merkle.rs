//! Binary Merkle root over ordered leaf hashes
//!
//! Used for both the transactions root and the receipts root, so every
//! implementation must agree on it bit for bit:
//!
//! 1. Empty input has root `SENTINEL_HASH`.
//! 2. Leaves are padded with `SENTINEL_HASH` to the next power of two
//!    (a single leaf is padded to two).
//! 3. Each parent is `keccak(left || right)`.

use shared_types::{keccak256_concat, Hash, ZERO_HASH};

/// Padding value for missing leaves.
pub const SENTINEL_HASH: Hash = ZERO_HASH;

/// Compute the root of the tree built from `leaves`, in order.
pub fn derive_root<I>(leaves: I) -> Hash
where
    I: IntoIterator<Item = Hash>,
{
    let mut level: Vec<Hash> = leaves.into_iter().collect();

    match level.len() {
        0 => return SENTINEL_HASH,
        1 => level.push(SENTINEL_HASH),
        n => level.resize(n.next_power_of_two(), SENTINEL_HASH),
    }

    while level.len() > 1 {
        level = level
            .chunks_exact(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }

    level[0]
}

/// parent = H(left || right)
fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    keccak256_concat(&[&left[..], &right[..]])
}
