//! # Core Primitive Entities
//!
//! Fixed-size byte aliases shared by every subsystem.

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

/// A 32-byte Keccak-256 digest (block IDs, transaction IDs, roots).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// A 65-byte recoverable secp256k1 signature laid out as `r || s || v`.
pub type Signature = [u8; 65];

/// The all-zero hash. Used as the Merkle sentinel and as the empty root.
pub const ZERO_HASH: Hash = [0u8; 32];

/// The all-zero address.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Render bytes as a `0x`-prefixed lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
