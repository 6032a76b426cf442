//! Canonical field absorption for consensus hashes
//!
//! Integers are absorbed big-endian, variable-length byte strings and lists
//! are prefixed with their length as a big-endian u64, optionals with a
//! presence byte. Changing anything here forks the chain.

use sha3::{Digest, Keccak256};
use shared_types::{Hash, U256};

pub(crate) struct FieldHasher(Keccak256);

impl FieldHasher {
    pub(crate) fn new() -> Self {
        Self(Keccak256::new())
    }

    pub(crate) fn u8(&mut self, value: u8) -> &mut Self {
        self.0.update([value]);
        self
    }

    pub(crate) fn u32(&mut self, value: u32) -> &mut Self {
        self.0.update(value.to_be_bytes());
        self
    }

    pub(crate) fn u64(&mut self, value: u64) -> &mut Self {
        self.0.update(value.to_be_bytes());
        self
    }

    pub(crate) fn bool(&mut self, value: bool) -> &mut Self {
        self.u8(value as u8)
    }

    pub(crate) fn u256(&mut self, value: &U256) -> &mut Self {
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        self.0.update(buf);
        self
    }

    /// Fixed-width field, absorbed without a length prefix.
    pub(crate) fn fixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.update(bytes);
        self
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.len(bytes.len());
        self.0.update(bytes);
        self
    }

    pub(crate) fn optional(&mut self, bytes: Option<&[u8]>) -> &mut Self {
        match bytes {
            Some(bytes) => self.u8(1).fixed(bytes),
            None => self.u8(0),
        }
    }

    pub(crate) fn len(&mut self, len: usize) -> &mut Self {
        self.u64(len as u64)
    }

    pub(crate) fn finish(&mut self) -> Hash {
        let result = std::mem::take(&mut self.0).finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }
}
