//! Block domain entities

use super::encoding::FieldHasher;
use super::merkle::derive_root;
use super::transaction::Transaction;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{
    keccak256_concat, recover_address, sign_hash, Address, Hash, Signature, SignatureError,
    SigningKey, ZERO_ADDRESS,
};

/// Block number encoded in the first 4 bytes of a block ID.
pub fn block_number(block_id: &Hash) -> u32 {
    u32::from_be_bytes([block_id[0], block_id[1], block_id[2], block_id[3]])
}

/// Parent ID used by genesis, so that genesis gets number 0.
pub fn genesis_parent_id() -> Hash {
    let mut id = [0u8; 32];
    id[..4].copy_from_slice(&u32::MAX.to_be_bytes());
    id
}

/// Block header
///
/// Only meaningful relative to its parent; the block number is derived from
/// `parent_id`.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub parent_id: Hash,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub beneficiary: Address,
    pub gas_used: u64,
    pub total_score: u64,
    pub txs_root: Hash,
    pub state_root: Hash,
    pub receipts_root: Hash,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl Header {
    pub fn number(&self) -> u32 {
        block_number(&self.parent_id).wrapping_add(1)
    }

    /// Hash of every field except the signature.
    pub fn signing_hash(&self) -> Hash {
        FieldHasher::new()
            .fixed(&self.parent_id)
            .u64(self.timestamp)
            .u64(self.gas_limit)
            .fixed(&self.beneficiary)
            .u64(self.gas_used)
            .u64(self.total_score)
            .fixed(&self.txs_root)
            .fixed(&self.state_root)
            .fixed(&self.receipts_root)
            .finish()
    }

    /// Recover the block proposer.
    pub fn signer(&self) -> Result<Address, SignatureError> {
        recover_address(&self.signing_hash(), &self.signature)
    }

    /// Block ID: `keccak(signing_hash || signer)` with the number in the
    /// first 4 bytes. Unsigned headers (genesis) hash with the zero signer.
    pub fn id(&self) -> Hash {
        let signer = self.signer().unwrap_or(ZERO_ADDRESS);
        let mut id = keccak256_concat(&[&self.signing_hash()[..], &signer[..]]);
        id[..4].copy_from_slice(&self.number().to_be_bytes());
        id
    }

    /// Sign in place with `key`.
    pub fn sign(&mut self, key: &SigningKey) -> Result<(), SignatureError> {
        self.signature = sign_hash(&self.signing_hash(), key)?;
        Ok(())
    }
}

/// A header plus its ordered transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: Header, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    pub fn id(&self) -> Hash {
        self.header.id()
    }
}

/// Root over an ordered transaction sequence.
pub fn transactions_root(transactions: &[Transaction]) -> Hash {
    derive_root(transactions.iter().map(Transaction::hash))
}
