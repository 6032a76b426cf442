//! Transaction domain entities

use super::encoding::FieldHasher;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{
    keccak256_concat, recover_address, sign_hash, Address, Hash, Signature, SignatureError,
    SigningKey, U256,
};

/// Base gas charged for every transaction.
pub const TX_GAS: u64 = 5_000;
/// Gas charged per clause with a recipient.
pub const CLAUSE_GAS: u64 = 16_000;
/// Gas charged per contract-creation clause.
pub const CLAUSE_GAS_CONTRACT_CREATION: u64 = 48_000;
/// Gas per zero byte of clause data.
pub const TX_DATA_ZERO_GAS: u64 = 4;
/// Gas per non-zero byte of clause data.
pub const TX_DATA_NON_ZERO_GAS: u64 = 68;

/// Reference to a recent block: the first 4 bytes are the big-endian block
/// number, the rest is taken from the block ID.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRef(pub [u8; 8]);

impl BlockRef {
    /// Reference by number only.
    pub fn new(number: u32) -> Self {
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&number.to_be_bytes());
        Self(bytes)
    }

    /// Reference a concrete block ID.
    pub fn from_id(block_id: &Hash) -> Self {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&block_id[..8]);
        Self(bytes)
    }

    /// The referenced block number.
    pub fn number(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }
}

/// A single call or transfer within a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    /// `None` creates a contract
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
}

impl Clause {
    /// Plain value transfer.
    pub fn transfer(to: Address, value: U256) -> Self {
        Self {
            to: Some(to),
            value,
            data: Vec::new(),
        }
    }
}

/// A signed transaction.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub chain_tag: u8,
    pub block_ref: BlockRef,
    /// Blocks after `block_ref` during which the transaction stays valid
    pub expiration: u32,
    pub clauses: Vec<Clause>,
    pub gas_price_coef: u8,
    pub gas: u64,
    /// Transaction that must be committed and not reverted first
    pub depends_on: Option<Hash>,
    pub nonce: u64,
    /// Reserved for protocol extensions; must be empty
    pub reserved: Vec<Vec<u8>>,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl Transaction {
    /// Hash of every field except the signature.
    pub fn signing_hash(&self) -> Hash {
        let mut hasher = FieldHasher::new();
        hasher
            .u8(self.chain_tag)
            .fixed(&self.block_ref.0)
            .u32(self.expiration)
            .len(self.clauses.len());
        for clause in &self.clauses {
            hasher
                .optional(clause.to.as_ref().map(|to| &to[..]))
                .u256(&clause.value)
                .bytes(&clause.data);
        }
        hasher
            .u8(self.gas_price_coef)
            .u64(self.gas)
            .optional(self.depends_on.as_ref().map(|dep| &dep[..]))
            .u64(self.nonce)
            .len(self.reserved.len());
        for field in &self.reserved {
            hasher.bytes(field);
        }
        hasher.finish()
    }

    /// Recover the origin of this transaction.
    pub fn signer(&self) -> Result<Address, SignatureError> {
        recover_address(&self.signing_hash(), &self.signature)
    }

    /// Content-derived identity, unique per chain.
    pub fn id(&self) -> Result<Hash, SignatureError> {
        let signer = self.signer()?;
        Ok(keccak256_concat(&[&self.signing_hash()[..], &signer[..]]))
    }

    /// Hash of the full signed transaction. Leaf of the transactions root.
    pub fn hash(&self) -> Hash {
        keccak256_concat(&[&self.signing_hash()[..], &self.signature[..]])
    }

    /// Sign in place with `key`.
    pub fn sign(&mut self, key: &SigningKey) -> Result<(), SignatureError> {
        self.signature = sign_hash(&self.signing_hash(), key)?;
        Ok(())
    }

    /// Whether the transaction is expired at `block_number`.
    pub fn is_expired(&self, block_number: u32) -> bool {
        u64::from(block_number) > u64::from(self.block_ref.number()) + u64::from(self.expiration)
    }

    pub fn has_reserved_fields(&self) -> bool {
        !self.reserved.is_empty()
    }

    /// Gas consumed before any clause executes.
    pub fn intrinsic_gas(&self) -> u64 {
        if self.clauses.is_empty() {
            return TX_GAS + CLAUSE_GAS;
        }

        self.clauses.iter().fold(TX_GAS, |total, clause| {
            let clause_gas = if clause.to.is_some() {
                CLAUSE_GAS
            } else {
                CLAUSE_GAS_CONTRACT_CREATION
            };
            total
                .saturating_add(clause_gas)
                .saturating_add(data_gas(&clause.data))
        })
    }
}

fn data_gas(data: &[u8]) -> u64 {
    data.iter().fold(0u64, |gas, byte| {
        let cost = if *byte == 0 {
            TX_DATA_ZERO_GAS
        } else {
            TX_DATA_NON_ZERO_GAS
        };
        gas.saturating_add(cost)
    })
}
