//! Receipt domain entities

use super::encoding::FieldHasher;
use super::merkle::derive_root;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash, U256};

/// Log emitted by a clause.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub address: Address,
    pub topics: Vec<Hash>,
    pub data: Vec<u8>,
}

/// Value moved by a clause.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub sender: Address,
    pub recipient: Address,
    pub amount: U256,
}

/// Effects of one clause.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub events: Vec<Event>,
    pub transfers: Vec<Transfer>,
}

/// Result of executing one transaction.
///
/// A reverted receipt has no outputs but still charges gas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub gas_used: u64,
    pub gas_payer: Address,
    pub paid: U256,
    /// Share of `paid` credited to the block beneficiary
    pub reward: U256,
    pub reverted: bool,
    /// One entry per clause, empty when reverted
    pub outputs: Vec<Output>,
}

impl Receipt {
    /// Leaf hash of the receipts root.
    pub fn hash(&self) -> Hash {
        let mut hasher = FieldHasher::new();
        hasher
            .u64(self.gas_used)
            .fixed(&self.gas_payer)
            .u256(&self.paid)
            .u256(&self.reward)
            .bool(self.reverted)
            .len(self.outputs.len());
        for output in &self.outputs {
            hasher.len(output.events.len());
            for event in &output.events {
                hasher.fixed(&event.address).len(event.topics.len());
                for topic in &event.topics {
                    hasher.fixed(topic);
                }
                hasher.bytes(&event.data);
            }
            hasher.len(output.transfers.len());
            for transfer in &output.transfers {
                hasher
                    .fixed(&transfer.sender)
                    .fixed(&transfer.recipient)
                    .u256(&transfer.amount);
            }
        }
        hasher.finish()
    }
}

/// Root over an ordered receipt sequence.
pub fn receipts_root(receipts: &[Receipt]) -> Hash {
    derive_root(receipts.iter().map(Receipt::hash))
}
