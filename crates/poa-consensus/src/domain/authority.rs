//! Authority and governance entities
//!
//! Candidates live in the authority registry inside ledger state; the
//! scheduler only ever sees the [`Proposer`] projection.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash};

/// Registered authority node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityCandidate {
    /// Address that signs blocks
    pub signer: Address,
    /// Address whose balance backs this candidate
    pub endorsor: Address,
    /// Operator-defined identity
    pub identity: Hash,
    pub active: bool,
}

/// Scheduling view of a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposer {
    pub address: Address,
    pub active: bool,
}

impl From<&AuthorityCandidate> for Proposer {
    fn from(candidate: &AuthorityCandidate) -> Self {
        Self {
            address: candidate.signer,
            active: candidate.active,
        }
    }
}

/// Key of a governance parameter.
pub type ParamKey = Hash;

/// Build a key from its ASCII name, right-aligned in 32 bytes.
pub const fn param_key(name: &[u8]) -> ParamKey {
    let mut key = [0u8; 32];
    let offset = 32 - name.len();
    let mut i = 0;
    while i < name.len() {
        key[offset + i] = name[i];
        i += 1;
    }
    key
}

/// Minimum endorsor balance for a candidate to be scheduled.
pub const KEY_PROPOSER_ENDORSEMENT: ParamKey = param_key(b"proposer-endorsement");

/// Base gas price before the transaction's coefficient is applied.
pub const KEY_BASE_GAS_PRICE: ParamKey = param_key(b"base-gas-price");
