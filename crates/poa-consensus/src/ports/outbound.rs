//! Driven ports (Outbound dependencies)
//!
//! Everything here is synchronous: a validation runs start to finish on the
//! calling thread.

use crate::domain::{
    AuthorityCandidate, ChainError, ParamKey, Receipt, RuntimeError, StateError, Transaction,
};
use shared_types::{Address, Hash, U256};

// =============================================================================
// LEDGER STATE
// =============================================================================

/// Pending writes of one validation attempt, hashable before commit.
pub trait StateStage {
    /// Root the state would have once committed.
    fn hash(&self) -> Hash;

    /// Persist the writes and return the new root.
    fn commit(self) -> Result<Hash, StateError>;
}

/// Account state owned by one validation attempt.
pub trait LedgerState: Sized {
    type Stage: StateStage;

    fn balance(&self, address: &Address) -> Result<U256, StateError>;

    fn set_balance(&mut self, address: &Address, amount: U256) -> Result<(), StateError>;

    /// Freeze the pending writes into a stage.
    fn stage(self) -> Result<Self::Stage, StateError>;
}

/// Authority candidate registry embedded in ledger state.
pub trait AuthorityRegistry {
    /// All registered candidates in registry order.
    fn candidates(&self) -> Result<Vec<AuthorityCandidate>, StateError>;

    /// Set the active flag of the candidate signing as `signer`.
    fn update_candidate(&mut self, signer: &Address, active: bool) -> Result<(), StateError>;
}

/// Governance parameters embedded in ledger state.
pub trait ParamsRegistry {
    /// Value of `key`, zero if never set.
    fn param(&self, key: &ParamKey) -> Result<U256, StateError>;
}

/// Block-context bookkeeping used by the execution environment.
pub trait ExtensionRegistry {
    /// Bind "current block" lookups to the child of `parent_id`.
    fn set_block_num_and_id(&mut self, parent_id: &Hash) -> Result<(), StateError>;
}

/// Everything validation needs from ledger state.
pub trait ConsensusState: LedgerState + AuthorityRegistry + ParamsRegistry + ExtensionRegistry {}

impl<T> ConsensusState for T where
    T: LedgerState + AuthorityRegistry + ParamsRegistry + ExtensionRegistry
{
}

// =============================================================================
// CHAIN INDEX
// =============================================================================

/// Where a committed transaction lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxLocation {
    pub block_id: Hash,
    pub index: usize,
}

/// Deferred receipt read.
pub type ReceiptFetch<'a> = Box<dyn FnOnce() -> Result<Receipt, ChainError> + 'a>;

/// A transaction found in the chain index.
///
/// The receipt is only loaded if asked for, so a plain duplicate check never
/// pays for decoding it.
pub struct TxLookup<'a> {
    pub location: TxLocation,
    fetch: ReceiptFetch<'a>,
}

impl<'a> TxLookup<'a> {
    pub fn new(location: TxLocation, fetch: ReceiptFetch<'a>) -> Self {
        Self { location, fetch }
    }

    pub fn receipt(self) -> Result<Receipt, ChainError> {
        (self.fetch)()
    }

    pub fn is_reverted(self) -> Result<bool, ChainError> {
        Ok(self.receipt()?.reverted)
    }
}

impl std::fmt::Debug for TxLookup<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxLookup")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Index over committed blocks and their transactions.
pub trait ChainIndex: Send + Sync {
    fn genesis_id(&self) -> Hash;

    /// Chain tag: last byte of the genesis ID.
    fn tag(&self) -> u8 {
        self.genesis_id()[31]
    }

    /// Find `tx_id` among `ancestor_id` and its ancestors.
    fn lookup_transaction(
        &self,
        ancestor_id: &Hash,
        tx_id: &Hash,
    ) -> Result<Option<TxLookup<'_>>, ChainError>;
}

// =============================================================================
// RUNTIME
// =============================================================================

/// Block-level values visible to transaction execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockContext {
    pub beneficiary: Address,
    pub number: u32,
    pub timestamp: u64,
    pub gas_limit: u64,
}

/// Applies one transaction to state.
///
/// A reverted transaction is a successful execution: it returns a receipt
/// with `reverted == true`. Errors are reserved for failures that make the
/// whole block unexecutable.
pub trait TransactionRuntime<S>: Send + Sync {
    fn execute_transaction(
        &self,
        state: &mut S,
        context: &BlockContext,
        tx: &Transaction,
    ) -> Result<Receipt, RuntimeError>;
}
