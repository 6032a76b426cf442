//! In-memory ledger state
//!
//! Committed snapshots are immutable and shared behind `Arc`; a
//! [`MemoryState`] clones its snapshot on first write, so any number of
//! validation attempts can fan out from the same root.

use crate::domain::encoding::FieldHasher;
use crate::domain::{AuthorityCandidate, ParamKey, StateError};
use crate::ports::{AuthorityRegistry, ExtensionRegistry, LedgerState, ParamsRegistry, StateStage};
use parking_lot::RwLock;
use shared_types::{Address, Hash, U256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Snapshot {
    /// Zero balances are never stored
    balances: BTreeMap<Address, U256>,
    candidates: Vec<AuthorityCandidate>,
    params: BTreeMap<ParamKey, U256>,
    /// Parent of the block currently being executed
    block_marker: Option<Hash>,
}

impl Snapshot {
    fn root(&self) -> Hash {
        let mut hasher = FieldHasher::new();
        hasher.len(self.balances.len());
        for (address, balance) in &self.balances {
            hasher.fixed(address).u256(balance);
        }
        hasher.len(self.candidates.len());
        for candidate in &self.candidates {
            hasher
                .fixed(&candidate.signer)
                .fixed(&candidate.endorsor)
                .fixed(&candidate.identity)
                .bool(candidate.active);
        }
        hasher.len(self.params.len());
        for (key, value) in &self.params {
            hasher.fixed(key).u256(value);
        }
        hasher.optional(self.block_marker.as_ref().map(|id| &id[..]));
        hasher.finish()
    }
}

/// Committed snapshots keyed by state root.
#[derive(Debug, Default)]
pub struct MemoryDb {
    snapshots: RwLock<HashMap<Hash, Arc<Snapshot>>>,
}

impl MemoryDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open a mutable view rooted at `root`.
    ///
    /// The all-zero root always resolves to the empty state.
    pub fn state(self: &Arc<Self>, root: &Hash) -> Result<MemoryState, StateError> {
        let snapshot = if *root == shared_types::ZERO_HASH {
            Arc::new(Snapshot::default())
        } else {
            self.snapshots
                .read()
                .get(root)
                .cloned()
                .ok_or(StateError::UnknownRoot(*root))?
        };

        Ok(MemoryState {
            db: Arc::clone(self),
            snapshot,
        })
    }

    pub fn contains(&self, root: &Hash) -> bool {
        self.snapshots.read().contains_key(root)
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }

    fn insert(&self, root: Hash, snapshot: Arc<Snapshot>) {
        self.snapshots.write().insert(root, snapshot);
    }
}

/// Ledger state for one validation attempt.
#[derive(Clone, Debug)]
pub struct MemoryState {
    db: Arc<MemoryDb>,
    snapshot: Arc<Snapshot>,
}

impl MemoryState {
    /// Root of the state including pending writes.
    pub fn root(&self) -> Hash {
        self.snapshot.root()
    }

    /// Register or replace a candidate (keyed by signer).
    pub fn add_candidate(&mut self, candidate: AuthorityCandidate) {
        let snapshot = Arc::make_mut(&mut self.snapshot);
        match snapshot
            .candidates
            .iter_mut()
            .find(|c| c.signer == candidate.signer)
        {
            Some(existing) => *existing = candidate,
            None => snapshot.candidates.push(candidate),
        }
    }

    pub fn set_param(&mut self, key: ParamKey, value: U256) {
        let params = &mut Arc::make_mut(&mut self.snapshot).params;
        if value.is_zero() {
            params.remove(&key);
        } else {
            params.insert(key, value);
        }
    }

    pub fn block_marker(&self) -> Option<Hash> {
        self.snapshot.block_marker
    }
}

impl LedgerState for MemoryState {
    type Stage = MemoryStage;

    fn balance(&self, address: &Address) -> Result<U256, StateError> {
        Ok(self
            .snapshot
            .balances
            .get(address)
            .copied()
            .unwrap_or_default())
    }

    fn set_balance(&mut self, address: &Address, amount: U256) -> Result<(), StateError> {
        let balances = &mut Arc::make_mut(&mut self.snapshot).balances;
        if amount.is_zero() {
            balances.remove(address);
        } else {
            balances.insert(*address, amount);
        }
        Ok(())
    }

    fn stage(self) -> Result<MemoryStage, StateError> {
        let root = self.snapshot.root();
        Ok(MemoryStage {
            db: self.db,
            snapshot: self.snapshot,
            root,
        })
    }
}

impl AuthorityRegistry for MemoryState {
    fn candidates(&self) -> Result<Vec<AuthorityCandidate>, StateError> {
        Ok(self.snapshot.candidates.clone())
    }

    fn update_candidate(&mut self, signer: &Address, active: bool) -> Result<(), StateError> {
        let candidate = Arc::make_mut(&mut self.snapshot)
            .candidates
            .iter_mut()
            .find(|c| c.signer == *signer)
            .ok_or(StateError::CandidateNotFound(*signer))?;
        candidate.active = active;
        Ok(())
    }
}

impl ParamsRegistry for MemoryState {
    fn param(&self, key: &ParamKey) -> Result<U256, StateError> {
        Ok(self.snapshot.params.get(key).copied().unwrap_or_default())
    }
}

impl ExtensionRegistry for MemoryState {
    fn set_block_num_and_id(&mut self, parent_id: &Hash) -> Result<(), StateError> {
        Arc::make_mut(&mut self.snapshot).block_marker = Some(*parent_id);
        Ok(())
    }
}

/// Frozen writes of a [`MemoryState`].
#[derive(Debug)]
pub struct MemoryStage {
    db: Arc<MemoryDb>,
    snapshot: Arc<Snapshot>,
    root: Hash,
}

impl StateStage for MemoryStage {
    fn hash(&self) -> Hash {
        self.root
    }

    fn commit(self) -> Result<Hash, StateError> {
        self.db.insert(self.root, self.snapshot);
        Ok(self.root)
    }
}
