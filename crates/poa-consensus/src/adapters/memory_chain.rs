//! In-memory chain index
//!
//! Stores every added block (including forks) and indexes transactions by
//! ID. Lookups only report a transaction if its block is an ancestor of the
//! queried block, so sibling forks never see each other's transactions.

use crate::domain::{block_number, Block, ChainError, Header, Receipt};
use crate::ports::{ChainIndex, TxLocation, TxLookup};
use parking_lot::RwLock;
use shared_types::{to_hex, Hash};
use std::collections::HashMap;

#[derive(Debug)]
struct StoredBlock {
    header: Header,
    receipts: Vec<Receipt>,
}

#[derive(Debug, Default)]
struct ChainStore {
    blocks: HashMap<Hash, StoredBlock>,
    /// A transaction may sit on several forks
    tx_index: HashMap<Hash, Vec<TxLocation>>,
}

impl ChainStore {
    /// Whether `candidate` is `descendant` or one of its ancestors.
    fn is_ancestor(&self, candidate: &Hash, descendant: &Hash) -> bool {
        let target = block_number(candidate);
        let mut cursor = *descendant;
        loop {
            if cursor == *candidate {
                return true;
            }
            if block_number(&cursor) <= target {
                return false;
            }
            match self.blocks.get(&cursor) {
                Some(stored) => cursor = stored.header.parent_id,
                None => return false,
            }
        }
    }
}

/// Block store with an ancestry-aware transaction index.
#[derive(Debug)]
pub struct MemoryChain {
    genesis_id: Hash,
    store: RwLock<ChainStore>,
}

impl MemoryChain {
    pub fn new(genesis: Header) -> Self {
        let genesis_id = genesis.id();
        let mut store = ChainStore::default();
        store.blocks.insert(
            genesis_id,
            StoredBlock {
                header: genesis,
                receipts: Vec::new(),
            },
        );

        Self {
            genesis_id,
            store: RwLock::new(store),
        }
    }

    /// Record a validated block and its receipts.
    pub fn add_block(&self, block: &Block, receipts: Vec<Receipt>) -> Result<Hash, ChainError> {
        let header = &block.header;
        if receipts.len() != block.transactions.len() {
            return Err(ChainError::InvalidBlock(format!(
                "{} receipts for {} transactions",
                receipts.len(),
                block.transactions.len()
            )));
        }

        let tx_ids = block
            .transactions
            .iter()
            .map(|tx| tx.id())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ChainError::InvalidBlock(err.to_string()))?;

        let block_id = header.id();
        let mut store = self.store.write();
        if !store.blocks.contains_key(&header.parent_id) {
            return Err(ChainError::UnknownBlock(header.parent_id));
        }
        if store.blocks.contains_key(&block_id) {
            return Ok(block_id);
        }

        for (index, tx_id) in tx_ids.into_iter().enumerate() {
            store
                .tx_index
                .entry(tx_id)
                .or_default()
                .push(TxLocation { block_id, index });
        }
        store.blocks.insert(
            block_id,
            StoredBlock {
                header: header.clone(),
                receipts,
            },
        );

        tracing::debug!(
            block_id = %to_hex(&block_id),
            number = header.number(),
            "Block added to chain index"
        );
        Ok(block_id)
    }

    pub fn header(&self, block_id: &Hash) -> Option<Header> {
        self.store
            .read()
            .blocks
            .get(block_id)
            .map(|stored| stored.header.clone())
    }

    pub fn contains(&self, block_id: &Hash) -> bool {
        self.store.read().blocks.contains_key(block_id)
    }
}

impl ChainIndex for MemoryChain {
    fn genesis_id(&self) -> Hash {
        self.genesis_id
    }

    fn lookup_transaction(
        &self,
        ancestor_id: &Hash,
        tx_id: &Hash,
    ) -> Result<Option<TxLookup<'_>>, ChainError> {
        let location = {
            let store = self.store.read();
            if !store.blocks.contains_key(ancestor_id) {
                return Err(ChainError::UnknownBlock(*ancestor_id));
            }
            store.tx_index.get(tx_id).and_then(|locations| {
                locations
                    .iter()
                    .find(|loc| store.is_ancestor(&loc.block_id, ancestor_id))
                    .copied()
            })
        };

        let Some(location) = location else {
            return Ok(None);
        };

        let store = &self.store;
        Ok(Some(TxLookup::new(
            location,
            Box::new(move || {
                store
                    .read()
                    .blocks
                    .get(&location.block_id)
                    .and_then(|stored| stored.receipts.get(location.index))
                    .cloned()
                    .ok_or(ChainError::ReceiptMissing {
                        block_id: location.block_id,
                        index: location.index,
                    })
            }),
        )))
    }
}
