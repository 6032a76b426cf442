//! # Devnet Harness
//!
//! A complete in-memory chain: genesis state with funded accounts and a set
//! of authorities, plus an honest block producer. The producer computes
//! every header commitment by executing the block the same way validation
//! does, so anything it seals must validate.

use poa_consensus::domain::{
    genesis_parent_id, receipts_root, transactions_root, AuthorityCandidate, BlockRef, Clause,
    SchedulerError, KEY_BASE_GAS_PRICE, KEY_PROPOSER_ENDORSEMENT,
};
use poa_consensus::ports::{
    AuthorityRegistry, BlockContext, ChainIndex, ExtensionRegistry, LedgerState, ParamsRegistry,
    StateStage, TransactionRuntime,
};
use poa_consensus::{
    Block, Consensus, GasLimit, Header, MemoryChain, MemoryDb, MemoryState, Proposer,
    ProtocolConfig, Receipt, Scheduler, Transaction, TransferRuntime, ValidationResult,
};
use primitive_types::U256;
use shared_types::{address_of, Address, Hash, SigningKey, ZERO_HASH};
use std::sync::Arc;

pub const GENESIS_TIME: u64 = 1_700_000_000;

/// Endorsor balance required for an authority to be scheduled.
pub const ENDORSEMENT: u64 = 25_000_000;

pub const BASE_GAS_PRICE: u64 = 1_000;

/// Deterministic key from a one-byte seed.
pub fn account(seed: u8) -> SigningKey {
    let mut bytes = [seed; 32];
    bytes[0] = 0x01;
    SigningKey::from_slice(&bytes).expect("valid scalar")
}

fn endorsor_of(signer: &Address) -> Address {
    let mut endorsor = *signer;
    endorsor[0] ^= 0xFF;
    endorsor
}

/// Route pipeline logs to the test writer; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// In-memory devnet.
pub struct DevNet {
    pub config: ProtocolConfig,
    pub db: Arc<MemoryDb>,
    pub chain: Arc<MemoryChain>,
    pub genesis: Header,
    pub authorities: Vec<SigningKey>,
    pub consensus: Consensus<MemoryChain, TransferRuntime>,
}

impl DevNet {
    /// Devnet with `authorities` proposers and the given funded accounts.
    pub fn new(config: ProtocolConfig, authorities: u8, funded: &[(Address, U256)]) -> Self {
        let db = MemoryDb::new();
        let mut state = db.state(&ZERO_HASH).expect("empty state");
        state.set_param(KEY_PROPOSER_ENDORSEMENT, U256::from(ENDORSEMENT));
        state.set_param(KEY_BASE_GAS_PRICE, U256::from(BASE_GAS_PRICE));

        let authorities: Vec<SigningKey> = (0..authorities).map(|i| account(0xA0 + i)).collect();
        for (i, key) in authorities.iter().enumerate() {
            let signer = address_of(key);
            state.add_candidate(AuthorityCandidate {
                signer,
                endorsor: endorsor_of(&signer),
                identity: [i as u8; 32],
                active: true,
            });
            state
                .set_balance(&endorsor_of(&signer), U256::from(ENDORSEMENT))
                .expect("fund endorsor");
        }
        for (address, amount) in funded {
            state.set_balance(address, *amount).expect("fund account");
        }
        let state_root = state
            .stage()
            .and_then(StateStage::commit)
            .expect("commit genesis state");

        let genesis = Header {
            parent_id: genesis_parent_id(),
            timestamp: GENESIS_TIME,
            gas_limit: config.initial_gas_limit,
            beneficiary: [0u8; 20],
            gas_used: 0,
            total_score: 0,
            txs_root: transactions_root(&[]),
            state_root,
            receipts_root: receipts_root(&[]),
            signature: [0u8; 65],
        };
        let chain = Arc::new(MemoryChain::new(genesis.clone()));
        let consensus = Consensus::new(
            Arc::clone(&chain),
            Arc::new(TransferRuntime),
            config.clone(),
        )
        .expect("valid protocol config");

        Self {
            config,
            db,
            chain,
            genesis,
            authorities,
            consensus,
        }
    }

    pub fn chain_tag(&self) -> u8 {
        self.chain.tag()
    }

    /// Mutable state rooted at `header`.
    pub fn state_at(&self, header: &Header) -> MemoryState {
        self.db.state(&header.state_root).expect("committed state")
    }

    pub fn balance_at(&self, header: &Header, address: &Address) -> U256 {
        self.state_at(header).balance(address).expect("balance")
    }

    /// Proposers eligible on top of `parent`.
    pub fn proposers(&self, parent: &Header) -> Vec<Proposer> {
        let state = self.state_at(parent);
        let endorsement = state
            .param(&KEY_PROPOSER_ENDORSEMENT)
            .expect("endorsement param");
        state
            .candidates()
            .expect("candidates")
            .iter()
            .filter(|c| state.balance(&c.endorsor).unwrap_or_default() >= endorsement)
            .map(Proposer::from)
            .collect()
    }

    pub fn scheduler(&self, key: &SigningKey, parent: &Header) -> Result<Scheduler, SchedulerError> {
        Scheduler::new(
            address_of(key),
            &self.proposers(parent),
            parent.number(),
            parent.timestamp,
            &self.config,
        )
    }

    /// The authority with the earliest slot after `parent`, and that slot.
    pub fn next_proposer(&self, parent: &Header) -> (&SigningKey, u64) {
        self.authorities
            .iter()
            .filter_map(|key| {
                self.scheduler(key, parent)
                    .ok()
                    .map(|s| (key, s.schedule(parent.timestamp)))
            })
            .min_by_key(|(_, timestamp)| *timestamp)
            .expect("at least one authority")
    }

    /// Seal an honest block signed by `key` at `timestamp`.
    pub fn propose(
        &self,
        key: &SigningKey,
        parent: &Header,
        timestamp: u64,
        transactions: Vec<Transaction>,
    ) -> Block {
        let (updates, score) = self
            .scheduler(key, parent)
            .map(|s| s.updates(timestamp))
            .expect("registered authority");

        let mut state = self.state_at(parent);
        for update in &updates {
            state
                .update_candidate(&update.address, update.active)
                .expect("known candidate");
        }
        state
            .set_block_num_and_id(&parent.id())
            .expect("block marker");

        let beneficiary = address_of(key);
        let gas_limit =
            GasLimit(self.config.initial_gas_limit).qualify(parent.gas_limit, &self.config);
        let context = BlockContext {
            beneficiary,
            number: parent.number() + 1,
            timestamp,
            gas_limit,
        };
        let receipts: Vec<Receipt> = transactions
            .iter()
            .map(|tx| {
                TransferRuntime
                    .execute_transaction(&mut state, &context, tx)
                    .expect("executable transaction")
            })
            .collect();

        let mut header = Header {
            parent_id: parent.id(),
            timestamp,
            gas_limit,
            beneficiary,
            gas_used: receipts.iter().map(|r| r.gas_used).sum(),
            total_score: parent.total_score + score,
            txs_root: transactions_root(&transactions),
            state_root: state.root(),
            receipts_root: receipts_root(&receipts),
            signature: [0u8; 65],
        };
        header.sign(key).expect("sign header");
        Block::new(header, transactions)
    }

    /// Seal the next block on `parent` from whoever's turn comes first.
    pub fn produce(&self, parent: &Header, transactions: Vec<Transaction>) -> Block {
        let (key, timestamp) = self.next_proposer(parent);
        self.propose(key, parent, timestamp, transactions)
    }

    /// Validate `block` on `parent`, then commit its state and index it.
    pub fn import(&self, block: &Block, parent: &Header) -> ValidationResult<(Header, Vec<Receipt>)> {
        let (stage, receipts) = self.consensus.validate(
            self.state_at(parent),
            block,
            parent,
            block.header.timestamp,
        )?;
        stage.commit()?;
        self.chain.add_block(block, receipts.clone())?;
        Ok((block.header.clone(), receipts))
    }
}

/// Signed value transfer from `from` to `to`.
pub fn transfer(
    chain_tag: u8,
    from: &SigningKey,
    to: Address,
    value: U256,
    block_ref: u32,
    nonce: u64,
    depends_on: Option<Hash>,
) -> Transaction {
    let mut tx = Transaction {
        chain_tag,
        block_ref: BlockRef::new(block_ref),
        expiration: 32,
        clauses: vec![Clause::transfer(to, value)],
        gas_price_coef: 0,
        gas: 30_000,
        depends_on,
        nonce,
        reserved: Vec::new(),
        signature: [0u8; 65],
    };
    tx.sign(from).expect("sign transaction");
    tx
}
