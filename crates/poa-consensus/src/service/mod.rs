//! Consensus service - block validation pipeline
//!
//! Runs, strictly in order:
//! 0. the block must extend `parent`
//! 1. header checks against the parent ([`BlockValidator`])
//! 2. proposer scheduling and authority updates
//! 3. body checks ([`BlockValidator`])
//! 4. transaction replay and commitment checks
//!
//! The ledger state is owned by the attempt. Every error drops it, so the
//! authority updates from step 2 never outlive a rejected block.

use crate::config::{ConfigError, ProtocolConfig};
use crate::domain::{
    receipts_root, Block, ChainError, ConsensusError, Header, Proposer, Receipt, Scheduler,
    SignedObject, ValidationResult, KEY_PROPOSER_ENDORSEMENT,
};
use crate::metrics;
use crate::ports::{
    BlockContext, BlockValidationApi, ChainIndex, ConsensusState, LedgerState, StateStage,
    TransactionRuntime, TxLookup,
};
use crate::validation::BlockValidator;
use shared_types::{to_hex, Hash};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Where an already-executed transaction was found.
enum FoundTx<'a> {
    /// Earlier in the block being validated
    InBlock { reverted: bool },
    /// In a committed ancestor; the receipt is still unread
    InChain(TxLookup<'a>),
}

impl FoundTx<'_> {
    fn is_reverted(self) -> Result<bool, ChainError> {
        match self {
            Self::InBlock { reverted } => Ok(reverted),
            Self::InChain(lookup) => lookup.is_reverted(),
        }
    }
}

/// Consensus validator
///
/// Holds only immutable collaborators, so one instance can validate
/// competing blocks from several threads as long as each call gets its own
/// state.
pub struct Consensus<C, R> {
    chain: Arc<C>,
    runtime: Arc<R>,
    config: ProtocolConfig,
    chain_tag: u8,
}

impl<C, R> Consensus<C, R>
where
    C: ChainIndex,
{
    /// Create a validator bound to `chain`. The chain tag is read once here.
    ///
    /// Fails if `config` does not pass [`ProtocolConfig::validate`].
    pub fn new(
        chain: Arc<C>,
        runtime: Arc<R>,
        config: ProtocolConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let chain_tag = chain.tag();
        Ok(Self {
            chain,
            runtime,
            config,
            chain_tag,
        })
    }

    pub fn chain_tag(&self) -> u8 {
        self.chain_tag
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Validate `block` on top of `parent` and execute it against `state`.
    ///
    /// Returns the uncommitted stage and the receipts. `now` is wall-clock
    /// time in seconds; a block more than one interval ahead of it fails
    /// with a retryable [`ConsensusError::FutureBlock`].
    #[instrument(
        name = "validate_block",
        skip_all,
        fields(number = block.header.number(), txs = block.transactions.len())
    )]
    pub fn validate<S>(
        &self,
        state: S,
        block: &Block,
        parent: &Header,
        now: u64,
    ) -> ValidationResult<(S::Stage, Vec<Receipt>)>
    where
        S: ConsensusState,
        R: TransactionRuntime<S>,
    {
        let started = Instant::now();
        let result = self.run_pipeline(state, block, parent, now);
        metrics::record_validation_latency(started.elapsed().as_secs_f64());

        match &result {
            Ok((stage, _)) => {
                metrics::record_block_validated();
                info!(
                    gas_used = block.header.gas_used,
                    state_root = %to_hex(&stage.hash()),
                    "Block validated"
                );
            }
            Err(err) if err.is_future_block() => {
                metrics::record_future_block();
                debug!(error = %err, "Block deferred");
            }
            Err(err) => {
                metrics::record_block_rejected(err.reason());
                warn!(reason = err.reason(), error = %err, "Block rejected");
            }
        }

        result
    }

    fn run_pipeline<S>(
        &self,
        mut state: S,
        block: &Block,
        parent: &Header,
        now: u64,
    ) -> ValidationResult<(S::Stage, Vec<Receipt>)>
    where
        S: ConsensusState,
        R: TransactionRuntime<S>,
    {
        let parent_id = parent.id();
        if block.header.parent_id != parent_id {
            return Err(ConsensusError::ParentMismatch {
                want: parent_id,
                have: block.header.parent_id,
            }
            .into());
        }

        BlockValidator::validate_block_header(&block.header, parent, now, &self.config)?;
        debug!("Header checks passed");

        self.validate_proposer(&block.header, parent, &mut state)?;
        debug!("Proposer checks passed");

        BlockValidator::validate_block_body(block, self.chain_tag)?;
        debug!("Body checks passed");

        self.verify_block(block, state)
    }

    /// Check that the signer owns the header's slot and claims the right
    /// score, then apply the resulting activity updates to `state`.
    pub fn validate_proposer<S>(
        &self,
        header: &Header,
        parent: &Header,
        state: &mut S,
    ) -> ValidationResult<()>
    where
        S: ConsensusState,
    {
        let signer = header
            .signer()
            .map_err(|source| ConsensusError::SignerUnavailable {
                subject: SignedObject::Block,
                source,
            })?;

        let endorsement = state.param(&KEY_PROPOSER_ENDORSEMENT)?;
        let candidates = state.candidates()?;

        let mut proposers = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            if state.balance(&candidate.endorsor)? >= endorsement {
                proposers.push(Proposer::from(candidate));
            }
        }

        let scheduler = Scheduler::new(
            signer,
            &proposers,
            parent.number(),
            parent.timestamp,
            &self.config,
        )
        .map_err(|source| ConsensusError::InvalidSigner { signer, source })?;

        if !scheduler.is_the_time(header.timestamp) {
            return Err(ConsensusError::TimestampUnscheduled {
                timestamp: header.timestamp,
                signer,
            }
            .into());
        }

        let (updates, score) = scheduler.updates(header.timestamp);
        let want = parent.total_score.saturating_add(score);
        if header.total_score != want {
            return Err(ConsensusError::TotalScoreInvalid {
                want,
                have: header.total_score,
            }
            .into());
        }

        for update in &updates {
            state.update_candidate(&update.address, update.active)?;
        }
        if !updates.is_empty() {
            debug!(updates = updates.len(), score, "Applied proposer activity updates");
        }

        Ok(())
    }

    /// Replay the transactions of `block` and check the header commitments.
    ///
    /// Expects header, proposer and body checks to have passed.
    pub fn verify_block<S>(
        &self,
        block: &Block,
        mut state: S,
    ) -> ValidationResult<(S::Stage, Vec<Receipt>)>
    where
        S: ConsensusState,
        R: TransactionRuntime<S>,
    {
        let header = &block.header;
        state.set_block_num_and_id(&header.parent_id)?;

        let context = BlockContext {
            beneficiary: header.beneficiary,
            number: header.number(),
            timestamp: header.timestamp,
            gas_limit: header.gas_limit,
        };

        let mut processed: HashMap<Hash, bool> = HashMap::with_capacity(block.transactions.len());
        let mut receipts = Vec::with_capacity(block.transactions.len());
        let mut total_gas_used = 0u64;

        for (index, tx) in block.transactions.iter().enumerate() {
            let tx_id = tx
                .id()
                .map_err(|source| ConsensusError::SignerUnavailable {
                    subject: SignedObject::Transaction { index },
                    source,
                })?;

            if self.find_tx(&header.parent_id, &processed, &tx_id)?.is_some() {
                return Err(ConsensusError::TxAlreadyExists { tx_id }.into());
            }

            if let Some(dependency) = tx.depends_on {
                match self.find_tx(&header.parent_id, &processed, &dependency)? {
                    None => {
                        return Err(ConsensusError::TxDepBroken { tx_id, dependency }.into());
                    }
                    Some(found) => {
                        if found.is_reverted()? {
                            return Err(ConsensusError::TxDepReverted { tx_id, dependency }.into());
                        }
                    }
                }
            }

            let receipt = self.runtime.execute_transaction(&mut state, &context, tx)?;

            total_gas_used = total_gas_used.saturating_add(receipt.gas_used);
            processed.insert(tx_id, receipt.reverted);
            receipts.push(receipt);
        }
        metrics::record_transactions_executed(receipts.len());

        if header.gas_used != total_gas_used {
            return Err(ConsensusError::GasUsedMismatch {
                want: header.gas_used,
                have: total_gas_used,
            }
            .into());
        }

        let receipts_root = receipts_root(&receipts);
        if header.receipts_root != receipts_root {
            return Err(ConsensusError::ReceiptsRootMismatch {
                want: header.receipts_root,
                have: receipts_root,
            }
            .into());
        }

        let stage = state.stage()?;
        let state_root = stage.hash();
        if header.state_root != state_root {
            return Err(ConsensusError::StateRootMismatch {
                want: header.state_root,
                have: state_root,
            }
            .into());
        }

        debug!(gas_used = total_gas_used, "Execution checks passed");
        Ok((stage, receipts))
    }

    /// Look up `tx_id` in this block first, then in the ancestry of
    /// `parent_id`.
    fn find_tx(
        &self,
        parent_id: &Hash,
        processed: &HashMap<Hash, bool>,
        tx_id: &Hash,
    ) -> Result<Option<FoundTx<'_>>, ChainError> {
        if let Some(reverted) = processed.get(tx_id) {
            return Ok(Some(FoundTx::InBlock {
                reverted: *reverted,
            }));
        }
        Ok(self
            .chain
            .lookup_transaction(parent_id, tx_id)?
            .map(FoundTx::InChain))
    }
}

impl<C, R, S> BlockValidationApi<S> for Consensus<C, R>
where
    C: ChainIndex,
    R: TransactionRuntime<S>,
    S: ConsensusState,
{
    fn validate(
        &self,
        state: S,
        block: &Block,
        parent: &Header,
        now: u64,
    ) -> ValidationResult<(S::Stage, Vec<Receipt>)> {
        Consensus::validate(self, state, block, parent, now)
    }
}
