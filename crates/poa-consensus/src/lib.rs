//! # poa-consensus
//!
//! Proof-of-authority block validation and state transition.
//!
//! ## Architecture
//!
//! Every block, whether received from a peer or produced locally, passes
//! through one pipeline before it may join the chain:
//!
//! ```text
//! header checks ──→ proposer schedule ──→ body checks ──→ replay + roots
//!  (vs parent)      (authority updates)   (per tx)        (gas, receipts, state)
//! ```
//!
//! The result is either an uncommitted state stage plus the receipts, or a
//! [`ValidationError`]. Consensus rejections are permanent except
//! [`ConsensusError::FutureBlock`]; state, chain index and runtime errors say
//! nothing about the block and are passed through untouched.
//!
//! Ledger state, the chain index and the transaction runtime are ports
//! ([`ports`]); [`adapters`] has in-memory versions of each.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use poa_consensus::{Consensus, MemoryChain, MemoryDb, ProtocolConfig, TransferRuntime};
//! use poa_consensus::ports::StateStage;
//!
//! let consensus = Consensus::new(chain, Arc::new(TransferRuntime), ProtocolConfig::default())?;
//!
//! let state = db.state(&parent.state_root)?;
//! let (stage, receipts) = consensus.validate(state, &block, &parent, now)?;
//! stage.commit()?;
//! chain.add_block(&block, receipts)?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod validation;

// Re-export main types
pub use adapters::{MemoryChain, MemoryDb, MemoryStage, MemoryState, TransferRuntime};
pub use config::{ConfigError, ProtocolConfig};
pub use domain::{
    AuthorityCandidate, Block, ConsensusError, GasLimit, Header, Proposer, Receipt, Scheduler,
    Transaction, ValidationError, ValidationResult,
};
pub use ports::{BlockValidationApi, ChainIndex, ConsensusState, TransactionRuntime};
pub use service::Consensus;
pub use validation::BlockValidator;
