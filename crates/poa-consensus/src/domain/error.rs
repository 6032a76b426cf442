//! Error types for the validation pipeline
//!
//! Two families: [`ConsensusError`] means the block itself is invalid, the
//! remaining errors come from collaborators (state, chain index, runtime)
//! and say nothing about the block. [`ValidationError`] carries either.

use shared_types::{to_hex, Address, Hash, SignatureError};
use std::fmt;
use thiserror::Error;

/// Object whose signature could not be recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedObject {
    Block,
    Transaction { index: usize },
}

impl fmt::Display for SignedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block => write!(f, "block"),
            Self::Transaction { index } => write!(f, "tx #{}", index),
        }
    }
}

/// The block violates a consensus rule.
///
/// Every variant except [`ConsensusError::FutureBlock`] is a permanent
/// rejection of this exact block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsensusError {
    /// The block does not extend the header it was validated against.
    #[error("block parent mismatch: want {}, have {}", to_hex(.want), to_hex(.have))]
    ParentMismatch { want: Hash, have: Hash },

    #[error("block timestamp behind parents: parent {parent}, current {current}")]
    TimestampBehindParent { parent: u64, current: u64 },

    #[error("block interval not rounded: parent {parent}, current {current}")]
    IntervalNotRounded { parent: u64, current: u64 },

    /// Valid only once wall-clock time catches up.
    #[error("block in the future: timestamp {timestamp}, now {now}")]
    FutureBlock { timestamp: u64, now: u64 },

    #[error("block gas limit invalid: parent {parent}, current {current}")]
    GasLimitInvalid { parent: u64, current: u64 },

    #[error("block gas used exceeds limit: limit {limit}, used {used}")]
    GasUsedExceedsLimit { limit: u64, used: u64 },

    /// `want` is the smallest acceptable score for the header check and the
    /// exact scheduled score for the proposer check.
    #[error("block total score invalid: want {want}, have {have}")]
    TotalScoreInvalid { want: u64, have: u64 },

    #[error("{subject} signer unavailable: {source}")]
    SignerUnavailable {
        subject: SignedObject,
        #[source]
        source: SignatureError,
    },

    #[error("block signer invalid: {} {source}", to_hex(.signer))]
    InvalidSigner {
        signer: Address,
        #[source]
        source: SchedulerError,
    },

    #[error("block timestamp unscheduled: t {timestamp}, s {}", to_hex(.signer))]
    TimestampUnscheduled { timestamp: u64, signer: Address },

    #[error("block txs root mismatch: want {}, have {}", to_hex(.want), to_hex(.have))]
    TxRootMismatch { want: Hash, have: Hash },

    #[error("tx chain tag mismatch: want {want}, have {have}")]
    ChainTagMismatch { want: u8, have: u8 },

    #[error("tx ref future block: ref {reference}, current {current}")]
    TxRefFutureBlock { reference: u32, current: u32 },

    #[error("tx expired: ref {reference}, current {current}, expiration {expiration}")]
    TxExpired {
        reference: u32,
        current: u32,
        expiration: u32,
    },

    #[error("tx reserved fields not empty: tx #{index}")]
    ReservedFieldsNotEmpty { index: usize },

    #[error("tx already exists: {}", to_hex(.tx_id))]
    TxAlreadyExists { tx_id: Hash },

    #[error("tx dep broken: tx {}, dep {}", to_hex(.tx_id), to_hex(.dependency))]
    TxDepBroken { tx_id: Hash, dependency: Hash },

    #[error("tx dep reverted: tx {}, dep {}", to_hex(.tx_id), to_hex(.dependency))]
    TxDepReverted { tx_id: Hash, dependency: Hash },

    #[error("block gas used mismatch: want {want}, have {have}")]
    GasUsedMismatch { want: u64, have: u64 },

    #[error("block receipts root mismatch: want {}, have {}", to_hex(.want), to_hex(.have))]
    ReceiptsRootMismatch { want: Hash, have: Hash },

    #[error("block state root mismatch: want {}, have {}", to_hex(.want), to_hex(.have))]
    StateRootMismatch { want: Hash, have: Hash },
}

impl ConsensusError {
    /// The block may become valid later; callers may retry it.
    pub fn is_future_block(&self) -> bool {
        matches!(self, Self::FutureBlock { .. })
    }

    /// Stable label for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ParentMismatch { .. } => "parent_mismatch",
            Self::TimestampBehindParent { .. } => "timestamp_behind_parent",
            Self::IntervalNotRounded { .. } => "interval_not_rounded",
            Self::FutureBlock { .. } => "future_block",
            Self::GasLimitInvalid { .. } => "gas_limit_invalid",
            Self::GasUsedExceedsLimit { .. } => "gas_used_exceeds_limit",
            Self::TotalScoreInvalid { .. } => "total_score_invalid",
            Self::SignerUnavailable { .. } => "signer_unavailable",
            Self::InvalidSigner { .. } => "invalid_signer",
            Self::TimestampUnscheduled { .. } => "timestamp_unscheduled",
            Self::TxRootMismatch { .. } => "tx_root_mismatch",
            Self::ChainTagMismatch { .. } => "chain_tag_mismatch",
            Self::TxRefFutureBlock { .. } => "tx_ref_future_block",
            Self::TxExpired { .. } => "tx_expired",
            Self::ReservedFieldsNotEmpty { .. } => "reserved_fields_not_empty",
            Self::TxAlreadyExists { .. } => "tx_already_exists",
            Self::TxDepBroken { .. } => "tx_dep_broken",
            Self::TxDepReverted { .. } => "tx_dep_reverted",
            Self::GasUsedMismatch { .. } => "gas_used_mismatch",
            Self::ReceiptsRootMismatch { .. } => "receipts_root_mismatch",
            Self::StateRootMismatch { .. } => "state_root_mismatch",
        }
    }
}

/// Scheduler construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("unauthorized block proposer")]
    UnauthorizedSigner,
}

/// Ledger state access errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Unknown state root: {}", to_hex(.0))]
    UnknownRoot(Hash),

    #[error("Authority candidate not found: {}", to_hex(.0))]
    CandidateNotFound(Address),

    #[error("Balance overflow for {}", to_hex(.0))]
    BalanceOverflow(Address),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Chain index lookup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Unknown block: {}", to_hex(.0))]
    UnknownBlock(Hash),

    #[error("Receipt missing for tx #{index} of block {}", to_hex(.block_id))]
    ReceiptMissing { block_id: Hash, index: usize },

    #[error("Block rejected by chain index: {0}")]
    InvalidBlock(String),
}

/// Fatal transaction runtime errors.
///
/// A reverted transaction is not an error; it yields a receipt with
/// `reverted == true`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("tx signer unavailable: {0}")]
    Signer(#[from] SignatureError),

    #[error("intrinsic gas exceeds provided gas: intrinsic {intrinsic}, provided {provided}")]
    IntrinsicGasExceeded { intrinsic: u64, provided: u64 },

    #[error("insufficient balance to pay for gas: {}", to_hex(.payer))]
    InsufficientFunds { payer: Address },

    #[error(transparent)]
    State(#[from] StateError),
}

/// Outcome of a failed validation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error("transaction execution failed: {0}")]
    ExecutionFailed(#[from] RuntimeError),

    #[error("ledger state error: {0}")]
    State(#[from] StateError),

    #[error("chain index error: {0}")]
    Chain(#[from] ChainError),
}

impl ValidationError {
    /// The consensus classification, if the block itself was rejected.
    pub fn consensus(&self) -> Option<&ConsensusError> {
        match self {
            Self::Consensus(err) => Some(err),
            _ => None,
        }
    }

    /// See [`ConsensusError::is_future_block`].
    pub fn is_future_block(&self) -> bool {
        self.consensus().is_some_and(ConsensusError::is_future_block)
    }

    /// The block is permanently invalid and must be dropped from the
    /// candidate set.
    pub fn is_block_invalid(&self) -> bool {
        self.consensus().is_some_and(|err| !err.is_future_block())
    }

    /// Stable label for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Consensus(err) => err.reason(),
            Self::ExecutionFailed(_) => "execution_failed",
            Self::State(_) => "state_error",
            Self::Chain(_) => "chain_error",
        }
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
