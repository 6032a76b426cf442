//! # Validation Metrics
//!
//! Prometheus metrics for the block validation pipeline.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! poa-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `poa_blocks_validated_total` - Counter of accepted blocks
//! - `poa_blocks_rejected_total` - Counter of rejected blocks (by reason)
//! - `poa_future_blocks_total` - Counter of blocks deferred as future blocks
//! - `poa_validation_latency_seconds` - Histogram of validation times
//! - `poa_transactions_executed_total` - Counter of transactions replayed

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Blocks that passed every check
    pub static ref BLOCKS_VALIDATED: IntCounter = register_int_counter!(
        "poa_blocks_validated_total",
        "Total number of blocks successfully validated"
    )
    .expect("Failed to create BLOCKS_VALIDATED metric");

    /// Rejected blocks, labeled by rejection reason
    pub static ref BLOCKS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "poa_blocks_rejected_total",
        "Total number of blocks rejected",
        &["reason"]
    )
    .expect("Failed to create BLOCKS_REJECTED metric");

    pub static ref FUTURE_BLOCKS: IntCounter = register_int_counter!(
        "poa_future_blocks_total",
        "Total number of blocks deferred because their timestamp is ahead of the clock"
    )
    .expect("Failed to create FUTURE_BLOCKS metric");

    /// Wall time of a full validation, including execution
    pub static ref VALIDATION_LATENCY: Histogram = register_histogram!(
        "poa_validation_latency_seconds",
        "Time taken to validate a block in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to create VALIDATION_LATENCY metric");

    pub static ref TRANSACTIONS_EXECUTED: IntCounter = register_int_counter!(
        "poa_transactions_executed_total",
        "Total number of transactions executed during validation"
    )
    .expect("Failed to create TRANSACTIONS_EXECUTED metric");
}

/// Record a successful block validation
#[cfg(feature = "metrics")]
pub fn record_block_validated() {
    BLOCKS_VALIDATED.inc();
}

/// Record a rejected block with reason
#[cfg(feature = "metrics")]
pub fn record_block_rejected(reason: &str) {
    BLOCKS_REJECTED.with_label_values(&[reason]).inc();
}

/// Record a block that is not valid yet
#[cfg(feature = "metrics")]
pub fn record_future_block() {
    FUTURE_BLOCKS.inc();
}

/// Record validation latency
#[cfg(feature = "metrics")]
pub fn record_validation_latency(seconds: f64) {
    VALIDATION_LATENCY.observe(seconds);
}

#[cfg(feature = "metrics")]
pub fn record_transactions_executed(count: usize) {
    TRANSACTIONS_EXECUTED.inc_by(count as u64);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_block_validated() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_future_block() {}

#[cfg(not(feature = "metrics"))]
pub fn record_validation_latency(_seconds: f64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_transactions_executed(_count: usize) {}
