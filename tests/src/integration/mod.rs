//! # Integration Flows
//!
//! Chains of several blocks driven through `Consensus::validate`, committed
//! to the in-memory state and indexed in the in-memory chain.

mod flows;
