//! Domain layer for proof-of-authority consensus
//!
//! Pure types and rules, no I/O:
//! - block, transaction, receipt: chain entities and their hashes
//! - scheduler: proposer rotation and score
//! - gas_limit: gas limit band
//! - authority: candidate registry entities and governance keys

mod authority;
mod block;
pub(crate) mod encoding;
mod error;
mod gas_limit;
mod merkle;
mod receipt;
mod scheduler;
mod transaction;

pub use authority::*;
pub use block::*;
pub use error::*;
pub use gas_limit::*;
pub use merkle::*;
pub use receipt::*;
pub use scheduler::*;
pub use transaction::*;
