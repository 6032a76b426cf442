//! Adapters layer (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound ports. Good enough for tests
//! and single-node devnets; production nodes plug in their own storage and
//! virtual machine.

mod memory_chain;
mod memory_state;
mod transfer_runtime;

pub use memory_chain::*;
pub use memory_state::*;
pub use transfer_runtime::*;
