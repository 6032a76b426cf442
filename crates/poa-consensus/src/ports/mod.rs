//! Ports layer (Hexagonal Architecture)
//!
//! Inbound: the single validation operation offered to the node.
//! Outbound: ledger state, chain index and transaction runtime.

mod inbound;
mod outbound;

pub use inbound::*;
pub use outbound::*;
