//! Driving ports (Inbound API)

use super::outbound::{ConsensusState, LedgerState};
use crate::domain::{Block, Header, Receipt, ValidationResult};

/// Block validation API
///
/// The only operation this crate exposes to the rest of the node.
pub trait BlockValidationApi<S: ConsensusState> {
    /// Validate `block` on top of `parent`, executing it against `state`.
    ///
    /// `state` must be rooted at `parent.state_root`. A block whose
    /// `parent_id` is not `parent.id()` is rejected. On success the
    /// returned stage is uncommitted; committing it is up to the caller.
    /// On error the state and every pending write are dropped.
    fn validate(
        &self,
        state: S,
        block: &Block,
        parent: &Header,
        now: u64,
    ) -> ValidationResult<(<S as LedgerState>::Stage, Vec<Receipt>)>;
}
