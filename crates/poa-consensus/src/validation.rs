//! Stateless block checks
//!
//! Header checks compare a header with its parent, body checks compare the
//! transactions with the header. Neither touches ledger state.

use crate::config::ProtocolConfig;
use crate::domain::{
    transactions_root, Block, ConsensusError, GasLimit, Header, SignedObject,
};

/// Stateless validation logic for blocks.
pub struct BlockValidator;

impl BlockValidator {
    /// Check `header` against `parent` and wall-clock time `now`.
    ///
    /// Checks run in a fixed order and the first failure wins.
    pub fn validate_block_header(
        header: &Header,
        parent: &Header,
        now: u64,
        config: &ProtocolConfig,
    ) -> Result<(), ConsensusError> {
        if header.timestamp <= parent.timestamp {
            return Err(ConsensusError::TimestampBehindParent {
                parent: parent.timestamp,
                current: header.timestamp,
            });
        }

        if (header.timestamp - parent.timestamp) % config.block_interval != 0 {
            return Err(ConsensusError::IntervalNotRounded {
                parent: parent.timestamp,
                current: header.timestamp,
            });
        }

        if header.timestamp > now.saturating_add(config.block_interval) {
            return Err(ConsensusError::FutureBlock {
                timestamp: header.timestamp,
                now,
            });
        }

        if !GasLimit(header.gas_limit).is_valid(parent.gas_limit, config) {
            return Err(ConsensusError::GasLimitInvalid {
                parent: parent.gas_limit,
                current: header.gas_limit,
            });
        }

        if header.gas_used > header.gas_limit {
            return Err(ConsensusError::GasUsedExceedsLimit {
                limit: header.gas_limit,
                used: header.gas_used,
            });
        }

        if header.total_score <= parent.total_score {
            return Err(ConsensusError::TotalScoreInvalid {
                want: parent.total_score.saturating_add(1),
                have: header.total_score,
            });
        }

        Ok(())
    }

    /// Check the transaction list of `block` against its header.
    pub fn validate_block_body(block: &Block, chain_tag: u8) -> Result<(), ConsensusError> {
        let header = &block.header;

        let txs_root = transactions_root(&block.transactions);
        if header.txs_root != txs_root {
            return Err(ConsensusError::TxRootMismatch {
                want: header.txs_root,
                have: txs_root,
            });
        }

        let number = header.number();
        for (index, tx) in block.transactions.iter().enumerate() {
            tx.signer().map_err(|source| ConsensusError::SignerUnavailable {
                subject: SignedObject::Transaction { index },
                source,
            })?;

            if tx.chain_tag != chain_tag {
                return Err(ConsensusError::ChainTagMismatch {
                    want: chain_tag,
                    have: tx.chain_tag,
                });
            }

            let reference = tx.block_ref.number();
            if number < reference {
                return Err(ConsensusError::TxRefFutureBlock {
                    reference,
                    current: number,
                });
            }

            if tx.is_expired(number) {
                return Err(ConsensusError::TxExpired {
                    reference,
                    current: number,
                    expiration: tx.expiration,
                });
            }

            if tx.has_reserved_fields() {
                return Err(ConsensusError::ReservedFieldsNotEmpty { index });
            }
        }

        Ok(())
    }
}
