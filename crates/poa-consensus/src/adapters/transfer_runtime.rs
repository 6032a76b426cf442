//! Value-transfer runtime
//!
//! Executes clauses as plain balance transfers, no contract code. Gas is
//! the intrinsic gas of the transaction; the fee is charged to the origin
//! and part of it is paid to the block beneficiary.

use crate::domain::{
    Clause, Output, Receipt, RuntimeError, StateError, Transaction, Transfer, KEY_BASE_GAS_PRICE,
};
use crate::ports::{BlockContext, LedgerState, ParamsRegistry, TransactionRuntime};
use shared_types::{Address, U256};
use std::collections::BTreeMap;

/// Percentage of the paid fee credited to the beneficiary.
pub const REWARD_PERCENT: u64 = 30;

/// Runtime that understands value transfers only.
///
/// A clause sequence that would overdraw the origin, create a contract or
/// overflow a recipient balance reverts as a whole. The fee is charged
/// either way.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransferRuntime;

impl TransferRuntime {
    pub fn new() -> Self {
        Self
    }

    /// Effective price per unit of gas: `base * (255 + coef) / 255`.
    pub fn gas_price(base_gas_price: U256, coef: u8) -> U256 {
        base_gas_price.saturating_mul(U256::from(255u64 + u64::from(coef))) / U256::from(255u64)
    }

    /// Apply `clauses` atomically, or return `None` if they revert.
    fn apply_clauses<S: LedgerState>(
        state: &mut S,
        origin: Address,
        clauses: &[Clause],
    ) -> Result<Option<Vec<Output>>, StateError> {
        let mut pending: BTreeMap<Address, U256> = BTreeMap::new();
        let mut outputs = Vec::with_capacity(clauses.len());

        for clause in clauses {
            let Some(to) = clause.to else {
                return Ok(None);
            };

            let sender_balance = match pending.get(&origin) {
                Some(balance) => *balance,
                None => state.balance(&origin)?,
            };
            let Some(sender_balance) = sender_balance.checked_sub(clause.value) else {
                return Ok(None);
            };
            pending.insert(origin, sender_balance);

            let recipient_balance = match pending.get(&to) {
                Some(balance) => *balance,
                None => state.balance(&to)?,
            };
            let Some(recipient_balance) = recipient_balance.checked_add(clause.value) else {
                return Ok(None);
            };
            pending.insert(to, recipient_balance);

            let mut output = Output::default();
            if !clause.value.is_zero() {
                output.transfers.push(Transfer {
                    sender: origin,
                    recipient: to,
                    amount: clause.value,
                });
            }
            outputs.push(output);
        }

        for (address, balance) in pending {
            state.set_balance(&address, balance)?;
        }
        Ok(Some(outputs))
    }
}

impl<S> TransactionRuntime<S> for TransferRuntime
where
    S: LedgerState + ParamsRegistry,
{
    fn execute_transaction(
        &self,
        state: &mut S,
        context: &BlockContext,
        tx: &Transaction,
    ) -> Result<Receipt, RuntimeError> {
        let origin = tx.signer()?;

        let intrinsic = tx.intrinsic_gas();
        if tx.gas < intrinsic {
            return Err(RuntimeError::IntrinsicGasExceeded {
                intrinsic,
                provided: tx.gas,
            });
        }
        let gas_used = intrinsic;

        let gas_price = Self::gas_price(state.param(&KEY_BASE_GAS_PRICE)?, tx.gas_price_coef);
        let paid = gas_price.saturating_mul(U256::from(gas_used));

        let balance = state.balance(&origin)?;
        let Some(remaining) = balance.checked_sub(paid) else {
            return Err(RuntimeError::InsufficientFunds { payer: origin });
        };
        state.set_balance(&origin, remaining)?;

        let (reverted, outputs) = match Self::apply_clauses(state, origin, &tx.clauses)? {
            Some(outputs) => (false, outputs),
            None => (true, Vec::new()),
        };

        let reward = paid.saturating_mul(U256::from(REWARD_PERCENT)) / U256::from(100u64);
        let beneficiary = state.balance(&context.beneficiary)?;
        let credited = beneficiary
            .checked_add(reward)
            .ok_or(StateError::BalanceOverflow(context.beneficiary))?;
        state.set_balance(&context.beneficiary, credited)?;

        tracing::trace!(gas_used, reverted, "Transaction executed");

        Ok(Receipt {
            gas_used,
            gas_payer: origin,
            paid,
            reward,
            reverted,
            outputs,
        })
    }
}
