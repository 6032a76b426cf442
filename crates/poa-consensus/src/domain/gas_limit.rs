//! Block gas limit rules

use crate::config::ProtocolConfig;

/// A block gas limit, checked and adjusted against the protocol band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct GasLimit(pub u64);

impl GasLimit {
    /// Whether this limit may follow `parent_gas_limit`.
    ///
    /// The limit must stay inside `[min_gas_limit, max_gas_limit]` and move
    /// by at most `parent / gas_limit_bound_divisor`.
    pub fn is_valid(self, parent_gas_limit: u64, config: &ProtocolConfig) -> bool {
        let gas_limit = self.0;
        if gas_limit < config.min_gas_limit || gas_limit > config.max_gas_limit {
            return false;
        }
        gas_limit.abs_diff(parent_gas_limit) <= max_step(parent_gas_limit, config)
    }

    /// Move by `delta`, clamped to the largest step the band allows.
    pub fn adjust(self, delta: i64, config: &ProtocolConfig) -> u64 {
        let step = max_step(self.0, config);
        let adjusted = if delta >= 0 {
            self.0.saturating_add(delta.unsigned_abs().min(step))
        } else {
            self.0.saturating_sub(delta.unsigned_abs().min(step))
        };
        adjusted.clamp(config.min_gas_limit, config.max_gas_limit)
    }

    /// Closest limit to `self` that is valid after `parent_gas_limit`.
    pub fn qualify(self, parent_gas_limit: u64, config: &ProtocolConfig) -> u64 {
        let delta = if self.0 >= parent_gas_limit {
            i64::try_from(self.0 - parent_gas_limit).unwrap_or(i64::MAX)
        } else {
            i64::try_from(parent_gas_limit - self.0)
                .map(|d| -d)
                .unwrap_or(i64::MIN + 1)
        };
        GasLimit(parent_gas_limit).adjust(delta, config)
    }
}

fn max_step(parent_gas_limit: u64, config: &ProtocolConfig) -> u64 {
    parent_gas_limit / config.gas_limit_bound_divisor
}
