//! Protocol configuration
//!
//! Every node on a network must run with identical values; they feed the
//! scheduler and the header checks and therefore decide consensus.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Seconds between two consecutive block slots.
pub const DEFAULT_BLOCK_INTERVAL: u64 = 10;

/// Upper bound on slots walked back when computing activity updates.
pub const DEFAULT_MAX_BLOCK_PROPOSERS: u64 = 101;

/// Absolute floor for a block gas limit.
pub const DEFAULT_MIN_GAS_LIMIT: u64 = 1_000_000;

/// Gas limit carried by genesis.
pub const DEFAULT_INITIAL_GAS_LIMIT: u64 = 10_000_000;

/// A child's gas limit may differ from its parent's by at most `parent / divisor`.
pub const DEFAULT_GAS_LIMIT_BOUND_DIVISOR: u64 = 1024;

/// Consensus parameters shared by every validator on a network.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Block slot length in seconds
    pub block_interval: u64,

    /// Cap on skipped slots inspected by the scheduler
    pub max_block_proposers: u64,

    /// Absolute gas limit floor
    pub min_gas_limit: u64,

    /// Absolute gas limit ceiling
    pub max_gas_limit: u64,

    /// Relative gas limit step bound
    pub gas_limit_bound_divisor: u64,

    /// Gas limit used by genesis and as the producer's default target
    pub initial_gas_limit: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            block_interval: DEFAULT_BLOCK_INTERVAL,
            max_block_proposers: DEFAULT_MAX_BLOCK_PROPOSERS,
            min_gas_limit: DEFAULT_MIN_GAS_LIMIT,
            max_gas_limit: u64::MAX,
            gas_limit_bound_divisor: DEFAULT_GAS_LIMIT_BOUND_DIVISOR,
            initial_gas_limit: DEFAULT_INITIAL_GAS_LIMIT,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(&'static str),
}

impl ProtocolConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    ///
    /// ```toml
    /// block_interval = 10
    /// max_block_proposers = 101
    /// min_gas_limit = 1000000
    /// gas_limit_bound_divisor = 1024
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject values that would make scheduling or gas checks meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_interval == 0 {
            return Err(ConfigError::Invalid("block_interval must be positive"));
        }
        if self.max_block_proposers == 0 {
            return Err(ConfigError::Invalid("max_block_proposers must be positive"));
        }
        if self.gas_limit_bound_divisor == 0 {
            return Err(ConfigError::Invalid("gas_limit_bound_divisor must be positive"));
        }
        if self.min_gas_limit > self.max_gas_limit {
            return Err(ConfigError::Invalid("min_gas_limit exceeds max_gas_limit"));
        }
        Ok(())
    }
}
