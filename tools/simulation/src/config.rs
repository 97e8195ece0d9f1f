//! Simulation configuration
//!
//! Loaded from an optional JSON file; every field has a default so a partial
//! file only overrides what it names. Balances are written in display units
//! (`"0.5"`), gas prices in base units.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use types::numeric::Wei;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Host chain parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Price per unit of gas, in base units
    pub gas_price: Wei,
    /// Gas consumed by deploying the ledger
    pub deploy_gas: u64,
    /// Gas consumed by a deposit transaction
    pub deposit_gas: u64,
    /// Gas consumed by a withdraw transaction
    pub withdraw_gas: u64,
    /// Starting balance of every funded account
    #[serde(with = "display_units")]
    pub genesis_balance: Wei,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            gas_price: Wei::new(20_000_000_000),
            deploy_gas: 1_200_000,
            deposit_gas: 45_000,
            withdraw_gas: 35_000,
            genesis_balance: Wei::new(100 * types::numeric::WEI_PER_UNIT),
        }
    }
}

/// Seeded random workload parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    pub seed: u64,
    pub accounts: usize,
    pub operations: usize,
    /// Upper bound of a single deposit or withdrawal
    #[serde(with = "display_units")]
    pub max_amount: Wei,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            accounts: 8,
            operations: 500,
            max_amount: Wei::new(types::numeric::WEI_PER_UNIT / 2),
        }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub chain: ChainConfig,
    pub stress: StressConfig,
}

impl SimConfig {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.genesis_balance.is_zero() {
            return Err(ConfigError::Invalid(
                "chain.genesis_balance must be positive".to_string(),
            ));
        }
        if self.stress.accounts == 0 {
            return Err(ConfigError::Invalid(
                "stress.accounts must be at least 1".to_string(),
            ));
        }
        if self.stress.max_amount.is_zero() {
            return Err(ConfigError::Invalid(
                "stress.max_amount must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Serde adapter storing a `Wei` as a display-unit string.
pub mod display_units {
    use serde::{Deserialize, Deserializer, Serializer};
    use types::numeric::Wei;

    pub fn serialize<S: Serializer>(value: &Wei, serializer: S) -> Result<S::Ok, S::Error> {
        let units = value.to_units().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&units.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Wei, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Wei::parse_units(&raw).map_err(serde::de::Error::custom)
    }
}
