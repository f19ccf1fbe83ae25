//! TOML configuration loading
//!
//! ```toml
//! [tx_manager]
//! min_fee = "1000000000"          # decimal or 0x-prefixed hex
//! max_fee = "0x174876e800"
//! fee_increment = "1000000000"
//! resubmission_interval_ms = 60000
//! receipt_poll_interval_ms = 1000
//! ```
//!
//! Missing keys fall back to [`TxManagerConfig::default`]. The loaded
//! configuration is validated before it is returned.

use crate::config::TxManagerConfig;
use primitive_types::U256;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    tx_manager: TxManagerSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TxManagerSection {
    min_fee: Option<String>,
    max_fee: Option<String>,
    fee_increment: Option<String>,
    resubmission_interval_ms: Option<u64>,
    receipt_poll_interval_ms: Option<u64>,
}

/// Errors that can occur during config loading
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    /// TOML parsing error
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Fee value is not a decimal or hex integer that fits in 256 bits
    #[error("Invalid fee for `{field}`: {value}")]
    InvalidFee { field: &'static str, value: String },

    /// Parsed configuration failed validation
    #[error("Config rejected: {reason}")]
    Invalid { reason: String },
}

/// Loads [`TxManagerConfig`] from TOML
pub struct TomlConfigLoader;

impl TomlConfigLoader {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TxManagerConfig, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<TxManagerConfig, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let section = file.tx_manager;
        let defaults = TxManagerConfig::default();

        let config = TxManagerConfig {
            min_fee: parse_fee_or("min_fee", section.min_fee, defaults.min_fee)?,
            max_fee: parse_fee_or("max_fee", section.max_fee, defaults.max_fee)?,
            fee_increment: parse_fee_or(
                "fee_increment",
                section.fee_increment,
                defaults.fee_increment,
            )?,
            resubmission_interval: section
                .resubmission_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.resubmission_interval),
            receipt_poll_interval: section
                .receipt_poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.receipt_poll_interval),
        };

        config.validate().map_err(|e| ConfigError::Invalid {
            reason: e.to_string(),
        })?;
        Ok(config)
    }
}

/// Parse a decimal or `0x`-prefixed hex fee
pub fn parse_fee(field: &'static str, value: &str) -> Result<U256, ConfigError> {
    let trimmed = value.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None if !trimmed.is_empty() => U256::from_dec_str(trimmed).ok(),
        None => None,
    };
    parsed.ok_or_else(|| ConfigError::InvalidFee {
        field,
        value: value.to_string(),
    })
}

fn parse_fee_or(
    field: &'static str,
    value: Option<String>,
    default: U256,
) -> Result<U256, ConfigError> {
    match value {
        Some(v) => parse_fee(field, &v),
        None => Ok(default),
    }
}
