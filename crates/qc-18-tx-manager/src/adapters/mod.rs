//! Adapters for the Tx Manager subsystem
//!
//! - `memory` - In-memory ledger (receipt source and publisher)
//! - `toml_config` - TOML config loading (requires "toml-config" feature)

pub mod memory;
#[cfg(feature = "toml-config")]
pub mod toml_config;

pub use memory::InMemoryLedger;
#[cfg(feature = "toml-config")]
pub use toml_config::{ConfigError, TomlConfigLoader};
