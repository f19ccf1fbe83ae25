//! # qc-18-tx-manager
//!
//! Reliable transaction publication with linear fee escalation.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Fee Escalation**: Publish at `min_fee`, bump by `fee_increment` every
//!   resubmission interval, clamp at `max_fee`
//! - **Confirmation Polling**: One receipt poller per published attempt
//! - **First-Receipt Race**: All attempts race; exactly one receipt is returned
//! - **Full Drain**: Every attempt task is joined before `send` returns
//!
//! ## Architecture
//!
//! ```text
//! Caller ──send(cancel, publisher)──→ SimpleTxManager
//!                                          │
//!                                          ├── TxPublisher::publish(fee) ──→ caller's signer
//!                                          │
//!                                          └── ReceiptSource::transaction_receipt ──→ ledger backend
//! ```
//!
//! ## Outcomes
//!
//! | Outcome | When |
//! |---------|------|
//! | `Ok(receipt)` | Any attempt confirms |
//! | `PublishTimeout` | `max_fee` was tried and its interval elapsed |
//! | `Cancelled` | The caller's token fired |
//!
//! ## Example
//!
//! ```rust,ignore
//! use qc_18_tx_manager::{publish_fn, SimpleTxManager, TxManager, TxManagerConfig};
//!
//! let manager = SimpleTxManager::new(TxManagerConfig::default(), backend)?;
//! let publisher = publish_fn(move |cancel, fee| {
//!     let signer = signer.clone();
//!     async move { signer.sign_and_send(&cancel, fee).await }
//! });
//!
//! let receipt = manager.send(&shutdown, publisher).await?;
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

mod config;
mod error;
mod metrics;

use std::time::Duration;

pub use config::TxManagerConfig;
pub use error::{PublishError, ReceiptQueryError, TxManagerError, TxManagerResult};
pub use metrics::{AttemptInFlight, TxManagerMetrics};

pub use domain::{
    next_fee, Attempt, AttemptOutcome, FeeSchedule, Hash, SendEvent, SendState,
    TransactionReceipt, TxHash,
};
pub use ports::{publish_fn, PublishFn, ReceiptSource, SendReport, TxManager, TxPublisher};
pub use service::{ConfirmationWaiter, SimpleTxManager};

pub use adapters::InMemoryLedger;
#[cfg(feature = "toml-config")]
pub use adapters::{ConfigError, TomlConfigLoader};

/// Subsystem identifier
pub const SUBSYSTEM_ID: u8 = 18;

/// Default first-attempt fee (1 gwei)
pub const DEFAULT_MIN_FEE: u64 = 1_000_000_000;

/// Default ceiling fee (100 gwei)
pub const DEFAULT_MAX_FEE: u64 = 100_000_000_000;

/// Default fee bump per resubmission (1 gwei)
pub const DEFAULT_FEE_INCREMENT: u64 = 1_000_000_000;

/// Default interval between resubmissions
pub const DEFAULT_RESUBMISSION_INTERVAL: Duration = Duration::from_secs(60);

/// Default interval between receipt queries
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);
