//! Error types for the Tx Manager subsystem

use primitive_types::U256;
use thiserror::Error;

/// Call-level failures of [`crate::SimpleTxManager::send`].
///
/// A caller sees exactly one of: a receipt, `PublishTimeout`, or `Cancelled`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TxManagerError {
    /// The ceiling fee was tried and its resubmission interval elapsed
    /// without a confirmation. The fee ceiling should likely be raised.
    #[error("Failed to publish tx with max fee {max_fee}")]
    PublishTimeout { max_fee: U256 },

    /// The caller's cancellation token fired before a confirmation arrived
    #[error("Send cancelled by caller")]
    Cancelled,

    /// Configuration rejected by validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl TxManagerError {
    /// True for the caller-initiated cancellation outcome
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// True when the fee schedule was exhausted
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::PublishTimeout { .. })
    }
}

/// Errors returned by a publish capability.
///
/// These never leave `send`: the attempt ends and the next resubmission
/// carries the call forward.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    /// Backend refused the transaction at this fee
    #[error("Transaction rejected at fee {fee}: {reason}")]
    Rejected { fee: U256, reason: String },

    /// Publication was interrupted by cancellation
    #[error("Publish cancelled")]
    Cancelled,

    /// Signing or transport failure
    #[error("Publish backend error: {reason}")]
    Backend { reason: String },
}

/// Errors returned by a receipt source. Always treated as transient.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReceiptQueryError {
    /// Backend could not answer the query
    #[error("Receipt source unavailable: {reason}")]
    Unavailable { reason: String },

    /// Query interrupted by cancellation
    #[error("Receipt query cancelled")]
    Cancelled,
}

/// Result type for tx manager operations
pub type TxManagerResult<T> = Result<T, TxManagerError>;
