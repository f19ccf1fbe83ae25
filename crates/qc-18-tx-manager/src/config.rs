//! Configuration for the tx manager

use crate::domain::FeeSchedule;
use crate::error::{TxManagerError, TxManagerResult};
use primitive_types::U256;
use std::time::Duration;

/// Fee escalation policy and polling cadence.
///
/// Immutable once handed to [`crate::SimpleTxManager`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxManagerConfig {
    /// Fee of the first publication attempt
    pub min_fee: U256,

    /// Ceiling fee. Only one attempt is ever published at this value.
    pub max_fee: U256,

    /// Added to the fee each time a resubmission interval elapses without
    /// a confirmation
    pub fee_increment: U256,

    /// Interval after which, if nothing has confirmed, a new attempt with a
    /// bumped fee is published
    pub resubmission_interval: Duration,

    /// Interval between receipt queries for each published attempt
    pub receipt_poll_interval: Duration,
}

impl Default for TxManagerConfig {
    fn default() -> Self {
        Self {
            min_fee: U256::from(crate::DEFAULT_MIN_FEE),
            max_fee: U256::from(crate::DEFAULT_MAX_FEE),
            fee_increment: U256::from(crate::DEFAULT_FEE_INCREMENT),
            resubmission_interval: crate::DEFAULT_RESUBMISSION_INTERVAL,
            receipt_poll_interval: crate::DEFAULT_RECEIPT_POLL_INTERVAL,
        }
    }
}

impl TxManagerConfig {
    pub fn with_fee_range(mut self, min_fee: U256, max_fee: U256) -> Self {
        self.min_fee = min_fee;
        self.max_fee = max_fee;
        self
    }

    pub fn with_fee_increment(mut self, fee_increment: U256) -> Self {
        self.fee_increment = fee_increment;
        self
    }

    pub fn with_resubmission_interval(mut self, interval: Duration) -> Self {
        self.resubmission_interval = interval;
        self
    }

    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    /// Check the invariants the send loop depends on.
    ///
    /// # Errors
    ///
    /// - `min_fee > max_fee`
    /// - zero `fee_increment` while `min_fee < max_fee` would never reach
    ///   the ceiling, so it is always rejected
    /// - zero resubmission or poll interval
    pub fn validate(&self) -> TxManagerResult<()> {
        if self.min_fee > self.max_fee {
            return Err(TxManagerError::InvalidConfig {
                reason: format!(
                    "min_fee {} exceeds max_fee {}",
                    self.min_fee, self.max_fee
                ),
            });
        }
        if self.fee_increment.is_zero() {
            return Err(TxManagerError::InvalidConfig {
                reason: "fee_increment must be positive".to_string(),
            });
        }
        if self.resubmission_interval.is_zero() {
            return Err(TxManagerError::InvalidConfig {
                reason: "resubmission_interval must be positive".to_string(),
            });
        }
        if self.receipt_poll_interval.is_zero() {
            return Err(TxManagerError::InvalidConfig {
                reason: "receipt_poll_interval must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Fees a send will offer, in order
    pub fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule::new(self.min_fee, self.fee_increment, self.max_fee)
    }

    /// Time after which a send that never confirms returns
    /// `PublishTimeout`: one resubmission interval per scheduled fee.
    pub fn publish_deadline(&self) -> Duration {
        let fees = u32::try_from(self.fee_schedule().len_hint()).unwrap_or(u32::MAX);
        self.resubmission_interval.saturating_mul(fees)
    }
}
