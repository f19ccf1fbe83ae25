//! Publish attempts
//!
//! One attempt per offered fee. Each attempt runs in its own task and hands
//! its final record back to the orchestrator when it exits.

use super::receipt::TxHash;
use primitive_types::U256;

/// Lifecycle of a single attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Still publishing or waiting for a receipt
    Pending,
    /// Confirmed, and its receipt is the one the call returned
    Confirmed,
    /// Confirmed, but its receipt was not returned: another attempt won the
    /// slot, or the call ended first
    Superseded,
    /// Publication failed; no retry at this fee
    Failed,
    /// Stopped by cancellation before confirming
    Abandoned,
}

/// An in-flight or finished publish at one fee
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attempt {
    /// Position in the fee schedule, starting at 0
    pub index: u32,
    /// Fee offered. Owned by this attempt.
    pub fee: U256,
    /// Handle returned by publication, if it succeeded
    pub tx_hash: Option<TxHash>,
    pub outcome: AttemptOutcome,
}

impl Attempt {
    pub fn new(index: u32, fee: U256) -> Self {
        Self {
            index,
            fee,
            tx_hash: None,
            outcome: AttemptOutcome::Pending,
        }
    }

    /// The next attempt in the schedule, at `fee`
    pub fn successor(&self, fee: U256) -> Self {
        Self::new(self.index.saturating_add(1), fee)
    }

    pub fn is_pending(&self) -> bool {
        self.outcome == AttemptOutcome::Pending
    }

    /// True if the backend confirmed this attempt, whether or not it won
    pub fn was_confirmed(&self) -> bool {
        matches!(
            self.outcome,
            AttemptOutcome::Confirmed | AttemptOutcome::Superseded
        )
    }

    pub(crate) fn finish(mut self, outcome: AttemptOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}
