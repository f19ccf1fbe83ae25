//! Driving Ports (API - Inbound)

use super::outbound::TxPublisher;
use crate::domain::{Attempt, AttemptOutcome, SendState, TransactionReceipt};
use crate::error::TxManagerResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Everything a finished `send` observed.
///
/// Produced only after every attempt task has exited.
#[derive(Clone, Debug)]
pub struct SendReport {
    /// Receipt of the winning attempt, or why none was obtained
    pub result: TxManagerResult<TransactionReceipt>,
    /// Terminal state of the call
    pub final_state: SendState,
    /// Final record of every attempt, ordered by fee schedule position
    pub attempts: Vec<Attempt>,
    /// Wall time from the first publication to the end of the drain
    pub elapsed: Duration,
}

impl SendReport {
    pub fn into_result(self) -> TxManagerResult<TransactionReceipt> {
        self.result
    }

    /// The attempt whose receipt was returned, if any
    pub fn winner(&self) -> Option<&Attempt> {
        self.attempts
            .iter()
            .find(|a| a.outcome == AttemptOutcome::Confirmed)
    }

    pub fn count(&self, outcome: AttemptOutcome) -> usize {
        self.attempts.iter().filter(|a| a.outcome == outcome).count()
    }
}

/// Primary Tx Manager API
///
/// Publishes a transaction with incrementally higher fees until it confirms.
#[async_trait]
pub trait TxManager: Send + Sync {
    /// Publish via `publisher`, bumping the fee on every resubmission
    /// interval, and return the first receipt observed.
    ///
    /// Blocks until a receipt arrives, the fee schedule is exhausted, or
    /// `cancel` fires, and then until every attempt task has exited.
    ///
    /// NOTE: `send` should be driven by at most one caller at a time.
    async fn send(
        &self,
        cancel: &CancellationToken,
        publisher: Arc<dyn TxPublisher>,
    ) -> TxManagerResult<TransactionReceipt>;
}
