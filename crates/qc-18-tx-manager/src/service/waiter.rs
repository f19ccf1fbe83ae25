//! Confirmation waiter
//!
//! Polls a [`ReceiptSource`] for one transaction until a receipt appears or
//! the governing token is cancelled.

use crate::domain::{TransactionReceipt, TxHash};
use crate::error::{TxManagerError, TxManagerResult};
use crate::metrics::TxManagerMetrics;
use crate::ports::ReceiptSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Receipt poller shared by every attempt of a send
#[derive(Clone)]
pub struct ConfirmationWaiter {
    backend: Arc<dyn ReceiptSource>,
    query_interval: Duration,
    metrics: Arc<TxManagerMetrics>,
}

impl ConfirmationWaiter {
    pub fn new(backend: Arc<dyn ReceiptSource>, query_interval: Duration) -> Self {
        Self {
            backend,
            query_interval,
            metrics: Arc::new(TxManagerMetrics::new()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<TxManagerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Block until the backend reports a receipt for `tx_hash`.
    ///
    /// Queries once immediately and then every `query_interval`, whether or
    /// not the previous query failed. Query errors are logged and polling
    /// continues.
    ///
    /// # Errors
    ///
    /// `TxManagerError::Cancelled` once `cancel` fires. Both the tick wait
    /// and an in-progress query are abandoned on cancellation.
    pub async fn wait_mined(
        &self,
        cancel: &CancellationToken,
        tx_hash: &TxHash,
    ) -> TxManagerResult<TransactionReceipt> {
        let mut ticker = time::interval(self.query_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // First tick completes immediately
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TxManagerError::Cancelled),
                _ = ticker.tick() => {}
            }

            let queried = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TxManagerError::Cancelled),
                queried = self.backend.transaction_receipt(cancel, tx_hash) => queried,
            };

            match queried {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => trace!(hash = %tx_hash, "Transaction not yet mined"),
                Err(e) => {
                    self.metrics.record_receipt_query_failure();
                    debug!(hash = %tx_hash, error = %e, "Receipt retrieval failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedger;
    use crate::error::ReceiptQueryError;
    use async_trait::async_trait;
    use primitive_types::U256;
    use tokio::time::Instant;

    const POLL: Duration = Duration::from_millis(100);

    struct HangingSource;

    #[async_trait]
    impl ReceiptSource for HangingSource {
        async fn transaction_receipt(
            &self,
            _cancel: &CancellationToken,
            _tx_hash: &TxHash,
        ) -> Result<Option<TransactionReceipt>, ReceiptQueryError> {
            std::future::pending().await
        }
    }

    fn waiter_for(ledger: &Arc<InMemoryLedger>) -> ConfirmationWaiter {
        ConfirmationWaiter::new(ledger.clone(), POLL)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_query_is_immediate() {
        let ledger = Arc::new(InMemoryLedger::new(U256::one()));
        let hash = ledger.publish(U256::one()).unwrap();
        let start = Instant::now();

        let receipt = waiter_for(&ledger)
            .wait_mined(&CancellationToken::new(), &hash)
            .await
            .unwrap();

        assert_eq!(receipt.tx_hash, hash);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(ledger.receipt_queries(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval_until_mined() {
        let ledger = Arc::new(
            InMemoryLedger::new(U256::one()).with_confirmation_delay(Duration::from_millis(250)),
        );
        let hash = ledger.publish(U256::one()).unwrap();
        let start = Instant::now();

        waiter_for(&ledger)
            .wait_mined(&CancellationToken::new(), &hash)
            .await
            .unwrap();

        // Queries at 0, 100, 200 miss; 300 hits
        assert_eq!(start.elapsed(), Duration::from_millis(300));
        assert_eq!(ledger.receipt_queries(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_errors_are_transient() {
        let ledger = Arc::new(InMemoryLedger::new(U256::one()));
        let hash = ledger.publish(U256::one()).unwrap();
        ledger.fail_next_queries(2);
        let metrics = Arc::new(TxManagerMetrics::new());
        let start = Instant::now();

        let receipt = waiter_for(&ledger)
            .with_metrics(metrics.clone())
            .wait_mined(&CancellationToken::new(), &hash)
            .await;

        assert!(receipt.is_ok());
        assert_eq!(start.elapsed(), Duration::from_millis(200));
        assert_eq!(metrics.get_receipt_query_failures(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_wakes_within_one_tick() {
        let ledger = Arc::new(InMemoryLedger::new(U256::from(1_000u64)));
        let hash = ledger.publish(U256::one()).unwrap();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(150)).await;
            trigger.cancel();
        });
        let start = Instant::now();

        let result = waiter_for(&ledger).wait_mined(&cancel, &hash).await;

        assert_eq!(result, Err(TxManagerError::Cancelled));
        assert!(start.elapsed() < Duration::from_millis(150) + POLL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_hung_query() {
        let waiter = ConfirmationWaiter::new(Arc::new(HangingSource), POLL);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(40)).await;
            trigger.cancel();
        });
        let start = Instant::now();

        let result = waiter.wait_mined(&cancel, &TxHash([7u8; 32])).await;

        assert!(matches!(result, Err(TxManagerError::Cancelled)));
        assert_eq!(start.elapsed(), Duration::from_millis(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_returns_without_query() {
        let ledger = Arc::new(InMemoryLedger::new(U256::one()));
        let hash = ledger.publish(U256::one()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = waiter_for(&ledger).wait_mined(&cancel, &hash).await;

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(ledger.receipt_queries(), 0);
    }
}
