//! # Send Flow Integration Tests
//!
//! Drives `SimpleTxManager` through its public API against the in-memory
//! ledger. Time is paused, so every elapsed-time assertion is exact.
//!
//! Covered outcomes:
//!
//! 1. Confirmation after escalation
//! 2. Publish timeout at the ceiling
//! 3. Cancellation with attempts in flight
//! 4. Transient receipt query failures

use std::sync::Arc;
use std::time::Duration;

use primitive_types::U256;
use qc_18_tx_manager::{
    publish_fn, AttemptOutcome, InMemoryLedger, PublishError, SimpleTxManager, TxManager,
    TxManagerConfig, TxManagerError,
};
use tokio_util::sync::CancellationToken;

const RESUBMIT: Duration = Duration::from_millis(100);
const POLL: Duration = Duration::from_millis(10);

fn fee(v: u64) -> U256 {
    U256::from(v)
}

fn config(min: u64, max: u64) -> TxManagerConfig {
    TxManagerConfig::default()
        .with_fee_range(fee(min), fee(max))
        .with_fee_increment(U256::one())
        .with_resubmission_interval(RESUBMIT)
        .with_receipt_poll_interval(POLL)
}

/// Publication succeeds at fee 3 only and confirms within one poll.
#[tokio::test(start_paused = true)]
async fn test_publish_succeeding_only_at_fee_three() {
    let ledger = Arc::new(InMemoryLedger::new(U256::zero()));
    let manager = SimpleTxManager::new(config(1, 4), ledger.clone()).unwrap();

    let publisher = {
        let ledger = ledger.clone();
        publish_fn(move |_cancel: CancellationToken, offered: U256| {
            let ledger = ledger.clone();
            async move {
                if offered == fee(3) {
                    ledger.publish(offered)
                } else {
                    Err(PublishError::Backend {
                        reason: "nonce too low".to_string(),
                    })
                }
            }
        })
    };

    let report = manager
        .send_with_report(&CancellationToken::new(), publisher)
        .await;

    let receipt = report.result.clone().unwrap();
    assert_eq!(receipt.effective_fee, fee(3));
    assert!(receipt.success);
    assert_eq!(report.elapsed, Duration::from_millis(200));
    assert_eq!(report.count(AttemptOutcome::Failed), 2);
    assert_eq!(report.winner().map(|a| a.fee), Some(fee(3)));
    assert_eq!(ledger.published_fees(), vec![fee(3)]);
}

/// Ceiling reached immediately, one grace interval, then timeout.
#[tokio::test(start_paused = true)]
async fn test_single_fee_schedule_times_out() {
    let ledger = Arc::new(InMemoryLedger::new(fee(2)));
    let manager = SimpleTxManager::new(config(1, 1), ledger.clone()).unwrap();

    let report = manager
        .send_with_report(&CancellationToken::new(), ledger.clone())
        .await;

    assert_eq!(
        report.result,
        Err(TxManagerError::PublishTimeout { max_fee: fee(1) })
    );
    assert_eq!(report.elapsed, RESUBMIT);
    assert_eq!(ledger.published_fees(), vec![fee(1)]);
    assert_eq!(ledger.mined_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_confirms_once_fee_meets_inclusion_price() {
    let ledger = Arc::new(InMemoryLedger::new(fee(3)));
    let manager = SimpleTxManager::new(config(1, 10), ledger.clone()).unwrap();

    let report = manager
        .send_with_report(&CancellationToken::new(), ledger.clone())
        .await;

    assert_eq!(report.result.clone().unwrap().effective_fee, fee(3));
    assert_eq!(report.elapsed, Duration::from_millis(200));

    // Underpriced attempts keep polling until the drain stops them
    let outcomes: Vec<_> = report.attempts.iter().map(|a| a.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            AttemptOutcome::Abandoned,
            AttemptOutcome::Abandoned,
            AttemptOutcome::Confirmed,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_receipt_query_outage_is_transient() {
    let ledger = Arc::new(InMemoryLedger::new(U256::zero()));
    ledger.fail_next_queries(3);
    let manager = SimpleTxManager::new(config(1, 4), ledger.clone()).unwrap();

    let receipt = manager
        .send(&CancellationToken::new(), ledger.clone())
        .await
        .unwrap();

    assert_eq!(receipt.effective_fee, fee(1));
    assert_eq!(ledger.receipt_queries(), 4);
    assert_eq!(manager.metrics().get_receipt_query_failures(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_with_many_attempts_in_flight() {
    let ledger = Arc::new(InMemoryLedger::new(fee(1_000)));
    let manager = SimpleTxManager::new(config(1, 1_000), ledger.clone()).unwrap();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(905)).await;
        trigger.cancel();
    });

    let report = manager.send_with_report(&cancel, ledger.clone()).await;

    assert!(report.result.unwrap_err().is_cancelled());
    assert!(report.elapsed < Duration::from_millis(905) + POLL);
    assert_eq!(report.attempts.len(), 10);
    assert!(report.attempts.iter().all(|a| !a.is_pending()));
    assert_eq!(manager.metrics().get_attempts_in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_no_attempt_outlives_send() {
    let ledger = Arc::new(InMemoryLedger::new(U256::zero()));
    let manager = SimpleTxManager::new(config(1, 2), ledger.clone()).unwrap();
    let metrics = manager.metrics();

    // Confirmed
    manager
        .send(&CancellationToken::new(), ledger.clone())
        .await
        .unwrap();
    assert_eq!(metrics.get_attempts_in_flight(), 0);

    // Timed out
    ledger.set_inclusion_price(fee(5));
    let timed_out = manager.send(&CancellationToken::new(), ledger.clone()).await;
    assert!(timed_out.unwrap_err().is_timeout());
    assert_eq!(metrics.get_attempts_in_flight(), 0);

    // Cancelled
    let cancel = CancellationToken::new();
    cancel.cancel();
    let cancelled = manager.send(&cancel, ledger.clone()).await;
    assert_eq!(cancelled, Err(TxManagerError::Cancelled));
    assert_eq!(metrics.get_attempts_in_flight(), 0);

    assert_eq!(metrics.get_confirmations(), 1);
    assert_eq!(metrics.get_timeouts(), 1);
    assert_eq!(metrics.get_cancellations(), 1);
}

#[cfg(feature = "toml-config")]
#[tokio::test(start_paused = true)]
async fn test_manager_from_toml_config() {
    use qc_18_tx_manager::TomlConfigLoader;

    let config = TomlConfigLoader::parse(
        r#"
        [tx_manager]
        min_fee = "0x1"
        max_fee = "3"
        fee_increment = "1"
        resubmission_interval_ms = 50
        receipt_poll_interval_ms = 5
        "#,
    )
    .unwrap();
    assert_eq!(config.publish_deadline(), Duration::from_millis(150));

    let ledger = Arc::new(InMemoryLedger::new(fee(2)));
    let manager = SimpleTxManager::new(config, ledger.clone()).unwrap();
    let receipt = manager
        .send(&CancellationToken::new(), ledger.clone())
        .await
        .unwrap();

    assert_eq!(receipt.effective_fee, fee(2));
    assert_eq!(ledger.published_fees(), vec![fee(1), fee(2)]);
}
