//! Metrics collection for the tx manager

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics collector for the tx manager
#[derive(Debug, Default)]
pub struct TxManagerMetrics {
    /// Total `send` calls
    pub sends_started: AtomicU64,

    /// Total publish attempts spawned
    pub attempts_started: AtomicU64,

    /// Attempt tasks currently alive
    pub attempts_in_flight: AtomicU64,

    /// Publications that returned an error
    pub publish_failures: AtomicU64,

    /// Receipt queries that returned an error
    pub receipt_query_failures: AtomicU64,

    /// Sends that returned a receipt
    pub confirmations: AtomicU64,

    /// Sends that exhausted the fee schedule
    pub timeouts: AtomicU64,

    /// Sends cancelled by the caller
    pub cancellations: AtomicU64,
}

impl TxManagerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_send_started(&self) {
        self.sends_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a spawned attempt. The returned guard keeps it in flight until
    /// dropped, including when the task unwinds.
    pub fn attempt_started(self: &Arc<Self>) -> AttemptInFlight {
        self.attempts_started.fetch_add(1, Ordering::Relaxed);
        self.attempts_in_flight.fetch_add(1, Ordering::SeqCst);
        AttemptInFlight {
            metrics: Arc::clone(self),
        }
    }

    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_receipt_query_failure(&self) {
        self.receipt_query_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_confirmation(&self) {
        self.confirmations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_attempts_in_flight(&self) -> u64 {
        self.attempts_in_flight.load(Ordering::SeqCst)
    }

    pub fn get_attempts_started(&self) -> u64 {
        self.attempts_started.load(Ordering::Relaxed)
    }

    pub fn get_publish_failures(&self) -> u64 {
        self.publish_failures.load(Ordering::Relaxed)
    }

    pub fn get_receipt_query_failures(&self) -> u64 {
        self.receipt_query_failures.load(Ordering::Relaxed)
    }

    pub fn get_confirmations(&self) -> u64 {
        self.confirmations.load(Ordering::Relaxed)
    }

    pub fn get_timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    pub fn get_cancellations(&self) -> u64 {
        self.cancellations.load(Ordering::Relaxed)
    }

    /// Attempts spawned per send, 0.0 before the first send
    pub fn get_avg_attempts_per_send(&self) -> f64 {
        let sends = self.sends_started.load(Ordering::Relaxed);
        if sends == 0 {
            return 0.0;
        }
        self.get_attempts_started() as f64 / sends as f64
    }
}

/// Decrements `attempts_in_flight` on drop
#[derive(Debug)]
pub struct AttemptInFlight {
    metrics: Arc<TxManagerMetrics>,
}

impl Drop for AttemptInFlight {
    fn drop(&mut self) {
        self.metrics.attempts_in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_guard() {
        let metrics = Arc::new(TxManagerMetrics::new());
        let first = metrics.attempt_started();
        let second = metrics.attempt_started();
        assert_eq!(metrics.get_attempts_in_flight(), 2);

        drop(first);
        assert_eq!(metrics.get_attempts_in_flight(), 1);
        drop(second);
        assert_eq!(metrics.get_attempts_in_flight(), 0);
        assert_eq!(metrics.get_attempts_started(), 2);
    }

    #[test]
    fn test_avg_attempts_per_send() {
        let metrics = Arc::new(TxManagerMetrics::new());
        assert_eq!(metrics.get_avg_attempts_per_send(), 0.0);

        metrics.record_send_started();
        metrics.record_send_started();
        for _ in 0..3 {
            drop(metrics.attempt_started());
        }
        assert_eq!(metrics.get_avg_attempts_per_send(), 1.5);
    }
}
