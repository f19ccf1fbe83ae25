//! Publish orchestrator
//!
//! `SimpleTxManager` performs linear fee bumping of a transaction until one
//! published attempt confirms:
//!
//! ```text
//! t=0          publish(min)        ──→ wait_mined ─┐
//! t=R          publish(min+inc)    ──→ wait_mined ─┤
//! t=2R         publish(min+2inc)   ──→ wait_mined ─┼──→ single-slot winner ──→ result
//! ...                                              │
//! t=kR         publish(max)        ──→ wait_mined ─┘
//! t=(k+1)R     PublishTimeout
//! ```
//!
//! Earlier attempts keep running after a resubmission. Whichever attempt
//! confirms first takes the single result slot; later confirmations are
//! dropped. On any outcome the attempts' token is cancelled and every task
//! is joined before `send` returns.

mod waiter;


pub use waiter::ConfirmationWaiter;

use crate::config::TxManagerConfig;
use crate::domain::{next_fee, Attempt, AttemptOutcome, SendEvent, SendState, TransactionReceipt};
use crate::error::{TxManagerError, TxManagerResult};
use crate::metrics::TxManagerMetrics;
use crate::ports::{ReceiptSource, SendReport, TxManager, TxPublisher};
use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::U256;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Tx manager with linear fee escalation
pub struct SimpleTxManager {
    config: TxManagerConfig,
    waiter: ConfirmationWaiter,
    metrics: Arc<TxManagerMetrics>,
}

impl SimpleTxManager {
    /// Create a manager polling `backend` for receipts.
    ///
    /// # Errors
    ///
    /// `TxManagerError::InvalidConfig` if `config` fails validation.
    pub fn new(config: TxManagerConfig, backend: Arc<dyn ReceiptSource>) -> TxManagerResult<Self> {
        config.validate()?;
        let metrics = Arc::new(TxManagerMetrics::new());
        let waiter = ConfirmationWaiter::new(backend, config.receipt_poll_interval)
            .with_metrics(Arc::clone(&metrics));
        Ok(Self {
            config,
            waiter,
            metrics,
        })
    }

    pub fn config(&self) -> &TxManagerConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<TxManagerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run a send and report every attempt it made.
    ///
    /// Same semantics as [`TxManager::send`]; the report is built after the
    /// drain, so no attempt in it is still `Pending`.
    pub async fn send_with_report(
        &self,
        cancel: &CancellationToken,
        publisher: Arc<dyn TxPublisher>,
    ) -> SendReport {
        let started = Instant::now();
        self.metrics.record_send_started();

        // Cancelled on every exit path below, never cancels the caller's token
        let attempts_cancel = cancel.child_token();
        let (winner, mut receipt_rx) = WinnerSlot::new();
        let ctx = AttemptContext {
            cancel: attempts_cancel.clone(),
            publisher,
            waiter: self.waiter.clone(),
            winner,
            metrics: Arc::clone(&self.metrics),
        };

        let mut attempts = JoinSet::new();
        let mut state = SendState::Idle;
        let mut latest = Attempt::new(0, self.config.min_fee);

        info!(
            min_fee = %self.config.min_fee,
            max_fee = %self.config.max_fee,
            fee_increment = %self.config.fee_increment,
            "Publishing transaction"
        );
        state = state.transition(SendEvent::AttemptStarted { fee: latest.fee });
        attempts.spawn(run_attempt(ctx.clone(), latest.clone()));

        let period = self.config.resubmission_interval;
        let mut resubmit = time::interval_at(started + period, period);
        resubmit.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let result = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    state = state.transition(SendEvent::CancelRequested);
                    break Err(TxManagerError::Cancelled);
                }

                Ok(receipt) = &mut receipt_rx => {
                    state = state.transition(SendEvent::ReceiptObserved);
                    break Ok(receipt);
                }

                _ = resubmit.tick() => {
                    // The ceiling has had its full interval
                    if latest.fee >= self.config.max_fee {
                        state = state.transition(SendEvent::ScheduleExhausted);
                        break Err(TxManagerError::PublishTimeout {
                            max_fee: self.config.max_fee,
                        });
                    }

                    let fee = next_fee(latest.fee, self.config.fee_increment, self.config.max_fee);
                    latest = latest.successor(fee);
                    state = state.transition(SendEvent::AttemptStarted { fee });
                    debug!(fee = %fee, attempt = latest.index, "Resubmitting with bumped fee");
                    attempts.spawn(run_attempt(ctx.clone(), latest.clone()));
                }
            }
        };

        attempts_cancel.cancel();
        let mut finished = drain(&mut attempts).await;
        settle_outcomes(&result, &mut finished);
        self.log_outcome(&result, &finished);

        SendReport {
            result,
            final_state: state,
            attempts: finished,
            elapsed: started.elapsed(),
        }
    }

    fn log_outcome(&self, result: &TxManagerResult<TransactionReceipt>, attempts: &[Attempt]) {
        match result {
            Ok(receipt) => {
                self.metrics.record_confirmation();
                info!(
                    hash = %receipt.tx_hash,
                    block_number = receipt.block_number,
                    attempts = attempts.len(),
                    "Transaction confirmed"
                );
            }
            Err(TxManagerError::PublishTimeout { max_fee }) => {
                self.metrics.record_timeout();
                warn!(
                    max_fee = %max_fee,
                    attempts = attempts.len(),
                    "No confirmation after publishing at max fee"
                );
            }
            Err(TxManagerError::Cancelled) => {
                self.metrics.record_cancellation();
                info!(attempts = attempts.len(), "Send cancelled");
            }
            Err(e) => error!(error = %e, "Send failed"),
        }
    }
}

#[async_trait]
impl TxManager for SimpleTxManager {
    async fn send(
        &self,
        cancel: &CancellationToken,
        publisher: Arc<dyn TxPublisher>,
    ) -> TxManagerResult<TransactionReceipt> {
        self.send_with_report(cancel, publisher).await.into_result()
    }
}

/// Everything one attempt task owns
#[derive(Clone)]
struct AttemptContext {
    cancel: CancellationToken,
    publisher: Arc<dyn TxPublisher>,
    waiter: ConfirmationWaiter,
    winner: WinnerSlot,
    metrics: Arc<TxManagerMetrics>,
}

/// Single-slot, non-blocking result channel. Accepts exactly one receipt;
/// every later offer is refused.
#[derive(Clone)]
struct WinnerSlot(Arc<Mutex<Option<oneshot::Sender<TransactionReceipt>>>>);

impl WinnerSlot {
    fn new() -> (Self, oneshot::Receiver<TransactionReceipt>) {
        let (tx, rx) = oneshot::channel();
        (Self(Arc::new(Mutex::new(Some(tx)))), rx)
    }

    /// True if this receipt is the one delivered to the orchestrator
    fn offer(&self, receipt: TransactionReceipt) -> bool {
        let Some(tx) = self.0.lock().take() else {
            return false;
        };
        tx.send(receipt).is_ok()
    }
}

/// Publish at `attempt.fee`, then wait for its receipt and offer it to the
/// orchestrator without blocking.
async fn run_attempt(ctx: AttemptContext, mut attempt: Attempt) -> Attempt {
    let _in_flight = ctx.metrics.attempt_started();
    let fee: U256 = attempt.fee;

    let published = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return attempt.finish(AttemptOutcome::Abandoned),
        published = ctx.publisher.publish(&ctx.cancel, fee) => published,
    };

    let tx_hash = match published {
        Ok(tx_hash) => tx_hash,
        Err(e) => {
            if ctx.cancel.is_cancelled() {
                return attempt.finish(AttemptOutcome::Abandoned);
            }
            // No retry at the same fee; the next resubmission escalates
            ctx.metrics.record_publish_failure();
            error!(fee = %fee, error = %e, "Unable to publish transaction");
            return attempt.finish(AttemptOutcome::Failed);
        }
    };
    attempt.tx_hash = Some(tx_hash);
    info!(hash = %tx_hash, fee = %fee, "Transaction published successfully");

    match ctx.waiter.wait_mined(&ctx.cancel, &tx_hash).await {
        Ok(receipt) => {
            if ctx.winner.offer(receipt) {
                trace!(hash = %tx_hash, fee = %fee, "Send tx succeeded");
                attempt.finish(AttemptOutcome::Confirmed)
            } else {
                trace!(hash = %tx_hash, fee = %fee, "Receipt already reported, discarding");
                attempt.finish(AttemptOutcome::Superseded)
            }
        }
        Err(e) => {
            trace!(hash = %tx_hash, fee = %fee, error = %e, "Send tx failed");
            attempt.finish(AttemptOutcome::Abandoned)
        }
    }
}

/// A receipt handed over after the loop already ended with an error was
/// never returned to the caller
fn settle_outcomes(result: &TxManagerResult<TransactionReceipt>, attempts: &mut [Attempt]) {
    if result.is_ok() {
        return;
    }
    for attempt in attempts
        .iter_mut()
        .filter(|a| a.outcome == AttemptOutcome::Confirmed)
    {
        attempt.outcome = AttemptOutcome::Superseded;
    }
}

/// Join every attempt task, returning their records in schedule order
async fn drain(attempts: &mut JoinSet<Attempt>) -> Vec<Attempt> {
    let mut finished = Vec::with_capacity(attempts.len());
    while let Some(joined) = attempts.join_next().await {
        match joined {
            Ok(attempt) => finished.push(attempt),
            Err(e) => error!(error = %e, "Attempt task terminated abnormally"),
        }
    }
    finished.sort_by_key(|a| a.index);
    debug!(attempts = finished.len(), "All attempts drained");
    finished
}
