//! In-memory ledger backend
//!
//! Accepts publications, mines any transaction whose fee meets the current
//! inclusion price once `confirmation_delay` has elapsed, and answers
//! receipt queries. Time comes from the tokio clock, so paused-time tests
//! are deterministic.

use crate::domain::{Hash, TransactionReceipt, TxHash};
use crate::error::{PublishError, ReceiptQueryError};
use crate::ports::{ReceiptSource, TxPublisher};
use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::U256;
use sha3::{Digest, Keccak256};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Gas charged for every mined transaction
pub const SIMULATED_GAS_USED: u64 = 21_000;

#[derive(Debug)]
struct PendingTx {
    fee: U256,
    submitted_at: Instant,
    receipt: Option<TransactionReceipt>,
}

#[derive(Debug, Default)]
struct LedgerState {
    txs: HashMap<TxHash, PendingTx>,
    inclusion_price: U256,
    rejected_fees: HashSet<U256>,
    failing_queries: u32,
    published_fees: Vec<U256>,
    receipt_queries: u64,
    next_nonce: u64,
    block_number: u64,
}

/// Simulated ledger for tests and the simulator tool
#[derive(Debug)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    confirmation_delay: Duration,
}

impl InMemoryLedger {
    /// Ledger that mines transactions paying at least `inclusion_price`
    pub fn new(inclusion_price: U256) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                inclusion_price,
                ..LedgerState::default()
            }),
            confirmation_delay: Duration::ZERO,
        }
    }

    /// Minimum time between publication and inclusion
    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }

    /// Change the inclusion price. Applies to already-published txs too.
    pub fn set_inclusion_price(&self, price: U256) {
        self.state.lock().inclusion_price = price;
    }

    /// Refuse publications at exactly `fee`
    pub fn reject_fee(&self, fee: U256) {
        self.state.lock().rejected_fees.insert(fee);
    }

    /// Fail the next `count` receipt queries with `Unavailable`
    pub fn fail_next_queries(&self, count: u32) {
        self.state.lock().failing_queries = count;
    }

    /// Accept a transaction at `fee` and return its hash
    pub fn publish(&self, fee: U256) -> Result<TxHash, PublishError> {
        let mut state = self.state.lock();
        if state.rejected_fees.contains(&fee) {
            return Err(PublishError::Rejected {
                fee,
                reason: "fee refused by ledger".to_string(),
            });
        }

        let nonce = state.next_nonce;
        state.next_nonce += 1;
        let tx_hash = TxHash(hash_parts(&[&nonce.to_be_bytes(), &fee_bytes(fee)]));
        state.published_fees.push(fee);
        state.txs.insert(
            tx_hash,
            PendingTx {
                fee,
                submitted_at: Instant::now(),
                receipt: None,
            },
        );
        Ok(tx_hash)
    }

    /// Fees of every successful publication, in order
    pub fn published_fees(&self) -> Vec<U256> {
        self.state.lock().published_fees.clone()
    }

    /// Total receipt queries answered or failed
    pub fn receipt_queries(&self) -> u64 {
        self.state.lock().receipt_queries
    }

    /// Transactions mined so far
    pub fn mined_count(&self) -> usize {
        self.state
            .lock()
            .txs
            .values()
            .filter(|tx| tx.receipt.is_some())
            .count()
    }

    fn lookup(&self, tx_hash: &TxHash) -> Result<Option<TransactionReceipt>, ReceiptQueryError> {
        let mut state = self.state.lock();
        state.receipt_queries += 1;
        if state.failing_queries > 0 {
            state.failing_queries -= 1;
            return Err(ReceiptQueryError::Unavailable {
                reason: "simulated outage".to_string(),
            });
        }

        let inclusion_price = state.inclusion_price;
        let Some(tx) = state.txs.get(tx_hash) else {
            return Ok(None);
        };
        if let Some(receipt) = &tx.receipt {
            return Ok(Some(receipt.clone()));
        }
        let minable =
            tx.fee >= inclusion_price && tx.submitted_at.elapsed() >= self.confirmation_delay;
        if !minable {
            return Ok(None);
        }

        state.block_number += 1;
        let block_number = state.block_number;
        let Some(tx) = state.txs.get_mut(tx_hash) else {
            return Ok(None);
        };
        let receipt = TransactionReceipt {
            tx_hash: *tx_hash,
            block_hash: hash_parts(&[&block_number.to_be_bytes(), tx_hash.as_bytes()]),
            block_number,
            gas_used: SIMULATED_GAS_USED,
            effective_fee: tx.fee,
            success: true,
        };
        tx.receipt = Some(receipt.clone());
        Ok(Some(receipt))
    }
}

#[async_trait]
impl ReceiptSource for InMemoryLedger {
    async fn transaction_receipt(
        &self,
        _cancel: &CancellationToken,
        tx_hash: &TxHash,
    ) -> Result<Option<TransactionReceipt>, ReceiptQueryError> {
        self.lookup(tx_hash)
    }
}

#[async_trait]
impl TxPublisher for InMemoryLedger {
    async fn publish(&self, cancel: &CancellationToken, fee: U256) -> Result<TxHash, PublishError> {
        if cancel.is_cancelled() {
            return Err(PublishError::Cancelled);
        }
        InMemoryLedger::publish(self, fee)
    }
}

fn fee_bytes(fee: U256) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    fee.to_big_endian(&mut bytes);
    bytes
}

fn hash_parts(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
