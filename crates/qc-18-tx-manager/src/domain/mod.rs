//! Domain module for the Tx Manager subsystem
//!
//! ## Core Modules
//! - fee: Linear fee escalation and the per-send fee schedule
//! - attempt: Publish attempt records
//! - state: Per-call state machine
//! - receipt: Transaction handles and receipts

pub mod attempt;
pub mod fee;
pub mod receipt;
pub mod state;

pub use attempt::{Attempt, AttemptOutcome};
pub use fee::{next_fee, FeeSchedule};
pub use receipt::{Hash, TransactionReceipt, TxHash};
pub use state::{SendEvent, SendState};
