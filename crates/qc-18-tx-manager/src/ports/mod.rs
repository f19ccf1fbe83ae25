//! Ports module for the Tx Manager subsystem

pub mod inbound;
pub mod outbound;

pub use inbound::{SendReport, TxManager};
pub use outbound::{publish_fn, PublishFn, ReceiptSource, TxPublisher};
