//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::{TransactionReceipt, TxHash};
use crate::error::{PublishError, ReceiptQueryError};
use async_trait::async_trait;
use primitive_types::U256;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Backend capability used to detect confirmation of published txs.
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    /// Look up the receipt for `tx_hash`.
    ///
    /// Returns `Ok(None)` when the lookup succeeded but the transaction is
    /// not yet included. Errors are treated as transient by callers.
    async fn transaction_receipt(
        &self,
        cancel: &CancellationToken,
        tx_hash: &TxHash,
    ) -> Result<Option<TransactionReceipt>, ReceiptQueryError>;
}

/// Caller capability that signs and publishes the transaction at a fee.
///
/// Implementations should return promptly once `cancel` fires.
#[async_trait]
pub trait TxPublisher: Send + Sync {
    async fn publish(&self, cancel: &CancellationToken, fee: U256)
        -> Result<TxHash, PublishError>;
}

/// [`TxPublisher`] backed by a closure.
///
/// Built with [`publish_fn`].
pub struct PublishFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> TxPublisher for PublishFn<F>
where
    F: Fn(CancellationToken, U256) -> Fut + Send + Sync,
    Fut: Future<Output = Result<TxHash, PublishError>> + Send + 'static,
{
    async fn publish(
        &self,
        cancel: &CancellationToken,
        fee: U256,
    ) -> Result<TxHash, PublishError> {
        (self.f)(cancel.clone(), fee).await
    }
}

/// Wrap a closure `(cancel, fee) -> Future<Result<TxHash, PublishError>>`
/// as a shareable publisher.
///
/// ```rust,ignore
/// let publisher = publish_fn(move |cancel, fee| {
///     let signer = signer.clone();
///     async move { signer.sign_and_send(&cancel, fee).await }
/// });
/// let receipt = manager.send(&cancel, publisher).await?;
/// ```
pub fn publish_fn<F, Fut>(f: F) -> Arc<dyn TxPublisher>
where
    F: Fn(CancellationToken, U256) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<TxHash, PublishError>> + Send + 'static,
{
    Arc::new(PublishFn { f })
}
