//! Best-effort order notification.
//!
//! Fired once per payment, right after the transaction id is known. The
//! outcome is logged and otherwise ignored: a failed notification never
//! changes the course of the checkout.

use crate::Network;
use async_trait::async_trait;
use boostpay_sdk::client::NotifyClient;
use boostpay_sdk::objects::NotifyRequest;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("notification failed: {0}")]
    NotificationFailed(String),
}

/// What the operator is told about a submitted payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderNotification {
    pub service: String,
    pub price: Decimal,
    pub network: Network,
    pub tx_id: String,
    pub customer_email: String,
    pub telegram: Option<String>,
    pub wallet_address: String,
}

impl From<OrderNotification> for NotifyRequest {
    fn from(n: OrderNotification) -> Self {
        NotifyRequest {
            service: n.service,
            price: n.price,
            network: n.network,
            tx_hash: n.tx_id,
            customer_email: n.customer_email,
            telegram: n.telegram,
            wallet_address: n.wallet_address,
        }
    }
}

/// The outbound notification call.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn send_notification(&self, request: &NotifyRequest) -> Result<(), NotifyError>;
}

#[async_trait]
impl OrderNotifier for NotifyClient {
    async fn send_notification(&self, request: &NotifyRequest) -> Result<(), NotifyError> {
        let response = self
            .notify(request)
            .await
            .map_err(|e| NotifyError::NotificationFailed(e.to_string()))?;
        info!(email_id = ?response.email_id, "Order notification accepted");
        Ok(())
    }
}

/// Fires notifications without ever reporting back.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn OrderNotifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn OrderNotifier>) -> Self {
        Self { notifier }
    }

    /// Send in the background. The caller does not wait for the result.
    pub fn dispatch(&self, notification: OrderNotification) -> JoinHandle<()> {
        tokio::spawn(deliver(self.notifier.clone(), notification))
    }
}

async fn deliver(notifier: Arc<dyn OrderNotifier>, notification: OrderNotification) {
    let tx_id = notification.tx_id.clone();
    let network = notification.network;
    let request = NotifyRequest::from(notification);
    match notifier.send_notification(&request).await {
        Ok(()) => info!(tx_id = %tx_id, %network, "Order notification sent"),
        Err(e) => warn!(tx_id = %tx_id, %network, error = %e, "Order notification failed"),
    }
}

impl Processor<OrderNotification> for NotificationDispatcher {
    type Output = ();
    type Error = Infallible;

    #[tracing::instrument(skip_all, name = "Notify:OrderNotification")]
    async fn process(&self, notification: OrderNotification) -> Result<(), Infallible> {
        deliver(self.notifier.clone(), notification).await;
        Ok(())
    }
}
