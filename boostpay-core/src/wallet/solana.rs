//! Solana-family wallet adapter (Phantom).

use super::{
    FailureClass, ProviderError, ProviderEvent, StatusCell, WalletAdapter, WalletError,
    WalletStatus, classify, spawn_event_listener, status_cell,
};
use crate::Network;
use crate::config::CheckoutSettings;
use crate::payment::solana::{SignedTransaction, UnsignedTransaction};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The only connector id the Solana side supports.
pub const PHANTOM_CONNECTOR_ID: &str = "phantom";

const INSTALL_HINT: &str = "Please install Phantom wallet";
const RESTART_HINT: &str = "Phantom wallet error. Please try: 1) Refresh the page, \
    2) Restart Phantom extension, or 3) Restart your browser";

/// The injected Phantom handle.
#[async_trait]
pub trait PhantomProvider: Send + Sync {
    fn is_phantom(&self) -> bool;

    fn is_connected(&self) -> bool;

    fn public_key(&self) -> Option<String>;

    /// Prompt for a connection; returns the holder's public key.
    async fn connect(&self, only_if_trusted: bool) -> Result<String, ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError>;

    async fn sign_transaction(
        &self,
        transaction: UnsignedTransaction,
    ) -> Result<SignedTransaction, ProviderError>;

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

pub struct SolanaWallet {
    /// `None` when no injected wallet was found.
    provider: Option<Arc<dyn PhantomProvider>>,
    status: StatusCell,
    listener: Option<JoinHandle<()>>,
    attempts: u32,
    retry_delay: Duration,
}

impl SolanaWallet {
    /// Wrap the injected handle, if any, and start listening to its events.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(provider: Option<Arc<dyn PhantomProvider>>, settings: &CheckoutSettings) -> Self {
        let provider = provider.filter(|p| p.is_phantom());
        let initial = provider
            .as_ref()
            .filter(|p| p.is_connected())
            .and_then(|p| p.public_key())
            .map(|key| WalletStatus::connected(key, None))
            .unwrap_or_default();
        let status = status_cell(initial);
        let listener = provider
            .as_ref()
            .map(|p| spawn_event_listener(Network::SolanaDevnet, p.subscribe(), status.clone()));
        Self {
            provider,
            status,
            listener,
            attempts: settings.solana_connect_attempts.max(1),
            retry_delay: settings.solana_retry_delay,
        }
    }

    fn provider(&self) -> Result<&Arc<dyn PhantomProvider>, WalletError> {
        self.provider
            .as_ref()
            .ok_or_else(|| WalletError::ProviderUnavailable(INSTALL_HINT.to_string()))
    }

    fn set_connected(&self, public_key: String) -> WalletStatus {
        let status = WalletStatus::connected(public_key, None);
        self.status.send_replace(status.clone());
        status
    }
}

impl Drop for SolanaWallet {
    fn drop(&mut self) {
        if let Some(listener) = &self.listener {
            listener.abort();
        }
    }
}

fn exhausted_error(err: ProviderError) -> WalletError {
    if err.message.contains("disconnected port") {
        WalletError::Provider(RESTART_HINT.to_string())
    } else if err.message.is_empty() {
        WalletError::Provider("Failed to connect Phantom".to_string())
    } else {
        WalletError::Provider(err.message)
    }
}

#[async_trait]
impl WalletAdapter for SolanaWallet {
    fn network(&self) -> Network {
        Network::SolanaDevnet
    }

    fn status(&self) -> WalletStatus {
        self.status.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<WalletStatus> {
        self.status.subscribe()
    }

    async fn connect(&self, connector_id: &str) -> Result<WalletStatus, WalletError> {
        if connector_id != PHANTOM_CONNECTOR_ID {
            return Err(WalletError::UnsupportedConnector(connector_id.to_string()));
        }
        let provider = self.provider()?;

        if provider.is_connected() {
            if let Some(key) = provider.public_key() {
                debug!(public_key = %key, "Phantom already connected");
                return Ok(self.set_connected(key));
            }
        }

        let mut last_error = ProviderError::new("Failed to connect Phantom");
        for attempt in 1..=self.attempts {
            if attempt > 1 {
                tokio::time::sleep(self.retry_delay).await;
            }
            debug!(attempt, max = self.attempts, "Attempting Phantom connection");

            match provider.connect(false).await {
                Ok(key) => {
                    info!(public_key = %key, "Phantom connected");
                    return Ok(self.set_connected(key));
                }
                Err(e) => match classify(&e) {
                    FailureClass::UserRejected => return Err(WalletError::ConnectionRejected),
                    FailureClass::AlreadyConnected => {
                        if let Some(key) = provider.public_key() {
                            return Ok(self.set_connected(key));
                        }
                        last_error = e;
                    }
                    FailureClass::Transient => {
                        warn!(attempt, error = %e, "Phantom connection attempt failed");
                        last_error = e;
                    }
                },
            }
        }

        Err(exhausted_error(last_error))
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        let Some(provider) = &self.provider else {
            return Ok(());
        };
        if !self.status.borrow().connected && !provider.is_connected() {
            return Ok(());
        }
        provider
            .disconnect()
            .await
            .map_err(|e| WalletError::Provider(e.message))?;
        self.status.send_replace(WalletStatus::disconnected());
        Ok(())
    }
}
