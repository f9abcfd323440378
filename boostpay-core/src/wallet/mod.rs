//! Wallet capability adapters.
//!
//! Two unrelated wallet ecosystems sit behind one [`WalletAdapter`] shape:
//!
//! - [`EthereumWallet`]: several connectors (browser-injected, WalletConnect,
//!   Coinbase) over an [`EthereumProvider`]
//! - [`SolanaWallet`]: the injected Phantom provider ([`PhantomProvider`])
//!
//! Each adapter owns a subscription to its provider's events for its whole
//! lifetime and publishes the resulting [`WalletStatus`] on a `watch`
//! channel, so callers can react to connection changes they did not start.

pub mod ethereum;
pub mod solana;

pub use ethereum::{ConnectorOption, EthereumAccount, EthereumProvider, EthereumWallet};
pub use solana::{PhantomProvider, SolanaWallet};

use crate::Network;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// EIP-1193 / Phantom code for "user rejected the request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// Connection state of one wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletStatus {
    pub connected: bool,
    /// Holder address, string form of the public key.
    pub address: Option<String>,
    /// Active chain id (Ethereum only).
    pub chain_id: Option<u64>,
}

impl WalletStatus {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(address: impl Into<String>, chain_id: Option<u64>) -> Self {
        Self {
            connected: true,
            address: Some(address.into()),
            chain_id,
        }
    }
}

/// Events pushed by a wallet provider without being asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    Connected {
        address: String,
        chain_id: Option<u64>,
    },
    Disconnected,
    /// `None` means the provider no longer exposes any account.
    AccountChanged(Option<String>),
    ChainChanged(u64),
}

/// Error reported by an external wallet or chain capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub code: Option<i64>,
    /// Error class name, when the provider reports one.
    pub name: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            name: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn user_rejected() -> Self {
        Self::new("User rejected the request.").with_code(USER_REJECTED_CODE)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(USER_REJECTED_CODE) || self.message.contains("User rejected")
    }
}

/// How a failed connect call should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The holder declined. Never retried.
    UserRejected,
    /// A connection with this connector already exists; counts as success.
    AlreadyConnected,
    /// Anything else; may be retried.
    Transient,
}

/// Classify a provider failure before any retry decision is made.
pub fn classify(err: &ProviderError) -> FailureClass {
    if err.is_user_rejection() {
        FailureClass::UserRejected
    } else if err.name.as_deref() == Some("ConnectorAlreadyConnectedError") {
        FailureClass::AlreadyConnected
    } else {
        FailureClass::Transient
    }
}

/// Errors surfaced by wallet adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("Connection rejected by user")]
    ConnectionRejected,

    #[error("{0}")]
    ProviderUnavailable(String),

    #[error("unsupported connector: {0}")]
    UnsupportedConnector(String),

    #[error("{0}")]
    Provider(String),
}

/// The common shape of both wallet adapters.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn network(&self) -> Network;

    /// Current connection state. Pure read.
    fn status(&self) -> WalletStatus;

    /// Receive every status change, including provider-originated ones.
    fn subscribe(&self) -> watch::Receiver<WalletStatus>;

    /// Connect through the chosen connector.
    async fn connect(&self, connector_id: &str) -> Result<WalletStatus, WalletError>;

    /// Drop the connection. Idempotent.
    async fn disconnect(&self) -> Result<(), WalletError>;
}

/// Shared, single-writer status cell of an adapter.
pub(crate) type StatusCell = Arc<watch::Sender<WalletStatus>>;

pub(crate) fn status_cell(initial: WalletStatus) -> StatusCell {
    let (tx, _) = watch::channel(initial);
    Arc::new(tx)
}

/// Fold a provider event into the current status.
pub(crate) fn apply_event(status: &mut WalletStatus, event: ProviderEvent) {
    match event {
        ProviderEvent::Connected { address, chain_id } => {
            let chain_id = chain_id.or(status.chain_id);
            *status = WalletStatus::connected(address, chain_id);
        }
        ProviderEvent::Disconnected | ProviderEvent::AccountChanged(None) => {
            *status = WalletStatus::disconnected();
        }
        ProviderEvent::AccountChanged(Some(address)) => {
            *status = WalletStatus::connected(address, status.chain_id);
        }
        ProviderEvent::ChainChanged(chain_id) => {
            if status.connected {
                status.chain_id = Some(chain_id);
            }
        }
    }
}

/// Spawn the task that keeps `status` in sync with provider events.
///
/// Runs until the provider drops its event sender or the returned handle is
/// aborted.
pub(crate) fn spawn_event_listener(
    network: Network,
    mut events: broadcast::Receiver<ProviderEvent>,
    status: StatusCell,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    debug!(%network, ?event, "Wallet provider event");
                    if matches!(event, ProviderEvent::Disconnected) {
                        info!(%network, "Wallet disconnected by provider");
                    }
                    status.send_modify(|s| apply_event(s, event));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(%network, skipped, "Wallet event listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(%network, "Wallet provider event stream closed");
                    break;
                }
            }
        }
    })
}
