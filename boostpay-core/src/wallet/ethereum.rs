//! Ethereum-family wallet adapter.

use super::{
    FailureClass, ProviderError, ProviderEvent, StatusCell, WalletAdapter, WalletError,
    WalletStatus, classify, spawn_event_listener, status_cell,
};
use crate::Network;
use alloy_primitives::{Address, B256, Bytes};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The account currently exposed by the Ethereum provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthereumAccount {
    pub address: String,
    pub chain_id: u64,
    /// Id of the connector the account was connected through.
    pub connector_id: String,
}

/// A connector as enumerated by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorInfo {
    pub id: String,
    pub name: String,
}

/// A state-changing contract call to be signed and sent by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractWrite {
    pub chain_id: u64,
    pub contract: Address,
    /// ABI encoded calldata.
    pub data: Bytes,
}

/// Browser wallet capability for Ethereum-family chains.
#[async_trait]
pub trait EthereumProvider: Send + Sync {
    fn connectors(&self) -> Vec<ConnectorInfo>;

    fn account(&self) -> Option<EthereumAccount>;

    async fn connect(&self, connector_id: &str) -> Result<EthereumAccount, ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError>;

    /// Ask the wallet to move to another chain. Completion only means the
    /// request was accepted.
    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;

    /// Sign and send a contract call; returns the transaction hash once the
    /// wallet has broadcast it.
    async fn write_contract(&self, call: ContractWrite) -> Result<B256, ProviderError>;

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// A connector offered to the user, with presentation hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorOption {
    pub id: String,
    pub name: String,
    pub hint: &'static str,
    pub badge: &'static str,
}

impl ConnectorOption {
    fn from_info(info: ConnectorInfo) -> Self {
        let (hint, badge) = match info.id.as_str() {
            "injected" => ("Browser extension", "Wallet"),
            "walletConnect" => ("Scan with mobile", "Mobile"),
            "coinbaseWalletSDK" => ("Coinbase app", "Popular"),
            _ => ("Connect securely", "Wallet"),
        };
        Self {
            id: info.id,
            name: info.name,
            hint,
            badge,
        }
    }
}

pub struct EthereumWallet {
    provider: Arc<dyn EthereumProvider>,
    status: StatusCell,
    listener: JoinHandle<()>,
}

impl EthereumWallet {
    /// Wrap a provider and start listening to its events.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(provider: Arc<dyn EthereumProvider>) -> Self {
        let initial = provider
            .account()
            .map(|a| WalletStatus::connected(a.address, Some(a.chain_id)))
            .unwrap_or_default();
        let status = status_cell(initial);
        let listener =
            spawn_event_listener(Network::EthereumSepolia, provider.subscribe(), status.clone());
        Self {
            provider,
            status,
            listener,
        }
    }

    /// Connectors to offer, de-duplicated by name. Phantom is left to the
    /// Solana side.
    pub fn available_connectors(&self) -> Vec<ConnectorOption> {
        let mut seen: Vec<String> = Vec::new();
        self.provider
            .connectors()
            .into_iter()
            .filter(|c| {
                let fresh = !seen.contains(&c.name) && !c.name.eq_ignore_ascii_case("phantom");
                seen.push(c.name.clone());
                fresh
            })
            .map(ConnectorOption::from_info)
            .collect()
    }

    fn publish_account(&self) -> WalletStatus {
        let status = self
            .provider
            .account()
            .map(|a| WalletStatus::connected(a.address, Some(a.chain_id)))
            .unwrap_or_default();
        self.status.send_replace(status.clone());
        status
    }
}

impl Drop for EthereumWallet {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[async_trait]
impl WalletAdapter for EthereumWallet {
    fn network(&self) -> Network {
        Network::EthereumSepolia
    }

    fn status(&self) -> WalletStatus {
        self.status.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<WalletStatus> {
        self.status.subscribe()
    }

    async fn connect(&self, connector_id: &str) -> Result<WalletStatus, WalletError> {
        if let Some(account) = self.provider.account() {
            if account.connector_id == connector_id {
                return Ok(self.publish_account());
            }
        }
        if !self
            .available_connectors()
            .iter()
            .any(|c| c.id == connector_id)
        {
            return Err(WalletError::UnsupportedConnector(connector_id.to_string()));
        }

        match self.provider.connect(connector_id).await {
            Ok(account) => {
                info!(connector = connector_id, address = %account.address, "Ethereum wallet connected");
                let status = WalletStatus::connected(account.address, Some(account.chain_id));
                self.status.send_replace(status.clone());
                Ok(status)
            }
            Err(e) => match classify(&e) {
                FailureClass::AlreadyConnected => Ok(self.publish_account()),
                FailureClass::UserRejected => Err(WalletError::ConnectionRejected),
                FailureClass::Transient => {
                    warn!(connector = connector_id, error = %e, "Ethereum wallet connection failed");
                    Err(WalletError::Provider(e.message))
                }
            },
        }
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        if !self.status.borrow().connected {
            return Ok(());
        }
        if let Err(e) = self.provider.disconnect().await {
            warn!(error = %e, "Ethereum provider disconnect failed");
        }
        self.status.send_replace(WalletStatus::disconnected());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    pub const SEPOLIA: u64 = 11_155_111;

    /// Scriptable in-memory Ethereum provider.
    pub struct FakeEthereumProvider {
        pub account: Mutex<Option<EthereumAccount>>,
        pub connect_result: Mutex<Option<Result<EthereumAccount, ProviderError>>>,
        pub write_result: Mutex<Result<B256, ProviderError>>,
        pub switch_result: Mutex<Result<(), ProviderError>>,
        pub writes: Mutex<Vec<ContractWrite>>,
        pub switch_requests: Mutex<Vec<u64>>,
        pub connect_calls: Mutex<u32>,
        pub events: broadcast::Sender<ProviderEvent>,
    }

    impl FakeEthereumProvider {
        pub fn new() -> Self {
            let (events, _) = broadcast::channel(16);
            Self {
                account: Mutex::new(None),
                connect_result: Mutex::new(None),
                write_result: Mutex::new(Ok(B256::repeat_byte(0xab))),
                switch_result: Mutex::new(Ok(())),
                writes: Mutex::new(Vec::new()),
                switch_requests: Mutex::new(Vec::new()),
                connect_calls: Mutex::new(0),
                events,
            }
        }

        pub fn connected_on(chain_id: u64) -> Self {
            let provider = Self::new();
            *provider.account.lock().unwrap() = Some(EthereumAccount {
                address: "0x00000000000000000000000000000000000000aa".to_string(),
                chain_id,
                connector_id: "injected".to_string(),
            });
            provider
        }
    }

    #[async_trait]
    impl EthereumProvider for FakeEthereumProvider {
        fn connectors(&self) -> Vec<ConnectorInfo> {
            [
                ("injected", "MetaMask"),
                ("injected2", "MetaMask"),
                ("phantom", "Phantom"),
                ("walletConnect", "WalletConnect"),
                ("coinbaseWalletSDK", "Coinbase Wallet"),
            ]
            .into_iter()
            .map(|(id, name)| ConnectorInfo {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect()
        }

        fn account(&self) -> Option<EthereumAccount> {
            self.account.lock().unwrap().clone()
        }

        async fn connect(&self, connector_id: &str) -> Result<EthereumAccount, ProviderError> {
            *self.connect_calls.lock().unwrap() += 1;
            let result = self.connect_result.lock().unwrap().take().unwrap_or_else(|| {
                Ok(EthereumAccount {
                    address: "0x00000000000000000000000000000000000000bb".to_string(),
                    chain_id: SEPOLIA,
                    connector_id: connector_id.to_string(),
                })
            });
            if let Ok(account) = &result {
                *self.account.lock().unwrap() = Some(account.clone());
            }
            result
        }

        async fn disconnect(&self) -> Result<(), ProviderError> {
            *self.account.lock().unwrap() = None;
            Ok(())
        }

        async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
            self.switch_requests.lock().unwrap().push(chain_id);
            self.switch_result.lock().unwrap().clone()
        }

        async fn write_contract(&self, call: ContractWrite) -> Result<B256, ProviderError> {
            self.writes.lock().unwrap().push(call);
            self.write_result.lock().unwrap().clone()
        }

        fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
            self.events.subscribe()
        }
    }

    #[tokio::test]
    async fn test_connectors_are_deduplicated_without_phantom() {
        let wallet = EthereumWallet::new(Arc::new(FakeEthereumProvider::new()));
        let options = wallet.available_connectors();
        let ids: Vec<&str> = options.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["injected", "walletConnect", "coinbaseWalletSDK"]);
        assert_eq!(options[1].hint, "Scan with mobile");
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let provider = Arc::new(FakeEthereumProvider::new());
        let wallet = EthereumWallet::new(provider.clone());
        assert!(!wallet.status().connected);

        let status = wallet.connect("walletConnect").await.unwrap();
        assert!(status.connected);
        assert_eq!(status.chain_id, Some(SEPOLIA));
        assert_eq!(wallet.status(), status);

        wallet.disconnect().await.unwrap();
        assert!(!wallet.status().connected);
        // idempotent
        wallet.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_with_active_connector_is_a_noop() {
        let provider = Arc::new(FakeEthereumProvider::connected_on(SEPOLIA));
        let wallet = EthereumWallet::new(provider.clone());
        let status = wallet.connect("injected").await.unwrap();
        assert!(status.connected);
        assert_eq!(*provider.connect_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_already_connected_error_counts_as_success() {
        let provider = Arc::new(FakeEthereumProvider::connected_on(SEPOLIA));
        *provider.connect_result.lock().unwrap() = Some(Err(ProviderError::new(
            "Connector already connected.",
        )
        .with_name("ConnectorAlreadyConnectedError")));
        let wallet = EthereumWallet::new(provider.clone());
        let status = wallet.connect("walletConnect").await.unwrap();
        assert!(status.connected);
    }

    #[tokio::test]
    async fn test_connect_rejected_and_unknown_connector() {
        let provider = Arc::new(FakeEthereumProvider::new());
        *provider.connect_result.lock().unwrap() = Some(Err(ProviderError::user_rejected()));
        let wallet = EthereumWallet::new(provider.clone());
        assert_eq!(
            wallet.connect("injected").await,
            Err(WalletError::ConnectionRejected)
        );
        assert!(matches!(
            wallet.connect("ledger").await,
            Err(WalletError::UnsupportedConnector(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_events_update_status() {
        let provider = Arc::new(FakeEthereumProvider::connected_on(1));
        let wallet = EthereumWallet::new(provider.clone());
        let mut rx = wallet.subscribe();
        assert_eq!(wallet.status().chain_id, Some(1));

        provider.events.send(ProviderEvent::ChainChanged(SEPOLIA)).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(wallet.status().chain_id, Some(SEPOLIA));
    }
}
