//! Checkout configuration.
//!
//! Receiving and token addresses come from the environment and are read
//! once at startup. A missing value is kept as `None` so that the payment
//! attempt, not the process start, fails with a configuration error.

use crate::Network;
use std::time::Duration;

/// Addresses in effect for one network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Wallet receiving the payment.
    pub receiving_address: Option<String>,
    /// ERC-20 contract address (Ethereum) or SPL mint address (Solana).
    pub token_address: Option<String>,
}

impl NetworkConfig {
    pub fn new(receiving_address: impl Into<String>, token_address: impl Into<String>) -> Self {
        Self {
            receiving_address: Some(receiving_address.into()),
            token_address: Some(token_address.into()),
        }
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>, network: Network) -> Self {
        let (wallet_key, token_key) = env_keys(network);
        Self {
            receiving_address: lookup(wallet_key),
            token_address: lookup(token_key),
        }
    }
}

fn env_keys(network: Network) -> (&'static str, &'static str) {
    match network {
        Network::EthereumSepolia => ("ETH_WALLET_ADDRESS", "ETH_USDC_ADDRESS"),
        Network::SolanaDevnet => ("SOL_WALLET_ADDRESS", "SOL_USDC_ADDRESS"),
    }
}

/// Timing and retry knobs of the checkout flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// Pause between settlement and the success step.
    pub success_delay: Duration,
    /// How often the Ethereum receipt is polled.
    pub receipt_poll_interval: Duration,
    /// Attempts made to connect the Solana wallet.
    pub solana_connect_attempts: u32,
    /// Pause before each Solana connect retry.
    pub solana_retry_delay: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            success_delay: Duration::from_secs(2),
            receipt_poll_interval: Duration::from_secs(4),
            solana_connect_attempts: 3,
            solana_retry_delay: Duration::from_millis(500),
        }
    }
}

/// Complete client-side configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub ethereum: NetworkConfig,
    pub solana: NetworkConfig,
    pub settings: CheckoutSettings,
}

impl CheckoutConfig {
    /// Read the four address variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count
    /// as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let config = Self {
            ethereum: NetworkConfig::from_lookup(&lookup, Network::EthereumSepolia),
            solana: NetworkConfig::from_lookup(&lookup, Network::SolanaDevnet),
            settings: CheckoutSettings::default(),
        };
        for network in Network::ALL {
            let net = config.network(network);
            if net.receiving_address.is_none() || net.token_address.is_none() {
                tracing::warn!(%network, "Payment addresses not configured");
            }
        }
        config
    }

    pub fn with_settings(mut self, settings: CheckoutSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn network(&self, network: Network) -> &NetworkConfig {
        match network {
            Network::EthereumSepolia => &self.ethereum,
            Network::SolanaDevnet => &self.solana,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ETH_WALLET_ADDRESS", "0x1111111111111111111111111111111111111111"),
            ("ETH_USDC_ADDRESS", "0x2222222222222222222222222222222222222222"),
            ("SOL_WALLET_ADDRESS", "Receiver1111"),
            ("SOL_USDC_ADDRESS", "  "),
        ]);
        let config = CheckoutConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(
            config.ethereum.token_address.as_deref(),
            Some("0x2222222222222222222222222222222222222222")
        );
        assert_eq!(
            config.network(Network::SolanaDevnet).receiving_address.as_deref(),
            Some("Receiver1111")
        );
        assert_eq!(config.solana.token_address, None);
        assert_eq!(config.settings.success_delay, Duration::from_secs(2));
    }
}
