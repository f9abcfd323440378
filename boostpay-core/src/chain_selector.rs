//! Active network selection.
//!
//! The selector owns the active network and resolves its addresses. The
//! matching wallet and transfer submitter are looked up from the same
//! network by `Wallets::for_network` and `PaymentRails::for_network` in the
//! checkout session, which owns those capabilities.

use crate::Network;
use crate::config::CheckoutConfig;
use crate::payment::{PaymentAttempt, PaymentError, SEPOLIA_CHAIN_ID};
use tracing::debug;

/// Addresses a payment on the active network goes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRoute {
    pub network: Network,
    pub receiving_address: String,
    /// ERC-20 contract (Ethereum) or SPL mint (Solana).
    pub token_address: String,
}

/// Holds the network payments are currently made on.
#[derive(Debug, Clone)]
pub struct ChainSelector {
    current: Network,
    config: CheckoutConfig,
}

impl ChainSelector {
    /// Starts on Ethereum.
    pub fn new(config: CheckoutConfig) -> Self {
        Self {
            current: Network::EthereumSepolia,
            config,
        }
    }

    pub fn current(&self) -> Network {
        self.current
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Switch network. Always succeeds and clears every trace of the
    /// attempt made on the previous one.
    pub fn select(&mut self, network: Network, attempt: &mut PaymentAttempt) {
        debug!(from = %self.current, to = %network, "Network selected");
        self.current = network;
        attempt.reset();
    }

    /// Receiving and token address of the active network.
    pub fn route(&self) -> Result<PaymentRoute, PaymentError> {
        let net = self.config.network(self.current);
        match (&net.receiving_address, &net.token_address) {
            (Some(receiving), Some(token)) => Ok(PaymentRoute {
                network: self.current,
                receiving_address: receiving.clone(),
                token_address: token.clone(),
            }),
            _ => Err(PaymentError::ConfigurationMissing),
        }
    }
}

/// Chain id a wallet must be on to pay on `network`, if the network has one.
pub fn required_chain_id(network: Network) -> Option<u64> {
    match network {
        Network::EthereumSepolia => Some(SEPOLIA_CHAIN_ID),
        Network::SolanaDevnet => None,
    }
}
