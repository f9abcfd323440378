//! ERC-20 transfer through the connected Ethereum wallet.

use super::{PaymentError, Submission, SubmitOutcome, TransferRequest, TransferSubmitter};
use crate::Network;
use crate::catalog::to_base_units;
use crate::wallet::ethereum::{ContractWrite, EthereumProvider};
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, sol};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Chain id of Ethereum Sepolia.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

sol! {
    /// ERC-20 `transfer`.
    function transfer(address to, uint256 amount) external returns (bool);
}

/// ABI encode `transfer(to, amount)`.
pub fn encode_transfer(to: Address, base_units: u64) -> Vec<u8> {
    transferCall {
        to,
        amount: U256::from(base_units),
    }
    .abi_encode()
}

fn parse_address(what: &'static str, value: &str) -> Result<Address, PaymentError> {
    value
        .parse::<Address>()
        .map_err(|_| PaymentError::InvalidAddress {
            what,
            value: value.to_string(),
        })
}

pub struct EthereumSubmitter {
    provider: Arc<dyn EthereumProvider>,
    chain_id: u64,
}

impl EthereumSubmitter {
    pub fn new(provider: Arc<dyn EthereumProvider>) -> Self {
        Self {
            provider,
            chain_id: SEPOLIA_CHAIN_ID,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl TransferSubmitter for EthereumSubmitter {
    fn network(&self) -> Network {
        Network::EthereumSepolia
    }

    async fn submit(&self, request: &TransferRequest) -> Result<SubmitOutcome, PaymentError> {
        let account = self
            .provider
            .account()
            .ok_or(PaymentError::WalletNotConnected("Ethereum"))?;

        if account.chain_id != self.chain_id {
            info!(
                current = account.chain_id,
                required = self.chain_id,
                "Wallet on wrong chain, requesting switch"
            );
            self.request_network_switch().await?;
            return Ok(SubmitOutcome::NetworkSwitchRequested);
        }

        let to = parse_address("receiving", &request.route.receiving_address)?;
        let contract = parse_address("token contract", &request.route.token_address)?;
        let amount = to_base_units(request.amount)
            .map_err(|e| PaymentError::SubmissionFailed(e.to_string()))?;

        let call = ContractWrite {
            chain_id: self.chain_id,
            contract,
            data: encode_transfer(to, amount).into(),
        };

        let hash = self.provider.write_contract(call).await.map_err(|e| {
            warn!(error = %e, "Wallet refused ERC-20 transfer");
            PaymentError::SubmissionFailed(e.message)
        })?;

        let tx_id = hash.to_string();
        info!(tx_id = %tx_id, amount, "ERC-20 transfer sent");
        Ok(SubmitOutcome::Submitted(Submission {
            tx_id,
            payer: account.address,
        }))
    }

    async fn request_network_switch(&self) -> Result<(), PaymentError> {
        self.provider
            .switch_chain(self.chain_id)
            .await
            .map_err(|e| {
                warn!(error = %e, "Chain switch request failed");
                PaymentError::WrongNetwork(
                    "Please switch to Ethereum Sepolia network to continue".to_string(),
                )
            })
    }
}
