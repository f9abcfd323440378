//! Transaction builders and submitters.
//!
//! One capability ([`TransferSubmitter`]) with one variant per network:
//!
//! - [`EthereumSubmitter`]: ERC-20 `transfer(to, amount)` through the
//!   connected wallet, after making sure the wallet is on Sepolia
//! - [`SolanaSubmitter`]: SPL token transfer between associated token
//!   accounts, signed by Phantom and broadcast through an RPC client
//!
//! Submitters only fire: they return as soon as the transaction id is known
//! (Ethereum) or the network accepted it (Solana). Finality is tracked by
//! [`crate::confirmation`].

pub mod ethereum;
pub mod solana;

pub use ethereum::{EthereumSubmitter, SEPOLIA_CHAIN_ID};
pub use solana::{SolanaRpc, SolanaSubmitter};

use crate::Network;
use crate::chain_selector::PaymentRoute;
use crate::wallet::WalletError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures of a payment attempt. The message is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("Connection rejected by user")]
    ConnectionRejected,

    #[error("{0}")]
    ProviderUnavailable(String),

    #[error("{0}")]
    WrongNetwork(String),

    #[error("Missing wallet or USDC address configuration")]
    ConfigurationMissing,

    #[error("Invalid {what} address: {value}")]
    InvalidAddress { what: &'static str, value: String },

    #[error("{0} wallet not connected")]
    WalletNotConnected(&'static str),

    #[error("{0}")]
    SubmissionFailed(String),
}

impl From<WalletError> for PaymentError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::ConnectionRejected => PaymentError::ConnectionRejected,
            WalletError::ProviderUnavailable(hint) => PaymentError::ProviderUnavailable(hint),
            WalletError::UnsupportedConnector(connector) => {
                PaymentError::ProviderUnavailable(format!("unsupported connector: {connector}"))
            }
            WalletError::Provider(message) => PaymentError::SubmissionFailed(message),
        }
    }
}

/// Confirmation state of the current attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfirmationStatus {
    #[default]
    None,
    /// Submitted, waiting for a receipt. Shown as "Confirming...".
    Pending,
    Confirmed,
    Failed,
}

/// Transient state of one payment attempt on the payment step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentAttempt {
    pub processing: bool,
    /// Transaction hash (Ethereum) or signature (Solana), once submitted.
    pub tx_id: Option<String>,
    pub confirmation: ConfirmationStatus,
    /// Last user-visible error message.
    pub error: Option<String>,
}

impl PaymentAttempt {
    /// Start a fresh attempt.
    pub fn begin(&mut self) {
        *self = Self {
            processing: true,
            ..Self::default()
        };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn fail(&mut self, error: &PaymentError) {
        self.processing = false;
        self.error = Some(error.to_string());
    }

    /// Whether a transaction of this attempt is still unsettled.
    pub fn in_flight(&self) -> bool {
        self.processing || self.confirmation == ConfirmationStatus::Pending
    }

    pub fn is_for(&self, tx_id: &str) -> bool {
        self.tx_id.as_deref() == Some(tx_id)
    }
}

/// Everything a submitter needs to move the funds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Price in USDC major units.
    pub amount: Decimal,
    pub route: PaymentRoute,
    /// Address of the connected wallet paying.
    pub payer: String,
}

/// A transaction the network now knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub tx_id: String,
    pub payer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(Submission),
    /// The wallet was asked to change network; the user has to pay again
    /// once it did.
    NetworkSwitchRequested,
}

#[async_trait]
pub trait TransferSubmitter: Send + Sync {
    fn network(&self) -> Network;

    async fn submit(&self, request: &TransferRequest) -> Result<SubmitOutcome, PaymentError>;

    /// Ask the wallet to move to the network payments are made on.
    async fn request_network_switch(&self) -> Result<(), PaymentError> {
        Ok(())
    }
}
