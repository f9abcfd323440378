//! SPL token transfer signed by Phantom.

use super::{PaymentError, Submission, SubmitOutcome, TransferRequest, TransferSubmitter};
use crate::Network;
use crate::catalog::to_base_units;
use crate::wallet::ProviderError;
use crate::wallet::solana::PhantomProvider;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The SPL Token program.
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Instruction index of `Transfer` in the SPL Token program.
const TRANSFER_INSTRUCTION: u8 = 3;

/// An SPL token `Transfer` instruction between two token accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub program_id: String,
    pub source: String,
    pub destination: String,
    /// Owner of `source`; signs the transaction.
    pub owner: String,
    /// Amount in base units.
    pub amount: u64,
}

impl TokenTransfer {
    pub fn new(source: String, destination: String, owner: String, amount: u64) -> Self {
        Self {
            program_id: TOKEN_PROGRAM_ID.to_string(),
            source,
            destination,
            owner,
            amount,
        }
    }

    /// Instruction data: the tag byte followed by the little-endian amount.
    pub fn data(&self) -> [u8; 9] {
        let mut data = [0u8; 9];
        data[0] = TRANSFER_INSTRUCTION;
        data[1..].copy_from_slice(&self.amount.to_le_bytes());
        data
    }
}

/// A transaction ready to be signed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub fee_payer: String,
    pub recent_blockhash: String,
    pub instructions: Vec<TokenTransfer>,
}

/// A wallet-signed transaction in wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    wire: Vec<u8>,
}

impl SignedTransaction {
    pub fn new(wire: Vec<u8>) -> Self {
        Self { wire }
    }

    pub fn serialize(&self) -> &[u8] {
        &self.wire
    }
}

/// The Solana JSON-RPC operations a payment needs.
#[async_trait]
pub trait SolanaRpc: Send + Sync {
    async fn latest_blockhash(&self) -> Result<String, ProviderError>;

    /// Derive the associated token account of `owner` for `mint`.
    async fn associated_token_address(
        &self,
        owner: &str,
        mint: &str,
    ) -> Result<String, ProviderError>;

    /// Broadcast a signed transaction; returns its signature.
    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<String, ProviderError>;

    /// Wait until the network accepted the transaction.
    async fn confirm_transaction(&self, signature: &str) -> Result<(), ProviderError>;
}

pub struct SolanaSubmitter {
    provider: Arc<dyn PhantomProvider>,
    rpc: Arc<dyn SolanaRpc>,
}

impl SolanaSubmitter {
    pub fn new(provider: Arc<dyn PhantomProvider>, rpc: Arc<dyn SolanaRpc>) -> Self {
        Self { provider, rpc }
    }

    async fn token_account(&self, owner: &str, mint: &str) -> Result<String, PaymentError> {
        self.rpc
            .associated_token_address(owner, mint)
            .await
            .map_err(|e| {
                PaymentError::SubmissionFailed(format!("Failed to derive token account: {e}"))
            })
    }
}

fn failed(step: &'static str) -> impl Fn(ProviderError) -> PaymentError {
    move |e| {
        warn!(step, error = %e, "Solana payment step failed");
        PaymentError::SubmissionFailed(e.message)
    }
}

#[async_trait]
impl TransferSubmitter for SolanaSubmitter {
    fn network(&self) -> Network {
        Network::SolanaDevnet
    }

    async fn submit(&self, request: &TransferRequest) -> Result<SubmitOutcome, PaymentError> {
        let mint = &request.route.token_address;
        let amount = to_base_units(request.amount)
            .map_err(|e| PaymentError::SubmissionFailed(e.to_string()))?;

        let source = self.token_account(&request.payer, mint).await?;
        let destination = self
            .token_account(&request.route.receiving_address, mint)
            .await?;
        debug!(%source, %destination, amount, "Built SPL transfer");

        let transfer = TokenTransfer::new(source, destination, request.payer.clone(), amount);
        let recent_blockhash = self
            .rpc
            .latest_blockhash()
            .await
            .map_err(failed("blockhash"))?;
        let transaction = UnsignedTransaction {
            fee_payer: request.payer.clone(),
            recent_blockhash,
            instructions: vec![transfer],
        };

        let signed = self
            .provider
            .sign_transaction(transaction)
            .await
            .map_err(failed("sign"))?;
        let signature = self
            .rpc
            .send_raw_transaction(signed.serialize())
            .await
            .map_err(failed("broadcast"))?;
        self.rpc
            .confirm_transaction(&signature)
            .await
            .map_err(failed("confirm"))?;

        info!(tx_id = %signature, amount, "SPL transfer accepted");
        Ok(SubmitOutcome::Submitted(Submission {
            tx_id: signature,
            payer: request.payer.clone(),
        }))
    }
}
