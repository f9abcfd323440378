//! Order notification payloads.
//!
//! Sent by the checkout to the notification endpoint once a payment
//! transaction has been submitted.

use crate::objects::Network;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request body of `POST /api/notify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    /// Display name of the purchased service.
    pub service: String,
    /// Price in USDC major units.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub network: Network,
    /// Transaction hash (Ethereum) or signature (Solana).
    pub tx_hash: String,
    pub customer_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    /// Address of the wallet that paid.
    pub wallet_address: String,
}

/// Successful response of `POST /api/notify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyResponse {
    pub success: bool,
    pub message: String,
    pub email_id: Option<String>,
}

/// Error response of `POST /api/notify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NotifyErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            message: None,
        }
    }
}
