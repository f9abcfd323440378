//! Event type definitions.

use crate::Network;

/// What the receipt watcher saw for a submitted Ethereum transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptOutcome {
    /// No receipt yet; the transaction is still being mined.
    Pending,
    /// Mined successfully.
    Confirmed,
    /// Mined, but execution failed.
    Reverted,
}

/// Events produced by background tasks of a checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutEvent {
    /// The receipt watcher observed a change for a transaction.
    ReceiptObserved {
        tx_id: String,
        outcome: ReceiptOutcome,
    },
    /// The fixed pause after settlement elapsed.
    SuccessDelayElapsed { tx_id: String },
}

impl CheckoutEvent {
    /// The transaction this event belongs to.
    pub fn tx_id(&self) -> &str {
        match self {
            CheckoutEvent::ReceiptObserved { tx_id, .. } => tx_id,
            CheckoutEvent::SuccessDelayElapsed { tx_id } => tx_id,
        }
    }
}

/// User actions, as issued by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutCommand {
    SelectService(String),
    SelectDuration(String),
    SetEmail(String),
    SetTelegram(String),
    SetTermsAccepted(bool),
    Advance,
    Back,
    SelectNetwork(Network),
    ConnectWallet { connector_id: String },
    DisconnectWallet,
    SwitchNetwork,
    Pay,
}
