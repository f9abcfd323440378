//! Snapshot of the checkout handed to the presentation layer.

use super::wizard::{OrderDraft, Step};
use crate::Network;
use crate::chain_selector::required_chain_id;
use crate::confirmation::SettlementModel;
use crate::payment::{ConfirmationStatus, PaymentAttempt};
use crate::wallet::WalletStatus;
use rust_decimal::Decimal;

/// The main affordance of the payment step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentPrompt {
    /// No wallet connected on the active network.
    ConnectWallet,
    /// The Ethereum wallet sits on another chain.
    SwitchNetwork { required_chain_id: u64 },
    Pay { label: String, disabled: bool },
}

impl PaymentPrompt {
    pub fn resolve(
        network: Network,
        wallet: &WalletStatus,
        attempt: &PaymentAttempt,
        price: Decimal,
    ) -> Self {
        if !wallet.connected {
            return PaymentPrompt::ConnectWallet;
        }
        if let (Some(required), Some(active)) = (required_chain_id(network), wallet.chain_id) {
            if required != active && !attempt.in_flight() {
                return PaymentPrompt::SwitchNetwork {
                    required_chain_id: required,
                };
            }
        }
        let confirming = SettlementModel::for_network(network).shows_confirming()
            && attempt.confirmation == ConfirmationStatus::Pending;
        let label = if confirming {
            "Confirming...".to_string()
        } else if attempt.processing {
            "Processing...".to_string()
        } else {
            format!("Pay {price} USDC")
        };
        PaymentPrompt::Pay {
            label,
            disabled: attempt.processing || confirming,
        }
    }
}

/// Everything needed to render the checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutView {
    pub step: Step,
    /// 25, 50, 75 or 100.
    pub progress: u8,
    pub draft: OrderDraft,
    pub can_advance: bool,
    pub network: Network,
    pub attempt: PaymentAttempt,
    /// Wallet of the active network.
    pub wallet: WalletStatus,
    /// Only on the payment step.
    pub prompt: Option<PaymentPrompt>,
    /// Set once back was pressed on a wizard opened with a service.
    pub exited: bool,
}
