//! Confirmation tracking.
//!
//! The two networks settle differently and the difference is visible to the
//! user:
//!
//! - Ethereum: the submitter returns as soon as the wallet hands back a
//!   hash. A [`ReceiptTracker`] then polls for the receipt, and the payment
//!   step shows "Confirming..." until it is mined.
//! - Solana: the submitter already waited for network acceptance, which is
//!   taken as settlement. There is no confirming state.

use crate::Network;
use crate::events::{CheckoutEvent, CheckoutEventSender, ReceiptOutcome};
use crate::wallet::ProviderError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// How a network's transactions reach finality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementModel {
    /// A receipt has to be watched for after submission.
    ReceiptPolling,
    /// Network acceptance during submission is settlement.
    AcceptanceIsFinal,
}

impl SettlementModel {
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::EthereumSepolia => SettlementModel::ReceiptPolling,
            Network::SolanaDevnet => SettlementModel::AcceptanceIsFinal,
        }
    }

    /// Whether the payment step has a "Confirming..." interstitial.
    pub fn shows_confirming(self) -> bool {
        self == SettlementModel::ReceiptPolling
    }
}

/// A mined transaction receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptInfo {
    /// `status == 1`.
    pub success: bool,
    pub block_number: u64,
}

/// Receipt lookups on the Ethereum RPC.
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    /// `Ok(None)` while the transaction is not mined yet.
    async fn receipt(&self, tx_hash: &str) -> Result<Option<ReceiptInfo>, ProviderError>;
}

/// Watches a transaction hash until its receipt shows up.
#[derive(Clone)]
pub struct ReceiptTracker {
    source: Arc<dyn ReceiptSource>,
    poll_interval: Duration,
}

impl ReceiptTracker {
    pub fn new(source: Arc<dyn ReceiptSource>, poll_interval: Duration) -> Self {
        Self {
            source,
            poll_interval,
        }
    }

    /// Spawn a watcher for `tx_id`.
    ///
    /// Emits `Pending` right away, then exactly one of `Confirmed` or
    /// `Reverted`. Lookup errors are logged and polling continues. The task
    /// ends early when the receiving side is gone.
    pub fn watch(&self, tx_id: String, events: CheckoutEventSender) -> JoinHandle<()> {
        let source = self.source.clone();
        let poll_interval = self.poll_interval;
        tokio::spawn(async move {
            let observed = |outcome| CheckoutEvent::ReceiptObserved {
                tx_id: tx_id.clone(),
                outcome,
            };
            if events.send(observed(ReceiptOutcome::Pending)).await.is_err() {
                return;
            }

            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let outcome = match source.receipt(&tx_id).await {
                    Ok(None) => {
                        debug!(tx_id = %tx_id, "Receipt not available yet");
                        continue;
                    }
                    Ok(Some(receipt)) if receipt.success => {
                        info!(tx_id = %tx_id, block = receipt.block_number, "Transaction confirmed");
                        ReceiptOutcome::Confirmed
                    }
                    Ok(Some(receipt)) => {
                        warn!(tx_id = %tx_id, block = receipt.block_number, "Transaction reverted");
                        ReceiptOutcome::Reverted
                    }
                    Err(e) => {
                        warn!(tx_id = %tx_id, error = %e, "Receipt lookup failed");
                        continue;
                    }
                };
                let _ = events.send(observed(outcome)).await;
                break;
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::events::checkout_event_channel;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers lookups from a script, then keeps reporting "not mined".
    #[derive(Default)]
    pub struct ScriptedReceipts {
        pub script: Mutex<VecDeque<Result<Option<ReceiptInfo>, ProviderError>>>,
        pub lookups: Mutex<u32>,
    }

    impl ScriptedReceipts {
        pub fn with(script: Vec<Result<Option<ReceiptInfo>, ProviderError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                lookups: Mutex::new(0),
            }
        }

        pub fn mined(success: bool) -> Result<Option<ReceiptInfo>, ProviderError> {
            Ok(Some(ReceiptInfo {
                success,
                block_number: 7,
            }))
        }
    }

    #[async_trait]
    impl ReceiptSource for ScriptedReceipts {
        async fn receipt(&self, _tx_hash: &str) -> Result<Option<ReceiptInfo>, ProviderError> {
            *self.lookups.lock().unwrap() += 1;
            self.script.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }
    }

    fn observed(tx_id: &str, outcome: ReceiptOutcome) -> CheckoutEvent {
        CheckoutEvent::ReceiptObserved {
            tx_id: tx_id.to_string(),
            outcome,
        }
    }

    #[test]
    fn test_settlement_models() {
        assert!(SettlementModel::for_network(Network::EthereumSepolia).shows_confirming());
        assert!(!SettlementModel::for_network(Network::SolanaDevnet).shows_confirming());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_reports_pending_then_confirmed() {
        let source = Arc::new(ScriptedReceipts::with(vec![
            Ok(None),
            Err(ProviderError::new("rpc timeout")),
            ScriptedReceipts::mined(true),
        ]));
        let tracker = ReceiptTracker::new(source.clone(), Duration::from_secs(1));
        let (tx, mut rx) = checkout_event_channel();

        let handle = tracker.watch("0xabc".to_string(), tx);
        assert_eq!(rx.recv().await, Some(observed("0xabc", ReceiptOutcome::Pending)));
        assert_eq!(rx.recv().await, Some(observed("0xabc", ReceiptOutcome::Confirmed)));
        handle.await.unwrap();
        assert_eq!(*source.lookups.lock().unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_reports_revert() {
        let source = Arc::new(ScriptedReceipts::with(vec![ScriptedReceipts::mined(false)]));
        let tracker = ReceiptTracker::new(source, Duration::from_secs(1));
        let (tx, mut rx) = checkout_event_channel();

        tracker.watch("0xdef".to_string(), tx);
        rx.recv().await;
        assert_eq!(rx.recv().await, Some(observed("0xdef", ReceiptOutcome::Reverted)));
        assert_eq!(rx.recv().await, None);
    }
}
