//! CheckoutSession: the wizard wired to wallets, submitters, the receipt
//! tracker and the notification dispatcher.
//!
//! A session is driven by user actions (its methods, or [`CheckoutCommand`]s
//! through [`CheckoutSession::run`]) and by [`CheckoutEvent`]s its own
//! background tasks send back. Actions are applied one at a time, so the
//! session is the only writer of the attempt and the chain selection.
//!
//! Within one payment attempt the order is fixed: submission returns a
//! transaction id, then the notification is fired, then confirmation
//! tracking starts.

use super::view::{CheckoutView, PaymentPrompt};
use super::wizard::{CheckoutWizard, Step, Transition};
use crate::Network;
use crate::chain_selector::ChainSelector;
use crate::config::{CheckoutConfig, CheckoutSettings};
use crate::confirmation::{ReceiptTracker, SettlementModel};
use crate::events::{
    CheckoutCommand, CheckoutCommandReceiver, CheckoutEvent, CheckoutEventReceiver,
    CheckoutEventSender, ReceiptOutcome, checkout_event_channel,
};
use crate::notify::{NotificationDispatcher, OrderNotification};
use crate::payment::{
    ConfirmationStatus, PaymentAttempt, PaymentError, Submission, SubmitOutcome, TransferRequest,
    TransferSubmitter,
};
use crate::wallet::{WalletAdapter, WalletStatus};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One wallet adapter per network.
#[derive(Clone)]
pub struct Wallets {
    pub ethereum: Arc<dyn WalletAdapter>,
    pub solana: Arc<dyn WalletAdapter>,
}

impl Wallets {
    pub fn for_network(&self, network: Network) -> &Arc<dyn WalletAdapter> {
        match network {
            Network::EthereumSepolia => &self.ethereum,
            Network::SolanaDevnet => &self.solana,
        }
    }
}

/// One transfer submitter per network.
#[derive(Clone)]
pub struct PaymentRails {
    pub ethereum: Arc<dyn TransferSubmitter>,
    pub solana: Arc<dyn TransferSubmitter>,
}

impl PaymentRails {
    pub fn for_network(&self, network: Network) -> &Arc<dyn TransferSubmitter> {
        match network {
            Network::EthereumSepolia => &self.ethereum,
            Network::SolanaDevnet => &self.solana,
        }
    }
}

fn wallet_name(network: Network) -> &'static str {
    match network {
        Network::EthereumSepolia => "Ethereum",
        Network::SolanaDevnet => "Solana",
    }
}

pub struct CheckoutSession {
    wizard: CheckoutWizard,
    selector: ChainSelector,
    attempt: PaymentAttempt,
    wallets: Wallets,
    rails: PaymentRails,
    tracker: ReceiptTracker,
    dispatcher: NotificationDispatcher,
    settings: CheckoutSettings,
    events_tx: CheckoutEventSender,
    events_rx: CheckoutEventReceiver,
    view: watch::Sender<CheckoutView>,
    /// Receipt watchers and the success timer of the current attempt.
    background: Vec<JoinHandle<()>>,
    exited: bool,
}

impl CheckoutSession {
    pub fn new(
        wizard: CheckoutWizard,
        config: CheckoutConfig,
        wallets: Wallets,
        rails: PaymentRails,
        tracker: ReceiptTracker,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        let settings = config.settings.clone();
        let selector = ChainSelector::new(config);
        let attempt = PaymentAttempt::default();
        let (events_tx, events_rx) = checkout_event_channel();
        let initial = render(&wizard, &selector, &attempt, &wallets, false);
        let (view, _) = watch::channel(initial);
        Self {
            wizard,
            selector,
            attempt,
            wallets,
            rails,
            tracker,
            dispatcher,
            settings,
            events_tx,
            events_rx,
            view,
            background: Vec::new(),
            exited: false,
        }
    }

    /// Subscribe to view snapshots. A new one is published after every
    /// change.
    pub fn view(&self) -> watch::Receiver<CheckoutView> {
        self.view.subscribe()
    }

    pub fn snapshot(&self) -> CheckoutView {
        render(
            &self.wizard,
            &self.selector,
            &self.attempt,
            &self.wallets,
            self.exited,
        )
    }

    pub fn wizard(&self) -> &CheckoutWizard {
        &self.wizard
    }

    pub fn attempt(&self) -> &PaymentAttempt {
        &self.attempt
    }

    pub fn network(&self) -> Network {
        self.selector.current()
    }

    fn publish(&self) {
        self.view.send_replace(self.snapshot());
    }

    fn abort_background(&mut self) {
        for handle in self.background.drain(..) {
            handle.abort();
        }
    }

    /// A submitted payment that has not failed pins the user to the
    /// payment step.
    fn payment_locked(&self) -> bool {
        self.attempt.in_flight() || self.attempt.confirmation == ConfirmationStatus::Confirmed
    }

    fn after(&mut self, transition: Transition) -> Transition {
        self.publish();
        transition
    }

    pub fn select_service(&mut self, service_id: &str) -> Transition {
        let transition = self.wizard.select_service(service_id);
        self.after(transition)
    }

    pub fn select_duration(&mut self, label: &str) -> Transition {
        let transition = self.wizard.select_duration(label);
        self.after(transition)
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.wizard.set_email(email);
        self.publish();
    }

    pub fn set_telegram(&mut self, telegram: impl Into<String>) {
        self.wizard.set_telegram(telegram);
        self.publish();
    }

    pub fn set_terms_accepted(&mut self, accepted: bool) {
        self.wizard.set_terms_accepted(accepted);
        self.publish();
    }

    pub fn advance(&mut self) -> Transition {
        let transition = self.wizard.advance();
        if transition == Transition::Moved(Step::Payment) {
            self.attempt.reset();
        }
        self.after(transition)
    }

    /// Back is refused on the payment step while a payment is pending.
    pub fn back(&mut self) -> Transition {
        if self.wizard.step() == Step::Payment && self.payment_locked() {
            debug!("Back ignored while a payment is pending");
            return Transition::Unchanged;
        }
        let transition = self.wizard.back();
        match transition {
            Transition::Exited => self.exited = true,
            Transition::Moved(Step::DetailsCollection) => {
                self.abort_background();
                self.attempt.reset();
            }
            _ => {}
        }
        self.after(transition)
    }

    /// Change the network payments are made on. Only on the payment step;
    /// clears the current attempt.
    pub fn select_network(&mut self, network: Network) -> bool {
        if self.wizard.step() != Step::Payment {
            return false;
        }
        if network != self.selector.current() {
            self.abort_background();
            self.selector.select(network, &mut self.attempt);
            self.publish();
        }
        true
    }

    /// Connect the wallet of the active network. Failures also land in the
    /// attempt's error message.
    pub async fn connect_wallet(&mut self, connector_id: &str) -> Result<WalletStatus, PaymentError> {
        let network = self.selector.current();
        self.attempt.error = None;
        let result = self
            .wallets
            .for_network(network)
            .connect(connector_id)
            .await
            .map_err(PaymentError::from);
        if let Err(e) = &result {
            warn!(%network, connector = connector_id, error = %e, "Wallet connection failed");
            self.attempt.fail(e);
        }
        self.publish();
        result
    }

    pub async fn disconnect_wallet(&mut self) {
        let network = self.selector.current();
        if let Err(e) = self.wallets.for_network(network).disconnect().await {
            warn!(%network, error = %e, "Wallet disconnect failed");
        }
        self.publish();
    }

    /// Explicit chain switch from the `SwitchNetwork` prompt.
    pub async fn switch_network(&mut self) {
        if self.wizard.step() != Step::Payment {
            return;
        }
        let submitter = self.rails.for_network(self.selector.current()).clone();
        match submitter.request_network_switch().await {
            Ok(()) => self.attempt.error = None,
            Err(e) => self.attempt.fail(&e),
        }
        self.publish();
    }

    /// Start a payment attempt on the active network.
    ///
    /// Ignored outside the payment step and while another attempt is
    /// pending. Failures end up in the attempt, never in the caller.
    pub async fn pay(&mut self) {
        if self.wizard.step() != Step::Payment || self.payment_locked() {
            debug!("Pay ignored");
            return;
        }
        self.abort_background();
        self.attempt.begin();
        self.publish();

        let network = self.selector.current();
        if let Err(e) = self.submit(network).await {
            warn!(%network, error = %e, "Payment attempt failed");
            self.attempt.fail(&e);
        }
        self.publish();
    }

    async fn submit(&mut self, network: Network) -> Result<(), PaymentError> {
        let route = self.selector.route()?;
        let status = self.wallets.for_network(network).status();
        let payer = status
            .address
            .filter(|_| status.connected)
            .ok_or(PaymentError::WalletNotConnected(wallet_name(network)))?;
        let amount = self
            .wizard
            .payment_price()
            .ok_or_else(|| PaymentError::SubmissionFailed("No price selected".to_string()))?;

        let request = TransferRequest {
            amount,
            route,
            payer,
        };
        let submitter = self.rails.for_network(network).clone();
        match submitter.submit(&request).await? {
            SubmitOutcome::NetworkSwitchRequested => {
                info!(%network, "Network switch requested, waiting for the user to pay again");
                self.attempt.processing = false;
            }
            SubmitOutcome::Submitted(submission) => {
                self.on_submitted(network, amount, submission);
            }
        }
        Ok(())
    }

    fn on_submitted(&mut self, network: Network, amount: Decimal, submission: Submission) {
        info!(tx_id = %submission.tx_id, %network, "Payment submitted");
        self.attempt.tx_id = Some(submission.tx_id.clone());

        let notification = self.notification(network, amount, &submission);
        self.dispatcher.dispatch(notification);

        match SettlementModel::for_network(network) {
            SettlementModel::ReceiptPolling => {
                self.attempt.confirmation = ConfirmationStatus::Pending;
                let watcher = self
                    .tracker
                    .watch(submission.tx_id, self.events_tx.clone());
                self.background.push(watcher);
            }
            SettlementModel::AcceptanceIsFinal => self.settle(submission.tx_id),
        }
    }

    fn notification(
        &self,
        network: Network,
        price: Decimal,
        submission: &Submission,
    ) -> OrderNotification {
        let draft = self.wizard.draft();
        let telegram = draft.telegram.trim().trim_start_matches('@');
        OrderNotification {
            service: draft
                .service
                .as_ref()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            price,
            network,
            tx_id: submission.tx_id.clone(),
            customer_email: draft.email.trim().to_string(),
            telegram: (!telegram.is_empty()).then(|| telegram.to_string()),
            wallet_address: submission.payer.clone(),
        }
    }

    /// Payment is final: release the pay button and schedule the success
    /// step.
    fn settle(&mut self, tx_id: String) {
        self.attempt.processing = false;
        self.attempt.confirmation = ConfirmationStatus::Confirmed;

        let delay = self.settings.success_delay;
        let events = self.events_tx.clone();
        self.background.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events
                .send(CheckoutEvent::SuccessDelayElapsed { tx_id })
                .await;
        }));
    }

    /// Apply an event from a background task. Events of any other
    /// transaction than the current one are dropped.
    pub fn handle_event(&mut self, event: CheckoutEvent) {
        if !self.attempt.is_for(event.tx_id()) {
            debug!(tx_id = %event.tx_id(), "Ignoring event of a stale transaction");
            return;
        }
        match event {
            CheckoutEvent::ReceiptObserved { tx_id, outcome } => match outcome {
                ReceiptOutcome::Pending => {
                    self.attempt.confirmation = ConfirmationStatus::Pending;
                }
                ReceiptOutcome::Confirmed => self.settle(tx_id),
                ReceiptOutcome::Reverted => {
                    self.attempt.confirmation = ConfirmationStatus::Failed;
                    self.attempt.fail(&PaymentError::SubmissionFailed(
                        "transaction reverted".to_string(),
                    ));
                }
            },
            CheckoutEvent::SuccessDelayElapsed { tx_id } => {
                if self.attempt.confirmation == ConfirmationStatus::Confirmed
                    && self.wizard.complete_payment() == Transition::Moved(Step::Success)
                {
                    info!(tx_id = %tx_id, "Checkout completed");
                    self.attempt.reset();
                }
            }
        }
        self.publish();
    }

    /// Wait for the next background event and apply it.
    pub async fn process_next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    pub async fn apply(&mut self, command: CheckoutCommand) {
        match command {
            CheckoutCommand::SelectService(id) => {
                self.select_service(&id);
            }
            CheckoutCommand::SelectDuration(label) => {
                self.select_duration(&label);
            }
            CheckoutCommand::SetEmail(email) => self.set_email(email),
            CheckoutCommand::SetTelegram(handle) => self.set_telegram(handle),
            CheckoutCommand::SetTermsAccepted(accepted) => self.set_terms_accepted(accepted),
            CheckoutCommand::Advance => {
                self.advance();
            }
            CheckoutCommand::Back => {
                self.back();
            }
            CheckoutCommand::SelectNetwork(network) => {
                self.select_network(network);
            }
            CheckoutCommand::ConnectWallet { connector_id } => {
                let _ = self.connect_wallet(&connector_id).await;
            }
            CheckoutCommand::DisconnectWallet => self.disconnect_wallet().await,
            CheckoutCommand::SwitchNetwork => self.switch_network().await,
            CheckoutCommand::Pay => self.pay().await,
        }
    }

    /// Drive the session until shutdown or until the command channel is
    /// closed.
    pub async fn run(
        mut self,
        mut commands: CheckoutCommandReceiver,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("CheckoutSession started");
        let mut ethereum_status = self.wallets.ethereum.subscribe();
        let mut solana_status = self.wallets.solana.subscribe();

        loop {
            tokio::select! {
                biased;

                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        info!("CheckoutSession received shutdown signal");
                        break;
                    }
                }

                Some(event) = self.events_rx.recv() => {
                    self.handle_event(event);
                }

                Ok(()) = ethereum_status.changed() => {
                    debug!("Ethereum wallet status changed");
                    self.publish();
                }

                Ok(()) = solana_status.changed() => {
                    debug!("Solana wallet status changed");
                    self.publish();
                }

                command = commands.recv() => match command {
                    Some(command) => {
                        debug!(command = ?command, "Received CheckoutCommand");
                        self.apply(command).await;
                    }
                    None => {
                        info!("CheckoutCommand channel closed");
                        break;
                    }
                },
            }
        }

        self.abort_background();
        info!("CheckoutSession shutdown complete");
    }
}

impl Drop for CheckoutSession {
    fn drop(&mut self) {
        self.abort_background();
    }
}

fn render(
    wizard: &CheckoutWizard,
    selector: &ChainSelector,
    attempt: &PaymentAttempt,
    wallets: &Wallets,
    exited: bool,
) -> CheckoutView {
    let step = wizard.step();
    let network = selector.current();
    let wallet = wallets.for_network(network).status();
    let prompt = match (step, wizard.payment_price()) {
        (Step::Payment, Some(price)) => {
            Some(PaymentPrompt::resolve(network, &wallet, attempt, price))
        }
        _ => None,
    };
    CheckoutView {
        step,
        progress: step.progress(),
        draft: wizard.draft().clone(),
        can_advance: wizard.can_advance(),
        network,
        attempt: attempt.clone(),
        wallet,
        prompt,
        exited,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::NetworkConfig;
    use crate::confirmation::tests::ScriptedReceipts;
    use crate::events::checkout_command_channel;
    use crate::notify::tests::RecordingNotifier;
    use crate::payment::solana::tests::{FakeRpc, MINT, RECEIVER, SIGNATURE};
    use crate::payment::{EthereumSubmitter, SolanaSubmitter};
    use crate::wallet::ethereum::tests::{FakeEthereumProvider, SEPOLIA};
    use crate::wallet::solana::PHANTOM_CONNECTOR_ID;
    use crate::wallet::solana::tests::{FakePhantom, PAYER};
    use crate::wallet::{
        EthereumWallet, PhantomProvider, ProviderError, ProviderEvent, SolanaWallet,
    };
    use std::time::Duration;
    use tokio::time::Instant;

    const ETH_RECEIVER: &str = "0x00000000000000000000000000000000000000cc";
    const ETH_TOKEN: &str = "0x1c7d4b196cb0c7b01d743fbc6116a902379c7238";

    struct Harness {
        session: CheckoutSession,
        eth: Arc<FakeEthereumProvider>,
        phantom: Arc<FakePhantom>,
        notifier: Arc<RecordingNotifier>,
    }

    fn config() -> CheckoutConfig {
        CheckoutConfig {
            ethereum: NetworkConfig::new(ETH_RECEIVER, ETH_TOKEN),
            solana: NetworkConfig::new(RECEIVER, MINT),
            settings: CheckoutSettings::default(),
        }
    }

    fn harness_with(
        eth: FakeEthereumProvider,
        receipts: ScriptedReceipts,
        notifier: RecordingNotifier,
        config: CheckoutConfig,
    ) -> Harness {
        let eth = Arc::new(eth);
        let phantom = Arc::new(FakePhantom::new());
        let notifier = Arc::new(notifier);
        let phantom_provider: Arc<dyn PhantomProvider> = phantom.clone();

        let wallets = Wallets {
            ethereum: Arc::new(EthereumWallet::new(eth.clone())),
            solana: Arc::new(SolanaWallet::new(
                Some(phantom_provider.clone()),
                &config.settings,
            )),
        };
        let rails = PaymentRails {
            ethereum: Arc::new(EthereumSubmitter::new(eth.clone())),
            solana: Arc::new(SolanaSubmitter::new(
                phantom_provider,
                Arc::new(FakeRpc::default()),
            )),
        };
        let tracker = ReceiptTracker::new(
            Arc::new(receipts),
            config.settings.receipt_poll_interval,
        );
        let dispatcher = NotificationDispatcher::new(notifier.clone());
        let session = CheckoutSession::new(
            CheckoutWizard::new(Catalog::builtin()),
            config,
            wallets,
            rails,
            tracker,
            dispatcher,
        );
        Harness {
            session,
            eth,
            phantom,
            notifier,
        }
    }

    fn ethereum_harness(chain_id: u64, receipts: ScriptedReceipts) -> Harness {
        harness_with(
            FakeEthereumProvider::connected_on(chain_id),
            receipts,
            RecordingNotifier::default(),
            config(),
        )
    }

    fn to_payment(session: &mut CheckoutSession) {
        assert_eq!(session.select_service("premium-post"), Transition::Unchanged);
        session.select_duration("48 Hours");
        session.set_email("a@b.com");
        session.set_telegram("@alice");
        session.set_terms_accepted(true);
        assert_eq!(session.advance(), Transition::Moved(Step::Payment));
    }

    async fn connect_phantom(h: &mut Harness) {
        assert!(h.session.select_network(Network::SolanaDevnet));
        h.session
            .connect_wallet(PHANTOM_CONNECTOR_ID)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ethereum_payment_confirms_then_succeeds() {
        let mut h = ethereum_harness(
            SEPOLIA,
            ScriptedReceipts::with(vec![Ok(None), ScriptedReceipts::mined(true)]),
        );
        to_payment(&mut h.session);
        h.session.pay().await;

        let attempt = h.session.attempt().clone();
        assert!(attempt.processing);
        assert_eq!(attempt.confirmation, ConfirmationStatus::Pending);
        let tx_id = attempt.tx_id.unwrap();
        assert_eq!(h.eth.writes.lock().unwrap().len(), 1);
        assert_eq!(
            h.session.snapshot().prompt,
            Some(PaymentPrompt::Pay {
                label: "Confirming...".to_string(),
                disabled: true
            })
        );

        // pending, then confirmed
        assert!(h.session.process_next_event().await);
        assert!(h.session.process_next_event().await);
        assert!(!h.session.attempt().processing);
        assert_eq!(
            h.session.attempt().confirmation,
            ConfirmationStatus::Confirmed
        );
        assert_eq!(h.session.wizard().step(), Step::Payment);

        let confirmed_at = Instant::now();
        assert!(h.session.process_next_event().await);
        assert!(confirmed_at.elapsed() >= Duration::from_secs(2));
        assert_eq!(h.session.wizard().step(), Step::Success);
        assert_eq!(h.session.snapshot().progress, 100);

        let requests = h.notifier.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tx_hash, tx_id);
        assert_eq!(requests[0].network, Network::EthereumSepolia);
        assert_eq!(requests[0].price, Decimal::from(800));
        assert_eq!(requests[0].service, "Premium Amplified Post");
        assert_eq!(requests[0].telegram.as_deref(), Some("alice"));
        assert_eq!(
            requests[0].wallet_address,
            "0x00000000000000000000000000000000000000aa"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_chain_only_requests_switch() {
        let mut h = ethereum_harness(1, ScriptedReceipts::default());
        to_payment(&mut h.session);
        assert_eq!(
            h.session.snapshot().prompt,
            Some(PaymentPrompt::SwitchNetwork {
                required_chain_id: SEPOLIA
            })
        );

        h.session.pay().await;
        assert!(h.eth.writes.lock().unwrap().is_empty());
        assert_eq!(*h.eth.switch_requests.lock().unwrap(), vec![SEPOLIA]);
        assert_eq!(h.session.attempt(), &PaymentAttempt::default());
        assert_eq!(h.session.wizard().step(), Step::Payment);

        h.session.switch_network().await;
        assert_eq!(h.eth.switch_requests.lock().unwrap().len(), 2);
        assert!(h.notifier.requests.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_configuration_fails_attempt() {
        let config = CheckoutConfig {
            ethereum: NetworkConfig::default(),
            ..config()
        };
        let mut h = harness_with(
            FakeEthereumProvider::connected_on(SEPOLIA),
            ScriptedReceipts::default(),
            RecordingNotifier::default(),
            config,
        );
        to_payment(&mut h.session);
        h.session.pay().await;

        assert!(!h.session.attempt().processing);
        assert_eq!(
            h.session.attempt().error.as_deref(),
            Some("Missing wallet or USDC address configuration")
        );
        assert!(h.eth.writes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_solana_signing_rejected() {
        let mut h = ethereum_harness(SEPOLIA, ScriptedReceipts::default());
        to_payment(&mut h.session);
        connect_phantom(&mut h).await;
        *h.phantom.sign_result.lock().unwrap() = Some(ProviderError::user_rejected());

        h.session.pay().await;
        let attempt = h.session.attempt();
        assert!(!attempt.processing);
        assert_eq!(attempt.tx_id, None);
        assert_eq!(attempt.error.as_deref(), Some("User rejected the request."));
        assert_eq!(h.session.wizard().step(), Step::Payment);
        assert!(h.notifier.requests.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_solana_payment_succeeds_despite_failed_notification() {
        let mut h = harness_with(
            FakeEthereumProvider::new(),
            ScriptedReceipts::default(),
            RecordingNotifier::failing(),
            config(),
        );
        to_payment(&mut h.session);
        connect_phantom(&mut h).await;

        h.session.pay().await;
        let attempt = h.session.attempt().clone();
        assert!(!attempt.processing);
        assert_eq!(attempt.tx_id.as_deref(), Some(SIGNATURE));
        assert_eq!(attempt.confirmation, ConfirmationStatus::Confirmed);
        // no confirming interstitial on Solana
        assert_eq!(
            h.session.snapshot().prompt,
            Some(PaymentPrompt::Pay {
                label: "Pay 800 USDC".to_string(),
                disabled: false
            })
        );
        assert_eq!(h.session.back(), Transition::Unchanged);

        assert!(h.session.process_next_event().await);
        assert_eq!(h.session.wizard().step(), Step::Success);
        let requests = h.notifier.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].wallet_address, PAYER);
        assert_eq!(requests[0].network, Network::SolanaDevnet);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_switch_clears_attempt() {
        let mut h = ethereum_harness(SEPOLIA, ScriptedReceipts::default());
        assert!(!h.session.select_network(Network::SolanaDevnet));

        to_payment(&mut h.session);
        h.session.pay().await;
        let tx_id = h.session.attempt().tx_id.clone().unwrap();
        assert_eq!(h.session.back(), Transition::Unchanged);

        assert!(h.session.select_network(Network::SolanaDevnet));
        assert_eq!(h.session.attempt(), &PaymentAttempt::default());

        // a late receipt of the abandoned transaction changes nothing
        h.session.handle_event(CheckoutEvent::ReceiptObserved {
            tx_id,
            outcome: ReceiptOutcome::Confirmed,
        });
        assert_eq!(h.session.attempt(), &PaymentAttempt::default());

        // an error is cleared the same way
        let err = h.session.connect_wallet("metamask").await.unwrap_err();
        assert_eq!(
            h.session.attempt().error.as_deref(),
            Some(err.to_string().as_str())
        );
        h.session.select_network(Network::EthereumSepolia);
        assert_eq!(h.session.attempt().error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverted_transaction_fails_attempt() {
        let mut h = ethereum_harness(
            SEPOLIA,
            ScriptedReceipts::with(vec![ScriptedReceipts::mined(false)]),
        );
        to_payment(&mut h.session);
        h.session.pay().await;
        h.session.process_next_event().await;
        h.session.process_next_event().await;

        let attempt = h.session.attempt();
        assert!(!attempt.processing);
        assert_eq!(attempt.confirmation, ConfirmationStatus::Failed);
        assert_eq!(attempt.error.as_deref(), Some("transaction reverted"));
        assert_eq!(
            h.session.back(),
            Transition::Moved(Step::DetailsCollection)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_connection_surfaces_message() {
        let mut h = ethereum_harness(SEPOLIA, ScriptedReceipts::default());
        to_payment(&mut h.session);
        h.session.select_network(Network::SolanaDevnet);
        h.phantom.script(vec![Err(ProviderError::user_rejected())]);

        assert_eq!(
            h.session.connect_wallet(PHANTOM_CONNECTOR_ID).await,
            Err(PaymentError::ConnectionRejected)
        );
        assert_eq!(
            h.session.attempt().error.as_deref(),
            Some("Connection rejected by user")
        );
        assert_eq!(
            h.session.snapshot().prompt,
            Some(PaymentPrompt::ConnectWallet)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_drives_commands_and_wallet_events() {
        let h = ethereum_harness(
            SEPOLIA,
            ScriptedReceipts::with(vec![ScriptedReceipts::mined(true)]),
        );
        let eth = h.eth.clone();
        let mut view = h.session.view();
        let (commands, commands_rx) = checkout_command_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(h.session.run(commands_rx, shutdown_rx));

        for command in [
            CheckoutCommand::SelectService("livestream".to_string()),
            CheckoutCommand::SetEmail("a@b.com".to_string()),
            CheckoutCommand::SetTermsAccepted(true),
            CheckoutCommand::Advance,
            CheckoutCommand::Pay,
        ] {
            commands.send(command).await.unwrap();
        }
        view.wait_for(|v| v.step == Step::Success).await.unwrap();
        assert_eq!(
            eth.writes.lock().unwrap()[0].contract.to_string().to_lowercase(),
            ETH_TOKEN
        );

        eth.events.send(ProviderEvent::Disconnected).unwrap();
        view.wait_for(|v| !v.wallet.connected).await.unwrap();

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_when_commands_close() {
        let h = ethereum_harness(SEPOLIA, ScriptedReceipts::default());
        let (commands, commands_rx) = checkout_command_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(h.session.run(commands_rx, shutdown_rx));

        commands
            .send(CheckoutCommand::SelectService("livestream".to_string()))
            .await
            .unwrap();
        drop(commands);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("run did not return after the command channel closed")
            .unwrap();
    }
}
