use super::clipboard::{CopyFeedback, CopyTarget};
use super::confirmation::{ConfirmOutcome, SelfReportedConfirmationFlow};
use super::gateway_client::GatewayOrderClient;
use super::ledger::DonationLedgerRecorder;
use super::qr_session::{QrSessionManager, QrSnapshot};
use crate::config::{BankTransferDetails, CheckoutConfig};
use crate::domain::card::CardDetails;
use crate::domain::donation::DonationRecord;
use crate::domain::fees::{FeeBreakdown, FeeCalculator};
use crate::domain::gateway::{CheckoutOptions, CheckoutResponse, FeeQuoteRequest};
use crate::domain::method::{PaymentMethod, SubFlowKind};
use crate::domain::money::{Amount, Money};
use crate::domain::ports::{ClipboardArc, FeeQuoteServiceArc, Notification, NotifierArc};
use crate::domain::session::{Campaign, CheckoutState, Donor, PaymentSession};
use crate::error::{PaymentError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Collaborators shared by every checkout session.
#[derive(Clone)]
pub struct CheckoutServices {
    pub quotes: FeeQuoteServiceArc,
    pub gateway: Arc<GatewayOrderClient>,
    pub ledger: Arc<DonationLedgerRecorder>,
    pub notifier: NotifierArc,
    pub clipboard: ClipboardArc,
}

/// Identifies one opening of the checkout widget. Completion and dismissal
/// events carry it back so late events from a replaced attempt are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptToken(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    Completed(DonationRecord),
    Dismissed,
    /// The event belonged to an attempt that is no longer current.
    Stale,
}

/// Bank-transfer view: where to send the money and what to quote as reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankTransferView {
    pub details: BankTransferDetails,
    pub reference: String,
}

struct PendingCheckout {
    token: AttemptToken,
    order_id: String,
    options: CheckoutOptions,
}

/// The active sub-flow. Replacing it drops whatever the previous one owned,
/// including the QR timer.
enum ActiveFlow {
    None,
    Qr(QrSessionManager),
    BankTransfer(BankTransferView),
    Card(CardDetails),
    Gateway(PendingCheckout),
}

/// Top-level checkout state machine for one donation session.
///
/// `MethodSelection -> {QrActive | BankDetails | CardForm | GatewayCheckout}
/// -> Processing -> {Completed | Failed}`. A failure returns to method
/// selection; completion is terminal and the surface closes shortly after.
pub struct PaymentOrchestrator {
    config: CheckoutConfig,
    services: CheckoutServices,
    fallback_fees: FeeCalculator,
    session: PaymentSession,
    amount_input: Decimal,
    flow: ActiveFlow,
    confirmation: SelfReportedConfirmationFlow,
    copy: CopyFeedback,
    quote_in_flight: bool,
    call_in_flight: bool,
    next_attempt: u64,
    last_error: Option<String>,
}

impl PaymentOrchestrator {
    /// Opens the payment surface for `amount` towards `campaign`.
    pub fn open(
        config: CheckoutConfig,
        services: CheckoutServices,
        amount: Decimal,
        campaign: Campaign,
        donor: Donor,
    ) -> Result<Self> {
        let session = PaymentSession::new(Amount::new(amount)?, campaign, donor);
        info!(
            session = %session.id,
            campaign = %session.campaign.id,
            amount = %session.amount,
            "payment session opened"
        );
        let confirmation = SelfReportedConfirmationFlow::new(
            services.ledger.clone(),
            config.confirmation_latency(),
        );
        let copy = CopyFeedback::new(services.clipboard.clone(), config.copy_ack());
        Ok(Self {
            fallback_fees: FeeCalculator::new(config.fees.clone()),
            config,
            services,
            session,
            amount_input: amount,
            flow: ActiveFlow::None,
            confirmation,
            copy,
            quote_in_flight: false,
            call_in_flight: false,
            next_attempt: 0,
            last_error: None,
        })
    }

    pub fn state(&self) -> CheckoutState {
        self.session.state
    }

    pub fn session(&self) -> &PaymentSession {
        &self.session
    }

    pub fn quote(&self) -> Option<&FeeBreakdown> {
        self.session.quote.as_ref()
    }

    pub fn selected_method(&self) -> Option<PaymentMethod> {
        self.session.selected_method
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Amount the donor pays, fees included.
    pub fn payable(&self) -> Money {
        self.current_quote()
            .map(|q| q.total_payable)
            .unwrap_or_else(|| Money::from(self.session.amount))
    }

    /// Pay/confirm is enabled only for a valid amount, with a quote for that
    /// amount in hand and no quote or gateway call outstanding.
    pub fn can_pay(&self) -> bool {
        self.amount_input >= Amount::MINIMUM
            && self.current_quote().is_some()
            && !self.quote_in_flight
            && !self.call_in_flight
            && !self.confirmation.is_processing()
            && match self.session.state {
                CheckoutState::MethodSelection => {
                    self.session.selected_method == Some(PaymentMethod::Wallet)
                }
                CheckoutState::QrActive | CheckoutState::BankDetails => true,
                CheckoutState::CardForm => self.card_is_valid(),
                _ => false,
            }
    }

    /// Label of the self-reported confirm button for the active sub-flow.
    pub fn confirm_label(&self) -> Option<String> {
        let payable = self.payable();
        match self.session.state {
            CheckoutState::QrActive => Some(format!("I have paid ₹{payable}")),
            CheckoutState::BankDetails => Some(format!("I have transferred ₹{payable}")),
            CheckoutState::CardForm => Some(format!("Pay ₹{payable}")),
            _ => None,
        }
    }

    pub fn qr_snapshot(&self) -> Option<QrSnapshot> {
        match &self.flow {
            ActiveFlow::Qr(manager) => Some(manager.snapshot()),
            _ => None,
        }
    }

    /// Live countdown updates. The channel closes when the QR view is torn down.
    pub fn subscribe_qr(&self) -> Option<watch::Receiver<QrSnapshot>> {
        match &self.flow {
            ActiveFlow::Qr(manager) => Some(manager.subscribe()),
            _ => None,
        }
    }

    pub fn qr_timer_active(&self) -> bool {
        matches!(&self.flow, ActiveFlow::Qr(manager) if manager.is_active())
    }

    pub fn bank_transfer(&self) -> Option<&BankTransferView> {
        match &self.flow {
            ActiveFlow::BankTransfer(view) => Some(view),
            _ => None,
        }
    }

    pub fn checkout_options(&self) -> Option<&CheckoutOptions> {
        match &self.flow {
            ActiveFlow::Gateway(pending) => Some(&pending.options),
            _ => None,
        }
    }

    /// Edits the amount. Only allowed on the selection screen; an amount below
    /// one is kept as typed but disables paying.
    pub async fn set_amount(&mut self, amount: Decimal) -> Result<()> {
        if self.session.state != CheckoutState::MethodSelection {
            return Err(PaymentError::InvalidTransition {
                action: "set_amount",
                state: self.session.state.name(),
            });
        }
        self.amount_input = amount;
        self.session.amount = Amount::new(amount)?;
        self.refresh_quote().await;
        Ok(())
    }

    /// Activates exactly one sub-flow for `method`, tearing down the previous one.
    pub async fn select_method(&mut self, method: PaymentMethod) -> Result<()> {
        let state = self.session.state;
        if !(state == CheckoutState::MethodSelection || state.is_sub_flow()) {
            return Err(PaymentError::InvalidTransition {
                action: "select_method",
                state: state.name(),
            });
        }

        self.teardown_flow();
        self.session.selected_method = Some(method);
        info!(session = %self.session.id, %method, "payment method selected");
        self.refresh_quote().await;

        match method.sub_flow() {
            SubFlowKind::QrSession => {
                let manager = QrSessionManager::activate(
                    self.config.payee(),
                    self.session.campaign.title.clone(),
                    self.payable(),
                    self.config.qr_ttl_secs,
                );
                self.session.transition("select_method", CheckoutState::QrActive)?;
                self.flow = ActiveFlow::Qr(manager);
            }
            SubFlowKind::BankDetails => {
                self.session
                    .transition("select_method", CheckoutState::BankDetails)?;
                self.flow = ActiveFlow::BankTransfer(BankTransferView {
                    details: self.config.bank.clone(),
                    reference: transfer_reference(&self.session),
                });
            }
            SubFlowKind::CardForm => {
                self.session.transition("select_method", CheckoutState::CardForm)?;
                self.flow = ActiveFlow::Card(CardDetails::default());
            }
            SubFlowKind::GatewayCheckout => {
                // The widget opens on pay; until then the donor stays on the
                // selection screen.
                if self.session.state != CheckoutState::MethodSelection {
                    self.session
                        .transition("select_method", CheckoutState::MethodSelection)?;
                }
            }
        }
        Ok(())
    }

    /// Explicit "back": returns to method selection from any sub-flow.
    pub fn back(&mut self) -> Result<()> {
        self.session
            .transition("back", CheckoutState::MethodSelection)?;
        self.teardown_flow();
        Ok(())
    }

    pub fn update_card(&mut self, details: CardDetails) -> Result<()> {
        match &mut self.flow {
            ActiveFlow::Card(card) => {
                debug!(
                    session = %self.session.id,
                    last4 = ?details.last4(),
                    "card details updated"
                );
                *card = details;
                Ok(())
            }
            _ => Err(PaymentError::InvalidTransition {
                action: "update_card",
                state: self.session.state.name(),
            }),
        }
    }

    /// Copies a payment detail of the active view to the clipboard.
    pub fn copy(&mut self, target: CopyTarget) -> Result<()> {
        let text = match (&self.flow, target) {
            (ActiveFlow::Qr(_), CopyTarget::UpiId) => self.config.merchant_upi_id.clone(),
            (ActiveFlow::Qr(manager), CopyTarget::UpiUrl) => manager.deep_link(),
            (ActiveFlow::Qr(manager), CopyTarget::Reference) => {
                manager.snapshot().session.reference_id
            }
            (ActiveFlow::BankTransfer(view), CopyTarget::BankAccount) => {
                view.details.account_number.clone()
            }
            (ActiveFlow::BankTransfer(view), CopyTarget::Reference) => view.reference.clone(),
            _ => {
                return Err(PaymentError::InvalidTransition {
                    action: "copy",
                    state: self.session.state.name(),
                });
            }
        };
        self.copy.copy(target, &text)
    }

    pub fn is_copied(&self, target: CopyTarget) -> bool {
        self.copy.is_copied(target)
    }

    /// Gateway path: loads the widget script, creates an order and opens the
    /// widget. The returned token must accompany the completion or dismiss event.
    pub async fn pay(&mut self) -> Result<AttemptToken> {
        if self.session.state != CheckoutState::MethodSelection
            || self.session.selected_method != Some(PaymentMethod::Wallet)
        {
            return Err(PaymentError::InvalidTransition {
                action: "pay",
                state: self.session.state.name(),
            });
        }
        if !self.can_pay() {
            return Err(PaymentError::ActionDisabled(
                "amount below minimum or a request is in flight",
            ));
        }
        let method = PaymentMethod::Wallet;

        self.call_in_flight = true;
        let opened = self.open_gateway(method).await;
        self.call_in_flight = false;

        match opened {
            Ok(pending) => {
                let token = pending.token;
                self.session
                    .transition("pay", CheckoutState::GatewayCheckout)?;
                self.flow = ActiveFlow::Gateway(pending);
                self.last_error = None;
                Ok(token)
            }
            Err(e) => {
                let title = match e {
                    PaymentError::ScriptLoad => "Payment unavailable",
                    _ => "Could not start payment",
                };
                self.report_error(title, &e);
                Err(e)
            }
        }
    }

    async fn open_gateway(&mut self, method: PaymentMethod) -> Result<PendingCheckout> {
        let gateway = self.services.gateway.clone();
        if !gateway.load_gateway_script().await {
            return Err(PaymentError::ScriptLoad);
        }
        let order = gateway.create_order(&self.session, method).await?;
        let options = gateway.checkout_options(&order, &self.session, method);
        gateway.open_checkout(&options)?;

        self.next_attempt += 1;
        Ok(PendingCheckout {
            token: AttemptToken(self.next_attempt),
            order_id: order.order_id,
            options,
        })
    }

    /// Completion handler of the checkout widget.
    pub async fn on_gateway_response(
        &mut self,
        token: AttemptToken,
        response: CheckoutResponse,
    ) -> Result<CheckoutOutcome> {
        let order_id = match &self.flow {
            ActiveFlow::Gateway(pending)
                if pending.token == token && self.session.state == CheckoutState::GatewayCheckout =>
            {
                pending.order_id.clone()
            }
            _ => {
                debug!(?token, "discarding stale checkout response");
                return Ok(CheckoutOutcome::Stale);
            }
        };

        self.session
            .transition("verify", CheckoutState::Processing)?;
        self.call_in_flight = true;
        let gateway = self.services.gateway.clone();
        let result = gateway
            .complete(&self.session, PaymentMethod::Wallet, &order_id, response)
            .await;
        self.call_in_flight = false;

        match result {
            Ok(record) => {
                self.complete(&record)?;
                Ok(CheckoutOutcome::Completed(record))
            }
            Err(e) => {
                self.fail("Payment verification failed", &e)?;
                Err(e)
            }
        }
    }

    /// Dismiss handler of the checkout widget. Not an error: the donor may retry.
    pub fn on_gateway_dismiss(&mut self, token: AttemptToken) -> Result<CheckoutOutcome> {
        let current = matches!(
            &self.flow,
            ActiveFlow::Gateway(pending) if pending.token == token
        );
        if !current || self.session.state != CheckoutState::GatewayCheckout {
            debug!(?token, "discarding stale dismiss");
            return Ok(CheckoutOutcome::Stale);
        }
        info!(session = %self.session.id, "checkout dismissed by donor");
        self.session
            .transition("dismiss", CheckoutState::MethodSelection)?;
        self.flow = ActiveFlow::None;
        self.services.notifier.notify(Notification::info(
            "Payment cancelled",
            "You can try again or choose another method.",
        ));
        Ok(CheckoutOutcome::Dismissed)
    }

    /// Self-reported path for QR, bank transfer and card entry.
    pub async fn confirm_payment(&mut self) -> Result<ConfirmOutcome> {
        let state = self.session.state;
        if !matches!(
            state,
            CheckoutState::QrActive | CheckoutState::BankDetails | CheckoutState::CardForm
        ) {
            return Err(PaymentError::InvalidTransition {
                action: "confirm",
                state: state.name(),
            });
        }
        let card_check = match &self.flow {
            ActiveFlow::Card(card) => card.validate(Utc::now().date_naive()),
            _ => Ok(()),
        };
        if let Err(e) = card_check {
            self.report_error("Check your card details", &e);
            return Err(e);
        }
        if !self.can_pay() {
            return Err(PaymentError::ActionDisabled(
                "amount below minimum or a request is in flight",
            ));
        }
        let method = self
            .session
            .selected_method
            .ok_or(PaymentError::ActionDisabled("no payment method selected"))?;

        self.session
            .transition("confirm", CheckoutState::Processing)?;
        if let ActiveFlow::Qr(manager) = &mut self.flow {
            manager.deactivate();
        }

        let result = self.confirmation.confirm(&self.session, method).await;
        match result {
            Ok(ConfirmOutcome::Recorded(record)) => {
                self.complete(&record)?;
                Ok(ConfirmOutcome::Recorded(record))
            }
            Ok(ConfirmOutcome::AlreadyProcessing) => Ok(ConfirmOutcome::AlreadyProcessing),
            Err(e) => {
                self.fail("Could not record donation", &e)?;
                Err(e)
            }
        }
    }

    /// Waits out the success banner, then closes the surface.
    pub async fn await_auto_close(&mut self) {
        if self.session.state != CheckoutState::Completed {
            return;
        }
        tokio::time::sleep(self.config.auto_close_delay()).await;
        self.close();
    }

    /// Closes the payment surface and releases every timer the session owns.
    pub fn close(&mut self) {
        self.teardown_flow();
        if self.session.close() {
            info!(session = %self.session.id, "payment session closed");
        }
    }

    fn complete(&mut self, record: &DonationRecord) -> Result<()> {
        self.session
            .transition("complete", CheckoutState::Completed)?;
        self.teardown_flow();
        self.last_error = None;
        self.services.notifier.notify(Notification::success(
            "Thank you!",
            format!(
                "Your donation of ₹{} to {} was received. Transaction {}",
                record.amount, record.campaign_title, record.transaction_id
            ),
        ));
        Ok(())
    }

    fn fail(&mut self, title: &str, error: &PaymentError) -> Result<()> {
        self.session.transition("fail", CheckoutState::Failed)?;
        self.report_error(title, error);
        self.teardown_flow();
        self.session
            .transition("retry", CheckoutState::MethodSelection)
    }

    fn report_error(&mut self, title: &str, error: &PaymentError) {
        warn!(session = %self.session.id, error = %error, "{title}");
        self.last_error = Some(error.to_string());
        self.services
            .notifier
            .notify(Notification::error(title, error.to_string()));
    }

    fn teardown_flow(&mut self) {
        if let ActiveFlow::Qr(manager) = &mut self.flow {
            manager.deactivate();
        }
        self.flow = ActiveFlow::None;
        self.copy.reset();
    }

    /// The session quote, as long as it was priced for the current amount.
    fn current_quote(&self) -> Option<&FeeBreakdown> {
        let amount = Money::from(self.session.amount);
        self.session
            .quote
            .as_ref()
            .filter(|q| q.donation_amount == amount)
    }

    /// Fetches a new fee quote. Failures keep the previous quote while it still
    /// prices the current amount; otherwise the locally configured schedule
    /// stands in. An amount the schedule cannot price leaves no quote, which
    /// disables paying.
    async fn refresh_quote(&mut self) {
        let Some(method) = self.session.selected_method else {
            return;
        };
        if self.amount_input < Amount::MINIMUM {
            return;
        }
        let request = FeeQuoteRequest {
            amount: self.session.amount.value(),
            method,
        };

        self.quote_in_flight = true;
        let result = self.services.quotes.quote(request).await;
        self.quote_in_flight = false;

        match result {
            Ok(quote) => self.session.quote = Some(quote),
            Err(e) if self.current_quote().is_some() => {
                warn!(
                    session = %self.session.id,
                    error = %e,
                    "fee quote failed; keeping previous quote"
                );
            }
            Err(e) => {
                warn!(
                    session = %self.session.id,
                    error = %e,
                    "fee quote failed; using local schedule"
                );
                let fallback = self.fallback_fees.compute_for(self.session.amount, method);
                self.session.quote = match fallback {
                    Ok(quote) => Some(quote),
                    Err(e) => {
                        warn!(session = %self.session.id, error = %e, "amount cannot be priced");
                        None
                    }
                };
            }
        }
    }

    fn card_is_valid(&self) -> bool {
        match &self.flow {
            ActiveFlow::Card(card) => card.validate(Utc::now().date_naive()).is_ok(),
            _ => false,
        }
    }
}

impl Drop for PaymentOrchestrator {
    fn drop(&mut self) {
        self.teardown_flow();
    }
}

fn transfer_reference(session: &PaymentSession) -> String {
    let id = session.id.simple().to_string();
    format!("DON-{}", id[..8].to_ascii_uppercase())
}
