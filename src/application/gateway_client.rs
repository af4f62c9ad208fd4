use super::ledger::DonationLedgerRecorder;
use crate::config::CheckoutConfig;
use crate::domain::donation::{ConfirmationKind, DonationRecord};
use crate::domain::gateway::{
    CheckoutOptions, CheckoutResponse, MethodToggles, OrderRequest, OrderResponse, Prefill, Theme,
    VerificationRequest,
};
use crate::domain::method::PaymentMethod;
use crate::domain::ports::{CheckoutWidgetArc, PaymentBackendArc};
use crate::domain::session::PaymentSession;
use crate::error::{PaymentError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// What the checkout widget is loaded from and opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub name: String,
    pub theme_color: String,
    /// Used when the order does not name one.
    pub currency: String,
    pub script_url: String,
}

impl CheckoutSettings {
    pub fn from_config(config: &CheckoutConfig) -> Self {
        Self {
            name: config.gateway_name.clone(),
            theme_color: config.theme_color.clone(),
            currency: config.currency.clone(),
            script_url: config.checkout_script_url.clone(),
        }
    }
}

/// Order/verify protocol against the payment backend, plus the hosted
/// checkout widget in between.
pub struct GatewayOrderClient {
    backend: PaymentBackendArc,
    widget: CheckoutWidgetArc,
    ledger: Arc<DonationLedgerRecorder>,
    settings: CheckoutSettings,
    script_loaded: AtomicBool,
}

impl GatewayOrderClient {
    pub fn new(
        backend: PaymentBackendArc,
        widget: CheckoutWidgetArc,
        ledger: Arc<DonationLedgerRecorder>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            backend,
            widget,
            ledger,
            settings,
            script_loaded: AtomicBool::new(false),
        }
    }

    /// Loads the checkout script once. A failed load is not remembered, so the
    /// next attempt tries again.
    pub async fn load_gateway_script(&self) -> bool {
        if self.script_loaded.load(Ordering::SeqCst) {
            return true;
        }
        let url = self.settings.script_url.as_str();
        let loaded = self.widget.load_script(url).await;
        if loaded {
            self.script_loaded.store(true, Ordering::SeqCst);
            debug!(url, "checkout script loaded");
        } else {
            warn!(url, "checkout script failed to load");
        }
        loaded
    }

    pub async fn create_order(
        &self,
        session: &PaymentSession,
        method: PaymentMethod,
    ) -> Result<OrderResponse> {
        let request = OrderRequest {
            campaign_id: session.campaign.id.clone(),
            amount: session.amount.value(),
            payment_method: method,
            donor_name: session.donor.display_name().to_string(),
            donor_email: session.donor.email.clone(),
        };
        match self.backend.create_order(&request).await {
            Ok(order) => {
                info!(order_id = %order.order_id, amount = order.amount, "order created");
                Ok(order)
            }
            Err(PaymentError::OrderCreation(reason)) => Err(PaymentError::OrderCreation(reason)),
            Err(e) => Err(PaymentError::OrderCreation(e.to_string())),
        }
    }

    pub fn checkout_options(
        &self,
        order: &OrderResponse,
        session: &PaymentSession,
        method: PaymentMethod,
    ) -> CheckoutOptions {
        CheckoutOptions {
            key: order.key.clone(),
            amount: order.amount,
            currency: if order.currency.is_empty() {
                self.settings.currency.clone()
            } else {
                order.currency.clone()
            },
            name: if order.name.is_empty() {
                self.settings.name.clone()
            } else {
                order.name.clone()
            },
            description: order.description.clone(),
            order_id: order.order_id.clone(),
            prefill: Prefill {
                name: session.donor.display_name().to_string(),
                email: session.donor.email.clone(),
            },
            theme: Theme {
                color: self.settings.theme_color.clone(),
            },
            method: MethodToggles::for_method(method),
        }
    }

    pub fn open_checkout(&self, options: &CheckoutOptions) -> Result<()> {
        info!(order_id = %options.order_id, "opening checkout");
        self.widget.open(options)
    }

    /// Completion handler: verifies the payment and, only when the backend
    /// confirms it, writes the donation record.
    pub async fn complete(
        &self,
        session: &PaymentSession,
        method: PaymentMethod,
        expected_order_id: &str,
        response: CheckoutResponse,
    ) -> Result<DonationRecord> {
        let rejected = || PaymentError::PaymentVerification {
            order_id: response.order_id.clone(),
        };
        if response.order_id != expected_order_id {
            warn!(
                expected = expected_order_id,
                received = %response.order_id,
                "checkout response for a different order"
            );
            return Err(rejected());
        }

        let request = VerificationRequest {
            order_id: response.order_id.clone(),
            payment_id: response.payment_id.clone(),
            signature: response.signature.clone(),
            campaign_id: session.campaign.id.clone(),
            amount: session.amount.value(),
        };
        let verified = match self.backend.verify_payment(&request).await {
            Ok(result) => result.success,
            Err(e) => {
                warn!(order_id = %request.order_id, error = %e, "verification call failed");
                false
            }
        };
        if !verified {
            warn!(order_id = %request.order_id, "payment not verified");
            return Err(rejected());
        }

        let record = DonationRecord::completed(
            session,
            method,
            response.payment_id.clone(),
            ConfirmationKind::GatewayVerified,
        );
        self.ledger.append(session.id, record.clone()).await?;
        Ok(record)
    }
}
