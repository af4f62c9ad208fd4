//! Deterministic stand-ins for the payment backend and the hosted checkout
//! widget. The CLI uses them when no API is configured, and tests use them to
//! script failures.

use crate::domain::fees::FeeCalculator;
use crate::domain::gateway::{
    CheckoutOptions, CheckoutResponse, OrderRequest, OrderResponse, VerificationRequest,
    VerificationResult,
};
use crate::domain::ports::{CheckoutWidget, PaymentBackend};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

/// Signature the sandbox expects for a given order/payment pair.
pub fn sandbox_signature(order_id: &str, payment_id: &str) -> String {
    format!("sandbox_sig:{order_id}|{payment_id}")
}

pub struct SandboxBackend {
    calculator: FeeCalculator,
    currency: String,
    fail_orders: AtomicBool,
    reject_verification: AtomicBool,
    verify_calls: AtomicUsize,
}

impl Default for SandboxBackend {
    fn default() -> Self {
        Self::new(FeeCalculator::default(), "INR")
    }
}

impl SandboxBackend {
    pub fn new(calculator: FeeCalculator, currency: impl Into<String>) -> Self {
        Self {
            calculator,
            currency: currency.into(),
            fail_orders: AtomicBool::new(false),
            reject_verification: AtomicBool::new(false),
            verify_calls: AtomicUsize::new(0),
        }
    }

    /// Makes `create_order` fail as if the network were down.
    pub fn fail_orders(&self, fail: bool) {
        self.fail_orders.store(fail, Ordering::SeqCst);
    }

    pub fn reject_verification(&self, reject: bool) {
        self.reject_verification.store(reject, Ordering::SeqCst);
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentBackend for SandboxBackend {
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderResponse> {
        if self.fail_orders.load(Ordering::SeqCst) {
            return Err(PaymentError::OrderCreation(
                "sandbox: network unreachable".to_string(),
            ));
        }
        let breakdown = self
            .calculator
            .compute(request.amount, request.payment_method)?;
        Ok(OrderResponse {
            key: "sandbox_key".to_string(),
            amount: breakdown.total_payable.to_minor_units()?,
            currency: self.currency.clone(),
            name: String::new(),
            description: format!("Donation to {}", request.campaign_id),
            order_id: format!("order_{}", Uuid::new_v4().simple()),
        })
    }

    async fn verify_payment(&self, request: &VerificationRequest) -> Result<VerificationResult> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let signature_ok =
            request.signature == sandbox_signature(&request.order_id, &request.payment_id);
        Ok(VerificationResult {
            success: signature_ok && !self.reject_verification.load(Ordering::SeqCst),
        })
    }
}

/// Checkout widget that records what it was opened with. Payments are made
/// explicitly through [`SandboxWidget::pay`].
#[derive(Default)]
pub struct SandboxWidget {
    fail_script_loads: AtomicBool,
    script_urls: Mutex<Vec<String>>,
    opened: Mutex<Vec<CheckoutOptions>>,
}

impl SandboxWidget {
    pub fn fail_script_loads(&self, fail: bool) {
        self.fail_script_loads.store(fail, Ordering::SeqCst);
    }

    /// Every URL a script load was attempted from, in order.
    pub fn script_urls(&self) -> Vec<String> {
        self.script_urls.lock().map(|u| u.clone()).unwrap_or_default()
    }

    pub fn opened(&self) -> Vec<CheckoutOptions> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// The response the completion handler would receive for a successful payment.
    pub fn pay(&self, order_id: &str) -> CheckoutResponse {
        let payment_id = format!("pay_{}", Uuid::new_v4().simple());
        CheckoutResponse {
            order_id: order_id.to_string(),
            signature: sandbox_signature(order_id, &payment_id),
            payment_id,
        }
    }
}

#[async_trait]
impl CheckoutWidget for SandboxWidget {
    async fn load_script(&self, url: &str) -> bool {
        if let Ok(mut urls) = self.script_urls.lock() {
            urls.push(url.to_string());
        }
        !self.fail_script_loads.load(Ordering::SeqCst)
    }

    fn open(&self, options: &CheckoutOptions) -> Result<()> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(options.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_tampered_signature_is_not_verified() {
        let backend = SandboxBackend::default();
        let widget = SandboxWidget::default();
        let mut response = widget.pay("order_1");
        response.signature.push('x');

        let result = backend
            .verify_payment(&VerificationRequest {
                order_id: response.order_id,
                payment_id: response.payment_id,
                signature: response.signature,
                campaign_id: "c-1".into(),
                amount: dec!(100),
            })
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(backend.verify_calls(), 1);
    }

    #[tokio::test]
    async fn test_order_uses_configured_currency() {
        let backend = SandboxBackend::new(FeeCalculator::default(), "USD");
        let order = backend
            .create_order(&OrderRequest {
                campaign_id: "c-1".into(),
                amount: dec!(1000),
                payment_method: crate::domain::method::PaymentMethod::Card,
                donor_name: "Asha".into(),
                donor_email: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(order.currency, "USD");
        assert_eq!(order.amount, 105192);
    }
}
