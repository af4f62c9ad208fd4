//! Wire types exchanged with the payment backend and the hosted checkout widget.

use super::method::PaymentMethod;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuoteRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub campaign_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub donor_name: String,
    pub donor_email: String,
}

/// A created order; `amount` is in minor units (paise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub key: String,
    pub amount: i64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub campaign_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub success: bool,
}

/// What the widget hands to the completion handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    #[serde(alias = "razorpay_order_id")]
    pub order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodToggles {
    pub upi: bool,
    pub card: bool,
    pub netbanking: bool,
    pub wallet: bool,
}

impl MethodToggles {
    /// Enables only the chosen method; the wallet/default path enables all of them.
    pub fn for_method(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Upi => Self {
                upi: true,
                card: false,
                netbanking: false,
                wallet: false,
            },
            PaymentMethod::Card => Self {
                upi: false,
                card: true,
                netbanking: false,
                wallet: false,
            },
            PaymentMethod::NetBanking => Self {
                upi: false,
                card: false,
                netbanking: true,
                wallet: false,
            },
            PaymentMethod::Wallet => Self {
                upi: true,
                card: true,
                netbanking: true,
                wallet: true,
            },
        }
    }
}

/// Options the checkout widget is constructed with.
///
/// The `handler` and `modal.ondismiss` callbacks are not part of the payload;
/// they arrive back as orchestrator events tagged with the attempt token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutOptions {
    pub key: String,
    pub amount: i64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub order_id: String,
    pub prefill: Prefill,
    pub theme: Theme,
    pub method: MethodToggles,
}
