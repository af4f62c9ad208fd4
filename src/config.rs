use crate::domain::fees::FeeSchedule;
use crate::domain::upi::UpiPayee;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const ENV_API_URL: &str = "DONAPAY_API_URL";
pub const ENV_MERCHANT_UPI_ID: &str = "DONAPAY_MERCHANT_UPI_ID";
pub const ENV_MERCHANT_NAME: &str = "DONAPAY_MERCHANT_NAME";
pub const ENV_THEME_COLOR: &str = "DONAPAY_THEME_COLOR";

/// Account the donor transfers to on the net-banking path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BankTransferDetails {
    pub account_name: String,
    pub account_number: String,
    pub ifsc: String,
    pub bank_name: String,
}

impl Default for BankTransferDetails {
    fn default() -> Self {
        Self {
            account_name: "Helping Hands Foundation".to_string(),
            account_number: "50100234567890".to_string(),
            ifsc: "HDFC0001234".to_string(),
            bank_name: "HDFC Bank".to_string(),
        }
    }
}

/// Checkout settings. Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CheckoutConfig {
    pub currency: String,
    pub merchant_upi_id: String,
    pub merchant_name: String,
    /// Title shown at the top of the checkout widget.
    pub gateway_name: String,
    pub theme_color: String,
    pub checkout_script_url: String,
    pub api_base_url: Option<String>,
    pub http_timeout_secs: u64,
    pub fees: FeeSchedule,
    pub bank: BankTransferDetails,
    pub qr_ttl_secs: u32,
    pub confirmation_latency_ms: u64,
    pub auto_close_ms: u64,
    pub copy_ack_ms: u64,
    pub preset_amounts: Vec<Decimal>,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
            merchant_upi_id: "helpinghands@okhdfcbank".to_string(),
            merchant_name: "Helping Hands Foundation".to_string(),
            gateway_name: "Helping Hands".to_string(),
            theme_color: "#10B981".to_string(),
            checkout_script_url: "https://checkout.razorpay.com/v1/checkout.js".to_string(),
            api_base_url: None,
            http_timeout_secs: 15,
            fees: FeeSchedule::default(),
            bank: BankTransferDetails::default(),
            qr_ttl_secs: 300,
            confirmation_latency_ms: 2_000,
            auto_close_ms: 3_000,
            copy_ack_ms: 2_000,
            preset_amounts: vec![dec!(500), dec!(1000), dec!(2500), dec!(5000)],
        }
    }
}

impl CheckoutConfig {
    /// Loads a JSON config file; missing fields fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_API_URL) {
            self.api_base_url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(upi_id) = non_empty(ENV_MERCHANT_UPI_ID) {
            self.merchant_upi_id = upi_id;
        }
        if let Some(name) = non_empty(ENV_MERCHANT_NAME) {
            self.merchant_name = name;
        }
        if let Some(color) = non_empty(ENV_THEME_COLOR) {
            self.theme_color = color;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.merchant_upi_id.contains('@') {
            return Err(PaymentError::Config(format!(
                "merchant_upi_id `{}` is not a UPI address",
                self.merchant_upi_id
            )));
        }
        if self.qr_ttl_secs == 0 {
            return Err(PaymentError::Config("qr_ttl_secs must be positive".into()));
        }
        if self.preset_amounts.iter().any(|a| *a < Decimal::ONE) {
            return Err(PaymentError::Config(
                "preset amounts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn payee(&self) -> UpiPayee {
        UpiPayee {
            upi_id: self.merchant_upi_id.clone(),
            name: self.merchant_name.clone(),
            currency: self.currency.clone(),
        }
    }

    pub fn confirmation_latency(&self) -> Duration {
        Duration::from_millis(self.confirmation_latency_ms)
    }

    pub fn auto_close_delay(&self) -> Duration {
        Duration::from_millis(self.auto_close_ms)
    }

    pub fn copy_ack(&self) -> Duration {
        Duration::from_millis(self.copy_ack_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
