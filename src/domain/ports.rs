use super::donation::DonationRecord;
use super::fees::FeeBreakdown;
use super::gateway::{
    CheckoutOptions, FeeQuoteRequest, OrderRequest, OrderResponse, VerificationRequest,
    VerificationResult,
};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Fee preview, either computed locally or fetched from the backend.
#[async_trait]
pub trait FeeQuoteService: Send + Sync {
    async fn quote(&self, request: FeeQuoteRequest) -> Result<FeeBreakdown>;
}

#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderResponse>;
    async fn verify_payment(&self, request: &VerificationRequest) -> Result<VerificationResult>;
}

/// The externally hosted checkout widget.
#[async_trait]
pub trait CheckoutWidget: Send + Sync {
    /// Injects the checkout script from `url`. Resolves to whether it loaded.
    async fn load_script(&self, url: &str) -> bool;
    /// Opens the widget. Completion and dismissal come back as separate events.
    fn open(&self, options: &CheckoutOptions) -> Result<()>;
}

/// Donor-local donation history. Append-only.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append(&self, record: DonationRecord) -> Result<()>;
    async fn all_records(&self) -> Result<Vec<DonationRecord>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title, message)
    }

    fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// User-visible toast notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
}

pub type FeeQuoteServiceArc = Arc<dyn FeeQuoteService>;
pub type PaymentBackendArc = Arc<dyn PaymentBackend>;
pub type CheckoutWidgetArc = Arc<dyn CheckoutWidget>;
pub type LedgerStoreArc = Arc<dyn LedgerStore>;
pub type NotifierArc = Arc<dyn Notifier>;
pub type ClipboardArc = Arc<dyn Clipboard>;
