#![allow(dead_code)]

use async_trait::async_trait;
use donapay::application::gateway_client::{CheckoutSettings, GatewayOrderClient};
use donapay::application::ledger::DonationLedgerRecorder;
use donapay::application::orchestrator::{CheckoutServices, PaymentOrchestrator};
use donapay::config::CheckoutConfig;
use donapay::domain::card::CardDetails;
use donapay::domain::fees::{FeeBreakdown, FeeCalculator};
use donapay::domain::gateway::FeeQuoteRequest;
use donapay::domain::ports::{FeeQuoteService, FeeQuoteServiceArc, LedgerStore};
use donapay::domain::session::{Campaign, Donor};
use donapay::error::{PaymentError, Result};
use donapay::infrastructure::in_memory::{InMemoryClipboard, InMemoryLedgerStore, RecordingNotifier};
use donapay::infrastructure::local_quotes::LocalFeeQuotes;
use donapay::infrastructure::sandbox::{SandboxBackend, SandboxWidget};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Quote service whose backend is always down.
pub struct UnreachableQuotes;

#[async_trait]
impl FeeQuoteService for UnreachableQuotes {
    async fn quote(&self, _request: FeeQuoteRequest) -> Result<FeeBreakdown> {
        Err(PaymentError::FeeQuote("connection refused".into()))
    }
}

/// Local quotes until the service is taken down.
#[derive(Default)]
pub struct FlakyQuotes {
    down: AtomicBool,
    inner: LocalFeeQuotes,
}

impl FlakyQuotes {
    pub fn go_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FeeQuoteService for FlakyQuotes {
    async fn quote(&self, request: FeeQuoteRequest) -> Result<FeeBreakdown> {
        if self.down.load(Ordering::SeqCst) {
            return Err(PaymentError::FeeQuote("connection refused".into()));
        }
        self.inner.quote(request).await
    }
}

pub struct Harness {
    pub store: InMemoryLedgerStore,
    pub backend: Arc<SandboxBackend>,
    pub widget: Arc<SandboxWidget>,
    pub notifier: RecordingNotifier,
    pub clipboard: InMemoryClipboard,
    pub services: CheckoutServices,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_quotes(Arc::new(LocalFeeQuotes::new(FeeCalculator::default())))
    }

    pub fn with_quotes(quotes: FeeQuoteServiceArc) -> Self {
        let store = InMemoryLedgerStore::new();
        let backend = Arc::new(SandboxBackend::default());
        let widget = Arc::new(SandboxWidget::default());
        let notifier = RecordingNotifier::new();
        let clipboard = InMemoryClipboard::new();
        let ledger = Arc::new(DonationLedgerRecorder::new(Arc::new(store.clone())));
        let gateway = Arc::new(GatewayOrderClient::new(
            backend.clone(),
            widget.clone(),
            ledger.clone(),
            CheckoutSettings::from_config(&CheckoutConfig::default()),
        ));
        let services = CheckoutServices {
            quotes,
            gateway,
            ledger,
            notifier: Arc::new(notifier.clone()),
            clipboard: Arc::new(clipboard.clone()),
        };
        Self {
            store,
            backend,
            widget,
            notifier,
            clipboard,
            services,
        }
    }

    pub fn open(&self, amount: Decimal) -> PaymentOrchestrator {
        PaymentOrchestrator::open(
            CheckoutConfig::default(),
            self.services.clone(),
            amount,
            Campaign::new("c-water", "Clean Water"),
            Donor::new("Asha", "asha@example.org"),
        )
        .unwrap()
    }

    pub async fn records(&self) -> usize {
        self.store.all_records().await.unwrap().len()
    }
}

pub fn valid_card() -> CardDetails {
    CardDetails {
        holder_name: "Asha Rao".into(),
        number: "4111 1111 1111 1111".into(),
        expiry: "12/99".into(),
        cvv: "123".into(),
    }
}
