use super::ledger::DonationLedgerRecorder;
use crate::domain::donation::{ConfirmationKind, DonationRecord, synthesize_transaction_id};
use crate::domain::method::PaymentMethod;
use crate::domain::session::PaymentSession;
use crate::error::{PaymentError, Result};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmOutcome {
    Recorded(DonationRecord),
    /// A confirmation for this flow is already under way; nothing was done.
    AlreadyProcessing,
}

/// Completion path for UPI-QR, bank transfer and card entry, where no gateway
/// callback exists. The donor's assertion is taken at face value: after a
/// fixed processing delay a completed record is written without any
/// server-side check.
pub struct SelfReportedConfirmationFlow {
    ledger: Arc<DonationLedgerRecorder>,
    latency: Duration,
    processing: AtomicBool,
}

/// Clears the processing flag unless the confirmation went through, so a
/// cancelled or failed attempt can be retried.
struct ProcessingGuard<'a> {
    flag: &'a AtomicBool,
    done: bool,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.flag.store(false, Ordering::SeqCst);
        }
    }
}

impl SelfReportedConfirmationFlow {
    pub fn new(ledger: Arc<DonationLedgerRecorder>, latency: Duration) -> Self {
        Self {
            ledger,
            latency,
            processing: AtomicBool::new(false),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    pub async fn confirm(
        &self,
        session: &PaymentSession,
        method: PaymentMethod,
    ) -> Result<ConfirmOutcome> {
        if self.processing.swap(true, Ordering::SeqCst) {
            warn!(session = %session.id, "confirmation already in progress");
            return Ok(ConfirmOutcome::AlreadyProcessing);
        }
        let mut guard = ProcessingGuard {
            flag: &self.processing,
            done: false,
        };
        if self.ledger.has_recorded(session.id).await {
            return Err(PaymentError::DuplicateDonation(session.id));
        }

        info!(session = %session.id, %method, "donor asserted payment");
        tokio::time::sleep(self.latency).await;

        let record = DonationRecord::completed(
            session,
            method,
            synthesize_transaction_id(Utc::now()),
            ConfirmationKind::SelfReported,
        );
        self.ledger.append(session.id, record.clone()).await?;
        guard.done = true;
        Ok(ConfirmOutcome::Recorded(record))
    }
}
