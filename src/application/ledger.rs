use crate::domain::donation::{DonationRecord, DonationStatus};
use crate::domain::money::Money;
use crate::domain::ports::LedgerStoreArc;
use crate::error::{PaymentError, Result};
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSummary {
    pub completed_count: usize,
    pub completed_total: Money,
}

/// Appends finalized donations to the donor's history.
///
/// Holds the set of sessions that already produced a record, so a session can
/// contribute at most one entry no matter which path completes it.
pub struct DonationLedgerRecorder {
    store: LedgerStoreArc,
    recorded_sessions: Mutex<HashSet<Uuid>>,
}

impl DonationLedgerRecorder {
    pub fn new(store: LedgerStoreArc) -> Self {
        Self {
            store,
            recorded_sessions: Mutex::new(HashSet::new()),
        }
    }

    pub async fn append(&self, session_id: Uuid, record: DonationRecord) -> Result<()> {
        // The lock is held across the store write so two completions of the
        // same session cannot both pass the check.
        let mut recorded = self.recorded_sessions.lock().await;
        if recorded.contains(&session_id) {
            return Err(PaymentError::DuplicateDonation(session_id));
        }

        info!(
            session = %session_id,
            transaction_id = %record.transaction_id,
            amount = %record.amount,
            method = %record.method,
            "donation recorded"
        );
        self.store.append(record).await?;
        recorded.insert(session_id);
        Ok(())
    }

    pub async fn has_recorded(&self, session_id: Uuid) -> bool {
        self.recorded_sessions.lock().await.contains(&session_id)
    }

    /// Records newest first.
    pub async fn history(&self) -> Result<Vec<DonationRecord>> {
        let mut records = self.store.all_records().await?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    pub async fn summary(&self) -> Result<LedgerSummary> {
        let records = self.store.all_records().await?;
        let completed = records
            .iter()
            .filter(|r| r.status == DonationStatus::Completed);
        let mut summary = LedgerSummary {
            completed_count: 0,
            completed_total: Money::ZERO,
        };
        for record in completed {
            summary.completed_count += 1;
            summary.completed_total = summary
                .completed_total
                .checked_add(record.amount)
                .ok_or(PaymentError::AmountOverflow(record.amount.value()))?;
        }
        Ok(summary)
    }
}
