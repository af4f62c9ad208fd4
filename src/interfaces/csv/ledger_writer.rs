use crate::domain::donation::{ConfirmationKind, DonationRecord, DonationStatus};
use crate::domain::method::PaymentMethod;
use crate::domain::money::Money;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct LedgerRow<'a> {
    timestamp: String,
    transaction_id: &'a str,
    campaign_id: &'a str,
    campaign_title: &'a str,
    donor: &'a str,
    amount: Money,
    method: PaymentMethod,
    status: DonationStatus,
    confirmation: ConfirmationKind,
    blockchain_hash: Option<&'a str>,
}

/// Writes donation history as CSV, one row per record.
pub struct LedgerWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> LedgerWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_records<'a, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a DonationRecord>,
    {
        for record in records {
            self.writer.serialize(LedgerRow {
                timestamp: record.timestamp.to_rfc3339(),
                transaction_id: &record.transaction_id,
                campaign_id: &record.campaign_id,
                campaign_title: &record.campaign_title,
                donor: &record.donor_name,
                amount: record.amount,
                method: record.method,
                status: record.status,
                confirmation: record.confirmation,
                blockchain_hash: record.blockchain_hash.as_deref(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
