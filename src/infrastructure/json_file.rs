use crate::domain::donation::DonationRecord;
use crate::domain::ports::LedgerStore;
use crate::error::Result;
use async_trait::async_trait;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Donation history kept in a JSON array on disk, the donor-local counterpart
/// of the in-memory store.
///
/// Each append rewrites the file through a temporary file in the same
/// directory, so readers never observe a half-written history.
pub struct JsonFileLedgerStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileLedgerStore {
    /// Opens the ledger at `path`. The file is created on first append.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> Result<Vec<DonationRecord>> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_records(&self, records: &[DonationRecord]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, records)?;
        tmp.write_all(b"\n")?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for JsonFileLedgerStore {
    async fn append(&self, record: DonationRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_records()?;
        records.push(record);
        self.write_records(&records)
    }

    async fn all_records(&self) -> Result<Vec<DonationRecord>> {
        self.read_records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::donation::ConfirmationKind;
    use crate::domain::method::PaymentMethod;
    use crate::domain::money::Amount;
    use crate::domain::session::{Campaign, Donor, PaymentSession};
    use crate::error::PaymentError;
    use rust_decimal_macros::dec;

    fn record(tx: &str) -> DonationRecord {
        let session = PaymentSession::new(
            Amount::new(dec!(750)).unwrap(),
            Campaign::new("c-3", "Flood Relief"),
            Donor::new("Meera", "meera@example.org"),
        );
        DonationRecord::completed(
            &session,
            PaymentMethod::NetBanking,
            tx.to_string(),
            ConfirmationKind::SelfReported,
        )
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileLedgerStore::open(dir.path().join("ledger.json"));
        assert!(store.all_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");

        let store = JsonFileLedgerStore::open(&path);
        store.append(record("TXN1")).await.unwrap();
        store.append(record("TXN2")).await.unwrap();
        drop(store);

        let reopened = JsonFileLedgerStore::open(&path);
        let records = reopened.all_records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].transaction_id, "TXN2");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileLedgerStore::open(&path);
        assert!(matches!(
            store.all_records().await,
            Err(PaymentError::Serialization(_))
        ));
        assert!(store.append(record("TXN1")).await.is_err());
    }
}
