///! Snapshot persistence - record log plus raw payload archive
///!
///! `FileStore` is the production store: a JSON array of records and one
///! JSON file per raw payload under the data directory. `MemoryStore`
///! backs orchestrator tests, including simulated storage outages.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::fs;

use super::types::{Record, Source};
use crate::error::StorageError;

/// Durable storage contract for completed cycles.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Append one summary record to the record log.
    async fn append_record(&self, record: &Record) -> Result<(), StorageError>;

    /// Archive one raw source payload, keyed by source and fetch time.
    async fn append_payload(
        &self,
        source: Source,
        payload: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// All records persisted so far, in append order.
    async fn load_all_records(&self) -> Result<Vec<Record>, StorageError>;
}

/// JSON-file-backed store.
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    fn records_path(&self) -> PathBuf {
        self.data_dir.join("records.json")
    }

    fn payloads_dir(&self) -> PathBuf {
        self.data_dir.join("payloads")
    }
}

#[async_trait]
impl SnapshotStore for FileStore {
    async fn append_record(&self, record: &Record) -> Result<(), StorageError> {
        let mut records = self.load_all_records().await?;
        records.push(record.clone());

        let json = serde_json::to_string_pretty(&records)?;
        fs::create_dir_all(&self.data_dir).await?;
        fs::write(self.records_path(), json).await?;

        tracing::debug!("Appended record {} ({} total)", record.id, records.len());
        Ok(())
    }

    async fn append_payload(
        &self,
        source: Source,
        payload: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let dir = self.payloads_dir();
        fs::create_dir_all(&dir).await?;

        let filename = format!("{}_{}.json", source, fetched_at.format("%Y%m%dT%H%M%S%3f"));
        let json = serde_json::to_string_pretty(payload)?;
        fs::write(dir.join(&filename), json).await?;

        tracing::debug!("Archived {} payload as {}", source, filename);
        Ok(())
    }

    async fn load_all_records(&self) -> Result<Vec<Record>, StorageError> {
        let path = self.records_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// In-memory store for tests. The `fail` switch simulates an unreachable
/// backing store.
pub struct MemoryStore {
    records: Mutex<Vec<Record>>,
    payloads: Mutex<Vec<(Source, Value, DateTime<Utc>)>>,
    fail: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            payloads: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn payloads(&self) -> Vec<(Source, Value, DateTime<Utc>)> {
        self.payloads.lock().unwrap().clone()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(std::io::Error::other(
                "simulated storage outage",
            )));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn append_record(&self, record: &Record) -> Result<(), StorageError> {
        self.check_available()?;
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn append_payload(
        &self,
        source: Source,
        payload: &Value,
        fetched_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.check_available()?;
        self.payloads
            .lock()
            .unwrap()
            .push((source, payload.clone(), fetched_at));
        Ok(())
    }

    async fn load_all_records(&self) -> Result<Vec<Record>, StorageError> {
        self.check_available()?;
        Ok(self.records())
    }
}
