//! In-memory record store for testing and dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use visiscreen_core::record::ScreeningRecord;
use visiscreen_core::traits::{RecordQuery, RecordStore, StoredRecord};

use crate::error::StoreError;

/// A record store that keeps everything in a map. Nothing survives the process.
pub struct MemoryStore {
    records: Mutex<HashMap<String, StoredRecord>>,
    /// Ids handed out so far.
    next_id: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            next_id: AtomicU32::new(0),
        }
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredRecord>> {
        // a poisoned map is still consistent: every write is a single insert/remove
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, record: &ScreeningRecord) -> Result<String> {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("mem-{n}");
        self.lock()
            .insert(id.clone(), StoredRecord::new(id.clone(), record.clone()));
        Ok(id)
    }

    async fn update(&self, id: &str, record: &ScreeningRecord) -> Result<()> {
        let mut records = self.lock();
        let stored = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        stored.record = record.clone();
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<StoredRecord> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()).into())
    }

    async fn list(&self, query: &RecordQuery) -> Result<Vec<StoredRecord>> {
        let records: Vec<StoredRecord> = self.lock().values().cloned().collect();
        Ok(query.apply(records))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()).into())
    }
}
