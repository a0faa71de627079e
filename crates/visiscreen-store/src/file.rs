//! Directory-backed record store: one JSON document per record.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use uuid::Uuid;

use visiscreen_core::record::ScreeningRecord;
use visiscreen_core::traits::{RecordQuery, RecordStore, StoredRecord};

use crate::error::StoreError;

/// Stores records as `<root>/<collection>/<id>.json`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(root: &Path, collection: &str) -> Self {
        Self {
            dir: root.join(collection),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            anyhow::bail!("invalid record id: {id:?}");
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    async fn write(&self, stored: &StoredRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create store directory {}", self.dir.display()))?;
        let path = self.path_for(&stored.id)?;
        let json = serde_json::to_string_pretty(stored).context("failed to serialize record")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("failed to write record to {}", path.display()))?;
        Ok(())
    }

    async fn read(&self, path: &Path) -> Result<StoredRecord> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read record from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse record JSON: {}", path.display()))
    }
}

#[async_trait]
impl RecordStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn save(&self, record: &ScreeningRecord) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.write(&StoredRecord::new(id.clone(), record.clone()))
            .await?;
        tracing::info!(id = %id, dir = %self.dir.display(), "saved record");
        Ok(id)
    }

    async fn update(&self, id: &str, record: &ScreeningRecord) -> Result<()> {
        let existing = self.get(id).await?;
        let stored = StoredRecord {
            id: existing.id,
            created_at: existing.created_at,
            record: record.clone(),
        };
        self.write(&stored).await?;
        tracing::info!(id = %id, "updated record");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<StoredRecord> {
        let path = self.path_for(id)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StoreError::NotFound(id.to_string()).into());
        }
        self.read(&path).await
    }

    async fn list(&self, query: &RecordQuery) -> Result<Vec<StoredRecord>> {
        if !tokio::fs::try_exists(&self.dir).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("failed to read directory: {}", self.dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            match self.read(&path).await {
                Ok(stored) => records.push(stored),
                Err(e) => tracing::warn!("skipping {}: {:#}", path.display(), e),
            }
        }

        Ok(query.apply(records))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(id = %id, "deleted record");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.to_string()).into())
            }
            Err(e) => Err(e).with_context(|| format!("failed to delete {}", path.display())),
        }
    }
}
