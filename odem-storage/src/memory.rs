//! In-memory storage adapter.

use crate::adapter::{is_below, validate_key, StorageAdapter};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use odem_types::Record;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::trace;

/// Keeps records in a sorted map for the lifetime of the adapter.
#[derive(Debug)]
pub struct MemoryAdapter {
    records: RwLock<BTreeMap<String, Record>>,
    binary: bool,
}

impl MemoryAdapter {
    /// Creates an empty adapter storing binary values natively.
    pub fn new() -> Self {
        Self::with_binary(true)
    }

    /// Creates an empty adapter that reports no binary support, forcing
    /// type handlers to use textual representations.
    pub fn text_only() -> Self {
        Self::with_binary(false)
    }

    fn with_binary(binary: bool) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            binary,
        }
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no record is stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn supports_binary(&self) -> bool {
        self.binary
    }

    async fn has(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.records.read().await.contains_key(key))
    }

    async fn read(&self, key: &str) -> StorageResult<Record> {
        validate_key(key)?;
        self.records
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn write(&self, key: &str, record: &Record) -> StorageResult<()> {
        validate_key(key)?;
        trace!(key, "memory write");
        self.records
            .write()
            .await
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn purge(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        trace!(key, "memory purge");
        self.records
            .write()
            .await
            .retain(|stored, _| !is_below(stored, key));
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        if !prefix.is_empty() {
            validate_key(prefix)?;
        }
        Ok(self
            .records
            .read()
            .await
            .keys()
            .filter(|key| prefix.is_empty() || is_below(key, prefix))
            .cloned()
            .collect())
    }
}
