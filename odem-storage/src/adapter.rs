//! Storage adapter abstraction trait.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use odem_types::Record;
use std::fmt;

/// Abstract key/value store for serialized records.
#[async_trait]
pub trait StorageAdapter: Send + Sync + fmt::Debug {
    /// Returns a short name of the adapter implementation.
    fn name(&self) -> &'static str;

    /// Returns whether raw binary values can be stored as-is.
    ///
    /// Type handlers with a binary-native representation (e.g. UUIDs) consult
    /// this to pick between bytes and a textual form.
    fn supports_binary(&self) -> bool;

    /// Checks whether a record exists under the key.
    async fn has(&self, key: &str) -> StorageResult<bool>;

    /// Reads the record stored under the key.
    ///
    /// Fails with [`StorageError::NotFound`] when there is no such record.
    async fn read(&self, key: &str) -> StorageResult<Record>;

    /// Writes a record, replacing any record stored under the same key.
    async fn write(&self, key: &str, record: &Record) -> StorageResult<()>;

    /// Removes the record under the key and every record below it.
    async fn purge(&self, key: &str) -> StorageResult<()>;

    /// Lists keys of all records below the given prefix, sorted.
    async fn keys(&self, prefix: &str) -> StorageResult<Vec<String>>;
}

/// Checks that a key consists of non-empty, non-relative segments.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..");

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Tests whether `key` equals `prefix` or lives below it.
pub(crate) fn is_below(key: &str, prefix: &str) -> bool {
    key == prefix
        || (key.starts_with(prefix) && key.as_bytes().get(prefix.len()) == Some(&b'/'))
}
