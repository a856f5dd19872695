//! File-system storage adapter.
//!
//! Each key maps onto a JSON file below the adapter's root folder, e.g. key
//! `models/user/items/<uuid>` is stored in `<root>/models/user/items/<uuid>.json`.
//! Records are written to a temporary sibling first and renamed into place.

use crate::adapter::{is_below, validate_key, StorageAdapter};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use odem_types::Record;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

const EXTENSION: &str = "json";

/// Stores records as JSON documents in a folder.
#[derive(Debug, Clone)]
pub struct FileAdapter {
    root: PathBuf,
}

impl FileAdapter {
    /// Creates an adapter rooted at the given folder. The folder is created
    /// lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root folder.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder_for(&self, key: &str) -> PathBuf {
        key.split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    fn file_for(&self, key: &str) -> PathBuf {
        let mut path = self.folder_for(key);
        let last = key.rsplit('/').next().unwrap_or(key);
        path.set_file_name(format!("{last}.{EXTENSION}"));
        path
    }
}

#[async_trait]
impl StorageAdapter for FileAdapter {
    fn name(&self) -> &'static str {
        "file"
    }

    fn supports_binary(&self) -> bool {
        false
    }

    async fn has(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(tokio::fs::try_exists(self.file_for(key)).await?)
    }

    async fn read(&self, key: &str) -> StorageResult<Record> {
        validate_key(key)?;
        let content = match tokio::fs::read(self.file_for(key)).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&content)?)
    }

    async fn write(&self, key: &str, record: &Record) -> StorageResult<()> {
        validate_key(key)?;
        let path = self.file_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = path.with_extension("json.tmp");
        tokio::fs::write(&temp, serde_json::to_vec(record)?).await?;
        tokio::fs::rename(&temp, &path).await?;
        trace!(key, path = %path.display(), "file write");
        Ok(())
    }

    async fn purge(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        match tokio::fs::remove_file(self.file_for(key)).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        match tokio::fs::remove_dir_all(self.folder_for(key)).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        debug!(key, "file purge");
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        if !prefix.is_empty() {
            validate_key(prefix)?;
        }

        let mut keys = Vec::new();
        let mut pending = vec![(self.root.clone(), String::new())];
        while let Some((folder, base)) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&folder).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                let key = if base.is_empty() {
                    name.clone()
                } else {
                    format!("{base}/{name}")
                };

                if entry.file_type().await?.is_dir() {
                    pending.push((entry.path(), key));
                } else if let Some(stem) = key.strip_suffix(".json") {
                    if prefix.is_empty() || is_below(stem, prefix) {
                        keys.push(stem.to_string());
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
