//! Registry configuration.

use crate::error::{ModelError, ModelResult};
use crate::schema::OnUnsaved;
use odem_storage::{FileAdapter, MemoryAdapter, StorageAdapter};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Default prefix of data keys, giving `models/<name>/items/<uuid>`.
pub const DEFAULT_DATA_PREFIX: &str = "models";

/// Configuration of a [`ModelRegistry`](crate::ModelRegistry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelConfig {
    /// First segment of every data key.
    pub data_prefix: String,
    /// Conflict policy for types and instances that don't pick one.
    pub on_unsaved: OnUnsaved,
    /// Adapter used by types defined without an explicit one.
    pub adapter: AdapterConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            data_prefix: DEFAULT_DATA_PREFIX.to_string(),
            on_unsaved: OnUnsaved::default(),
            adapter: AdapterConfig::default(),
        }
    }
}

impl ModelConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ModelError::Config(err.to_string()))?;
        if config.data_prefix.is_empty() || odem_storage::validate_key(&config.data_prefix).is_err()
        {
            return Err(ModelError::Config(format!(
                "invalid data prefix: {:?}",
                config.data_prefix
            )));
        }
        Ok(config)
    }
}

/// Selects the default storage adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AdapterConfig {
    /// Records kept in process memory.
    Memory {
        #[serde(default = "binary_default")]
        binary: bool,
    },
    /// JSON files below a root folder.
    File { root: PathBuf },
}

fn binary_default() -> bool {
    true
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig::Memory { binary: true }
    }
}

impl AdapterConfig {
    /// Creates the configured adapter.
    pub fn build(&self) -> Arc<dyn StorageAdapter> {
        match self {
            AdapterConfig::Memory { binary: true } => Arc::new(MemoryAdapter::new()),
            AdapterConfig::Memory { binary: false } => Arc::new(MemoryAdapter::text_only()),
            AdapterConfig::File { root } => Arc::new(FileAdapter::new(root.clone())),
        }
    }
}
