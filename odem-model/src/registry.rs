//! Named entity types sharing one configuration.

use crate::config::ModelConfig;
use crate::error::ModelResult;
use crate::model::{compile_with, CompileContext, EntityType};
use crate::schema::RawSchema;
use odem_storage::StorageAdapter;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Compiles entity types with a shared configuration and keeps them by name.
///
/// Redefining a name replaces the registered type. Holders of the previous
/// type keep using it unchanged.
#[derive(Debug)]
pub struct ModelRegistry {
    config: ModelConfig,
    context: CompileContext,
    models: RwLock<HashMap<String, Arc<EntityType>>>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(ModelConfig::default())
    }
}

impl ModelRegistry {
    /// Creates a registry whose default adapter is built from `config`.
    pub fn new(config: ModelConfig) -> Self {
        let adapter = config.adapter.build();
        Self::with_adapter(config, adapter)
    }

    /// Creates a registry using `adapter` as default adapter.
    pub fn with_adapter(config: ModelConfig, adapter: Arc<dyn StorageAdapter>) -> Self {
        let context = CompileContext {
            data_prefix: config.data_prefix.clone(),
            on_unsaved: config.on_unsaved,
            adapter,
        };
        info!(
            adapter = context.adapter.name(),
            prefix = %context.data_prefix,
            "model registry ready"
        );
        Self {
            config,
            context,
            models: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Default adapter of the types defined here.
    pub fn adapter(&self) -> &Arc<dyn StorageAdapter> {
        &self.context.adapter
    }

    /// Compiles and registers an entity type.
    pub fn define(
        &self,
        name: &str,
        schema: RawSchema,
        base: Option<Arc<EntityType>>,
        adapter: Option<Arc<dyn StorageAdapter>>,
    ) -> ModelResult<Arc<EntityType>> {
        let model = compile_with(&self.context, name, schema, base, adapter)?;
        self.models
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&model));
        Ok(model)
    }

    pub fn get(&self, name: &str) -> Option<Arc<EntityType>> {
        self.models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Names of the registered types, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
