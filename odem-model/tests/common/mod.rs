#![allow(dead_code)]

use odem_model::{EntityType, PropertyDef, RawSchema, compile_model};
use odem_storage::{MemoryAdapter, StorageAdapter};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Installs a test log writer honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn memory() -> Arc<dyn StorageAdapter> {
    Arc::new(MemoryAdapter::new())
}

pub fn text_memory() -> Arc<dyn StorageAdapter> {
    Arc::new(MemoryAdapter::text_only())
}

/// `Person` with an integer `height` of at least 50 and a string `name`.
pub fn person(adapter: Arc<dyn StorageAdapter>) -> Arc<EntityType> {
    compile_model(
        "Person",
        RawSchema::new()
            .prop("name", PropertyDef::new("string").trimmed())
            .prop("height", PropertyDef::new("integer").with_min(50)),
        None,
        Some(adapter),
    )
    .unwrap()
}
