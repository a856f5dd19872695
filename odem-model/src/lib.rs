//! Schema-driven entity models.
//!
//! A [`RawSchema`] describes the properties, computed properties, methods,
//! lifecycle hooks, options and indices of an entity. [`compile_model`]
//! turns it into an [`EntityType`] with compiled property pipelines, whose
//! [`Instance`]s coerce, validate and persist their properties through a
//! [`StorageAdapter`](odem_storage::StorageAdapter).
//!
//! ```no_run
//! use odem_model::{compile_model, Instance, PropertyDef, RawSchema};
//!
//! # async fn run() -> odem_model::ModelResult<()> {
//! let person = compile_model(
//!     "Person",
//!     RawSchema::new().prop("height", PropertyDef::new("integer").with_min(50)),
//!     None,
//!     None,
//! )?;
//!
//! let mut item = Instance::new(person);
//! item.set("height", "180")?;
//! item.save().await?;
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod config;
pub mod error;
pub mod index;
pub mod instance;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod schema;
pub mod types;

pub use accessor::{Accessor, Accessors};
pub use config::{AdapterConfig, ModelConfig, DEFAULT_DATA_PREFIX};
pub use error::{ModelError, ModelResult, ValidationError};
pub use index::{ExplicitIndex, IndexDefinition, IndexDescriptor, IndexSpec};
pub use instance::{Instance, InstanceOptions};
pub use model::{compile_model, compile_with, default_adapter, CompileContext, EntityType};
pub use pipeline::Pipelines;
pub use registry::ModelRegistry;
pub use schema::{
    ComputedAccess, ComputedDef, LifecycleHook, OnUnsaved, PropertyDef, RawSchema, Schema,
};
pub use types::{CompareOp, TypeHandler};
