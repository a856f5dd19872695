//! Secondary index declarations and their resolved descriptors.

mod extract;
mod handler;

pub use extract::{collect_indices, extract_indices};
pub use handler::{IndexHandler, IndexHandlerFactory, IndexHandlerRegistry, SortedIndex};

use crate::types::{CompareOp, TypeRef};
use odem_types::Value;
use std::fmt;
use std::sync::Arc;

/// Derives the value tracked by an index from a property value.
pub type ReducerFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// How one operation of an inline declaration is enabled.
#[derive(Clone)]
pub enum IndexOpSpec {
    Enabled(bool),
    Reducer(ReducerFn),
}

/// Explicit index declaration of the schema-level `indices` section.
#[derive(Clone, Default)]
pub struct ExplicitIndex {
    /// Indexed property, defaults to the declaration's key.
    pub property: Option<String>,
    /// Operation name, defaults to `eq`.
    pub op: Option<String>,
    pub reducer: Option<ReducerFn>,
    /// Type name to use when the property doesn't provide one.
    pub property_type: Option<String>,
    /// Handler overriding every other source.
    pub handler: Option<TypeRef>,
}

impl ExplicitIndex {
    pub fn on(property: impl Into<String>) -> Self {
        Self {
            property: Some(property.into()),
            ..Self::default()
        }
    }

    pub fn op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    pub fn reducer<F>(mut self, reducer: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.reducer = Some(Arc::new(reducer));
        self
    }

    pub fn property_type(mut self, type_name: impl Into<String>) -> Self {
        self.property_type = Some(type_name.into());
        self
    }

    pub fn handler(mut self, handler: TypeRef) -> Self {
        self.handler = Some(handler);
        self
    }
}

/// An index declaration as written in a schema.
#[derive(Clone)]
pub enum IndexSpec {
    /// `eq` index on the reduced value.
    Reducer(ReducerFn),
    /// `eq` index when `true`, nothing when `false`.
    Enabled(bool),
    /// Index for one named operation.
    Op(String),
    /// One index per named operation. Inline declarations only.
    Ops(Vec<String>),
    /// Operation name to flag or reducer. Inline declarations only.
    Map(Vec<(String, IndexOpSpec)>),
    Explicit(ExplicitIndex),
    /// JSON that doesn't describe an index; reported on compilation.
    Unsupported(String),
}

impl IndexSpec {
    pub fn reducer<F>(reducer: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        IndexSpec::Reducer(Arc::new(reducer))
    }

    /// Reads the `index` field of a property definition.
    pub fn from_inline_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Object(ops) => IndexSpec::Map(
                ops.into_iter()
                    .map(|(op, flag)| {
                        let enabled = match flag {
                            serde_json::Value::Bool(b) => b,
                            serde_json::Value::Null => false,
                            _ => true,
                        };
                        (op, IndexOpSpec::Enabled(enabled))
                    })
                    .collect(),
            ),
            other => Self::from_scalar_json(other),
        }
    }

    /// Reads an entry of the schema-level `indices` section.
    pub fn from_section_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Object(fields) => {
                let text = |key: &str| {
                    fields
                        .get(key)
                        .and_then(serde_json::Value::as_str)
                        .map(str::to_string)
                };
                IndexSpec::Explicit(ExplicitIndex {
                    property: text("property"),
                    op: text("type"),
                    property_type: text("propertyType"),
                    ..ExplicitIndex::default()
                })
            }
            other => Self::from_scalar_json(other),
        }
    }

    fn from_scalar_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Bool(b) => IndexSpec::Enabled(b),
            serde_json::Value::String(op) => IndexSpec::Op(op),
            serde_json::Value::Array(ops) => {
                let names: Option<Vec<String>> = ops
                    .iter()
                    .map(|op| op.as_str().map(str::to_string))
                    .collect();
                names.map_or_else(
                    || IndexSpec::Unsupported("list of operations must hold names".to_string()),
                    IndexSpec::Ops,
                )
            }
            other => IndexSpec::Unsupported(other.to_string()),
        }
    }
}

impl From<bool> for IndexSpec {
    fn from(enabled: bool) -> Self {
        IndexSpec::Enabled(enabled)
    }
}

impl From<&str> for IndexSpec {
    fn from(op: &str) -> Self {
        IndexSpec::Op(op.to_string())
    }
}

impl From<Vec<&str>> for IndexSpec {
    fn from(ops: Vec<&str>) -> Self {
        IndexSpec::Ops(ops.into_iter().map(str::to_string).collect())
    }
}

impl From<ExplicitIndex> for IndexSpec {
    fn from(explicit: ExplicitIndex) -> Self {
        IndexSpec::Explicit(explicit)
    }
}

impl fmt::Debug for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSpec::Reducer(_) => f.write_str("Reducer(<fn>)"),
            IndexSpec::Enabled(b) => f.debug_tuple("Enabled").field(b).finish(),
            IndexSpec::Op(op) => f.debug_tuple("Op").field(op).finish(),
            IndexSpec::Ops(ops) => f.debug_tuple("Ops").field(ops).finish(),
            IndexSpec::Map(ops) => f
                .debug_tuple("Map")
                .field(&ops.iter().map(|(op, _)| op).collect::<Vec<_>>())
                .finish(),
            IndexSpec::Explicit(explicit) => f
                .debug_struct("Explicit")
                .field("property", &explicit.property)
                .field("op", &explicit.op)
                .field("property_type", &explicit.property_type)
                .finish(),
            IndexSpec::Unsupported(json) => f.debug_tuple("Unsupported").field(json).finish(),
        }
    }
}

/// A resolved index before a handler is attached to it.
#[derive(Clone)]
pub struct IndexDefinition {
    pub property: String,
    pub op: CompareOp,
    /// Type handler comparing the indexed values.
    pub handler_type: TypeRef,
    pub reducer: Option<ReducerFn>,
}

impl IndexDefinition {
    /// Passes a property value through the reducer, if any.
    pub fn reduce(&self, value: &Value) -> Value {
        match &self.reducer {
            Some(reducer) => reducer(value),
            None => value.clone(),
        }
    }
}

impl fmt::Debug for IndexDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexDefinition")
            .field("property", &self.property)
            .field("op", &self.op)
            .field("type", &self.handler_type.type_name())
            .field("reducer", &self.reducer.is_some())
            .finish()
    }
}

/// One index of an entity type with the handler maintaining it.
#[derive(Clone)]
pub struct IndexDescriptor {
    pub definition: IndexDefinition,
    pub handler: Arc<dyn IndexHandler>,
}

impl IndexDescriptor {
    pub fn property(&self) -> &str {
        &self.definition.property
    }

    pub fn op(&self) -> CompareOp {
        self.definition.op
    }

    /// Key identifying the index within its entity type.
    pub fn key(&self) -> String {
        format!("{}_{}", self.definition.property, self.definition.op)
    }
}

impl fmt::Debug for IndexDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexDescriptor")
            .field("definition", &self.definition)
            .field("entries", &self.handler.len())
            .finish()
    }
}
