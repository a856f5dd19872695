//! Error types for model compilation and the instance runtime.

use odem_storage::StorageError;
use odem_types::ItemId;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// One violated constraint of one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub property: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn join_all<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while compiling or using an entity type.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The model definition is invalid. Lists every problem found.
    #[error("invalid definition of model {model}: {}", join_all(.errors))]
    Definition { model: String, errors: Vec<String> },

    /// Saving was aborted because properties failed validation.
    #[error("validation failed: {}", join_all(.0))]
    Validation(Vec<ValidationError>),

    /// A bound item has recorded changes but its stored record was never loaded.
    #[error("item {uuid} of model {model} has unsaved changes conflicting with its stored record")]
    Conflict { model: String, uuid: ItemId },

    /// No property, computed property or method with the name exists.
    #[error("model {model} has no property named {name}")]
    UnknownProperty { model: String, name: String },

    /// The name refers to a method, hook or the item's identity.
    #[error("{name} of model {model} is read-only")]
    ReadOnly { model: String, name: String },

    /// The name does not refer to a method.
    #[error("{name} of model {model} is not a method")]
    NotAMethod { model: String, name: String },

    /// The operation requires an item bound to a UUID.
    #[error("item of model {model} is not bound to a UUID")]
    NotBound { model: String },

    /// A value given as identity is not a UUID.
    #[error("invalid UUID for item of model {model}: {value}")]
    InvalidUuid { model: String, value: String },

    /// The observed adapter of an entity type has been bound before.
    #[error("model {model} is already observing an adapter")]
    AdapterBound { model: String },

    /// A method or hook rejected the operation.
    #[error("{0}")]
    Rejected(String),

    /// Index lookup failed.
    #[error("index error: {0}")]
    Index(String),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The storage adapter failed.
    #[error("storage error: {0}")]
    Storage(Arc<StorageError>),
}

impl From<StorageError> for ModelError {
    fn from(err: StorageError) -> Self {
        ModelError::Storage(Arc::new(err))
    }
}

impl ModelError {
    /// Returns the validation errors if this is a validation failure.
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            ModelError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
