//! Core type definitions for odem.
//!
//! This crate defines the leaf types shared by the storage
//! layer and the model compiler:
//! - [`Value`]: the dynamic scalar used for in-memory and serialized property values
//! - [`PropertyBag`] / [`Record`]: named value collections of an item
//! - [`ItemId`]: the UUID identity of a stored item
//!
//! Nothing in here knows about schemas; type-aware behaviour lives in `odem-model`.

mod ids;
mod value;

pub use ids::ItemId;
pub use value::{PropertyBag, Record, Value};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
