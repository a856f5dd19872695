//! Storage layer for odem.
//!
//! Entity types persist their serialized records through the
//! [`StorageAdapter`] capability. Two adapters ship with the crate:
//!
//! - [`MemoryAdapter`] keeps records in process memory and accepts raw binary values
//! - [`FileAdapter`] stores one JSON document per key below a root folder
//!
//! # Keys
//!
//! Keys are slash-separated paths such as `models/user/items/<uuid>`. Empty
//! segments and `.`/`..` segments are rejected so that every adapter can map a
//! key onto a hierarchical namespace without escaping it.

mod adapter;
mod error;
mod file;
mod memory;

pub use adapter::{validate_key, StorageAdapter};
pub use error::{StorageError, StorageResult};
pub use file::FileAdapter;
pub use memory::MemoryAdapter;
