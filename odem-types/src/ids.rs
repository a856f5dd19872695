//! Item identities.
//!
//! Every stored item is addressed by a random UUID (v4). The canonical string
//! form is lowercase hex in 8-4-4-4-12 groups.

use crate::{Error, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier of a stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Creates a new random item ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an item ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Creates an item ID from its 16 raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the 16 raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Parses an item ID from any textual UUID form the `uuid` crate accepts.
    pub fn parse(s: &str) -> crate::Result<Self> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Tests whether a value already is a UUID in one of its canonical shapes:
    /// a native UUID, 16 raw bytes, or the dashed lowercase/uppercase hex string.
    #[must_use]
    pub fn is_uuid(value: &Value) -> bool {
        match value {
            Value::Uuid(_) => true,
            Value::Binary(bytes) => bytes.len() == 16,
            Value::String(s) => is_dashed_hex(s),
            _ => false,
        }
    }

    /// Converts a value into an item ID, returning `None` when the value does
    /// not describe a UUID.
    #[must_use]
    pub fn normalize(value: &Value) -> Option<Self> {
        match value {
            Value::Uuid(uuid) => Some(Self(*uuid)),
            Value::Binary(bytes) => <[u8; 16]>::try_from(bytes.as_slice())
                .ok()
                .map(Self::from_bytes),
            Value::String(s) => Uuid::parse_str(s.trim()).ok().map(Self),
            _ => None,
        }
    }
}

fn is_dashed_hex(s: &str) -> bool {
    s.len() == 36
        && s.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ItemId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for ItemId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ItemId> for Value {
    fn from(id: ItemId) -> Self {
        Value::Uuid(id.0)
    }
}
