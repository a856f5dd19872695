//! Dynamic property values.
//!
//! A [`Value`] carries both the canonical in-memory form of a property and the
//! form handed to a storage adapter. Type handlers in `odem-model` decide which
//! variants are canonical for a given property type.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Live property values of an item, keyed by property name.
pub type PropertyBag = BTreeMap<String, Value>;

/// Serialized property values as exchanged with a storage adapter.
pub type Record = BTreeMap<String, Value>;

/// A dynamically typed scalar.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Result of coercing input that can't be represented by the target type.
    Invalid,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    Uuid(Uuid),
    Binary(Vec<u8>),
}

impl Value {
    /// Returns true for [`Value::Null`] only.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for the [`Value::Invalid`] sentinel, including a NaN number.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        match self {
            Value::Invalid => true,
            Value::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Returns true for values considered "not set" by the `not` operation.
    #[must_use]
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Null | Value::Invalid => true,
            Value::Bool(b) => !b,
            Value::Integer(i) => *i == 0,
            Value::Number(n) => *n == 0.0 || n.is_nan(),
            Value::String(s) => s.is_empty(),
            Value::Binary(b) => b.is_empty(),
            Value::Date(_) | Value::Uuid(_) => false,
        }
    }

    /// Short label of the variant, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Invalid => "invalid",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Uuid(_) => "uuid",
            Value::Binary(_) => "binary",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of integers and numbers.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Value::Uuid(u) => Some(u),
            _ => None,
        }
    }

    /// Orders two values of compatible kinds without knowing their property type.
    ///
    /// Integers and numbers compare numerically with each other. Values of
    /// unrelated kinds are unordered.
    #[must_use]
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Binary(a), Value::Binary(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Converts into a JSON value using the serialized representation.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Invalid => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Value::Number(_) => serializer.serialize_none(),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(d) => {
                serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Uuid(u) => serializer.collect_str(&u.hyphenated()),
            Value::Binary(b) => serializer.serialize_bytes(b),
        }
    }
}

/// Shapes a value can take on the wire. Dates and UUIDs arrive as strings and
/// are restored by the type handlers on deserialization.
#[derive(Deserialize)]
#[serde(untagged)]
enum Wire {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Binary(Vec<u8>),
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Wire::deserialize(deserializer)? {
            Wire::Null => Value::Null,
            Wire::Bool(b) => Value::Bool(b),
            Wire::Integer(i) => Value::Integer(i),
            Wire::Number(n) => Value::Number(n),
            Wire::String(s) => Value::String(s),
            Wire::Binary(b) => Value::Binary(b),
        })
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Invalid, Value::Number),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .map_or(Value::Invalid, Value::Binary),
            serde_json::Value::Object(_) => Value::Invalid,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Binary(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
