use super::{check_presence, input_or_default, Capabilities, TypeHandler};
use crate::error::ValidationError;
use crate::schema::PropertyDef;
use odem_types::{ItemId, Value};
use std::cmp::Ordering;

/// References to other items.
///
/// Stored as 16 raw bytes on adapters supporting binary data and as the
/// dashed hex string otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidType;

impl TypeHandler for UuidType {
    fn type_name(&self) -> &'static str {
        "uuid"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["key", "foreign"]
    }

    fn coerce(&self, value: &Value, _def: &PropertyDef, default: Option<&Value>) -> Value {
        input_or_default(value, default)
            .and_then(ItemId::normalize)
            .map_or(Value::Null, Value::from)
    }

    fn is_valid(
        &self,
        name: &str,
        value: &Value,
        def: &PropertyDef,
        errors: &mut Vec<ValidationError>,
    ) {
        if let Some(value) = check_presence(name, value, def, self.type_name(), errors) {
            if value.as_uuid().is_none() {
                errors.push(ValidationError::new(name, "is not a valid uuid"));
            }
        }
    }

    fn serialize(&self, value: &Value, capabilities: Capabilities) -> Value {
        match ItemId::normalize(value) {
            Some(id) if capabilities.binary => Value::Binary(id.as_bytes().to_vec()),
            Some(id) => Value::String(id.to_string()),
            None => Value::Null,
        }
    }

    fn deserialize(&self, value: &Value) -> Value {
        ItemId::normalize(value).map_or(Value::Null, Value::from)
    }

    fn transforms_on_deserialize(&self) -> bool {
        true
    }

    fn order(&self, a: &Value, b: &Value) -> Option<Ordering> {
        Some(a.as_uuid()?.cmp(b.as_uuid()?))
    }
}
