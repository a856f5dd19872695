use super::{Capabilities, TypeHandler};
use crate::error::ValidationError;
use crate::schema::PropertyDef;
use odem_types::Value;
use std::cmp::Ordering;

/// Pass-through handler for values of unknown type.
///
/// Not selectable by name. Used for untyped computed properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyType;

impl TypeHandler for AnyType {
    fn type_name(&self) -> &'static str {
        "any"
    }

    fn coerce(&self, value: &Value, _def: &PropertyDef, default: Option<&Value>) -> Value {
        match value {
            Value::Null => default.cloned().unwrap_or(Value::Null),
            other => other.clone(),
        }
    }

    fn is_valid(
        &self,
        name: &str,
        value: &Value,
        def: &PropertyDef,
        errors: &mut Vec<ValidationError>,
    ) {
        if value.is_null() && def.required {
            errors.push(ValidationError::new(name, "is required"));
        }
    }

    fn serialize(&self, value: &Value, _capabilities: Capabilities) -> Value {
        if value.is_invalid() {
            Value::Null
        } else {
            value.clone()
        }
    }

    fn order(&self, a: &Value, b: &Value) -> Option<Ordering> {
        a.loose_cmp(b)
    }
}
