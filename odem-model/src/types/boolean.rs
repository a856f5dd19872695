use super::{check_presence, input_or_default, Capabilities, TypeHandler};
use crate::error::ValidationError;
use crate::schema::PropertyDef;
use odem_types::Value;
use std::cmp::Ordering;

/// Truth values.
///
/// Unrecognized input coerces to `Null` rather than the invalid sentinel.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanType;

const TRUTHY: &[&str] = &["true", "yes", "y", "on", "set", "1"];
const FALSY: &[&str] = &["false", "no", "n", "off", "unset", "0"];

impl TypeHandler for BooleanType {
    fn type_name(&self) -> &'static str {
        "boolean"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["bool"]
    }

    fn coerce(&self, value: &Value, _def: &PropertyDef, default: Option<&Value>) -> Value {
        let Some(input) = input_or_default(value, default) else {
            return Value::Null;
        };

        match input {
            Value::Bool(b) => Value::Bool(*b),
            Value::Integer(i) => Value::Bool(*i != 0),
            Value::Number(n) if !n.is_nan() => Value::Bool(*n != 0.0),
            Value::String(s) => {
                let s = s.trim().to_ascii_lowercase();
                if TRUTHY.contains(&s.as_str()) {
                    Value::Bool(true)
                } else if FALSY.contains(&s.as_str()) {
                    Value::Bool(false)
                } else {
                    Value::Null
                }
            }
            _ => Value::Null,
        }
    }

    fn is_valid(
        &self,
        name: &str,
        value: &Value,
        def: &PropertyDef,
        errors: &mut Vec<ValidationError>,
    ) {
        if let Some(value) = check_presence(name, value, def, self.type_name(), errors) {
            if value.as_bool().is_none() {
                errors.push(ValidationError::new(name, "is not a valid boolean"));
            }
        }
    }

    fn serialize(&self, value: &Value, _capabilities: Capabilities) -> Value {
        match value {
            Value::Bool(b) => Value::Bool(*b),
            _ => Value::Null,
        }
    }

    fn order(&self, a: &Value, b: &Value) -> Option<Ordering> {
        Some(a.as_bool()?.cmp(&b.as_bool()?))
    }
}
