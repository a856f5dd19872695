use super::{
    check_limits, check_presence, input_or_default, normalize_limits, Capabilities, TypeHandler,
};
use crate::error::ValidationError;
use crate::schema::PropertyDef;
use odem_types::Value;
use std::cmp::Ordering;

const STEP_EPSILON: f64 = 1e-9;

/// Finite floating-point numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberType;

fn finite(n: f64) -> Value {
    if n.is_finite() {
        Value::Number(n)
    } else {
        Value::Invalid
    }
}

impl TypeHandler for NumberType {
    fn type_name(&self) -> &'static str {
        "number"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["float", "decimal", "double"]
    }

    fn check_definition(&self, def: &mut PropertyDef) -> Vec<String> {
        let mut problems = Vec::new();
        normalize_limits(self, def, &mut problems);
        if let Some(step) = def.step {
            if !(step.is_finite() && step > 0.0) {
                problems.push(format!("invalid step {step}, must be positive"));
            }
        }
        problems
    }

    fn coerce(&self, value: &Value, _def: &PropertyDef, default: Option<&Value>) -> Value {
        let Some(input) = input_or_default(value, default) else {
            return Value::Null;
        };

        match input {
            Value::Number(n) => finite(*n),
            Value::Integer(i) => Value::Number(*i as f64),
            Value::Bool(b) => Value::Number(if *b { 1.0 } else { 0.0 }),
            Value::Date(d) => Value::Number(d.timestamp_millis() as f64),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    Value::Null
                } else {
                    s.parse::<f64>().map_or(Value::Invalid, finite)
                }
            }
            _ => Value::Invalid,
        }
    }

    fn is_valid(
        &self,
        name: &str,
        value: &Value,
        def: &PropertyDef,
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(value) = check_presence(name, value, def, self.type_name(), errors) else {
            return;
        };
        let Some(n) = value.as_f64() else {
            errors.push(ValidationError::new(name, "is not a valid number"));
            return;
        };

        check_limits(self, name, value, def, errors);

        if let Some(step) = def.step.filter(|step| *step > 0.0) {
            let base = def.min.as_ref().and_then(Value::as_f64).unwrap_or(0.0);
            let steps = (n - base) / step;
            if (steps - steps.round()).abs() > STEP_EPSILON {
                errors.push(ValidationError::new(
                    name,
                    format!("must be a multiple of {step} starting at {base}"),
                ));
            }
        }
    }

    fn serialize(&self, value: &Value, _capabilities: Capabilities) -> Value {
        match value.as_f64() {
            Some(n) if n.is_finite() => Value::Number(n),
            _ => Value::Null,
        }
    }

    fn transforms_on_deserialize(&self) -> bool {
        true
    }

    fn deserialize(&self, value: &Value) -> Value {
        match value {
            Value::Integer(i) => Value::Number(*i as f64),
            other => other.clone(),
        }
    }

    fn order(&self, a: &Value, b: &Value) -> Option<Ordering> {
        a.as_f64()?.partial_cmp(&b.as_f64()?)
    }
}
