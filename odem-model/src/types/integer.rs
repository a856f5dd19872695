use super::{
    check_limits, check_presence, input_or_default, normalize_limits, Capabilities, TypeHandler,
};
use crate::error::ValidationError;
use crate::schema::PropertyDef;
use odem_types::Value;
use std::cmp::Ordering;

/// Whole numbers in the range of `i64`.
///
/// Fractional input is rounded, e.g. `"48.6"` coerces to `49`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerType;

fn round(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Invalid;
    }
    let rounded = n.round();
    if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        Value::Invalid
    } else {
        Value::Integer(rounded as i64)
    }
}

impl TypeHandler for IntegerType {
    fn type_name(&self) -> &'static str {
        "integer"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["int"]
    }

    fn check_definition(&self, def: &mut PropertyDef) -> Vec<String> {
        let mut problems = Vec::new();
        normalize_limits(self, def, &mut problems);
        if let Some(step) = def.step {
            if !(step.is_finite() && step >= 1.0 && step.fract() == 0.0) {
                problems.push(format!("invalid step {step}, must be a positive integer"));
            }
        }
        problems
    }

    fn coerce(&self, value: &Value, _def: &PropertyDef, default: Option<&Value>) -> Value {
        let Some(input) = input_or_default(value, default) else {
            return Value::Null;
        };

        match input {
            Value::Integer(i) => Value::Integer(*i),
            Value::Number(n) => round(*n),
            Value::Bool(b) => Value::Integer(i64::from(*b)),
            Value::Date(d) => Value::Integer(d.timestamp_millis()),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Value::Null;
                }
                match s.parse::<i64>() {
                    Ok(i) => Value::Integer(i),
                    Err(_) => s.parse::<f64>().map_or(Value::Invalid, round),
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
        let Some(i) = value.as_i64() else {
            errors.push(ValidationError::new(name, "is not a valid integer"));
            return;
        };

        check_limits(self, name, value, def, errors);

        if let Some(step) = def.step {
            let base = def.min.as_ref().and_then(Value::as_i64).unwrap_or(0);
            let step = step as i128;
            if step > 0 && (i128::from(i) - i128::from(base)) % step != 0 {
                errors.push(ValidationError::new(
                    name,
                    format!("must be a multiple of {step} starting at {base}"),
                ));
            }
        }
    }

    fn serialize(&self, value: &Value, _capabilities: Capabilities) -> Value {
        match value {
            Value::Integer(i) => Value::Integer(*i),
            _ => Value::Null,
        }
    }

    fn order(&self, a: &Value, b: &Value) -> Option<Ordering> {
        Some(a.as_i64()?.cmp(&b.as_i64()?))
    }
}
