use super::{check_presence, input_or_default, Capabilities, TypeHandler};
use crate::error::ValidationError;
use crate::schema::PropertyDef;
use chrono::SecondsFormat;
use odem_types::Value;
use regex::Regex;
use std::cmp::Ordering;

/// Text properties.
///
/// Supports `trim`, `reduceSpace`, `upperCase`, `lowerCase` on coercion and
/// `minLength`, `maxLength`, `pattern` on validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringType;

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

impl TypeHandler for StringType {
    fn type_name(&self) -> &'static str {
        "string"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["text"]
    }

    fn check_definition(&self, def: &mut PropertyDef) -> Vec<String> {
        let mut problems = Vec::new();

        if def.upper_case && def.lower_case {
            problems.push("upperCase and lowerCase can't be requested at once".to_string());
        }

        if let (Some(min), Some(max)) = (def.min_length, def.max_length) {
            if min > max {
                def.min_length = Some(max);
                def.max_length = Some(min);
            }
        }

        def.matcher = None;
        if let Some(pattern) = &def.pattern {
            match Regex::new(pattern) {
                Ok(regex) => def.matcher = Some(regex),
                Err(err) => problems.push(format!("invalid pattern: {err}")),
            }
        }

        problems
    }

    fn coerce(&self, value: &Value, def: &PropertyDef, default: Option<&Value>) -> Value {
        let Some(input) = input_or_default(value, default) else {
            return Value::Null;
        };

        let mut s = match input {
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Number(n) if n.is_finite() => n.to_string(),
            Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            Value::Uuid(u) => u.hyphenated().to_string(),
            Value::Binary(bytes) => match String::from_utf8(bytes.clone()) {
                Ok(s) => s,
                Err(_) => return Value::Null,
            },
            _ => return Value::Null,
        };

        if def.trim {
            s = s.trim().to_string();
        }
        if def.reduce_space {
            s = collapse_whitespace(&s);
        }
        if def.upper_case {
            s = s.to_uppercase();
        } else if def.lower_case {
            s = s.to_lowercase();
        }

        Value::String(s)
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
        let Some(s) = value.as_str() else {
            errors.push(ValidationError::new(name, "is not a valid string"));
            return;
        };

        if s.is_empty() && def.required {
            errors.push(ValidationError::new(name, "is required"));
            return;
        }

        let length = s.chars().count();
        if let Some(min) = def.min_length {
            if length < min {
                errors.push(ValidationError::new(
                    name,
                    format!("must have at least {min} characters"),
                ));
            }
        }
        if let Some(max) = def.max_length {
            if length > max {
                errors.push(ValidationError::new(
                    name,
                    format!("must have at most {max} characters"),
                ));
            }
        }
        if let Some(regex) = &def.matcher {
            if !regex.is_match(s) {
                errors.push(ValidationError::new(
                    name,
                    format!("must match pattern {}", regex.as_str()),
                ));
            }
        }
    }

    fn serialize(&self, value: &Value, _capabilities: Capabilities) -> Value {
        match value {
            Value::String(s) => Value::String(s.clone()),
            _ => Value::Null,
        }
    }

    fn order(&self, a: &Value, b: &Value) -> Option<Ordering> {
        Some(a.as_str()?.cmp(b.as_str()?))
    }
}
