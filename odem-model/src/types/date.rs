use super::{
    check_limits, check_presence, input_or_default, normalize_limits, Capabilities, TypeHandler,
};
use crate::error::ValidationError;
use crate::schema::PropertyDef;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use odem_types::Value;
use std::cmp::Ordering;

/// Points in time with millisecond precision, always in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateType;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

fn from_millis(ms: i64) -> Value {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map_or(Value::Invalid, Value::Date)
}

fn truncate(date: &DateTime<Utc>) -> Value {
    from_millis(date.timestamp_millis())
}

fn parse(s: &str) -> Value {
    let s = s.trim();
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return truncate(&date.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return truncate(&naive.and_utc());
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return day
            .and_hms_opt(0, 0, 0)
            .map_or(Value::Invalid, |naive| truncate(&naive.and_utc()));
    }
    s.parse::<i64>().map_or(Value::Invalid, from_millis)
}

impl TypeHandler for DateType {
    fn type_name(&self) -> &'static str {
        "date"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["datetime", "timestamp"]
    }

    fn check_definition(&self, def: &mut PropertyDef) -> Vec<String> {
        let mut problems = Vec::new();
        normalize_limits(self, def, &mut problems);
        problems
    }

    fn coerce(&self, value: &Value, _def: &PropertyDef, default: Option<&Value>) -> Value {
        let Some(input) = input_or_default(value, default) else {
            return Value::Null;
        };

        match input {
            Value::Date(d) => truncate(d),
            Value::Integer(ms) => from_millis(*ms),
            Value::Number(ms) if ms.is_finite() => from_millis(ms.round() as i64),
            Value::String(s) => parse(s),
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
        if value.as_date().is_none() {
            errors.push(ValidationError::new(name, "is not a valid date"));
            return;
        }
        check_limits(self, name, value, def, errors);
    }

    fn serialize(&self, value: &Value, _capabilities: Capabilities) -> Value {
        match value {
            Value::Date(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            _ => Value::Null,
        }
    }

    fn deserialize(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => parse(s),
            Value::Integer(ms) => from_millis(*ms),
            other => other.clone(),
        }
    }

    fn transforms_on_deserialize(&self) -> bool {
        true
    }

    fn order(&self, a: &Value, b: &Value) -> Option<Ordering> {
        Some(a.as_date()?.cmp(b.as_date()?))
    }
}
