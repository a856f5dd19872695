//! Scalar type handlers.
//!
//! Every property type is implemented by a stateless [`TypeHandler`] that
//! knows how to coerce, validate, serialize, deserialize and compare values
//! of that type. Handlers are looked up once per property when a schema is
//! compiled; the compiled pipelines hold on to the resolved [`TypeRef`].

mod any;
mod boolean;
mod date;
mod integer;
mod number;
mod string;
mod uuid;

pub use any::AnyType;
pub use boolean::BooleanType;
pub use date::DateType;
pub use integer::IntegerType;
pub use number::NumberType;
pub use string::StringType;
pub use self::uuid::UuidType;

use crate::error::ValidationError;
use crate::schema::PropertyDef;
use odem_storage::StorageAdapter;
use odem_types::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Shared reference to a registered type handler.
pub type TypeRef = &'static dyn TypeHandler;

static HANDLERS: [TypeRef; 6] = [
    &StringType,
    &IntegerType,
    &NumberType,
    &BooleanType,
    &DateType,
    &UuidType,
];

/// Returns all registered handlers.
pub fn handlers() -> &'static [TypeRef] {
    &HANDLERS
}

/// Resolves a handler by its type name or one of its aliases, ignoring case.
pub fn select_by_name(name: &str) -> Option<TypeRef> {
    let name = name.trim();
    HANDLERS.iter().copied().find(|handler| {
        handler.type_name().eq_ignore_ascii_case(name)
            || handler
                .aliases()
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(name))
    })
}

/// Handler used where no property type is known, e.g. for indices on
/// untyped computed properties.
pub fn fallback() -> TypeRef {
    &AnyType
}

/// What a storage adapter can represent natively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub binary: bool,
}

impl Capabilities {
    pub const TEXT: Self = Self { binary: false };
    pub const BINARY: Self = Self { binary: true };

    /// Reads the capabilities of an adapter.
    pub fn of(adapter: &dyn StorageAdapter) -> Self {
        Self {
            binary: adapter.supports_binary(),
        }
    }
}

/// Comparison operations supported by every scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompareOp {
    Eq,
    NotEq,
    Not,
    Null,
    NotNull,
    Between,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    /// Canonical name of the operation.
    pub const fn name(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::NotEq => "neq",
            CompareOp::Not => "not",
            CompareOp::Null => "null",
            CompareOp::NotNull => "notnull",
            CompareOp::Between => "between",
            CompareOp::Lt => "lt",
            CompareOp::Lte => "lte",
            CompareOp::Gt => "gt",
            CompareOp::Gte => "gte",
        }
    }

    /// Number of operands the operation consumes.
    pub const fn arity(self) -> usize {
        match self {
            CompareOp::Not | CompareOp::Null | CompareOp::NotNull => 0,
            CompareOp::Between => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "eq" => CompareOp::Eq,
            "neq" | "noteq" => CompareOp::NotEq,
            "not" => CompareOp::Not,
            "null" => CompareOp::Null,
            "notnull" => CompareOp::NotNull,
            "between" => CompareOp::Between,
            "lt" => CompareOp::Lt,
            "lte" => CompareOp::Lte,
            "gt" => CompareOp::Gt,
            "gte" => CompareOp::Gte,
            _ => return Err(format!("unknown operation: {s}")),
        })
    }
}

/// Behaviour of one scalar property type.
pub trait TypeHandler: Send + Sync + fmt::Debug {
    /// Name the type is registered under.
    fn type_name(&self) -> &'static str;

    /// Alternative names accepted on lookup.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether [`TypeHandler::sort`] yields a meaningful order.
    fn sortable(&self) -> bool {
        true
    }

    /// Checks and normalizes the type-specific constraints of a property
    /// definition. Returns the problems found; an empty list means valid.
    fn check_definition(&self, def: &mut PropertyDef) -> Vec<String> {
        let _ = def;
        Vec::new()
    }

    /// Converts arbitrary input into the canonical in-memory form.
    ///
    /// `Null` input yields `default` coerced, or `Null` without one.
    /// Unconvertible input yields the type's invalid sentinel.
    fn coerce(&self, value: &Value, def: &PropertyDef, default: Option<&Value>) -> Value;

    /// Appends one error per violated constraint to `errors`.
    fn is_valid(
        &self,
        name: &str,
        value: &Value,
        def: &PropertyDef,
        errors: &mut Vec<ValidationError>,
    );

    /// Converts a coerced value into its storage representation.
    fn serialize(&self, value: &Value, capabilities: Capabilities) -> Value;

    /// Restores a value read from storage. Accepts native input as well.
    fn deserialize(&self, value: &Value) -> Value {
        value.clone()
    }

    /// Whether [`TypeHandler::deserialize`] does more than cloning its input.
    fn transforms_on_deserialize(&self) -> bool {
        false
    }

    /// Orders two non-null values of this type.
    fn order(&self, a: &Value, b: &Value) -> Option<Ordering>;

    /// Applies a comparison operation with null-aware semantics.
    fn compare(&self, value: &Value, op: CompareOp, operands: &[Value]) -> bool {
        compare_with(value, op, operands, |a, b| self.order(a, b))
    }

    /// Three-way comparator placing null and invalid values last.
    fn sort(&self, a: &Value, b: &Value) -> Ordering {
        sort_with(a, b, |a, b| self.order(a, b))
    }
}

fn is_missing(value: &Value) -> bool {
    value.is_null() || value.is_invalid()
}

/// Evaluates `op` on `value` using `order` for non-null values.
///
/// `null` equals `null` only; ordering operations involving exactly one
/// `null` are false; `lte`/`gte` of two `null`s is true.
pub fn compare_with(
    value: &Value,
    op: CompareOp,
    operands: &[Value],
    order: impl Fn(&Value, &Value) -> Option<Ordering>,
) -> bool {
    let reference = operands.first().unwrap_or(&Value::Null);
    let both_null = value.is_null() && reference.is_null();
    let ordering = || {
        if value.is_null() || reference.is_null() {
            None
        } else {
            order(value, reference)
        }
    };

    match op {
        CompareOp::Null => value.is_null(),
        CompareOp::NotNull => !value.is_null(),
        CompareOp::Not => value.is_falsy(),
        CompareOp::Eq => both_null || ordering() == Some(Ordering::Equal),
        CompareOp::NotEq => !(both_null || ordering() == Some(Ordering::Equal)),
        CompareOp::Lt => ordering() == Some(Ordering::Less),
        CompareOp::Gt => ordering() == Some(Ordering::Greater),
        CompareOp::Lte => {
            both_null || matches!(ordering(), Some(Ordering::Less | Ordering::Equal))
        }
        CompareOp::Gte => {
            both_null || matches!(ordering(), Some(Ordering::Greater | Ordering::Equal))
        }
        CompareOp::Between => {
            let upper = operands.get(1).unwrap_or(&Value::Null);
            if value.is_null() || reference.is_null() || upper.is_null() {
                return false;
            }
            let (lower, upper) = match order(reference, upper) {
                Some(Ordering::Greater) => (upper, reference),
                _ => (reference, upper),
            };
            matches!(
                order(value, lower),
                Some(Ordering::Greater | Ordering::Equal)
            ) && matches!(order(value, upper), Some(Ordering::Less | Ordering::Equal))
        }
    }
}

/// Sorts with `order`, placing null and invalid values after all others.
pub fn sort_with(
    a: &Value,
    b: &Value,
    order: impl Fn(&Value, &Value) -> Option<Ordering>,
) -> Ordering {
    match (is_missing(a), is_missing(b)) {
        (false, false) => order(a, b).unwrap_or(Ordering::Equal),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

/// Picks the input to convert: the value itself or, for `Null`, the default.
pub(crate) fn input_or_default<'a>(value: &'a Value, default: Option<&'a Value>) -> Option<&'a Value> {
    match value {
        Value::Null => default.filter(|d| !d.is_null()),
        value => Some(value),
    }
}

/// Checks requiredness and the invalid sentinel. Returns the value when
/// type-specific constraints still need checking.
pub(crate) fn check_presence<'a>(
    name: &str,
    value: &'a Value,
    def: &PropertyDef,
    type_name: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<&'a Value> {
    if value.is_invalid() {
        errors.push(ValidationError::new(
            name,
            format!("is not a valid {type_name}"),
        ));
        return None;
    }
    if value.is_null() {
        if def.required {
            errors.push(ValidationError::new(name, "is required"));
        }
        return None;
    }
    Some(value)
}

/// Normalizes an optional `min`/`max` pair through `coerce`, swapping the
/// limits when given in the wrong order.
pub(crate) fn normalize_limits(
    handler: &dyn TypeHandler,
    def: &mut PropertyDef,
    problems: &mut Vec<String>,
) {
    let plain = PropertyDef::default();
    let mut limit = |slot: &mut Option<Value>, label: &str| {
        if let Some(raw) = slot.take() {
            match handler.coerce(&raw, &plain, None) {
                Value::Null => {}
                coerced if coerced.is_invalid() => {
                    problems.push(format!("invalid {label} limit {raw:?}"));
                }
                coerced => *slot = Some(coerced),
            }
        }
    };
    limit(&mut def.min, "minimum");
    limit(&mut def.max, "maximum");

    if let (Some(min), Some(max)) = (&def.min, &def.max) {
        if handler.order(min, max) == Some(Ordering::Greater) {
            std::mem::swap(&mut def.min, &mut def.max);
        }
    }
}

/// Appends errors for values outside of the definition's `min`/`max`.
pub(crate) fn check_limits(
    handler: &dyn TypeHandler,
    name: &str,
    value: &Value,
    def: &PropertyDef,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(min) = &def.min {
        if handler.order(value, min) == Some(Ordering::Less) {
            errors.push(ValidationError::new(
                name,
                format!("must be at least {}", display(min)),
            ));
        }
    }
    if let Some(max) = &def.max {
        if handler.order(value, max) == Some(Ordering::Greater) {
            errors.push(ValidationError::new(
                name,
                format!("must be at most {}", display(max)),
            ));
        }
    }
}

/// Renders a value for messages.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => match other.to_json() {
            serde_json::Value::String(s) => s,
            json => json.to_string(),
        },
    }
}
