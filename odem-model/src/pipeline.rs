//! Whole-schema property pipelines.
//!
//! [`Pipelines::compile`] resolves the handler of every property once, when
//! the entity type is built. Each pipeline is then a single pass over that
//! ordered list; no handler lookup happens per call.

use crate::error::ValidationError;
use crate::schema::{PropertyDef, Section};
use crate::types::{Capabilities, TypeRef};
use odem_types::{PropertyBag, Record, Value};

/// Supplies the default value of a property during coercion.
pub type DefaultProvider<'a> = &'a dyn Fn(&str, &PropertyDef) -> Option<Value>;

#[derive(Debug, Clone)]
struct Step {
    name: String,
    def: PropertyDef,
    handler: TypeRef,
    deserializes: bool,
}

/// Coercion, validation, serialization and deserialization of all
/// properties of an entity type, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Pipelines {
    steps: Vec<Step>,
}

impl Pipelines {
    pub fn compile(props: &Section<PropertyDef>) -> Self {
        let steps = props
            .iter()
            .map(|(name, def)| {
                let handler = def.handler();
                Step {
                    name: name.to_string(),
                    def: def.clone(),
                    handler,
                    deserializes: handler.transforms_on_deserialize(),
                }
            })
            .collect();
        Self { steps }
    }

    /// Names of the covered properties.
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.name.as_str())
    }

    /// Replaces every property value of `bag` with its coerced form.
    /// Missing properties are coerced from `Null`, picking up a default
    /// from `defaults` when given.
    pub fn coerce(&self, bag: &mut PropertyBag, defaults: Option<DefaultProvider<'_>>) {
        for step in &self.steps {
            let default = defaults.and_then(|provider| provider(&step.name, &step.def));
            let raw = bag.remove(&step.name).unwrap_or_default();
            let coerced = step.handler.coerce(&raw, &step.def, default.as_ref());
            bag.insert(step.name.clone(), coerced);
        }
    }

    /// Appends the constraint violations of `bag` to `errors`.
    pub fn validate_into(&self, bag: &PropertyBag, errors: &mut Vec<ValidationError>) {
        for step in &self.steps {
            let value = bag.get(&step.name).unwrap_or(&Value::Null);
            step.handler.is_valid(&step.name, value, &step.def, errors);
        }
    }

    pub fn validate(&self, bag: &PropertyBag) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        self.validate_into(bag, &mut errors);
        errors
    }

    /// Converts `bag` into the record written to storage. Keys without a
    /// property definition are dropped.
    pub fn serialize(&self, bag: &PropertyBag, capabilities: Capabilities) -> Record {
        self.steps
            .iter()
            .map(|step| {
                let value = bag.get(&step.name).unwrap_or(&Value::Null);
                (step.name.clone(), step.handler.serialize(value, capabilities))
            })
            .collect()
    }

    /// Restores a property bag from a stored record.
    pub fn deserialize(&self, record: &Record) -> PropertyBag {
        self.steps
            .iter()
            .map(|step| {
                let raw = record.get(&step.name).unwrap_or(&Value::Null);
                let value = if step.deserializes {
                    step.handler.coerce(&step.handler.deserialize(raw), &step.def, None)
                } else {
                    step.handler.coerce(raw, &step.def, None)
                };
                (step.name.clone(), value)
            })
            .collect()
    }
}
