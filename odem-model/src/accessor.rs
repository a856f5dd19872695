//! Name-based access to the members of an entity type's items.

use crate::schema::{ComputedDef, LifecycleHook, Method, PropertyDef, Schema};
use std::collections::HashMap;

/// What a member name of an item refers to.
#[derive(Debug, Clone)]
pub enum Accessor {
    /// Read and written through the property bag.
    Property(PropertyDef),
    /// Read and written through the computed property's code.
    Computed(ComputedDef),
    /// Read-only binding to a method.
    Method(Method),
    /// Read-only binding to a lifecycle hook.
    Hook(LifecycleHook),
}

impl Accessor {
    pub fn is_writable(&self) -> bool {
        matches!(self, Accessor::Property(_) | Accessor::Computed(_))
    }
}

/// Accessors of every name declared in a schema.
#[derive(Debug, Clone, Default)]
pub struct Accessors {
    by_name: HashMap<String, Accessor>,
}

impl Accessors {
    pub fn build(schema: &Schema) -> Self {
        let mut by_name = HashMap::new();
        for (name, def) in schema.props.iter() {
            by_name.insert(name.to_string(), Accessor::Property(def.clone()));
        }
        for (name, def) in schema.computed.iter() {
            by_name.insert(name.to_string(), Accessor::Computed(def.clone()));
        }
        for (name, method) in schema.methods.iter() {
            by_name.insert(name.to_string(), Accessor::Method(method.clone()));
        }
        for hook in schema.hooks.keys() {
            by_name.insert(hook.name().to_string(), Accessor::Hook(*hook));
        }
        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&Accessor> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
