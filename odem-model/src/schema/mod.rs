//! Schema model: the five sections of an entity type definition.
//!
//! A [`RawSchema`] is what callers write. [`normalize_schema`] checks it and
//! produces the canonical [`Schema`] of one type, which is then merged with
//! the schema of its base type.

mod computed;
mod hooks;
mod normalize;
mod options;
mod property;
mod raw;

pub use computed::{ComputedAccess, ComputedDef, ComputedFn};
pub use hooks::{Hook, HookBinding, HookFn, LifecycleHook, Method, MethodFn};
pub use normalize::{is_identifier, normalize_schema, Normalized};
pub use options::{ModelOptions, OnUnsaved};
pub use property::PropertyDef;
pub use raw::RawSchema;

use std::collections::BTreeMap;

/// Name-keyed entries kept in declaration order.
#[derive(Debug, Clone)]
pub struct Section<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Section<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Inserts an entry. An existing entry of the same name is replaced in
    /// place and returned.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> Option<T> {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Section<T> {
    /// Shallow union of `base` and `own`, own entries winning.
    pub fn merged(base: &Self, own: &Self) -> Self {
        let mut merged = base.clone();
        for (name, value) in &own.entries {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }
}

/// Canonical schema of an entity type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub props: Section<PropertyDef>,
    pub computed: Section<ComputedDef>,
    pub methods: Section<Method>,
    pub hooks: BTreeMap<LifecycleHook, Hook>,
    pub options: ModelOptions,
}

impl Schema {
    /// Merges every section of `own` over the ones of `base`.
    pub fn merged(base: &Schema, own: &Schema) -> Schema {
        let mut hooks = base.hooks.clone();
        hooks.extend(own.hooks.iter().map(|(hook, f)| (*hook, f.clone())));

        Schema {
            props: Section::merged(&base.props, &own.props),
            computed: Section::merged(&base.computed, &own.computed),
            methods: Section::merged(&base.methods, &own.methods),
            hooks,
            options: ModelOptions::merged(&base.options, &own.options),
        }
    }

    /// Tells which section declares `name`, if any.
    pub fn section_of(&self, name: &str) -> Option<&'static str> {
        if self.props.contains(name) {
            Some("props")
        } else if self.computed.contains(name) {
            Some("computed")
        } else if self.methods.contains(name) {
            Some("methods")
        } else {
            None
        }
    }
}
