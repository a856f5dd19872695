use crate::error::ModelResult;
use crate::instance::Instance;
use odem_types::Value;
use std::fmt;
use std::sync::Arc;

/// Events of an item's lifecycle that hooks can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleHook {
    BeforeCreate,
    AfterCreate,
    BeforeLoad,
    AfterLoad,
    BeforeValidate,
    AfterValidate,
    BeforeSave,
    AfterSave,
    BeforeRemove,
    AfterRemove,
}

/// Whether a hook fires on an item or on its entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookBinding {
    Instance,
    Type,
}

const TABLE: [(LifecycleHook, &str, HookBinding); 10] = [
    (LifecycleHook::BeforeCreate, "beforeCreate", HookBinding::Instance),
    (LifecycleHook::AfterCreate, "afterCreate", HookBinding::Instance),
    (LifecycleHook::BeforeLoad, "beforeLoad", HookBinding::Instance),
    (LifecycleHook::AfterLoad, "afterLoad", HookBinding::Instance),
    (LifecycleHook::BeforeValidate, "beforeValidate", HookBinding::Instance),
    (LifecycleHook::AfterValidate, "afterValidate", HookBinding::Instance),
    (LifecycleHook::BeforeSave, "beforeSave", HookBinding::Instance),
    (LifecycleHook::AfterSave, "afterSave", HookBinding::Instance),
    (LifecycleHook::BeforeRemove, "beforeRemove", HookBinding::Instance),
    (LifecycleHook::AfterRemove, "afterRemove", HookBinding::Instance),
];

impl LifecycleHook {
    pub const ALL: [LifecycleHook; 10] = [
        LifecycleHook::BeforeCreate,
        LifecycleHook::AfterCreate,
        LifecycleHook::BeforeLoad,
        LifecycleHook::AfterLoad,
        LifecycleHook::BeforeValidate,
        LifecycleHook::AfterValidate,
        LifecycleHook::BeforeSave,
        LifecycleHook::AfterSave,
        LifecycleHook::BeforeRemove,
        LifecycleHook::AfterRemove,
    ];

    const fn entry(self) -> (LifecycleHook, &'static str, HookBinding) {
        TABLE[self as usize]
    }

    /// Canonical name, e.g. `beforeSave`.
    pub const fn name(self) -> &'static str {
        self.entry().1
    }

    pub const fn binding(self) -> HookBinding {
        self.entry().2
    }

    /// Resolves a canonical name or its `on`-prefixed alias (`onBeforeSave`).
    pub fn from_name(name: &str) -> Option<Self> {
        let matches = |hook_name: &str| match name.strip_prefix("on") {
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_uppercase()) => {
                rest[..1].eq_ignore_ascii_case(&hook_name[..1]) && rest[1..] == hook_name[1..]
            }
            _ => name == hook_name,
        };
        TABLE
            .iter()
            .find_map(|(hook, hook_name, _)| matches(hook_name).then_some(*hook))
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type HookFn = Arc<dyn Fn(&mut Instance) -> ModelResult<()> + Send + Sync>;

pub type MethodFn = Arc<dyn Fn(&mut Instance, &[Value]) -> ModelResult<Value> + Send + Sync>;

/// Callable attached to a lifecycle event.
#[derive(Clone)]
pub struct Hook(pub HookFn);

impl Hook {
    pub fn call(&self, instance: &mut Instance) -> ModelResult<()> {
        (self.0)(instance)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(<fn>)")
    }
}

/// Callable bound to the items of an entity type.
#[derive(Clone)]
pub struct Method(pub MethodFn);

impl Method {
    pub fn call(&self, instance: &mut Instance, args: &[Value]) -> ModelResult<Value> {
        (self.0)(instance, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Method(<fn>)")
    }
}
