use crate::types::{self, TypeRef};
use odem_types::{PropertyBag, Value};
use std::fmt;
use std::sync::Arc;

/// How a computed property's code is invoked.
pub enum ComputedAccess<'a> {
    /// Derive the value from the item's properties.
    Read(&'a PropertyBag),
    /// Distribute an assigned value onto the item's properties.
    Write(&'a mut PropertyBag, Value),
}

/// Code of a computed property. Returns the value on read; the return
/// value of a write is ignored.
pub type ComputedFn = Arc<dyn Fn(ComputedAccess<'_>) -> Option<Value> + Send + Sync>;

/// Definition of a computed property.
#[derive(Clone, Default)]
pub struct ComputedDef {
    pub code: Option<ComputedFn>,
    pub type_name: Option<String>,
    /// Resolved type handler, `None` for untyped computed properties.
    pub handler: Option<TypeRef>,
}

impl fmt::Debug for ComputedDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedDef")
            .field("code", &self.code.as_ref().map(|_| "<fn>"))
            .field("type_name", &self.type_name)
            .finish()
    }
}

impl ComputedDef {
    pub fn new<F>(code: F) -> Self
    where
        F: Fn(ComputedAccess<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            code: Some(Arc::new(code)),
            ..Self::default()
        }
    }

    pub fn typed(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn is_typed(&self) -> bool {
        self.type_name.is_some()
    }

    /// Handler used for coercion and indexing.
    pub fn handler(&self) -> TypeRef {
        self.handler
            .or_else(|| self.type_name.as_deref().and_then(types::select_by_name))
            .unwrap_or_else(types::fallback)
    }

    /// Reads the value, coerced by the type handler when typed.
    pub fn read(&self, properties: &PropertyBag) -> Value {
        let Some(code) = &self.code else {
            return Value::Null;
        };
        let value = code(ComputedAccess::Read(properties)).unwrap_or_default();
        if self.is_typed() {
            self.handler().coerce(&value, &Default::default(), None)
        } else {
            value
        }
    }

    /// Passes an assigned value to the code.
    pub fn write(&self, properties: &mut PropertyBag, value: Value) {
        if let Some(code) = &self.code {
            code(ComputedAccess::Write(properties, value));
        }
    }
}
