use crate::index::IndexSpec;
use crate::types::{self, TypeRef};
use odem_types::Value;
use regex::Regex;
use serde::Deserialize;

/// Definition of one stored property.
///
/// Deserializes from the JSON form of a schema, e.g.
/// `{"type": "integer", "min": 50, "required": true}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyDef {
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Resolved type handler, set during normalization.
    #[serde(skip)]
    pub handler: Option<TypeRef>,
    pub required: bool,
    pub default: Option<Value>,
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub step: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    /// Compiled `pattern`.
    #[serde(skip)]
    pub matcher: Option<Regex>,
    pub trim: bool,
    pub reduce_space: bool,
    pub upper_case: bool,
    pub lower_case: bool,
    /// Inline index declaration.
    #[serde(skip)]
    pub index: Option<IndexSpec>,
}

impl PropertyDef {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    /// Name of the property's type, `string` when omitted.
    pub fn type_name(&self) -> &str {
        self.type_name.as_deref().unwrap_or("string")
    }

    /// The resolved handler, or a lookup by type name before normalization.
    pub fn handler(&self) -> TypeRef {
        self.handler
            .or_else(|| types::select_by_name(self.type_name()))
            .unwrap_or_else(types::fallback)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_min(mut self, value: impl Into<Value>) -> Self {
        self.min = Some(value.into());
        self
    }

    pub fn with_max(mut self, value: impl Into<Value>) -> Self {
        self.max = Some(value.into());
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    pub fn with_max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }

    pub fn reduce_space(mut self) -> Self {
        self.reduce_space = true;
        self
    }

    pub fn upper_case(mut self) -> Self {
        self.upper_case = true;
        self
    }

    pub fn lower_case(mut self) -> Self {
        self.lower_case = true;
        self
    }

    pub fn with_index(mut self, index: impl Into<IndexSpec>) -> Self {
        self.index = Some(index.into());
        self
    }
}
