use super::{ComputedAccess, ComputedDef, HookFn, MethodFn, PropertyDef};
use crate::error::{ModelError, ModelResult};
use crate::index::IndexSpec;
use crate::instance::Instance;
use odem_types::Value;
use std::fmt;
use std::sync::Arc;

/// A schema as written by its author, before normalization.
///
/// Built either through the builder methods, which can attach code, or from
/// JSON via [`RawSchema::from_json`], which can't. Problems found while
/// reading JSON are kept and reported when the schema is compiled.
#[derive(Clone, Default)]
pub struct RawSchema {
    pub(crate) props: Vec<(String, PropertyDef)>,
    pub(crate) computed: Vec<(String, ComputedDef)>,
    pub(crate) methods: Vec<(String, Option<MethodFn>)>,
    pub(crate) hooks: Vec<(String, Option<HookFn>)>,
    pub(crate) options: Vec<(String, serde_json::Value)>,
    pub(crate) indices: Vec<(String, IndexSpec)>,
    pub(crate) problems: Vec<String>,
}

impl fmt::Debug for RawSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn names<T>(entries: &[(String, T)]) -> Vec<&str> {
            entries.iter().map(|(name, _)| name.as_str()).collect()
        }
        f.debug_struct("RawSchema")
            .field("props", &self.props)
            .field("computed", &self.computed)
            .field("methods", &names(&self.methods))
            .field("hooks", &names(&self.hooks))
            .field("options", &self.options)
            .field("indices", &self.indices)
            .field("problems", &self.problems)
            .finish()
    }
}

impl RawSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a property.
    pub fn prop(mut self, name: impl Into<String>, def: PropertyDef) -> Self {
        self.props.push((name.into(), def));
        self
    }

    /// Declares a computed property. `key` is `name` or `name:type`.
    pub fn computed<F>(self, key: impl Into<String>, code: F) -> Self
    where
        F: Fn(ComputedAccess<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        self.computed_def(key, ComputedDef::new(code))
    }

    pub fn computed_def(mut self, key: impl Into<String>, def: ComputedDef) -> Self {
        self.computed.push((key.into(), def));
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, code: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> ModelResult<Value> + Send + Sync + 'static,
    {
        self.methods.push((name.into(), Some(Arc::new(code))));
        self
    }

    /// Attaches a hook. `name` is a lifecycle event name, optionally
    /// prefixed with `on`.
    pub fn hook<F>(mut self, name: impl Into<String>, code: F) -> Self
    where
        F: Fn(&mut Instance) -> ModelResult<()> + Send + Sync + 'static,
    {
        self.hooks.push((name.into(), Some(Arc::new(code))));
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.push((name.into(), value.into()));
        self
    }

    /// Declares an index in the schema-level `indices` section.
    pub fn index(mut self, name: impl Into<String>, spec: impl Into<IndexSpec>) -> Self {
        self.indices.push((name.into(), spec.into()));
        self
    }

    /// Reads a schema from its JSON form.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|err| ModelError::Config(format!("invalid schema JSON: {err}")))?;
        Ok(Self::from_value(value))
    }

    /// Reads a schema from a parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Self {
        let mut schema = Self::default();
        let serde_json::Value::Object(sections) = value else {
            schema.problems.push("schema must be an object".to_string());
            return schema;
        };

        for (section, entries) in sections {
            if entries.is_null() {
                continue;
            }
            let serde_json::Value::Object(entries) = entries else {
                schema
                    .problems
                    .push(format!("section {section} must be an object"));
                continue;
            };

            match section.as_str() {
                "props" | "properties" => {
                    for (name, def) in entries {
                        schema.read_prop(name, def);
                    }
                }
                "computed" => {
                    for (key, def) in entries {
                        schema.read_computed(key, def);
                    }
                }
                "methods" => schema
                    .methods
                    .extend(entries.into_iter().map(|(name, _)| (name, None))),
                "hooks" => schema
                    .hooks
                    .extend(entries.into_iter().map(|(name, _)| (name, None))),
                "options" => schema.options.extend(entries),
                "indices" | "indexes" | "index" => {
                    for (name, spec) in entries {
                        schema.indices.push((name, IndexSpec::from_section_json(spec)));
                    }
                }
                other => schema.problems.push(format!("unknown section {other}")),
            }
        }

        schema
    }

    fn read_prop(&mut self, name: String, def: serde_json::Value) {
        let def = match def {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            serde_json::Value::String(type_name) => serde_json::json!({ "type": type_name }),
            other => other,
        };
        let serde_json::Value::Object(mut fields) = def else {
            self.problems
                .push(format!("definition of property {name} must be an object"));
            return;
        };

        let index = fields.remove("index");
        match serde_json::from_value::<PropertyDef>(serde_json::Value::Object(fields)) {
            Ok(mut parsed) => {
                parsed.index = index
                    .filter(|spec| !spec.is_null())
                    .map(IndexSpec::from_inline_json);
                self.props.push((name, parsed));
            }
            Err(err) => self
                .problems
                .push(format!("invalid definition of property {name}: {err}")),
        }
    }

    fn read_computed(&mut self, key: String, def: serde_json::Value) {
        let type_name = match &def {
            serde_json::Value::Object(fields) => match fields.get("type") {
                None | Some(serde_json::Value::Null) => None,
                Some(serde_json::Value::String(t)) => Some(t.clone()),
                Some(_) => {
                    self.problems
                        .push(format!("type of computed property {key} must be a string"));
                    return;
                }
            },
            serde_json::Value::String(t) => Some(t.clone()),
            _ => None,
        };
        self.computed.push((
            key,
            ComputedDef {
                type_name,
                ..ComputedDef::default()
            },
        ));
    }
}
