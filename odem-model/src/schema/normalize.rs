use super::{
    ComputedDef, Hook, LifecycleHook, Method, OnUnsaved, PropertyDef, RawSchema, Schema,
};
use crate::index::IndexSpec;
use crate::types;
use std::collections::BTreeSet;
use std::str::FromStr;

const RESERVED: [&str; 4] = ["super", "prototype", "constructor", "uuid"];

/// Tests whether `name` is a keyword-shaped identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Own sections of one entity type after normalization.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub schema: Schema,
    /// The schema-level `indices` section, resolved by the index extractor.
    pub indices: Vec<(String, IndexSpec)>,
}

struct Names<'a> {
    base: &'a Schema,
    seen: BTreeSet<String>,
}

impl Names<'_> {
    /// Checks a name of the shared property/computed/method namespace.
    fn check(&mut self, section: &'static str, name: &str, errors: &mut Vec<String>) -> bool {
        let problem = if name.starts_with('$') {
            Some(format!("invalid name {name} in {section}: must not start with $"))
        } else if !is_identifier(name) {
            Some(format!("invalid name {name:?} in {section}"))
        } else if RESERVED.contains(&name) {
            Some(format!("reserved name {name} in {section}"))
        } else if LifecycleHook::from_name(name).is_some() {
            Some(format!(
                "{name} in {section} is a lifecycle hook name, declare it in hooks"
            ))
        } else if !self.seen.insert(name.to_string()) {
            Some(format!("duplicate name {name}"))
        } else {
            match self.base.section_of(name) {
                Some(inherited) if inherited != section => Some(format!(
                    "duplicate name {name}: {section} collides with inherited {inherited}"
                )),
                _ => None,
            }
        };

        match problem {
            Some(problem) => {
                errors.push(problem);
                false
            }
            None => true,
        }
    }
}

/// Checks and canonicalizes `raw` into the own sections of the entity type
/// `name` deriving from a type with schema `base`.
///
/// Problems are appended to `errors`. The returned structure is complete
/// as far as possible so later stages can keep inspecting it.
pub fn normalize_schema(
    name: &str,
    raw: RawSchema,
    base: &Schema,
    is_derived: bool,
    errors: &mut Vec<String>,
) -> Normalized {
    errors.extend(raw.problems);

    let mut names = Names {
        base,
        seen: BTreeSet::new(),
    };
    let mut schema = Schema::default();

    if !is_derived && raw.props.is_empty() {
        errors.push(format!(
            "missing definition of any actual property in model {name}"
        ));
    }

    for (prop, def) in raw.props {
        if let Some(def) = normalize_property(&prop, def, errors) {
            if names.check("props", &prop, errors) {
                schema.props.insert(prop, def);
            }
        }
    }

    for (key, def) in raw.computed {
        let (prop, def) = normalize_computed(&key, def, errors);
        if names.check("computed", &prop, errors) {
            schema.computed.insert(prop, def);
        }
    }

    for (method, code) in raw.methods {
        if !names.check("methods", &method, errors) {
            continue;
        }
        match code {
            Some(code) => {
                schema.methods.insert(method, Method(code));
            }
            None => errors.push(format!("method {method} is not a function")),
        }
    }

    for (key, code) in raw.hooks {
        let Some(hook) = LifecycleHook::from_name(&key) else {
            errors.push(format!("unknown lifecycle hook {key}"));
            continue;
        };
        let Some(code) = code else {
            errors.push(format!("hook {key} is not a function"));
            continue;
        };
        if schema.hooks.insert(hook, Hook(code)).is_some() {
            errors.push(format!("duplicate hook {hook}"));
        }
    }

    for (option, value) in raw.options {
        if option == "onUnsaved" {
            match &value {
                serde_json::Value::Null => {}
                serde_json::Value::String(policy) => match OnUnsaved::from_str(policy) {
                    Ok(policy) => schema.options.on_unsaved = Some(policy),
                    Err(err) => errors.push(err),
                },
                other => errors.push(format!("invalid onUnsaved policy: {other}")),
            }
        } else {
            schema.options.extra.insert(option, value);
        }
    }

    Normalized {
        schema,
        indices: raw.indices,
    }
}

fn normalize_property(
    name: &str,
    mut def: PropertyDef,
    errors: &mut Vec<String>,
) -> Option<PropertyDef> {
    let type_name = def.type_name().to_string();
    let Some(handler) = types::select_by_name(&type_name) else {
        errors.push(format!("unknown type {type_name} of property {name}"));
        return None;
    };
    def.type_name = Some(handler.type_name().to_string());
    def.handler = Some(handler);

    let problems = handler.check_definition(&mut def);
    errors.extend(
        problems
            .into_iter()
            .map(|problem| format!("property {name}: {problem}")),
    );

    if let Some(default) = def.default.take() {
        match handler.coerce(&default, &def, None) {
            coerced if coerced.is_invalid() => {
                errors.push(format!("property {name}: invalid default value {default:?}"));
            }
            coerced if coerced.is_null() => {}
            coerced => def.default = Some(coerced),
        }
    }

    Some(def)
}

fn normalize_computed(
    key: &str,
    mut def: ComputedDef,
    errors: &mut Vec<String>,
) -> (String, ComputedDef) {
    let (name, embedded) = match key.split_once(':') {
        Some((name, type_name)) => (name.trim(), Some(type_name.trim())),
        None => (key.trim(), None),
    };

    let type_name = def
        .type_name
        .take()
        .or_else(|| embedded.filter(|t| !t.is_empty()).map(str::to_string));
    if let Some(type_name) = type_name {
        match types::select_by_name(&type_name) {
            Some(handler) => {
                def.type_name = Some(handler.type_name().to_string());
                def.handler = Some(handler);
            }
            None => errors.push(format!(
                "unknown type {type_name} of computed property {name}"
            )),
        }
    }

    if def.code.is_none() {
        errors.push(format!("missing code of computed property {name}"));
    }

    (name.to_string(), def)
}
