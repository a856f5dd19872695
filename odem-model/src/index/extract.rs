use super::{
    IndexDefinition, IndexDescriptor, IndexHandlerRegistry, IndexOpSpec, IndexSpec, ReducerFn,
};
use crate::schema::Schema;
use crate::types::{self, CompareOp, TypeRef};
use std::collections::BTreeSet;
use std::str::FromStr;

/// An index declaration flattened to one operation.
struct Declaration {
    property: String,
    op: Option<String>,
    reducer: Option<ReducerFn>,
    handler: Option<TypeRef>,
    property_type: Option<String>,
}

impl Declaration {
    fn simple(property: &str, op: Option<String>, reducer: Option<ReducerFn>) -> Self {
        Self {
            property: property.to_string(),
            op,
            reducer,
            handler: None,
            property_type: None,
        }
    }
}

fn inline(
    property: &str,
    spec: &IndexSpec,
    out: &mut Vec<Declaration>,
    errors: &mut Vec<String>,
) {
    match spec {
        IndexSpec::Reducer(reducer) => {
            out.push(Declaration::simple(property, None, Some(reducer.clone())));
        }
        IndexSpec::Enabled(true) => out.push(Declaration::simple(property, None, None)),
        IndexSpec::Enabled(false) => {}
        IndexSpec::Op(op) if op.trim().is_empty() => {}
        IndexSpec::Op(op) => out.push(Declaration::simple(property, Some(op.clone()), None)),
        IndexSpec::Ops(ops) => out.extend(
            ops.iter()
                .map(|op| Declaration::simple(property, Some(op.clone()), None)),
        ),
        IndexSpec::Map(ops) => {
            for (op, flag) in ops {
                match flag {
                    IndexOpSpec::Enabled(false) => {}
                    IndexOpSpec::Enabled(true) => {
                        out.push(Declaration::simple(property, Some(op.clone()), None));
                    }
                    IndexOpSpec::Reducer(reducer) => out.push(Declaration::simple(
                        property,
                        Some(op.clone()),
                        Some(reducer.clone()),
                    )),
                }
            }
        }
        IndexSpec::Explicit(explicit) => {
            if explicit
                .property
                .as_deref()
                .is_some_and(|target| target != property)
            {
                errors.push(format!(
                    "index of property {property} must not refer to another property"
                ));
                return;
            }
            out.push(Declaration {
                property: property.to_string(),
                op: explicit.op.clone(),
                reducer: explicit.reducer.clone(),
                handler: explicit.handler,
                property_type: explicit.property_type.clone(),
            });
        }
        IndexSpec::Unsupported(json) => {
            errors.push(format!("invalid index declaration of property {property}: {json}"));
        }
    }
}

fn section(key: &str, spec: &IndexSpec, out: &mut Vec<Declaration>, errors: &mut Vec<String>) {
    match spec {
        IndexSpec::Reducer(reducer) => {
            out.push(Declaration::simple(key, None, Some(reducer.clone())));
        }
        IndexSpec::Enabled(true) => out.push(Declaration::simple(key, None, None)),
        IndexSpec::Enabled(false) => {}
        IndexSpec::Op(op) if op.trim().is_empty() => {}
        IndexSpec::Op(op) => out.push(Declaration::simple(key, Some(op.clone()), None)),
        IndexSpec::Ops(_) | IndexSpec::Map(_) => errors.push(format!(
            "index {key} must declare a single operation, use an explicit declaration per operation"
        )),
        IndexSpec::Explicit(explicit) => out.push(Declaration {
            property: explicit.property.clone().unwrap_or_else(|| key.to_string()),
            op: explicit.op.clone(),
            reducer: explicit.reducer.clone(),
            handler: explicit.handler,
            property_type: explicit.property_type.clone(),
        }),
        IndexSpec::Unsupported(json) => {
            errors.push(format!("invalid declaration of index {key}: {json}"));
        }
    }
}

/// Picks the handler comparing indexed values of `property`.
fn resolve_type(
    declaration: &Declaration,
    own: &Schema,
    base: &Schema,
    errors: &mut Vec<String>,
) -> Option<TypeRef> {
    let name = declaration.property.as_str();
    let prop = own.props.get(name).or_else(|| base.props.get(name));
    let computed = own.computed.get(name).or_else(|| base.computed.get(name));
    if prop.is_none() && computed.is_none() {
        errors.push(format!("index refers to unknown property {name}"));
        return None;
    }

    if let Some(handler) = declaration.handler {
        return Some(handler);
    }
    if let Some(prop) = prop {
        return Some(prop.handler());
    }
    if let Some(handler) = computed.and_then(|def| def.handler) {
        return Some(handler);
    }
    if let Some(type_name) = &declaration.property_type {
        return match types::select_by_name(type_name) {
            Some(handler) => Some(handler),
            None => {
                errors.push(format!("unknown type {type_name} of index on {name}"));
                None
            }
        };
    }
    Some(types::fallback())
}

/// Collects the indices an entity type declares itself, inline on its
/// properties and in its `indices` section.
///
/// Referenced properties are looked up in `own` first, then in `base`.
/// Declaring the same operation twice for one property is an error.
pub fn collect_indices(
    own: &Schema,
    indices: &[(String, IndexSpec)],
    base: &Schema,
    registry: &IndexHandlerRegistry,
    errors: &mut Vec<String>,
) -> Vec<IndexDefinition> {
    let mut declarations = Vec::new();
    for (property, def) in own.props.iter() {
        if let Some(spec) = &def.index {
            inline(property, spec, &mut declarations, errors);
        }
    }
    for (key, spec) in indices {
        section(key, spec, &mut declarations, errors);
    }

    let mut seen = BTreeSet::new();
    let mut definitions = Vec::new();
    for declaration in declarations {
        let op_name = declaration
            .op
            .as_deref()
            .map_or("eq", str::trim)
            .to_ascii_lowercase();
        let op = match CompareOp::from_str(&op_name) {
            Ok(op) if registry.has(op.name()) => op,
            _ => {
                errors.push(format!(
                    "unsupported index type {op_name} on {}",
                    declaration.property
                ));
                continue;
            }
        };

        if !seen.insert((declaration.property.clone(), op)) {
            errors.push(format!(
                "duplicate index {}_{}",
                declaration.property,
                op.name()
            ));
            continue;
        }

        if let Some(handler_type) = resolve_type(&declaration, own, base, errors) {
            definitions.push(IndexDefinition {
                property: declaration.property,
                op,
                handler_type,
                reducer: declaration.reducer,
            });
        }
    }

    definitions
}

/// Handler of a property or typed computed property redeclared by `own`.
fn redeclared_type(property: &str, own: &Schema) -> Option<TypeRef> {
    match own.props.get(property) {
        Some(def) => Some(def.handler()),
        None => own.computed.get(property).and_then(|def| def.handler),
    }
}

/// Merges inherited and own indices and attaches a fresh handler to each.
///
/// An own definition replaces the inherited one with the same property and
/// operation, keeping its position. Reducers and types are not compared.
/// An inherited index on a property redeclared in `own_schema` compares
/// values with the redeclared property's type.
pub fn extract_indices(
    inherited: &[IndexDescriptor],
    own: Vec<IndexDefinition>,
    own_schema: &Schema,
    registry: &IndexHandlerRegistry,
) -> Result<Vec<IndexDescriptor>, String> {
    let mut merged: Vec<IndexDefinition> = inherited
        .iter()
        .map(|descriptor| {
            let mut definition = descriptor.definition.clone();
            if let Some(handler_type) = redeclared_type(&definition.property, own_schema) {
                definition.handler_type = handler_type;
            }
            definition
        })
        .collect();

    for definition in own {
        match merged
            .iter_mut()
            .find(|known| known.property == definition.property && known.op == definition.op)
        {
            Some(known) => *known = definition,
            None => merged.push(definition),
        }
    }

    merged
        .into_iter()
        .map(|definition| -> Result<IndexDescriptor, String> {
            let factory = registry
                .select(definition.op.name())
                .ok_or_else(|| format!("no index handler for {}", definition.op))?;
            let handler = factory.create(&definition);
            Ok(IndexDescriptor {
                definition,
                handler,
            })
        })
        .collect()
}
