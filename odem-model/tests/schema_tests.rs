use odem_model::schema::{LifecycleHook, OnUnsaved};
use odem_model::{
    ComputedAccess, ComputedDef, EntityType, ModelError, PropertyDef, RawSchema, compile_model,
};
use odem_types::Value;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn definition_errors(result: Result<Arc<EntityType>, ModelError>) -> Vec<String> {
    match result {
        Err(ModelError::Definition { errors, .. }) => errors,
        Err(other) => panic!("expected a definition error, got {other}"),
        Ok(model) => panic!("expected a definition error, got {model:?}"),
    }
}

fn compile(name: &str, schema: RawSchema) -> Vec<String> {
    definition_errors(compile_model(name, schema, None, None))
}

fn with_name() -> RawSchema {
    RawSchema::new().prop("name", PropertyDef::new("string"))
}

// ── Properties ───────────────────────────────────────────────────

#[test]
fn omitted_type_defaults_to_string() {
    let model = compile_model(
        "Note",
        RawSchema::new().prop("title", PropertyDef::default()),
        None,
        None,
    )
    .unwrap();
    let def = model.schema().props.get("title").unwrap();
    assert_eq!(def.type_name(), "string");
    assert_eq!(def.handler().type_name(), "string");
}

#[test]
fn aliases_are_canonicalized() {
    let model = compile_model(
        "Note",
        RawSchema::new().prop("size", PropertyDef::new("INT")),
        None,
        None,
    )
    .unwrap();
    assert_eq!(model.schema().props.get("size").unwrap().type_name(), "integer");
}

#[test]
fn unknown_type_is_reported() {
    let errors = compile("Note", RawSchema::new().prop("price", PropertyDef::new("money")));
    assert_eq!(errors, vec!["unknown type money of property price"]);
}

#[test]
fn non_derived_type_needs_properties() {
    let errors = compile("Empty", RawSchema::new());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("missing definition of any actual property"));
}

#[test]
fn derived_type_may_omit_properties() {
    let base = compile_model("Base", with_name(), None, None).unwrap();
    let derived = compile_model("Derived", RawSchema::new(), Some(base), None).unwrap();
    assert!(derived.schema().props.contains("name"));
}

#[test]
fn default_values_are_coerced() {
    let model = compile_model(
        "Note",
        RawSchema::new().prop("size", PropertyDef::new("integer").with_default("7.2")),
        None,
        None,
    )
    .unwrap();
    let def = model.schema().props.get("size").unwrap();
    assert_eq!(def.default, Some(Value::Integer(7)));
}

#[test]
fn invalid_default_is_reported() {
    let errors = compile(
        "Note",
        RawSchema::new().prop("size", PropertyDef::new("integer").with_default("many")),
    );
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("invalid default"));
}

#[test]
fn type_constraint_problems_are_prefixed_with_property() {
    let errors = compile(
        "Note",
        RawSchema::new().prop("code", PropertyDef::new("string").upper_case().lower_case()),
    );
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("property code:"));
}

#[test]
fn declaration_order_is_kept() {
    let model = compile_model(
        "Note",
        RawSchema::new()
            .prop("z", PropertyDef::default())
            .prop("a", PropertyDef::default())
            .prop("m", PropertyDef::default()),
        None,
        None,
    )
    .unwrap();
    let names: Vec<&str> = model.schema().props.names().collect();
    assert_eq!(names, vec!["z", "a", "m"]);
}

// ── Names ────────────────────────────────────────────────────────

#[test]
fn property_and_method_share_namespace() {
    let errors = compile(
        "Note",
        RawSchema::new()
            .prop("a", PropertyDef::default())
            .method("a", |_, _| Ok(Value::Null)),
    );
    assert_eq!(errors, vec!["duplicate name a"]);
}

#[test]
fn property_and_computed_share_namespace() {
    let errors = compile(
        "Note",
        RawSchema::new()
            .prop("a", PropertyDef::default())
            .computed("a", |_| None),
    );
    assert_eq!(errors, vec!["duplicate name a"]);
}

#[test]
fn reserved_names_are_rejected() {
    for name in ["uuid", "constructor", "prototype", "super"] {
        let errors = compile("Note", with_name().prop(name, PropertyDef::default()));
        assert_eq!(errors.len(), 1, "{name}");
        assert!(errors[0].starts_with("reserved name"), "{name}");
    }
}

#[test]
fn dollar_prefix_is_rejected() {
    let errors = compile("Note", with_name().prop("$secret", PropertyDef::default()));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("must not start with $"));
}

#[test]
fn non_identifiers_are_rejected() {
    let errors = compile("Note", with_name().prop("two words", PropertyDef::default()));
    assert_eq!(errors.len(), 1);
}

#[test]
fn hook_names_are_not_members() {
    let errors = compile(
        "Note",
        with_name()
            .prop("afterLoad", PropertyDef::default())
            .method("beforeSave", |_, _| Ok(Value::Null))
            .method("onBeforeRemove", |_, _| Ok(Value::Null)),
    );
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|e| e.contains("lifecycle hook name")));
}

#[test]
fn cross_section_collision_with_inherited_member() {
    let base = compile_model(
        "Base",
        with_name().method("greet", |_, _| Ok(Value::Null)),
        None,
        None,
    )
    .unwrap();
    let errors = definition_errors(compile_model(
        "Derived",
        RawSchema::new().prop("greet", PropertyDef::default()),
        Some(base),
        None,
    ));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("duplicate name greet"));
}

#[test]
fn invalid_model_name() {
    let errors = compile("1st-model", with_name());
    assert_eq!(errors, vec![r#"invalid model name "1st-model""#]);
}

#[test]
fn all_problems_are_reported_at_once() {
    let errors = compile(
        "Note",
        RawSchema::new()
            .prop("a", PropertyDef::new("money"))
            .prop("uuid", PropertyDef::default())
            .hook("beforeFly", |_| Ok(())),
    );
    assert_eq!(errors.len(), 3);

    let err = compile_model("Note", RawSchema::new().prop("a", PropertyDef::new("money")), None, None)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid definition of model Note: unknown type money of property a"
    );
}

// ── Merge ────────────────────────────────────────────────────────

#[test]
fn derived_property_overrides_base_without_touching_it() {
    let root = compile_model("Root", with_name(), None, None).unwrap();
    let sub = compile_model(
        "Sub",
        RawSchema::new().prop("name", PropertyDef::new("integer")),
        Some(Arc::clone(&root)),
        None,
    )
    .unwrap();

    assert_eq!(sub.schema().props.get("name").unwrap().type_name(), "integer");
    assert_eq!(root.schema().props.get("name").unwrap().type_name(), "string");
}

#[test]
fn inherited_members_stay_visible() {
    let base = compile_model(
        "Base",
        with_name()
            .computed("label", |_| Some(Value::from("x")))
            .method("greet", |_, _| Ok(Value::Null))
            .hook("beforeSave", |_| Ok(())),
        None,
        None,
    )
    .unwrap();
    let derived = compile_model(
        "Derived",
        RawSchema::new().prop("age", PropertyDef::new("integer")),
        Some(base),
        None,
    )
    .unwrap();

    let schema = derived.schema();
    assert!(schema.props.contains("name"));
    assert!(schema.props.contains("age"));
    assert!(schema.computed.contains("label"));
    assert!(schema.methods.contains("greet"));
    assert!(derived.hook(LifecycleHook::BeforeSave).is_some());
    assert!(derived.accessors().contains("greet"));
    assert!(derived.accessors().contains("beforeSave"));
}

// ── Computed properties ──────────────────────────────────────────

#[test]
fn computed_key_may_carry_type() {
    let model = compile_model(
        "Note",
        with_name()
            .computed("length:integer", |_| Some(Value::from(3)))
            .computed_def(
                "ratio:integer",
                ComputedDef::new(|_| Some(Value::from(0.5))).typed("number"),
            )
            .computed("raw", |_| None),
        None,
        None,
    )
    .unwrap();

    let computed = &model.schema().computed;
    assert_eq!(computed.get("length").unwrap().type_name.as_deref(), Some("integer"));
    assert_eq!(computed.get("ratio").unwrap().type_name.as_deref(), Some("number"));
    assert!(!computed.get("raw").unwrap().is_typed());
}

#[test]
fn computed_reads_and_writes_through_code() {
    let def = ComputedDef::new(|access| match access {
        ComputedAccess::Read(props) => props.get("name").cloned(),
        ComputedAccess::Write(props, value) => {
            props.insert("name".to_string(), value);
            None
        }
    });
    let mut props = odem_types::PropertyBag::new();
    def.write(&mut props, Value::from("Ada"));
    assert_eq!(def.read(&props), Value::from("Ada"));
}

// ── Hooks and options ────────────────────────────────────────────

#[test]
fn hooks_accept_on_prefixed_alias() {
    let model = compile_model(
        "Note",
        with_name().hook("onBeforeSave", |_| Ok(())),
        None,
        None,
    )
    .unwrap();
    assert!(model.hook(LifecycleHook::BeforeSave).is_some());
    assert!(model.static_hook(LifecycleHook::BeforeSave).is_none());
}

#[test]
fn hook_declared_twice_is_rejected() {
    let errors = compile(
        "Note",
        with_name()
            .hook("beforeSave", |_| Ok(()))
            .hook("onBeforeSave", |_| Ok(())),
    );
    assert_eq!(errors, vec!["duplicate hook beforeSave"]);
}

#[test]
fn unknown_hook_is_rejected() {
    let errors = compile("Note", with_name().hook("beforeFly", |_| Ok(())));
    assert_eq!(errors, vec!["unknown lifecycle hook beforeFly"]);
}

#[test]
fn hook_table_is_instance_bound() {
    assert_eq!(LifecycleHook::ALL.len(), 10);
    for hook in LifecycleHook::ALL {
        assert_eq!(hook.binding(), odem_model::schema::HookBinding::Instance);
        assert_eq!(LifecycleHook::from_name(hook.name()), Some(hook));
    }
    assert_eq!(LifecycleHook::from_name("onAfterRemove"), Some(LifecycleHook::AfterRemove));
    assert_eq!(LifecycleHook::from_name("afterDinner"), None);
}

#[test]
fn hook_names_are_case_sensitive() {
    assert_eq!(LifecycleHook::from_name("BEFORESAVE"), None);
    assert_eq!(LifecycleHook::from_name("beforesave"), None);
    assert_eq!(LifecycleHook::from_name("onbeforeSave"), None);
    assert_eq!(LifecycleHook::from_name("onBeforeSave"), Some(LifecycleHook::BeforeSave));

    let errors = compile("Note", with_name().hook("BEFORESAVE", |_| Ok(())));
    assert_eq!(errors, vec!["unknown lifecycle hook BEFORESAVE"]);

    let model = compile_model(
        "Note",
        with_name().method("BEFORESAVE", |_, _| Ok(Value::Null)),
        None,
        None,
    )
    .unwrap();
    assert!(model.accessors().contains("BEFORESAVE"));
}

#[test]
fn on_unsaved_is_case_insensitive() {
    let model = compile_model("Note", with_name().option("onUnsaved", "WARN"), None, None).unwrap();
    assert_eq!(model.on_unsaved(), OnUnsaved::Warn);
}

#[test]
fn on_unsaved_defaults_to_fail() {
    let model = compile_model("Note", with_name(), None, None).unwrap();
    assert_eq!(model.on_unsaved(), OnUnsaved::Fail);
}

#[test]
fn on_unsaved_rejects_unknown_policies() {
    assert_eq!(compile("Note", with_name().option("onUnsaved", "sometimes")).len(), 1);
    assert_eq!(compile("Note", with_name().option("onUnsaved", 3)).len(), 1);
}

#[test]
fn unknown_options_are_kept() {
    let model = compile_model("Note", with_name().option("label", "Notes"), None, None).unwrap();
    assert_eq!(
        model.schema().options.extra.get("label"),
        Some(&serde_json::Value::from("Notes"))
    );
}

// ── JSON schemas ─────────────────────────────────────────────────

#[test]
fn json_schema_compiles() {
    let schema = RawSchema::from_json(
        r#"{
            "properties": {
                "name": {"type": "string", "required": true, "maxLength": 20},
                "height": {"type": "integer", "min": 50, "index": true},
                "nick": null
            },
            "computed": {"label:string": {}},
            "options": {"onUnsaved": "ignore"},
            "indexes": {"name": "lt"}
        }"#,
    )
    .unwrap();

    // computed entries from JSON carry no code
    let errors = compile("Person", schema);
    assert_eq!(errors, vec!["missing code of computed property label"]);
}

#[test]
fn json_schema_without_code_compiles() {
    let schema = RawSchema::from_json(
        r#"{
            "props": {
                "name": {"type": "string", "required": true, "maxLength": 20},
                "height": {"type": "integer", "min": 50, "index": true},
                "nick": null
            },
            "options": {"onUnsaved": "ignore"},
            "indices": {"name": "lt"}
        }"#,
    )
    .unwrap();
    let model = compile_model("Person", schema, None, None).unwrap();

    let name = model.schema().props.get("name").unwrap();
    assert!(name.required);
    assert_eq!(name.max_length, Some(20));
    assert_eq!(model.schema().props.get("nick").unwrap().type_name(), "string");
    assert_eq!(model.on_unsaved(), OnUnsaved::Ignore);
    assert_eq!(model.indices().len(), 2);
}

#[test]
fn json_properties_keep_declaration_order() {
    let schema = RawSchema::from_json(
        r#"{
            "props": {"zeta": {}, "alpha": {"type": "integer"}, "mid": null},
            "indices": {"zeta": "gt", "alpha": true}
        }"#,
    )
    .unwrap();
    let model = compile_model("Sorted", schema, None, None).unwrap();

    assert_eq!(
        model.pipelines().properties().collect::<Vec<_>>(),
        vec!["zeta", "alpha", "mid"]
    );
    assert_eq!(
        model.schema().props.names().collect::<Vec<_>>(),
        vec!["zeta", "alpha", "mid"]
    );
    assert_eq!(
        model.indices().iter().map(|i| i.key()).collect::<Vec<_>>(),
        vec!["zeta_gt", "alpha_eq"]
    );
}

#[test]
fn json_methods_and_hooks_are_not_callable() {
    let schema = RawSchema::from_json(
        r#"{"props": {"a": {}}, "methods": {"run": "x"}, "hooks": {"beforeSave": true}}"#,
    )
    .unwrap();
    let errors = compile("Note", schema);
    assert_eq!(
        errors,
        vec!["method run is not a function", "hook beforeSave is not a function"]
    );
}

#[test]
fn json_unknown_section_is_reported() {
    let schema = RawSchema::from_json(r#"{"props": {"a": {}}, "relations": {}}"#).unwrap();
    assert_eq!(compile("Note", schema), vec!["unknown section relations"]);
}

#[test]
fn json_syntax_error_is_a_config_error() {
    assert!(matches!(
        RawSchema::from_json("{props"),
        Err(ModelError::Config(_))
    ));
}
