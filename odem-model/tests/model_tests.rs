mod common;

use odem_model::types::CompareOp;
use odem_model::{CompileContext, EntityType, Instance, ModelError, OnUnsaved, PropertyDef, RawSchema, compile_model, compile_with};
use odem_storage::StorageAdapter;
use odem_types::{ItemId, Value};
use pretty_assertions::assert_eq;
use std::sync::Arc;

// ── Identity and keys ────────────────────────────────────────────

#[test]
fn root_type_is_the_default_base() {
    let model = common::person(common::memory());
    let root = EntityType::root();
    assert!(root.is_root());
    assert!(!model.is_root());
    assert!(model.derives_from_type(&root));
    assert_eq!(model.derives_from().unwrap().name(), "Model");
}

#[test]
fn derivation_chain_is_transitive() {
    let base = common::person(common::memory());
    let mid = compile_model("Employee", RawSchema::new(), Some(Arc::clone(&base)), None).unwrap();
    let leaf = compile_model("Manager", RawSchema::new(), Some(Arc::clone(&mid)), None).unwrap();

    assert!(leaf.derives_from_type(&mid));
    assert!(leaf.derives_from_type(&base));
    assert!(leaf.derives_from_type(&EntityType::root()));
    assert!(!base.derives_from_type(&leaf));
}

#[test]
fn data_key_substitutes_uuid() {
    let model = common::person(common::memory());
    let id = ItemId::parse("4a8f4c1e-3b0f-4d5e-9c1a-7e2b3c4d5e6f").unwrap();
    assert_eq!(
        model.data_key(id),
        "models/Person/items/4a8f4c1e-3b0f-4d5e-9c1a-7e2b3c4d5e6f"
    );
    assert_eq!(model.items_prefix(), "models/Person/items");
    assert_eq!(model.key_to_uuid(&model.data_key(id)), Some(id));
    assert_eq!(model.key_to_uuid("models/Other/items/4a8f4c1e-3b0f-4d5e-9c1a-7e2b3c4d5e6f"), None);
    assert_eq!(model.key_to_uuid("models/Person/items/nope"), None);
}

#[test]
fn compile_context_sets_prefix_and_policy() {
    let context = CompileContext {
        data_prefix: "tenant/a".to_string(),
        on_unsaved: OnUnsaved::Warn,
        adapter: common::memory(),
    };
    let model = compile_with(
        &context,
        "Note",
        RawSchema::new().prop("title", PropertyDef::default()),
        None,
        None,
    )
    .unwrap();

    let id = ItemId::new();
    assert_eq!(model.data_key(id), format!("tenant/a/Note/items/{id}"));
    assert_eq!(model.on_unsaved(), OnUnsaved::Warn);
    assert!(Arc::ptr_eq(model.adapter(), &context.adapter));
}

#[test]
fn explicit_adapter_beats_default() {
    let adapter = common::text_memory();
    let model = common::person(Arc::clone(&adapter));
    assert!(Arc::ptr_eq(model.adapter(), &adapter));
    assert!(!model.adapter().supports_binary());
}

// ── Observed adapter ─────────────────────────────────────────────

#[test]
fn observed_adapter_binds_once() {
    let model = common::person(common::memory());
    assert!(Arc::ptr_eq(&model.observed_adapter(), model.adapter()));

    let observed = common::memory();
    model.observe_adapter(Arc::clone(&observed)).unwrap();
    assert!(Arc::ptr_eq(&model.observed_adapter(), &observed));

    let err = model.observe_adapter(common::memory()).unwrap_err();
    assert!(matches!(err, ModelError::AdapterBound { ref model } if model == "Person"));
    assert!(Arc::ptr_eq(&model.observed_adapter(), &observed));
}

// ── Pipeline bindings ────────────────────────────────────────────

#[test]
fn pipeline_bindings_follow_the_merged_schema() {
    let base = common::person(common::memory());
    let derived = compile_model(
        "Athlete",
        RawSchema::new().prop("sport", PropertyDef::new("string").lower_case()),
        Some(base),
        None,
    )
    .unwrap();

    let mut bag = odem_types::PropertyBag::new();
    bag.insert("height".into(), Value::from("180.2"));
    bag.insert("sport".into(), Value::from("Rowing"));
    derived.coerce_properties(&mut bag, None);
    assert_eq!(bag["height"], Value::Integer(180));
    assert_eq!(bag["sport"], Value::from("rowing"));

    let mut errors = Vec::new();
    derived.validate_properties(&bag, &mut errors);
    assert!(errors.is_empty());

    let record = derived.serialize_properties(&bag, odem_model::types::Capabilities::TEXT);
    assert_eq!(derived.deserialize_properties(&record), bag);
}

// ── Indices ──────────────────────────────────────────────────────

#[test]
fn find_by_index_requires_declared_index() {
    let model = common::person(common::memory());
    let err = model
        .find_by_index("height", CompareOp::Eq, &[Value::from(1)])
        .unwrap_err();
    assert!(matches!(err, ModelError::Index(_)));
}

#[test]
fn find_by_index_checks_operands() {
    let model = compile_model(
        "Box",
        RawSchema::new().prop("size", PropertyDef::new("integer").with_index("between")),
        None,
        Some(common::memory()),
    )
    .unwrap();
    let err = model
        .find_by_index("size", CompareOp::Between, &[Value::from(1)])
        .unwrap_err();
    assert!(matches!(err, ModelError::Index(_)));
}

#[tokio::test]
async fn index_existing_rebuilds_from_storage() {
    common::init_tracing();
    let adapter = common::memory();
    let schema = || {
        RawSchema::new()
            .prop("name", PropertyDef::default())
            .prop("height", PropertyDef::new("integer").with_index("gte"))
    };
    let writer = compile_model("Climber", schema(), None, Some(Arc::clone(&adapter))).unwrap();
    for height in [150, 170, 190] {
        let mut item = Instance::new(Arc::clone(&writer));
        item.set("height", height).unwrap();
        item.save().await.unwrap();
    }

    // a second type over the same records starts with empty indices
    let reader = compile_model("Climber", schema(), None, Some(Arc::clone(&adapter))).unwrap();
    assert!(reader
        .find_by_index("height", CompareOp::Gte, &[Value::from(160)])
        .unwrap()
        .is_empty());

    assert_eq!(reader.index_existing().await.unwrap(), 3);
    let tall = reader
        .find_by_index("height", CompareOp::Gte, &[Value::from(160)])
        .unwrap();
    assert_eq!(tall.len(), 2);
}

#[tokio::test]
async fn index_existing_reads_observed_adapter() {
    let own = common::memory();
    let observed = common::memory();
    let model = compile_model(
        "Pin",
        RawSchema::new().prop("code", PropertyDef::default().with_index(true)),
        None,
        Some(Arc::clone(&own)),
    )
    .unwrap();

    let id = ItemId::new();
    let mut record = odem_types::Record::new();
    record.insert("code".into(), Value::from("A1"));
    observed.write(&model.data_key(id), &record).await.unwrap();
    observed.write("models/Pin/other", &record).await.unwrap();

    model.observe_adapter(observed).unwrap();
    assert_eq!(model.index_existing().await.unwrap(), 1);
    assert_eq!(
        model
            .find_by_index("code", CompareOp::Eq, &[Value::from("A1")])
            .unwrap(),
        vec![id]
    );
}
