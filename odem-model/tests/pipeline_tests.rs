use chrono::{TimeZone, Utc};
use odem_model::schema::{PropertyDef, Section};
use odem_model::types::Capabilities;
use odem_model::{Pipelines, RawSchema, compile_model};
use odem_types::{ItemId, PropertyBag, Record, Value};
use pretty_assertions::assert_eq;

fn pipelines() -> Pipelines {
    let model = compile_model(
        "Event",
        RawSchema::new()
            .prop("title", PropertyDef::new("string").trimmed().required())
            .prop("seats", PropertyDef::new("integer").with_min(1).with_default(10))
            .prop("starts", PropertyDef::new("date"))
            .prop("venue", PropertyDef::new("uuid"))
            .prop("public", PropertyDef::new("boolean")),
        None,
        None,
    )
    .unwrap();
    model.pipelines().clone()
}

fn bag(entries: &[(&str, Value)]) -> PropertyBag {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

// ── Coercion ─────────────────────────────────────────────────────

#[test]
fn coerce_covers_every_property_in_declaration_order() {
    let p = pipelines();
    assert_eq!(
        p.properties().collect::<Vec<_>>(),
        vec!["title", "seats", "starts", "venue", "public"]
    );

    let mut props = bag(&[("title", Value::from("  Launch ")), ("public", Value::from("yes"))]);
    p.coerce(&mut props, None);

    assert_eq!(props.len(), 5);
    assert_eq!(props["title"], Value::from("Launch"));
    assert_eq!(props["seats"], Value::Null);
    assert_eq!(props["public"], Value::Bool(true));
}

#[test]
fn coerce_uses_default_provider() {
    let p = pipelines();
    let mut props = PropertyBag::new();
    let defaults = |_: &str, def: &PropertyDef| def.default.clone();
    p.coerce(&mut props, Some(&defaults));
    assert_eq!(props["seats"], Value::Integer(10));
    assert_eq!(props["title"], Value::Null);
}

#[test]
fn coerce_keeps_unknown_keys() {
    let p = pipelines();
    let mut props = bag(&[("extra", Value::from(1))]);
    p.coerce(&mut props, None);
    assert_eq!(props["extra"], Value::from(1));
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn validate_collects_all_violations() {
    let p = pipelines();
    let mut props = bag(&[("seats", Value::from(0))]);
    p.coerce(&mut props, None);

    let errors: Vec<String> = p.validate(&props).iter().map(ToString::to_string).collect();
    assert_eq!(errors, vec!["title is required", "seats must be at least 1"]);
}

#[test]
fn validate_appends_to_existing_errors() {
    let p = pipelines();
    let mut errors = vec![odem_model::ValidationError::new("other", "is odd")];
    p.validate_into(&PropertyBag::new(), &mut errors);
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].property, "other");
    assert_eq!(errors[1].property, "title");
}

// ── Serialization ────────────────────────────────────────────────

#[test]
fn serialize_drops_unknown_keys_and_fills_missing() {
    let p = pipelines();
    let props = bag(&[("title", Value::from("Launch")), ("extra", Value::from(1))]);
    let record = p.serialize(&props, Capabilities::TEXT);

    assert!(!record.contains_key("extra"));
    assert_eq!(record.len(), 5);
    assert_eq!(record["title"], Value::from("Launch"));
    assert_eq!(record["seats"], Value::Null);
}

#[test]
fn serialize_uses_storage_representations() {
    let p = pipelines();
    let venue = ItemId::new();
    let mut props = bag(&[
        ("title", Value::from("Launch")),
        ("starts", Value::from("2024-05-01T18:30:00Z")),
        ("venue", Value::from(venue)),
    ]);
    p.coerce(&mut props, None);

    let text = p.serialize(&props, Capabilities::TEXT);
    assert_eq!(text["starts"], Value::from("2024-05-01T18:30:00.000Z"));
    assert_eq!(text["venue"], Value::from(venue.to_string()));

    let binary = p.serialize(&props, Capabilities::BINARY);
    assert_eq!(binary["venue"], Value::Binary(venue.as_bytes().to_vec()));
}

#[test]
fn deserialize_restores_native_values() {
    let p = pipelines();
    let venue = ItemId::new();
    let record: Record = bag(&[
        ("title", Value::from(" Launch ")),
        ("seats", Value::from(5)),
        ("starts", Value::from("2024-05-01T18:30:00.000Z")),
        ("venue", Value::from(venue.to_string())),
        ("public", Value::Bool(false)),
    ]);

    let props = p.deserialize(&record);
    assert_eq!(props["title"], Value::from("Launch"));
    assert_eq!(props["seats"], Value::Integer(5));
    assert_eq!(
        props["starts"],
        Value::Date(Utc.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap())
    );
    assert_eq!(props["venue"], Value::from(venue));
    assert_eq!(props["public"], Value::Bool(false));
}

#[test]
fn deserialize_ignores_defaults() {
    let p = pipelines();
    let props = p.deserialize(&Record::new());
    assert_eq!(props["seats"], Value::Null);
}

#[test]
fn round_trip_through_both_capabilities() {
    let p = pipelines();
    let mut props = bag(&[
        ("title", Value::from("Launch")),
        ("seats", Value::from(3)),
        ("starts", Value::from("2024-05-01")),
        ("venue", Value::from(ItemId::new())),
        ("public", Value::Bool(true)),
    ]);
    p.coerce(&mut props, None);

    for caps in [Capabilities::TEXT, Capabilities::BINARY] {
        let back = p.deserialize(&p.serialize(&props, caps));
        assert_eq!(back, props);
    }
}

#[test]
fn pipelines_compile_from_section_alone() {
    let mut props = Section::new();
    props.insert("n", PropertyDef::new("number"));
    let p = Pipelines::compile(&props);

    let mut bag = bag(&[("n", Value::from("2.5"))]);
    p.coerce(&mut bag, None);
    assert_eq!(bag["n"], Value::Number(2.5));
}
