use docstore_model::{ModelError, SnapshotRecord};
use docstore_types::{EntityKey, GenericValue, KeyId};
use pretty_assertions::assert_eq;
use serde_json::json;

fn record(value: serde_json::Value) -> SnapshotRecord {
    serde_json::from_value(value).unwrap()
}

// ── Parsing ──────────────────────────────────────────────────────

#[test]
fn parse_minimal_record() {
    let r = record(json!({"id": "a"}));
    assert_eq!(r.id, "a");
    assert_eq!(r.parent, None);
    assert!(r.data.is_empty());
}

#[test]
fn missing_id_means_new_entity() {
    let e = record(json!({"data": {"n": 1}})).to_entity("ns", "Journey").unwrap();
    assert!(!e.key.is_complete());
    assert_eq!(e.key.kind, "Journey");
    assert_eq!(e.key.namespace, "ns");
}

#[test]
fn numeric_id_becomes_numeric_key() {
    let e = record(json!({"id": "42"})).to_entity("", "Journey").unwrap();
    assert_eq!(e.key.id, Some(KeyId::Id(42)));
}

#[test]
fn parent_pair_builds_ancestor() {
    let e = record(json!({"id": "x", "parent": "Tenant,acme"}))
        .to_entity("ns", "Journey")
        .unwrap();
    let parent = e.key.parent().unwrap();
    assert_eq!(parent.kind, "Tenant");
    assert_eq!(parent.id, Some(KeyId::Name("acme".into())));
    assert_eq!(parent.namespace, "ns");
}

#[test]
fn parent_chain_is_root_first() {
    let e = record(json!({"id": "s", "parent": "Tenant,acme,Journey,42"}))
        .to_entity("ns", "Step")
        .unwrap();
    assert_eq!(e.key.to_string(), "Tenant,acme/Journey,42/Step,s");
}

#[test]
fn empty_parent_is_root() {
    let e = record(json!({"id": "a", "parent": ""})).to_entity("", "K").unwrap();
    assert!(e.key.parent().is_none());
}

#[test]
fn malformed_parent_is_rejected() {
    for parent in ["Tenant", "Tenant,", ",1", "A,1,B"] {
        let err = record(json!({"id": "a", "parent": parent}))
            .to_entity("", "K")
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidParent(_)), "{parent}");
    }
}

#[test]
fn data_is_normalised() {
    let r: SnapshotRecord =
        serde_json::from_str(r#"{"id": "a", "data": {"count": 5.0, "ratio": 0.5}}"#).unwrap();
    let e = r.to_entity("", "K").unwrap();
    assert_eq!(e.get("count"), Some(&GenericValue::Int(5)));
    assert_eq!(e.get("ratio"), Some(&GenericValue::Float(0.5)));
}

// ── Writing ──────────────────────────────────────────────────────

#[test]
fn from_entity_roundtrip() {
    let r = record(json!({
        "id": "s",
        "parent": "Tenant,acme,Journey,42",
        "data": {"addr": {"city": "X"}, "tags": ["a", "b"]}
    }));
    let e = r.to_entity("ns", "Step").unwrap();
    assert_eq!(SnapshotRecord::from_entity(&e), r);
}

#[test]
fn from_entity_omits_parent_and_empty_data() {
    let e = record(json!({"id": "7"})).to_entity("", "K").unwrap();
    let written = serde_json::to_value(SnapshotRecord::from_entity(&e)).unwrap();
    assert_eq!(written, json!({"id": "7"}));
}

#[test]
fn from_entity_of_incomplete_key_has_empty_id() {
    let e = docstore_model::Entity::new(EntityKey::incomplete("K", ""), Default::default());
    assert_eq!(SnapshotRecord::from_entity(&e).id, "");
}

// ── Key checks ──────────────────────────────────────────────────

#[test]
fn ordinary_keys_are_representable() {
    let key = EntityKey::with_id("Step", 3, "ns")
        .with_parent(EntityKey::with_name("Journey", "welcome-flow", "ns"));
    assert!(SnapshotRecord::check_key(&key).is_ok());
    assert!(SnapshotRecord::check_key(&EntityKey::incomplete("Step", "ns")).is_ok());
}

#[test]
fn parent_names_that_break_the_text_form_are_rejected() {
    for name in ["a,b", " padded", "trailing "] {
        let key = EntityKey::with_id("Step", 3, "")
            .with_parent(EntityKey::with_name("Journey", name, ""));
        assert!(
            matches!(
                SnapshotRecord::check_key(&key),
                Err(ModelError::UnrepresentableKey { .. })
            ),
            "{name:?} accepted"
        );
    }
}

#[test]
fn numeric_looking_names_are_rejected() {
    let leaf = EntityKey::with_name("Journey", "42", "");
    assert!(SnapshotRecord::check_key(&leaf).is_err());

    let child = EntityKey::with_id("Step", 1, "").with_parent(leaf);
    let err = SnapshotRecord::check_key(&child).unwrap_err();
    assert!(err.to_string().contains("parent name \"42\""));
}
