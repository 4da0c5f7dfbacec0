use docstore_model::{Entity, IdentityStrategy, ModelError};
use docstore_types::{EntityKey, GenericValue};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn entity_with(key: EntityKey, props: &[(&str, GenericValue)]) -> Entity {
    Entity::new(
        key,
        props
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn step_key() -> EntityKey {
    let tenant = EntityKey::with_name("Tenant", "acme", "ns");
    let journey = EntityKey::with_id("Journey", 42, "ns").with_parent(tenant);
    EntityKey::with_name("Step", "intro", "ns").with_parent(journey)
}

// ── Token parsing ────────────────────────────────────────────────

#[test]
fn parse_tokens() {
    assert_eq!(IdentityStrategy::from_token("key").unwrap(), IdentityStrategy::ByKey);
    assert_eq!(
        IdentityStrategy::from_token("property:slug").unwrap(),
        IdentityStrategy::ByProperty("slug".into())
    );
    assert_eq!(
        IdentityStrategy::from_token("parent:Journey").unwrap(),
        IdentityStrategy::ByParent("Journey".into())
    );
}

#[test]
fn parse_rejects_unknown_or_empty_tokens() {
    for token in ["", "keys", "property:", "parent:", "name:x", "property"] {
        assert!(
            matches!(
                IdentityStrategy::from_token(token),
                Err(ModelError::InvalidIdentityToken(_))
            ),
            "token {token:?} should be rejected"
        );
    }
}

#[test]
fn token_roundtrip_via_from_str() {
    for token in ["key", "property:a", "parent:B"] {
        let strategy: IdentityStrategy = token.parse().unwrap();
        assert_eq!(strategy.to_string(), token);
    }
}

#[test]
fn default_is_by_key() {
    assert_eq!(IdentityStrategy::default(), IdentityStrategy::ByKey);
}

// ── ByKey ────────────────────────────────────────────────────────

#[test]
fn by_key_returns_leaf_identifier() {
    let e = entity_with(step_key(), &[]);
    assert_eq!(IdentityStrategy::ByKey.extract(&e).unwrap(), "intro");
    let numeric = entity_with(EntityKey::with_id("Journey", 7, ""), &[]);
    assert_eq!(IdentityStrategy::ByKey.extract(&numeric).unwrap(), "7");
}

#[test]
fn by_key_never_fails_for_new_entity() {
    let e = entity_with(EntityKey::incomplete("Journey", ""), &[]);
    assert_eq!(IdentityStrategy::ByKey.extract(&e).unwrap(), "");
}

// ── ByProperty ───────────────────────────────────────────────────

#[test]
fn by_property_reads_string_property() {
    let e = entity_with(step_key(), &[("slug", GenericValue::from("welcome"))]);
    let strategy = IdentityStrategy::ByProperty("slug".into());
    assert_eq!(strategy.extract(&e).unwrap(), "welcome");
}

#[test]
fn by_property_fails_when_absent() {
    let e = entity_with(step_key(), &[]);
    let err = IdentityStrategy::ByProperty("slug".into())
        .extract(&e)
        .unwrap_err();
    assert!(matches!(err, ModelError::IdentityNotFound { .. }));
}

#[test]
fn by_property_fails_when_not_a_string() {
    let e = entity_with(step_key(), &[("slug", GenericValue::Int(3))]);
    let err = IdentityStrategy::ByProperty("slug".into())
        .extract(&e)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "identity not found (property:slug): property \"slug\" is a int, not a string"
    );
}

// ── ByParent ─────────────────────────────────────────────────────

#[test]
fn by_parent_finds_nearest_matching_ancestor() {
    let e = entity_with(step_key(), &[]);
    assert_eq!(
        IdentityStrategy::ByParent("Journey".into()).extract(&e).unwrap(),
        "42"
    );
    assert_eq!(
        IdentityStrategy::ByParent("Tenant".into()).extract(&e).unwrap(),
        "acme"
    );
}

#[test]
fn by_parent_does_not_match_the_entity_itself() {
    let e = entity_with(step_key(), &[]);
    assert!(IdentityStrategy::ByParent("Step".into()).extract(&e).is_err());
}

#[test]
fn by_parent_terminates_when_no_ancestor_matches() {
    let e = entity_with(step_key(), &[]);
    let err = IdentityStrategy::ByParent("Missing".into())
        .extract(&e)
        .unwrap_err();
    assert!(matches!(err, ModelError::IdentityNotFound { .. }));

    let root = entity_with(EntityKey::with_id("Journey", 1, ""), &[]);
    assert!(IdentityStrategy::ByParent("Tenant".into()).extract(&root).is_err());
}

proptest! {
    #[test]
    fn extraction_is_deterministic(name in "[a-z]{1,8}", value in "[a-zA-Z0-9]{0,8}") {
        let e = entity_with(step_key(), &[(name.as_str(), GenericValue::from(value.as_str()))]);
        for strategy in [
            IdentityStrategy::ByKey,
            IdentityStrategy::ByProperty(name.clone()),
            IdentityStrategy::ByParent("Journey".into()),
        ] {
            let first = strategy.extract(&e).unwrap();
            let second = strategy.extract(&e).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn by_property_fails_iff_absent_or_non_string(present in any::<bool>(), stringy in any::<bool>()) {
        let props: Vec<(&str, GenericValue)> = match (present, stringy) {
            (false, _) => vec![],
            (true, true) => vec![("x", GenericValue::from("v"))],
            (true, false) => vec![("x", GenericValue::Int(1))],
        };
        let e = entity_with(step_key(), &props);
        let result = IdentityStrategy::ByProperty("x".into()).extract(&e);
        prop_assert_eq!(result.is_ok(), present && stringy);
    }
}
