use docstore_types::{EntityKey, GenericValue};
use serde::Serialize;
use std::collections::BTreeMap;

/// One record of the store: a key and its named properties.
///
/// Built when read from the store or parsed from a snapshot file, never
/// mutated afterwards. Diffing and planning always produce new values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub key: EntityKey,
    pub properties: BTreeMap<String, GenericValue>,
}

impl Entity {
    pub fn new(key: EntityKey, properties: BTreeMap<String, GenericValue>) -> Self {
        Self { key, properties }
    }

    /// The property named `name`, if present.
    pub fn get(&self, name: &str) -> Option<&GenericValue> {
        self.properties.get(name)
    }

    /// The property named `name` if it is a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(GenericValue::as_str)
    }

    /// The property named `name` if it is a boolean.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(GenericValue::as_bool)
    }

    /// The property named `name` if it is an integer.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(GenericValue::as_i64)
    }

    /// The key's leaf identifier, `""` for a new entity.
    pub fn identifier(&self) -> String {
        self.key.id_string()
    }

    /// Short context for log lines: `namespace/kind/id`.
    pub fn context(&self) -> String {
        let id = if self.key.is_complete() {
            self.identifier()
        } else {
            "<new>".to_string()
        };
        format!("{}/{}/{}", display_namespace(&self.key.namespace), self.key.kind, id)
    }
}

fn display_namespace(namespace: &str) -> &str {
    if namespace.is_empty() {
        "[default]"
    } else {
        namespace
    }
}
