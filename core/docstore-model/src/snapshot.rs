use crate::{Entity, ModelError, ModelResult};
use docstore_codec::{from_json, to_json};
use docstore_types::{EntityKey, KeyId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One element of a snapshot file (`<namespace>/<kind>.json`).
///
/// ```json
/// {"id": "42", "parent": "Tenant,acme", "data": {"count": 5}}
/// ```
///
/// An empty `id` marks a new entity whose identifier the store assigns on
/// apply. A missing `parent` marks a root entity. Deeper ancestor chains
/// are written root-first: `"Tenant,acme,Journey,42"`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SnapshotRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl SnapshotRecord {
    /// Builds the entity this record describes, in `namespace` and `kind`.
    ///
    /// Data values go through the snapshot read path, so integral floats
    /// become integers.
    pub fn to_entity(&self, namespace: &str, kind: &str) -> ModelResult<Entity> {
        let mut path = match self.parent.as_deref() {
            Some(parent) if !parent.is_empty() => parse_parent(parent)?,
            _ => Vec::new(),
        };
        let id = if self.id.is_empty() {
            None
        } else {
            Some(KeyId::parse(&self.id))
        };
        path.push((kind.to_string(), id));

        let key = EntityKey::from_path(namespace, path)?;
        let properties = self
            .data
            .iter()
            .map(|(name, value)| (name.clone(), from_json(value)))
            .collect();
        Ok(Entity::new(key, properties))
    }

    /// Checks that `key` reads back unchanged from a snapshot record.
    ///
    /// Names that look like numbers come back as numeric ids. Ancestor
    /// kinds and identifiers must not hold a comma or surrounding
    /// whitespace.
    pub fn check_key(key: &EntityKey) -> ModelResult<()> {
        let unrepresentable = |reason: String| ModelError::UnrepresentableKey {
            key: key.to_string(),
            reason,
        };

        if let Some(id) = &key.id {
            if !survives_parse(id) {
                return Err(unrepresentable(format!("name \"{id}\" reads back as a numeric id")));
            }
        }
        for ancestor in key.ancestors() {
            let id = ancestor.id_string();
            for segment in [ancestor.kind.as_str(), id.as_str()] {
                if segment.is_empty() || segment.contains(',') || segment.trim() != segment {
                    return Err(unrepresentable(format!(
                        "parent segment {segment:?} does not fit \"Kind,id\""
                    )));
                }
            }
            if ancestor.id.as_ref().is_some_and(|id| !survives_parse(id)) {
                return Err(unrepresentable(format!(
                    "parent name \"{id}\" reads back as a numeric id"
                )));
            }
        }
        Ok(())
    }

    /// Describes `entity` as a snapshot record.
    pub fn from_entity(entity: &Entity) -> Self {
        let mut ancestors: Vec<&EntityKey> = entity.key.ancestors().collect();
        ancestors.reverse();
        let parent = if ancestors.is_empty() {
            None
        } else {
            Some(
                ancestors
                    .iter()
                    .map(|k| format!("{},{}", k.kind, k.id_string()))
                    .collect::<Vec<_>>()
                    .join(","),
            )
        };

        Self {
            id: entity.identifier(),
            parent,
            data: entity
                .properties
                .iter()
                .map(|(name, value)| (name.clone(), to_json(value)))
                .collect(),
        }
    }
}

fn survives_parse(id: &KeyId) -> bool {
    KeyId::parse(&id.to_string()) == *id
}

fn parse_parent(parent: &str) -> ModelResult<Vec<(String, Option<KeyId>)>> {
    let items: Vec<&str> = parent.split(',').map(str::trim).collect();
    if items.len() % 2 != 0 || items.iter().any(|item| item.is_empty()) {
        return Err(ModelError::InvalidParent(parent.to_string()));
    }
    Ok(items
        .chunks(2)
        .map(|pair| (pair[0].to_string(), Some(KeyId::parse(pair[1]))))
        .collect())
}
