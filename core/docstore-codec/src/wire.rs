//! The store's REST JSON encoding.
//!
//! Values are single-member objects tagged by type:
//!
//! ```json
//! {"integerValue": "42"}
//! {"arrayValue": {"values": [{"stringValue": "a"}]}}
//! {"entityValue": {"properties": {"city": {"stringValue": "X"}}}}
//! ```
//!
//! Keys carry a partition and a root-first path:
//!
//! ```json
//! {"partitionId": {"projectId": "p", "namespaceId": "ns"},
//!  "path": [{"kind": "Tenant", "name": "acme"}, {"kind": "Journey", "id": "42"}]}
//! ```
//!
//! The same encoding is used for dry-run review artifacts.

use crate::{CodecError, CodecResult};
use docstore_types::{EntityKey, KeyId, PropertyMap, TypedValue};
use serde_json::{Map, Value, json};

/// Members that may accompany the value tag and carry no value.
const METADATA_MEMBERS: &[&str] = &["excludeFromIndexes", "meaning"];

/// Encodes a typed value. `Unsupported` values cannot be written back.
pub fn encode_value(value: &TypedValue) -> CodecResult<Value> {
    Ok(match value {
        TypedValue::Null => json!({"nullValue": null}),
        TypedValue::Integer(i) => json!({"integerValue": i.to_string()}),
        TypedValue::Boolean(b) => json!({"booleanValue": b}),
        TypedValue::String(s) => json!({"stringValue": s}),
        TypedValue::Double(f) => json!({"doubleValue": encode_double(*f)}),
        TypedValue::Array(values) => {
            let values = values.iter().map(encode_value).collect::<CodecResult<Vec<_>>>()?;
            json!({"arrayValue": {"values": values}})
        }
        TypedValue::Entity(properties) => {
            json!({"entityValue": {"properties": encode_properties(properties)?}})
        }
        TypedValue::Unsupported { tag } => return Err(CodecError::UnsupportedType(tag.clone())),
    })
}

fn encode_double(f: f64) -> Value {
    if f.is_nan() {
        Value::from("NaN")
    } else if f == f64::INFINITY {
        Value::from("Infinity")
    } else if f == f64::NEG_INFINITY {
        Value::from("-Infinity")
    } else {
        Value::from(f)
    }
}

/// Encodes a property map as a JSON object of wire values.
pub fn encode_properties(properties: &PropertyMap) -> CodecResult<Value> {
    let mut out = Map::new();
    for (name, value) in properties {
        out.insert(name.clone(), encode_value(value).map_err(|e| e.in_property(name))?);
    }
    Ok(Value::Object(out))
}

/// Decodes a wire value.
///
/// Recognised tags become their typed variant. Any other single tag becomes
/// [`TypedValue::Unsupported`]; the caller decides whether that is fatal.
pub fn decode_value(value: &Value) -> CodecResult<TypedValue> {
    let obj = value
        .as_object()
        .ok_or_else(|| CodecError::Malformed(format!("expected object, got {value}")))?;

    let mut tagged = obj
        .iter()
        .filter(|(k, _)| !METADATA_MEMBERS.contains(&k.as_str()));
    let (tag, inner) = tagged
        .next()
        .ok_or_else(|| CodecError::Malformed("value object has no type member".into()))?;
    if let Some((extra, _)) = tagged.next() {
        return Err(CodecError::Malformed(format!(
            "value object has both {tag} and {extra}"
        )));
    }

    match tag.as_str() {
        "nullValue" => Ok(TypedValue::Null),
        "integerValue" => decode_integer(inner).map(TypedValue::Integer),
        "booleanValue" => inner
            .as_bool()
            .map(TypedValue::Boolean)
            .ok_or_else(|| CodecError::Malformed(format!("booleanValue: {inner}"))),
        "stringValue" => inner
            .as_str()
            .map(|s| TypedValue::String(s.to_string()))
            .ok_or_else(|| CodecError::Malformed(format!("stringValue: {inner}"))),
        "doubleValue" => decode_double(inner).map(TypedValue::Double),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(decode_value)
                    .collect::<CodecResult<Vec<_>>>()?,
                Some(other) => {
                    return Err(CodecError::Malformed(format!("arrayValue.values: {other}")));
                }
                None => Vec::new(),
            };
            Ok(TypedValue::Array(values))
        }
        "entityValue" => {
            let properties = match inner.get("properties") {
                Some(props) => decode_properties(props)?,
                None => PropertyMap::new(),
            };
            Ok(TypedValue::Entity(properties))
        }
        other => Ok(TypedValue::Unsupported {
            tag: other.to_string(),
        }),
    }
}

fn decode_integer(inner: &Value) -> CodecResult<i64> {
    match inner {
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|e| CodecError::Malformed(format!("integerValue {s:?}: {e}"))),
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| CodecError::Malformed(format!("integerValue: {n}"))),
        other => Err(CodecError::Malformed(format!("integerValue: {other}"))),
    }
}

fn decode_double(inner: &Value) -> CodecResult<f64> {
    match inner {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| CodecError::Malformed(format!("doubleValue: {n}"))),
        Value::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            _ => Err(CodecError::Malformed(format!("doubleValue {s:?}"))),
        },
        other => Err(CodecError::Malformed(format!("doubleValue: {other}"))),
    }
}

/// Decodes a JSON object of wire values into a property map.
pub fn decode_properties(value: &Value) -> CodecResult<PropertyMap> {
    let obj = value
        .as_object()
        .ok_or_else(|| CodecError::Malformed(format!("properties: expected object, got {value}")))?;
    obj.iter()
        .map(|(name, v)| {
            decode_value(v)
                .map(|tv| (name.clone(), tv))
                .map_err(|e| e.in_property(name))
        })
        .collect()
}

/// Encodes a key. `project_id` is omitted from the partition when `None`.
pub fn encode_key(key: &EntityKey, project_id: Option<&str>) -> Value {
    let mut partition = Map::new();
    if let Some(project) = project_id {
        partition.insert("projectId".into(), Value::from(project));
    }
    if !key.namespace.is_empty() {
        partition.insert("namespaceId".into(), Value::from(key.namespace.as_str()));
    }

    let path: Vec<Value> = key
        .path()
        .into_iter()
        .map(|(kind, id)| match id {
            Some(KeyId::Id(id)) => json!({"kind": kind, "id": id.to_string()}),
            Some(KeyId::Name(name)) => json!({"kind": kind, "name": name}),
            None => json!({"kind": kind}),
        })
        .collect();

    json!({"partitionId": partition, "path": path})
}

/// Decodes a key.
pub fn decode_key(value: &Value) -> CodecResult<EntityKey> {
    let namespace = value
        .pointer("/partitionId/namespaceId")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let path = value
        .get("path")
        .and_then(Value::as_array)
        .ok_or_else(|| CodecError::Malformed(format!("key without path: {value}")))?;

    let segments = path
        .iter()
        .map(|element| {
            let kind = element
                .get("kind")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    CodecError::Malformed(format!("path element without kind: {element}"))
                })?;
            let id = match (element.get("id"), element.get("name")) {
                (Some(id), _) => Some(KeyId::Id(decode_integer(id)?)),
                (None, Some(Value::String(name))) => Some(KeyId::Name(name.clone())),
                (None, Some(other)) => {
                    return Err(CodecError::Malformed(format!("key name: {other}")));
                }
                (None, None) => None,
            };
            Ok((kind.to_string(), id))
        })
        .collect::<CodecResult<Vec<_>>>()?;

    EntityKey::from_path(namespace, segments).map_err(|e| CodecError::Malformed(e.to_string()))
}

/// Encodes a full entity: `{"key": ..., "properties": ...}`.
pub fn encode_entity(
    key: &EntityKey,
    properties: &PropertyMap,
    project_id: Option<&str>,
) -> CodecResult<Value> {
    Ok(json!({
        "key": encode_key(key, project_id),
        "properties": encode_properties(properties)?,
    }))
}

/// Decodes a full entity. Missing `properties` means an empty entity.
pub fn decode_entity(value: &Value) -> CodecResult<(EntityKey, PropertyMap)> {
    let key = value
        .get("key")
        .ok_or_else(|| CodecError::Malformed("entity without key".into()))
        .and_then(decode_key)?;
    let properties = match value.get("properties") {
        Some(props) => decode_properties(props)?,
        None => PropertyMap::new(),
    };
    Ok((key, properties))
}
