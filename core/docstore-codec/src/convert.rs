use crate::{CodecError, CodecResult};
use docstore_types::{GenericValue, PropertyMap, TypedValue};
use std::collections::BTreeMap;

/// Converts a typed store value into the generic normal form.
///
/// Values already typed by the store are taken as-is: a `Double` stays a
/// `Float` even when it holds an integral value. A non-finite `Double` has no
/// snapshot form and is rejected.
pub fn to_generic(value: &TypedValue) -> CodecResult<GenericValue> {
    Ok(match value {
        TypedValue::Null => GenericValue::Null,
        TypedValue::Integer(i) => GenericValue::Int(*i),
        TypedValue::Boolean(b) => GenericValue::Bool(*b),
        TypedValue::String(s) => GenericValue::String(s.clone()),
        TypedValue::Double(f) if !f.is_finite() => return Err(CodecError::NonFiniteFloat(*f)),
        TypedValue::Double(f) => GenericValue::Float(*f),
        TypedValue::Array(values) => GenericValue::List(
            values.iter().map(to_generic).collect::<CodecResult<Vec<_>>>()?,
        ),
        TypedValue::Entity(properties) => GenericValue::Map(properties_to_generic(properties)?),
        TypedValue::Unsupported { tag } => return Err(CodecError::UnsupportedType(tag.clone())),
    })
}

/// Converts a generic value into the store's typed form.
///
/// Maps become embedded entity values. Non-finite floats have no
/// representation in the store's JSON transport and are rejected.
pub fn to_typed(value: &GenericValue) -> CodecResult<TypedValue> {
    Ok(match value {
        GenericValue::Null => TypedValue::Null,
        GenericValue::Bool(b) => TypedValue::Boolean(*b),
        GenericValue::Int(i) => TypedValue::Integer(*i),
        GenericValue::Float(f) if !f.is_finite() => return Err(CodecError::NonFiniteFloat(*f)),
        GenericValue::Float(f) => TypedValue::Double(*f),
        GenericValue::String(s) => TypedValue::String(s.clone()),
        GenericValue::List(values) => TypedValue::Array(
            values.iter().map(to_typed).collect::<CodecResult<Vec<_>>>()?,
        ),
        GenericValue::Map(map) => TypedValue::Entity(properties_to_typed(map)?),
    })
}

/// Converts every property of a typed entity. The first failure aborts.
pub fn properties_to_generic(
    properties: &PropertyMap,
) -> CodecResult<BTreeMap<String, GenericValue>> {
    properties
        .iter()
        .map(|(name, value)| {
            to_generic(value)
                .map(|v| (name.clone(), v))
                .map_err(|e| e.in_property(name))
        })
        .collect()
}

/// Converts every property of a generic entity. The first failure aborts.
pub fn properties_to_typed(
    properties: &BTreeMap<String, GenericValue>,
) -> CodecResult<PropertyMap> {
    properties
        .iter()
        .map(|(name, value)| {
            to_typed(value)
                .map(|v| (name.clone(), v))
                .map_err(|e| e.in_property(name))
        })
        .collect()
}
