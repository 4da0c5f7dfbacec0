//! The two value models: generic (normal form) and typed (store form).

use serde::Serialize;
use std::collections::BTreeMap;

/// Properties of a typed entity or embedded entity value, by name.
pub type PropertyMap = BTreeMap<String, TypedValue>;

/// The normal form used for comparison, JSON persistence and diffing.
///
/// Lists and maps only ever contain other normal-form values. Two values are
/// equal when they have the same variant and the same contents, recursively.
/// A NaN float equals another NaN, so every value equals itself.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GenericValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<GenericValue>),
    Map(BTreeMap<String, GenericValue>),
}

impl GenericValue {
    /// The explicit "empty" value compared against when a property is absent.
    pub fn empty() -> Self {
        Self::String(String::new())
    }

    /// Returns the string contents if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the variant, used in log and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl PartialEq for GenericValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for GenericValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for GenericValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for GenericValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for GenericValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for GenericValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<GenericValue>> for GenericValue {
    fn from(v: Vec<GenericValue>) -> Self {
        Self::List(v)
    }
}

impl From<BTreeMap<String, GenericValue>> for GenericValue {
    fn from(v: BTreeMap<String, GenericValue>) -> Self {
        Self::Map(v)
    }
}

/// A property value as the store represents it: a tagged union.
///
/// `Entity` is an embedded sub-document scoped to its parent property, not a
/// reference to another entity. `Unsupported` holds any value shape the store
/// returned that is not one of the recognised tags (timestamps, keys, blobs,
/// geo points, ...); it cannot be converted to the generic model.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Null,
    Integer(i64),
    Boolean(bool),
    String(String),
    Double(f64),
    Array(Vec<TypedValue>),
    Entity(PropertyMap),
    Unsupported { tag: String },
}

impl TypedValue {
    /// The wire tag of this value (e.g. `integerValue`).
    pub fn tag(&self) -> &str {
        match self {
            Self::Null => "nullValue",
            Self::Integer(_) => "integerValue",
            Self::Boolean(_) => "booleanValue",
            Self::String(_) => "stringValue",
            Self::Double(_) => "doubleValue",
            Self::Array(_) => "arrayValue",
            Self::Entity(_) => "entityValue",
            Self::Unsupported { tag } => tag,
        }
    }
}
