use docstore_types::GenericValue;
use serde_json::{Map, Number, Value};

// 2^63: the first float above every i64.
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// Reads a JSON value from a snapshot file into the generic normal form.
///
/// The JSON transport represents every number as floating point, so a float
/// with an exact integral value that fits `i64` is reported as `Int`. This
/// recovers the integer/float distinction the store driver would have made.
pub fn from_json(value: &Value) -> GenericValue {
    match value {
        Value::Null => GenericValue::Null,
        Value::Bool(b) => GenericValue::Bool(*b),
        Value::Number(n) => number_to_generic(n),
        Value::String(s) => GenericValue::String(s.clone()),
        Value::Array(items) => GenericValue::List(items.iter().map(from_json).collect()),
        Value::Object(map) => GenericValue::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect(),
        ),
    }
}

fn number_to_generic(n: &Number) -> GenericValue {
    if let Some(i) = n.as_i64() {
        return GenericValue::Int(i);
    }
    match n.as_f64() {
        Some(f) if is_integral_i64(f) => GenericValue::Int(f as i64),
        Some(f) => GenericValue::Float(f),
        // serde_json numbers always have an f64 view without arbitrary_precision.
        None => GenericValue::Float(f64::NAN),
    }
}

fn is_integral_i64(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f >= -I64_UPPER && f < I64_UPPER
}

/// Writes a generic value as JSON for a snapshot file.
///
/// Non-finite floats have no JSON form and are written as `null`.
pub fn to_json(value: &GenericValue) -> Value {
    match value {
        GenericValue::Null => Value::Null,
        GenericValue::Bool(b) => Value::Bool(*b),
        GenericValue::Int(i) => Value::Number((*i).into()),
        GenericValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        GenericValue::String(s) => Value::String(s.clone()),
        GenericValue::List(items) => Value::Array(items.iter().map(to_json).collect()),
        GenericValue::Map(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}
