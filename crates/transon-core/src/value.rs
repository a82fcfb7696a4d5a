//! Value model shared by templates, inputs and outputs
//!
//! Documents are `serde_json::Value`s. The crate enables `preserve_order`, so
//! map keys keep their insertion order from parsing through output.

use crate::error::Result;

pub use serde_json::{Map, Number, Value};

/// Parse a JSON document
///
/// Malformed input fails with a `Syntax` error carrying 1-based line and column.
pub fn parse(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Serialize a value as compact JSON
pub fn to_string(value: &Value) -> String {
    // Serializing a `Value` into memory cannot fail: map keys are always strings.
    value.to_string()
}

/// Serialize a value as indented JSON
pub fn to_string_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Name of the value's variant, as used in error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// Truthiness: null, false, zero, and empty strings/lists/maps are false
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Text rendering of a value: strings verbatim, anything else as compact JSON
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => to_string(other),
    }
}

/// Build a JSON number from a float, `None` for NaN and infinities
pub(crate) fn float(f: f64) -> Option<Value> {
    Number::from_f64(f).map(Value::Number)
}
