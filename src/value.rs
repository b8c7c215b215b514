//! Value semantics shared by the resolver, the helpers and the renderer.
//!
//! Context data is plain [`serde_json::Value`]. An *undefined* value (a
//! path that does not resolve) is modelled as `None` wherever the
//! distinction from `null` matters.

use regex::Regex;
use serde_json::{Number, Value};
use std::sync::LazyLock;

static NUMBER_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("valid regex"));

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Truthiness used by `#if`, `#unless` and the logic helpers.
///
/// `false`, `0`, `""`, `null` and empty arrays are falsy. Everything else,
/// including empty objects, is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Truthiness of a possibly undefined value.
pub fn is_defined_truthy(value: Option<&Value>) -> bool {
    value.is_some_and(is_truthy)
}

/// Converts a value to its display string.
///
/// Null renders as the empty string, scalars use their natural text form and
/// arrays/objects are serialised as compact JSON.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Parses a numeric literal token (`42`, `-3`, `2.5`).
pub fn parse_number(text: &str) -> Option<Value> {
    if !NUMBER_LITERAL.is_match(text) {
        return None;
    }
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::from(int));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
}

/// Numeric view of a value; numeric strings are accepted.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Builds a JSON number, preferring an integer when the value is integral.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Value::from(n as i64);
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Length of a string (in characters), array or object.
pub fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}
