//! Defensive accessors over loosely-structured JSON objects.
//!
//! Every accessor degrades to `None` on a missing key or a wrong type.

use serde_json::{Map, Value};

pub(crate) type Object = Map<String, Value>;

/// A possibly-absent JSON object
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Fields<'a>(Option<&'a Object>);

impl<'a> Fields<'a> {
    pub(crate) fn new(obj: &'a Object) -> Self {
        Self(Some(obj))
    }

    pub(crate) fn maybe(obj: Option<&'a Object>) -> Self {
        Self(obj)
    }

    pub(crate) fn get(&self, key: &str) -> Option<&'a Value> {
        self.0?.get(key)
    }

    /// Key exists, whatever its value
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Key exists and is not `null`
    pub(crate) fn has(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_null())
    }

    pub(crate) fn object(&self, key: &str) -> Option<&'a Object> {
        self.get(key)?.as_object()
    }

    pub(crate) fn number(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(as_millis)
    }

    pub(crate) fn text(&self, key: &str) -> Option<&'a str> {
        self.get(key)?.as_str()
    }

    pub(crate) fn flag(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    /// Event identifiers arrive as strings or numbers
    pub(crate) fn id(&self) -> Option<String> {
        match self.get("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Numeric JSON value as whole milliseconds
pub(crate) fn as_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.round() as i64)
        }),
        _ => None,
    }
}
