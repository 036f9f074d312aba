//! Inbound frame shapes
//!
//! Ontime multiplexes several envelope styles on one socket:
//! - `{"tag": "...", "payload": {...}}`
//! - `{"type": "ontime-<name>", "payload": {...}}`
//! - a bare object whose fields are the payload itself

use serde_json::Value;

use crate::error::{Error, Result};

/// Prefix of typed Ontime envelopes
const TYPE_PREFIX: &str = "ontime";

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `{tag, payload}` envelope
    Tagged { tag: String, payload: Value },
    /// `{type: "ontime-*", payload}` envelope
    Typed { kind: String, payload: Value },
    /// No recognised envelope; the frame is the payload
    Bare(Value),
}

impl Frame {
    /// Decode a text frame. Only JSON objects are accepted.
    pub fn decode(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(Error::InvalidFrame(format!(
                "expected object, got {}",
                json_kind(&value)
            )));
        }
        Ok(Self::from_value(value))
    }

    /// Classify an already-parsed value
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Frame::Bare(value);
        };

        if let Some(tag) = map.get("tag").and_then(Value::as_str).map(str::to_string) {
            // A tagged frame without payload carries its fields inline
            return match map.remove("payload") {
                Some(payload) => Frame::Tagged { tag, payload },
                None => Frame::Tagged {
                    tag,
                    payload: Value::Object(map),
                },
            };
        }

        let kind = map
            .get("type")
            .and_then(Value::as_str)
            .filter(|kind| is_ontime_type(kind))
            .map(str::to_string);

        match kind {
            Some(kind) if map.contains_key("payload") => {
                let payload = map.remove("payload").unwrap_or(Value::Null);
                Frame::Typed { kind, payload }
            }
            _ => Frame::Bare(Value::Object(map)),
        }
    }

    /// Envelope name, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            Frame::Tagged { tag, .. } => Some(tag),
            Frame::Typed { kind, .. } => Some(kind),
            Frame::Bare(_) => None,
        }
    }

    pub fn payload(&self) -> &Value {
        match self {
            Frame::Tagged { payload, .. } | Frame::Typed { payload, .. } => payload,
            Frame::Bare(value) => value,
        }
    }

    pub fn into_payload(self) -> Value {
        match self {
            Frame::Tagged { payload, .. } | Frame::Typed { payload, .. } => payload,
            Frame::Bare(value) => value,
        }
    }
}

fn is_ontime_type(kind: &str) -> bool {
    kind == TYPE_PREFIX
        || kind
            .strip_prefix(TYPE_PREFIX)
            .is_some_and(|rest| rest.starts_with('-'))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
