//! Outbound control commands
//!
//! Every command goes on the wire as `{"tag": ..., "payload": ...}`, with the
//! payload omitted for bare commands.

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// A control command understood by the Ontime server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask the server for a full state snapshot
    Poll,
    Start,
    Pause,
    Reload,
    LoadNext,
    LoadPrevious,
    /// Add milliseconds to the running timer
    AddTime(u64),
    /// Remove milliseconds from the running timer
    RemoveTime(u64),
    /// Set an event's duration
    ChangeDuration { event_id: String, duration: i64 },
    SetBlackout(bool),
    SetBlink(bool),
}

#[derive(Serialize)]
struct WireCommand<'a> {
    tag: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

impl Command {
    pub fn tag(&self) -> &'static str {
        match self {
            Command::Poll => "poll",
            Command::Start => "start",
            Command::Pause => "pause",
            Command::Reload => "reload",
            Command::LoadNext | Command::LoadPrevious => "load",
            Command::AddTime(_) | Command::RemoveTime(_) => "addtime",
            Command::ChangeDuration { .. } => "change",
            Command::SetBlackout(_) | Command::SetBlink(_) => "message",
        }
    }

    pub fn payload(&self) -> Option<Value> {
        match self {
            Command::Poll | Command::Start | Command::Pause | Command::Reload => None,
            Command::LoadNext => Some(json!("next")),
            Command::LoadPrevious => Some(json!("previous")),
            Command::AddTime(ms) => Some(json!({ "add": ms })),
            Command::RemoveTime(ms) => Some(json!({ "remove": ms })),
            Command::ChangeDuration { event_id, duration } => {
                let mut patch = serde_json::Map::new();
                patch.insert(event_id.clone(), json!({ "duration": duration }));
                Some(Value::Object(patch))
            }
            Command::SetBlackout(on) => Some(json!({ "timer": { "blackout": on } })),
            Command::SetBlink(on) => Some(json!({ "timer": { "blink": on } })),
        }
    }

    /// Wire form as a JSON value
    pub fn to_json(&self) -> Value {
        let mut frame = json!({ "tag": self.tag() });
        if let Some(payload) = self.payload() {
            frame["payload"] = payload;
        }
        frame
    }

    /// Wire form as text
    pub fn encode(&self) -> Result<String> {
        let wire = WireCommand {
            tag: self.tag(),
            payload: self.payload(),
        };
        serde_json::to_string(&wire).map_err(|e| Error::EncodeError(e.to_string()))
    }
}
