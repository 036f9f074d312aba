//! Payload normalization
//!
//! The server interleaves full snapshots, event-only deltas and
//! message-channel frames on one socket without marking which is which. A
//! [`Normalizer`] caches everything it has seen for the lifetime of one
//! connection and folds each payload into a complete [`TimerData`].

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::fields::{Fields, Object};
use crate::timer::{TimerData, TimerType};

/// Keys scanned, in order, when the timer type gives no direct hint
const FALLBACK_VALUE_KEYS: [&str; 6] = [
    "timer",
    "currentTime",
    "time",
    "elapsed",
    "remaining",
    "current",
];

/// Keys that make a payload more than a heartbeat
const ACTIONABLE_KEYS: [&str; 7] = [
    "timer",
    "currentEvent",
    "eventNow",
    "nextEvent",
    "eventNext",
    "message",
    "rundown",
];

/// The currently loaded event, as needed for duration changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRef {
    pub id: String,
    pub duration: Option<i64>,
}

/// Per-connection normalization state.
///
/// Thresholds, navigation flags and display-override flags persist across
/// payloads that omit them until a payload supplies a new value.
#[derive(Debug, Default)]
pub struct Normalizer {
    last_known_type: Option<TimerType>,
    time_warning: Option<i64>,
    time_danger: Option<i64>,
    duration: Option<i64>,
    has_next_event: Option<bool>,
    has_previous_event: Option<bool>,
    blink: bool,
    blackout: bool,
    current_event: Option<EventRef>,
    last: Option<TimerData>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently seen event with an id
    pub fn current_event(&self) -> Option<&EventRef> {
        self.current_event.as_ref()
    }

    /// Most recently produced snapshot
    pub fn last(&self) -> Option<&TimerData> {
        self.last.as_ref()
    }

    /// Drop all cached state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fold a raw payload into a snapshot.
    ///
    /// Returns `None` for non-object payloads and pure heartbeats. Never
    /// panics on missing or mistyped fields.
    pub fn normalize(&mut self, raw: &Value) -> Option<TimerData> {
        let root = raw.as_object()?;
        let top = Fields::new(root);

        // A scalar timer is the current value
        let wrapped: Object;
        let timer = match root.get("timer") {
            Some(Value::Object(block)) => Fields::new(block),
            Some(value) if !value.is_null() => {
                wrapped = Object::from_iter([("current".to_string(), value.clone())]);
                Fields::new(&wrapped)
            }
            _ => Fields::default(),
        };

        let current = top
            .object("currentEvent")
            .or_else(|| top.object("eventNow"))
            .or_else(|| looks_like_event(top).then_some(root));
        let event = Fields::maybe(current);
        let next_value = top
            .get("nextEvent")
            .filter(|v| !v.is_null())
            .or_else(|| top.get("eventNext"));
        let next = Fields::maybe(next_value.and_then(Value::as_object));

        let playback = timer.get("playback").map(|v| v.as_str().unwrap_or(""));
        let idle = match playback {
            Some("idle") => true,
            Some(p) => (p.is_empty() || p == "stop") && current.is_none(),
            None => false,
        };

        let timer_type = if idle {
            TimerType::None
        } else {
            let resolved = self.resolve_type(top, event, timer);
            self.last_known_type = Some(resolved);
            resolved
        };

        let timer_ms = resolve_value(timer_type, top, timer);

        if timer_ms.is_none()
            && current.is_none()
            && !ACTIONABLE_KEYS.iter().any(|key| top.has(key))
            && top.contains("clock")
        {
            debug!("Skipping heartbeat frame");
            return None;
        }

        self.update_navigation(top, event, next);

        if let Some(id) = event.id() {
            let duration = event.number("duration").or_else(|| {
                self.current_event
                    .as_ref()
                    .filter(|cached| cached.id == id)
                    .and_then(|cached| cached.duration)
            });
            self.current_event = Some(EventRef { id, duration });
        }

        let message_timer = Fields::maybe(
            top.object("message")
                .and_then(|message| message.get("timer")?.as_object()),
        );
        for source in [message_timer, timer] {
            if let Some(blink) = source.flag("blink") {
                self.blink = blink;
            }
            if let Some(blackout) = source.flag("blackout") {
                self.blackout = blackout;
            }
        }

        let time_warning = cached(
            &mut self.time_warning,
            event.number("timeWarning").or_else(|| timer.number("timeWarning")),
        );
        let time_danger = cached(
            &mut self.time_danger,
            event.number("timeDanger").or_else(|| timer.number("timeDanger")),
        );
        let duration = cached(
            &mut self.duration,
            event.number("duration").or_else(|| timer.number("duration")),
        );

        let next_event_title = match next_value {
            Some(Value::Object(_)) => next.text("title").unwrap_or_default().to_string(),
            Some(Value::String(title)) => title.clone(),
            _ => String::new(),
        };

        // Control-channel frames must not reset the visible timer, but
        // whatever else they carry still reaches the snapshot
        if timer_ms.is_none() && current.is_none() && playback.is_none() {
            if let Some(last) = &self.last {
                trace!("Merging partial frame into last snapshot");
                let mut merged = last.with_display_flags(self.blink, self.blackout);
                merged.time_warning = time_warning;
                merged.time_danger = time_danger;
                merged.duration = duration;
                merged.has_next_event = self.has_next_event.unwrap_or(merged.has_next_event);
                merged.has_previous_event =
                    self.has_previous_event.unwrap_or(merged.has_previous_event);
                if top.contains("nextEvent") || top.contains("eventNext") {
                    merged.next_event_title = next_event_title;
                }
                self.last = Some(merged.clone());
                return Some(merged);
            }
        }

        let data = TimerData {
            timer_ms,
            timer_type,
            title: event
                .text("title")
                .or_else(|| top.text("title"))
                .unwrap_or_default()
                .to_string(),
            next_event_title,
            has_next_event: self.has_next_event.unwrap_or(true),
            has_previous_event: self.has_previous_event.unwrap_or(true),
            status: timer
                .text("state")
                .or_else(|| top.text("status"))
                .or(playback)
                .unwrap_or_default()
                .to_string(),
            running: timer
                .flag("running")
                .or_else(|| top.flag("running"))
                .unwrap_or(playback == Some("play")),
            time_warning,
            time_danger,
            duration,
            blink: self.blink,
            blackout: self.blackout,
            raw_payload: Arc::new(raw.clone()),
        };

        self.last = Some(data.clone());
        Some(data)
    }

    fn resolve_type(&self, top: Fields<'_>, event: Fields<'_>, timer: Fields<'_>) -> TimerType {
        [
            top.get("timerType"),
            event.get("timerType"),
            timer.get("timerType"),
            timer.get("type"),
            timer.get("mode"),
        ]
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find_map(TimerType::parse)
        .or(self.last_known_type)
        .unwrap_or_default()
    }

    fn update_navigation(&mut self, top: Fields<'_>, event: Fields<'_>, next: Fields<'_>) {
        let rundown = Fields::maybe(top.object("rundown"));
        let mut next_disabled = false;

        if let (Some(index), Some(count)) = (
            rundown.number("selectedEventIndex"),
            rundown.number("numEvents"),
        ) {
            let has_next = index < count.saturating_sub(1);
            self.has_previous_event = Some(index > 0);
            self.has_next_event = Some(has_next);
            next_disabled = !has_next;
        }

        // A next event that starts earlier than the current one means the
        // rundown would wrap around
        if !next_disabled {
            if let (Some(next_start), Some(current_start)) =
                (next.number("timeStart"), event.number("timeStart"))
            {
                if next_start < current_start {
                    self.has_next_event = Some(false);
                }
            }
        }
    }
}

/// Heuristic: a payload carrying `id` plus `duration` or `title` is itself
/// an event. A non-event payload with those keys will be misclassified.
fn looks_like_event(top: Fields<'_>) -> bool {
    top.has("id") && (top.contains("duration") || top.contains("title"))
}

fn resolve_value(timer_type: TimerType, top: Fields<'_>, timer: Fields<'_>) -> Option<i64> {
    let direct = match timer_type {
        TimerType::CountUp => timer.number("elapsed"),
        TimerType::CountDown => timer.number("current").or_else(|| timer.number("remaining")),
        TimerType::Clock | TimerType::None => None,
    };

    direct.or_else(|| {
        FALLBACK_VALUE_KEYS
            .iter()
            .find_map(|key| top.number(key).or_else(|| timer.number(key)))
    })
}

fn cached(slot: &mut Option<i64>, fresh: Option<i64>) -> Option<i64> {
    if fresh.is_some() {
        *slot = fresh;
    }
    *slot
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_timer_is_wrapped() {
        let mut normalizer = Normalizer::new();
        let data = normalizer.normalize(&json!({"timer": 42_000})).unwrap();
        assert_eq!(data.timer_ms, Some(42_000));
        assert_eq!(data.timer_type, TimerType::CountDown);
    }

    #[test]
    fn test_payload_as_event_heuristic() {
        let mut normalizer = Normalizer::new();
        let data = normalizer
            .normalize(&json!({"id": "e1", "title": "Keynote", "duration": 600_000}))
            .unwrap();
        assert_eq!(data.title, "Keynote");
        assert_eq!(data.duration, Some(600_000));
        assert_eq!(
            normalizer.current_event(),
            Some(&EventRef {
                id: "e1".to_string(),
                duration: Some(600_000)
            })
        );
    }

    #[test]
    fn test_event_duration_kept_for_same_id() {
        let mut normalizer = Normalizer::new();
        normalizer.normalize(&json!({"eventNow": {"id": "a", "duration": 1000}}));
        normalizer.normalize(&json!({"eventNow": {"id": "a", "title": "A"}}));
        assert_eq!(normalizer.current_event().unwrap().duration, Some(1000));

        normalizer.normalize(&json!({"eventNow": {"id": "b", "title": "B"}}));
        assert_eq!(normalizer.current_event().unwrap().duration, None);
    }

    #[test]
    fn test_idle_does_not_overwrite_last_known_type() {
        let mut normalizer = Normalizer::new();
        normalizer.normalize(&json!({"timer": {"elapsed": 1000, "playback": "play"}, "timerType": "count-up"}));
        normalizer.normalize(&json!({"timer": {"playback": "idle"}}));
        let data = normalizer
            .normalize(&json!({"timer": {"elapsed": 2000, "playback": "play"}}))
            .unwrap();
        assert_eq!(data.timer_type, TimerType::CountUp);
        assert_eq!(data.timer_ms, Some(2000));
    }

    #[test]
    fn test_reset_clears_cache() {
        let mut normalizer = Normalizer::new();
        normalizer.normalize(&json!({"eventNow": {"id": "a", "timeDanger": 5000}}));
        normalizer.reset();
        assert!(normalizer.current_event().is_none());
        assert!(normalizer.last().is_none());
        let data = normalizer.normalize(&json!({"timer": {"current": 1}})).unwrap();
        assert_eq!(data.time_danger, None);
    }
}
