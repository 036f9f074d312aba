//! Normalized timer snapshot

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// How the displayed timer counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimerType {
    #[default]
    #[serde(rename = "count down")]
    CountDown,
    #[serde(rename = "count up")]
    CountUp,
    #[serde(rename = "clock")]
    Clock,
    #[serde(rename = "none")]
    None,
}

impl TimerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerType::CountDown => "count down",
            TimerType::CountUp => "count up",
            TimerType::Clock => "clock",
            TimerType::None => "none",
        }
    }

    /// Parse a server-supplied timer type.
    ///
    /// Casing is ignored and `-`/`_` count as spaces, so `"count-down"`,
    /// `"COUNT_DOWN"` and `"count down"` are the same type. Unknown names
    /// yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw
            .trim()
            .to_lowercase()
            .replace(&['-', '_'][..], " ");

        match normalized.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "count down" | "countdown" | "time to end" => Some(TimerType::CountDown),
            "count up" | "countup" => Some(TimerType::CountUp),
            "clock" => Some(TimerType::Clock),
            "none" => Some(TimerType::None),
            _ => None,
        }
    }
}

impl fmt::Display for TimerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual urgency of the current timer value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Normal,
    /// Count down at or below the warning threshold
    Warning,
    /// Count down at or below the danger threshold, or overrun
    Danger,
    /// Count up past the event duration
    Overtime,
}

/// Immutable snapshot of normalized show state.
///
/// Values are handed to the consumer by value; the session keeps its own
/// copy and never mutates one it has delivered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerData {
    /// Remaining or elapsed time in milliseconds, `None` when no timer is active
    pub timer_ms: Option<i64>,
    pub timer_type: TimerType,
    pub title: String,
    pub next_event_title: String,
    pub has_next_event: bool,
    pub has_previous_event: bool,
    pub status: String,
    pub running: bool,
    pub time_warning: Option<i64>,
    pub time_danger: Option<i64>,
    pub duration: Option<i64>,
    pub blink: bool,
    pub blackout: bool,
    /// Originating message, for diagnostics only
    #[serde(skip)]
    pub raw_payload: Arc<Value>,
}

impl TimerData {
    /// Copy with the display-override flags replaced
    pub fn with_display_flags(&self, blink: bool, blackout: bool) -> Self {
        Self {
            blink,
            blackout,
            ..self.clone()
        }
    }

    /// A value is shown only for a timer type that displays one
    pub fn is_active(&self) -> bool {
        self.timer_ms.is_some() && self.timer_type != TimerType::None
    }

    /// Classify the timer value against the cached thresholds
    pub fn urgency(&self) -> Urgency {
        let Some(ms) = self.timer_ms else {
            return Urgency::Normal;
        };

        match self.timer_type {
            TimerType::CountDown => {
                if ms < 0 || self.time_danger.is_some_and(|danger| ms <= danger) {
                    Urgency::Danger
                } else if self.time_warning.is_some_and(|warning| ms <= warning) {
                    Urgency::Warning
                } else {
                    Urgency::Normal
                }
            }
            TimerType::CountUp => {
                if self.duration.is_some_and(|duration| ms > duration) {
                    Urgency::Overtime
                } else {
                    Urgency::Normal
                }
            }
            TimerType::Clock | TimerType::None => Urgency::Normal,
        }
    }
}
