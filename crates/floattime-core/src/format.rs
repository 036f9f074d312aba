//! Timer display formatting

/// Shown when no timer value is known
pub const PLACEHOLDER: &str = "--:--";

/// Format milliseconds as `MM:SS`, or `HH:MM:SS` once an hour is reached.
///
/// Seconds are truncated toward zero and negative values keep a leading `-`.
pub fn format_time(ms: i64) -> String {
    let total_secs = ms.unsigned_abs() / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let body = if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    };

    if ms < 0 {
        format!("-{}", body)
    } else {
        body
    }
}

/// Format an optional timer value, falling back to [`PLACEHOLDER`]
pub fn format_timer(ms: Option<i64>) -> String {
    ms.map(format_time)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
