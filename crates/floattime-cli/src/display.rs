//! Terminal rendering of timer snapshots

use colored::{ColoredString, Colorize};
use floattime_core::{format_timer, TimerData, Urgency, PLACEHOLDER};

/// Timer text as a display would show it
pub fn timer_text(data: &TimerData) -> String {
    if data.is_active() {
        format_timer(data.timer_ms)
    } else {
        PLACEHOLDER.to_string()
    }
}

/// One plain-text line per snapshot
pub fn render_line(data: &TimerData) -> String {
    let mut line = format!("{:>9}  {:<10}", timer_text(data), data.timer_type.as_str());

    if !data.title.is_empty() {
        line.push_str("  ");
        line.push_str(&data.title);
    }
    if !data.next_event_title.is_empty() {
        line.push_str(&format!("  (next: {})", data.next_event_title));
    }

    let flags: Vec<&str> = [
        (data.running, "running"),
        (data.blink, "blink"),
        (data.blackout, "blackout"),
        (!data.has_previous_event, "first"),
        (!data.has_next_event, "last"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();

    if !flags.is_empty() {
        line.push_str(&format!("  [{}]", flags.join(" ")));
    }

    line
}

/// Colour a rendered line the way the on-screen timer is coloured
pub fn colorize(line: &str, data: &TimerData) -> ColoredString {
    if data.blackout {
        return line.dimmed();
    }

    match data.urgency() {
        Urgency::Danger => line.red().bold(),
        Urgency::Warning | Urgency::Overtime => line.yellow(),
        Urgency::Normal => line.normal(),
    }
}
