//! Display formatting tests

use floattime_core::{format_time, format_timer, PLACEHOLDER};

#[test]
fn test_minutes_and_seconds() {
    assert_eq!(format_time(0), "00:00");
    assert_eq!(format_time(59_000), "00:59");
    assert_eq!(format_time(65_000), "01:05");
    assert_eq!(format_time(3_599_999), "59:59");
}

#[test]
fn test_hours_shown_when_present() {
    assert_eq!(format_time(3_600_000), "01:00:00");
    assert_eq!(format_time(3_605_000), "01:00:05");
    assert_eq!(format_time(36_000_000 * 3), "30:00:00");
}

#[test]
fn test_negative_values() {
    assert_eq!(format_time(-65_000), "-01:05");
    assert_eq!(format_time(-3_605_000), "-01:00:05");
    assert_eq!(format_time(-500), "-00:00");
}

#[test]
fn test_truncates_partial_seconds() {
    assert_eq!(format_time(1_999), "00:01");
    assert_eq!(format_time(-1_999), "-00:01");
}

#[test]
fn test_extremes_do_not_overflow() {
    assert!(format_time(i64::MIN).starts_with('-'));
    assert!(!format_time(i64::MAX).is_empty());
}

#[test]
fn test_placeholder() {
    assert_eq!(format_timer(None), PLACEHOLDER);
    assert_eq!(format_timer(Some(65_000)), "01:05");
}
