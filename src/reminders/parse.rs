//! Reminder intent parsing — "remind me [at|on|in] <when> to <body>".
//!
//! The time expression parser is deliberately narrow: one
//! hour[:minute][am|pm] token, resolved as wall-clock time-of-day against
//! the caller's "now", rolling to the next day when already past. Anything
//! else falls back to a short fixed delay. This is a documented
//! simplification, not a calendar or relative-date parser.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Timelike, Utc};
use regex::Regex;

use crate::config::REMINDER_FALLBACK_DELAY_SECS;

static REMINDER_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)remind me (?:at|on|in)?\s*(.*) to (.+)").expect("Invalid reminder regex")
});

static CLOCK_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,2})(?::(\d{2}))?\s*(am|pm)?").expect("Invalid clock regex")
});

/// A parsed reminder intent: the raw time expression and the body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    pub when_expr: String,
    pub body: String,
}

/// Detect a reminder intent in a message. Returns `None` when the message
/// is not a reminder request.
pub fn parse_reminder(text: &str) -> Option<ReminderRequest> {
    let cap = REMINDER_INTENT.captures(text)?;
    Some(ReminderRequest {
        when_expr: cap[1].trim().to_string(),
        body: cap[2].trim().to_string(),
    })
}

/// Resolve a time expression to an absolute delivery instant.
///
/// Total over its input: an unrecognizable expression is not an error, it
/// falls back to now + the configured demo delay.
pub fn resolve_delivery_time(when_expr: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(at) = wall_clock_instant(when_expr, now) {
        return at;
    }
    now + Duration::seconds(REMINDER_FALLBACK_DELAY_SECS)
}

/// Interpret an hour[:minute][am|pm] token as the next occurrence of that
/// wall-clock time strictly after `now`.
fn wall_clock_instant(when_expr: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let cap = CLOCK_TOKEN.captures(when_expr)?;

    let mut hour: u32 = cap.get(1)?.as_str().parse().ok()?;
    let minute: u32 = cap
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    let meridiem = cap.get(3).map(|m| m.as_str().to_lowercase());

    match meridiem.as_deref() {
        Some("pm") if hour < 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }

    let at = now
        .with_hour(hour)?
        .with_minute(minute)?
        .with_second(0)?
        .with_nanosecond(0)?;

    // Already passed today: schedule for the same time tomorrow
    if at <= now {
        Some(at + Duration::days(1))
    } else {
        Some(at)
    }
}
