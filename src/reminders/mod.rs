//! Reminder subsystem: intent parsing and scheduled delivery.

mod parse;
mod scheduler;

pub use parse::{parse_reminder, resolve_delivery_time, ReminderRequest};
pub use scheduler::{DeliveryOutcome, ReminderScheduler};
