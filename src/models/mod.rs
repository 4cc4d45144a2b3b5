pub mod enums;
pub mod reminder;
pub mod session;

pub use enums::{AlertSeverity, LogCategory, MessageRole};
pub use reminder::Reminder;
pub use session::{Alert, HistoryTurn, LogEntry};

/// Errors from model-level parsing.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },
}
