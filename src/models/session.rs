use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AlertSeverity, MessageRole};

/// One turn of a session's conversation history. Append-only,
/// insertion order significant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub id: Uuid,
    pub role: MessageRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryTurn {
    pub fn new(role: MessageRole, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            timestamp,
        }
    }
}

/// A single structured log entry under one category.
/// Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub value: String,
}

/// A triage alert raised against a session. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub severity: AlertSeverity,
    pub reason: String,
}
