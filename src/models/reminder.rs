use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled one-shot delivery of a message into a session's history.
///
/// Identified independently of its owning session: the global registry
/// fires it, the owning session lists it. Only `delivered` ever changes,
/// and only false→true, exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub session_id: String,
    pub deliver_at: DateTime<Utc>,
    pub body: String,
    pub delivered: bool,
}

impl Reminder {
    pub fn new(session_id: impl Into<String>, deliver_at: DateTime<Utc>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            deliver_at,
            body: body.into(),
            delivered: false,
        }
    }
}
