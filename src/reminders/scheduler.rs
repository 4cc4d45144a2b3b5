//! Reminder scheduler — global registry plus one-shot delivery tasks.
//!
//! Each scheduled reminder spawns one tokio task that sleeps until the
//! delivery instant and then hands the firing to `deliver`, which performs
//! the session writes as a single critical section. Delivery is guarded by
//! the `delivered` flag: the false→true transition happens at most once,
//! even if a firing is ever repeated.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{LogCategory, MessageRole, Reminder};
use crate::store::{SessionStore, StoreError};

/// What a delivery attempt did. Only `Delivered` mutates state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The delivered flag was already set — repeated firing is a no-op.
    AlreadyDelivered,
    /// The reminder id is not in the registry.
    UnknownReminder,
    /// The owning session no longer exists — logged and dropped.
    UnknownSession,
}

/// Owns the global reminder registry and fires deliveries into the
/// session store. Shared (`Arc`) between request handlers and the spawned
/// timer tasks.
pub struct ReminderScheduler {
    store: Arc<SessionStore>,
    registry: RwLock<HashMap<Uuid, Reminder>>,
}

impl ReminderScheduler {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            registry: RwLock::new(HashMap::new()),
        }
    }

    /// Register a reminder and spawn its one-shot delivery task.
    ///
    /// The record lands in the global registry and in the owning session's
    /// pending list under one session lock acquisition, so a concurrent
    /// reader never sees one without the other. Must be called from within
    /// a tokio runtime.
    pub fn schedule(
        self: &Arc<Self>,
        session_id: &str,
        deliver_at: DateTime<Utc>,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Reminder, StoreError> {
        let reminder = Reminder::new(session_id, deliver_at, body);
        let id = reminder.id;

        let handle = self.store.resolve(session_id)?;
        {
            // Lock order everywhere: session first, then registry
            let mut record = handle.lock()?;
            let mut registry = self.registry.write().map_err(|_| StoreError::LockPoisoned)?;
            record.pending_reminders.push(id);
            registry.insert(id, reminder.clone());
        }

        tracing::info!(
            reminder = %id,
            session = session_id,
            deliver_at = %deliver_at,
            "Reminder scheduled"
        );

        let scheduler = Arc::clone(self);
        let delay = (deliver_at - now).to_std().unwrap_or_default();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match scheduler.deliver(id, Utc::now()) {
                Ok(outcome) => {
                    tracing::debug!(reminder = %id, ?outcome, "Reminder timer fired");
                }
                Err(e) => {
                    tracing::error!(reminder = %id, error = %e, "Reminder delivery failed");
                }
            }
        });

        Ok(reminder)
    }

    /// Fire one reminder: append the synthetic conversation turns and the
    /// trigger log entries to the owning session and set the delivered
    /// flag, all under the session lock so the writes appear atomic to any
    /// concurrent reader.
    pub fn deliver(&self, id: Uuid, now: DateTime<Utc>) -> Result<DeliveryOutcome, StoreError> {
        let session_id = {
            let registry = self.registry.read().map_err(|_| StoreError::LockPoisoned)?;
            match registry.get(&id) {
                Some(reminder) => reminder.session_id.clone(),
                None => {
                    tracing::warn!(reminder = %id, "Delivery requested for unknown reminder");
                    return Ok(DeliveryOutcome::UnknownReminder);
                }
            }
        };

        let Some(handle) = self.store.get(&session_id)? else {
            // The session vanished between scheduling and firing. Never
            // fatal: log and drop.
            tracing::warn!(
                reminder = %id,
                session = session_id,
                "Reminder fired for unknown session, dropping"
            );
            return Ok(DeliveryOutcome::UnknownSession);
        };

        let mut record = handle.lock()?;

        // Claim the delivered flag under the session lock. A second firing
        // observes delivered = true and leaves the session untouched.
        let (body, deliver_at) = {
            let mut registry = self.registry.write().map_err(|_| StoreError::LockPoisoned)?;
            let Some(reminder) = registry.get_mut(&id) else {
                return Ok(DeliveryOutcome::UnknownReminder);
            };
            if reminder.delivered {
                return Ok(DeliveryOutcome::AlreadyDelivered);
            }
            reminder.delivered = true;
            (reminder.body.clone(), reminder.deliver_at)
        };

        let delivered_text = format!(
            "Reminder: {body} (scheduled for {})",
            deliver_at.format("%Y-%m-%d %H:%M")
        );
        record.history.push(crate::models::HistoryTurn::new(
            MessageRole::System,
            "(reminder triggered)",
            now,
        ));
        record.history.push(crate::models::HistoryTurn::new(
            MessageRole::Companion,
            delivered_text.clone(),
            now,
        ));
        record
            .logs
            .entry(LogCategory::Medication)
            .or_default()
            .push(crate::models::LogEntry {
                timestamp: now,
                value: format!("Reminder triggered: {body}"),
            });
        record
            .logs
            .entry(LogCategory::Reminders)
            .or_default()
            .push(crate::models::LogEntry {
                timestamp: now,
                value: delivered_text,
            });

        tracing::info!(reminder = %id, session = session_id, "Reminder delivered");
        Ok(DeliveryOutcome::Delivered)
    }

    /// Look up a reminder by id (copy).
    pub fn reminder(&self, id: Uuid) -> Option<Reminder> {
        self.registry.read().ok()?.get(&id).cloned()
    }

    /// Number of registered reminders (delivered included).
    pub fn len(&self) -> usize {
        self.registry.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
