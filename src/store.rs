//! In-memory session store — the single structure mutated by both
//! request handlers and the reminder delivery task.
//!
//! Key properties:
//! - At-most-one session per identity for the process lifetime, even under
//!   concurrent first access (double-checked create under the write lock)
//! - A session's four sub-records (history, logs, alerts, pending
//!   reminders) are created together, atomically
//! - All mutators take the per-session mutex, so a concurrent reader sees
//!   either a whole entry or nothing

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Alert, HistoryTurn, LogCategory, LogEntry, MessageRole};

// ═══════════════════════════════════════════════════════════
// SessionRecord — one patient's state
// ═══════════════════════════════════════════════════════════

/// The conversational and clinical state for one ongoing patient
/// interaction, keyed by an opaque identity.
#[derive(Debug)]
pub struct SessionRecord {
    /// Ordered conversation turns, append-only, unbounded.
    pub history: Vec<HistoryTurn>,
    /// Structured log entries per category. Every category from the
    /// closed set is present from creation, possibly empty.
    pub logs: HashMap<LogCategory, Vec<LogEntry>>,
    /// Triage alerts, append-only.
    pub alerts: Vec<Alert>,
    /// Ids of reminders owned by this session (display back-references;
    /// the registry owns the records).
    pub pending_reminders: Vec<Uuid>,
}

impl SessionRecord {
    fn empty() -> Self {
        let mut logs = HashMap::with_capacity(LogCategory::ALL.len());
        for cat in LogCategory::ALL {
            logs.insert(cat, Vec::new());
        }
        Self {
            history: Vec::new(),
            logs,
            alerts: Vec::new(),
            pending_reminders: Vec::new(),
        }
    }

    /// Entries logged under one category. Total: the closed set is seeded
    /// at creation, so this never misses.
    pub fn log(&self, category: LogCategory) -> &[LogEntry] {
        self.logs.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ═══════════════════════════════════════════════════════════
// SessionHandle — identity + synchronized record
// ═══════════════════════════════════════════════════════════

/// Shared handle to one session. Cloneable via `Arc`; all access to the
/// record goes through the mutex so appends are linearizable.
pub struct SessionHandle {
    id: String,
    record: Mutex<SessionRecord>,
}

impl SessionHandle {
    fn new(id: String) -> Self {
        Self {
            id,
            record: Mutex::new(SessionRecord::empty()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lock the session record for reading or appending.
    pub fn lock(&self) -> Result<MutexGuard<'_, SessionRecord>, StoreError> {
        self.record.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

// ═══════════════════════════════════════════════════════════
// SessionStore — identity → session
// ═══════════════════════════════════════════════════════════

/// Owns the mapping from session identity to session state.
///
/// Wrapped in `Arc` by the embedding transport so request handlers and the
/// reminder scheduler share one instance. `RwLock` on the map lets lookups
/// proceed concurrently; only first-time creation takes the write lock.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve an identity to its session, creating an empty one on first
    /// reference. Concurrent resolves of the same unknown identity yield
    /// the same underlying session.
    pub fn resolve(&self, identity: &str) -> Result<Arc<SessionHandle>, StoreError> {
        // Fast path: session already exists
        {
            let map = self.sessions.read().map_err(|_| StoreError::LockPoisoned)?;
            if let Some(handle) = map.get(identity) {
                return Ok(Arc::clone(handle));
            }
        }

        // Slow path: create under the write lock. `entry` re-checks, so a
        // racing creator cannot produce a second session for the identity.
        let mut map = self.sessions.write().map_err(|_| StoreError::LockPoisoned)?;
        let handle = map
            .entry(identity.to_string())
            .or_insert_with(|| {
                tracing::info!(session = identity, "Created new session");
                Arc::new(SessionHandle::new(identity.to_string()))
            });
        Ok(Arc::clone(handle))
    }

    /// Look up an existing session without creating one. Used by the
    /// reminder delivery path, which must not resurrect sessions.
    pub fn get(&self, identity: &str) -> Result<Option<Arc<SessionHandle>>, StoreError> {
        let map = self.sessions.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(identity).cloned())
    }

    /// Number of known sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Append-only mutators ────────────────────────────────

    /// Append a conversation turn to a session's history.
    pub fn append_history(
        &self,
        identity: &str,
        role: MessageRole,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let handle = self.resolve(identity)?;
        let mut record = handle.lock()?;
        record.history.push(HistoryTurn::new(role, text, now));
        Ok(())
    }

    /// Append a structured entry under a log category.
    pub fn append_log(
        &self,
        identity: &str,
        category: LogCategory,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let handle = self.resolve(identity)?;
        let mut record = handle.lock()?;
        record
            .logs
            .entry(category)
            .or_default()
            .push(LogEntry {
                timestamp: now,
                value: value.to_string(),
            });
        Ok(())
    }

    /// Append a triage alert.
    pub fn append_alert(&self, identity: &str, alert: Alert) -> Result<(), StoreError> {
        let handle = self.resolve(identity)?;
        let mut record = handle.lock()?;
        record.alerts.push(alert);
        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════

/// Errors from session store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Internal lock error")]
    LockPoisoned,
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::thread;

    use crate::models::AlertSeverity;

    use super::*;

    #[test]
    fn new_store_is_empty() {
        let store = SessionStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn resolve_creates_all_sub_records_together() {
        let store = SessionStore::new();
        let handle = store.resolve("sess-1").unwrap();
        let record = handle.lock().unwrap();

        assert!(record.history.is_empty());
        assert!(record.alerts.is_empty());
        assert!(record.pending_reminders.is_empty());
        assert_eq!(record.logs.len(), LogCategory::ALL.len());
        for cat in LogCategory::ALL {
            assert!(record.log(cat).is_empty(), "{} should start empty", cat.as_str());
        }
    }

    #[test]
    fn resolve_is_idempotent() {
        let store = SessionStore::new();
        let a = store.resolve("sess-1").unwrap();
        let b = store.resolve("sess-1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn resolve_distinct_identities() {
        let store = SessionStore::new();
        let a = store.resolve("sess-1").unwrap();
        let b = store.resolve("sess-2").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn concurrent_resolve_yields_one_session() {
        let store = Arc::new(SessionStore::new());
        let mut handles = vec![];

        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || store.resolve("racy").unwrap()));
        }

        let resolved: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(store.len(), 1);
        for handle in &resolved[1..] {
            assert!(Arc::ptr_eq(&resolved[0], handle));
        }
    }

    #[test]
    fn get_does_not_create() {
        let store = SessionStore::new();
        assert!(store.get("ghost").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn append_history_preserves_order() {
        let store = SessionStore::new();
        let now = Utc::now();
        store.append_history("s", MessageRole::Patient, "first", now).unwrap();
        store.append_history("s", MessageRole::Companion, "second", now).unwrap();

        let handle = store.get("s").unwrap().unwrap();
        let record = handle.lock().unwrap();
        assert_eq!(record.history.len(), 2);
        assert_eq!(record.history[0].text, "first");
        assert_eq!(record.history[0].role, MessageRole::Patient);
        assert_eq!(record.history[1].text, "second");
    }

    #[test]
    fn append_log_files_under_category() {
        let store = SessionStore::new();
        let now = Utc::now();
        store.append_log("s", LogCategory::Pain, "7/10", now).unwrap();
        store.append_log("s", LogCategory::Pain, "5/10", now).unwrap();
        store.append_log("s", LogCategory::Mood, "feeling ok", now).unwrap();

        let handle = store.get("s").unwrap().unwrap();
        let record = handle.lock().unwrap();
        assert_eq!(record.log(LogCategory::Pain).len(), 2);
        assert_eq!(record.log(LogCategory::Pain)[1].value, "5/10");
        assert_eq!(record.log(LogCategory::Mood).len(), 1);
        assert!(record.log(LogCategory::Symptoms).is_empty());
    }

    #[test]
    fn append_alert_is_visible() {
        let store = SessionStore::new();
        store
            .append_alert(
                "s",
                Alert {
                    timestamp: Utc::now(),
                    severity: AlertSeverity::High,
                    reason: "Immediate attention required: chest pain".into(),
                },
            )
            .unwrap();

        let handle = store.get("s").unwrap().unwrap();
        let record = handle.lock().unwrap();
        assert_eq!(record.alerts.len(), 1);
        assert_eq!(record.alerts[0].severity, AlertSeverity::High);
    }

    #[test]
    fn concurrent_appends_lose_nothing() {
        let store = Arc::new(SessionStore::new());
        let mut handles = vec![];

        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for j in 0..50 {
                    store
                        .append_log("shared", LogCategory::Mobility, &format!("{i}-{j} steps"), Utc::now())
                        .unwrap();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let handle = store.get("shared").unwrap().unwrap();
        let record = handle.lock().unwrap();
        assert_eq!(record.log(LogCategory::Mobility).len(), 400);
    }
}
