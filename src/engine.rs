//! Message-handling pipeline — the crate's interface to the transport.
//!
//! One inbound message runs through an explicit ordered stage list:
//! validate → extract/log → triage → reminder intent → report intent →
//! defer to the external language model. Triage, reminder, and report
//! stages short-circuit: they compose the companion reply themselves and
//! later stages never run. The transport reads the returned
//! `MessageOutcome` to pick its response, and records model-generated
//! turns back through `record_external_turn`.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::extraction;
use crate::models::{Alert, AlertSeverity, LogCategory, MessageRole, Reminder};
use crate::reminders::{parse_reminder, resolve_delivery_time, ReminderScheduler};
use crate::report;
use crate::store::{SessionHandle, SessionStore, StoreError};
use crate::triage::{self, TriageVerdict};

static REPORT_INTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:report|weekly report|progress report|show my progress)\b")
        .expect("Invalid report intent regex")
});

/// How the pipeline disposed of one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Disposition {
    /// A triage rule fired; an alert was recorded and the escalation
    /// reply is final. No further stage ran.
    Escalated,
    /// A reminder was parsed and scheduled; the confirmation reply is
    /// final.
    ReminderScheduled,
    /// The patient asked for their progress report; the report text is
    /// the reply.
    ReportRequested,
    /// Nothing short-circuited: the transport should ask the language
    /// model and append its reply via `record_external_turn`.
    AwaitingCompanion,
}

/// Structured result of one handled message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageOutcome {
    pub disposition: Disposition,
    /// (category, value) entries the extractor logged for this message.
    pub extracted: Vec<(LogCategory, String)>,
    pub verdict: Option<TriageVerdict>,
    pub reminder: Option<Reminder>,
    /// The companion reply, already appended to history, for every
    /// disposition except `AwaitingCompanion`.
    pub reply: Option<String>,
}

/// Errors surfaced to the transport.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Empty message text")]
    EmptyMessage,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The monitoring core: session store + reminder scheduler behind one
/// message-handling API. Wrapped in `Arc` and shared across transport
/// handlers.
pub struct CareEngine {
    store: Arc<SessionStore>,
    scheduler: Arc<ReminderScheduler>,
}

impl CareEngine {
    pub fn new() -> Self {
        let store = Arc::new(SessionStore::new());
        let scheduler = Arc::new(ReminderScheduler::new(Arc::clone(&store)));
        Self { store, scheduler }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &Arc<ReminderScheduler> {
        &self.scheduler
    }

    /// Resolve (or lazily create) the session for an identity.
    pub fn resolve_session(&self, identity: &str) -> Result<Arc<SessionHandle>, StoreError> {
        self.store.resolve(identity)
    }

    /// Run one inbound patient message through the pipeline.
    pub fn handle_message(
        &self,
        identity: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<MessageOutcome, EngineError> {
        // Rejected before any state mutation: no session creation, no logs
        if text.trim().is_empty() {
            return Err(EngineError::EmptyMessage);
        }

        self.store.resolve(identity)?;

        // Stage 1: signal extraction. Log entries land before the history
        // entry, preserving causal order for concurrent readers.
        let extracted = extraction::extract(text);
        for (category, value) in &extracted {
            self.store.append_log(identity, *category, value, now)?;
        }

        // Stage 2: triage. A verdict short-circuits everything after it.
        if let Some(verdict) = triage::classify(text) {
            return Ok(self.escalate(identity, text, verdict, extracted, now)?);
        }

        // Stage 3: reminder intent.
        if let Some(request) = parse_reminder(text) {
            let deliver_at = resolve_delivery_time(&request.when_expr, now);
            let reminder = self
                .scheduler
                .schedule(identity, deliver_at, &request.body, now)?;
            let reply = format!(
                "Reminder scheduled at {} to: {}",
                deliver_at.format("%Y-%m-%d %H:%M"),
                request.body
            );
            self.append_exchange(identity, text, &reply, now)?;
            return Ok(MessageOutcome {
                disposition: Disposition::ReminderScheduled,
                extracted,
                verdict: None,
                reminder: Some(reminder),
                reply: Some(reply),
            });
        }

        // Stage 4: report intent.
        if REPORT_INTENT.is_match(text) {
            let reply = self.report(identity)?;
            self.append_exchange(identity, text, &reply, now)?;
            return Ok(MessageOutcome {
                disposition: Disposition::ReportRequested,
                extracted,
                verdict: None,
                reminder: None,
                reply: Some(reply),
            });
        }

        // Stage 5: hand off to the external model. The patient turn is
        // recorded now; the transport appends the model's reply later.
        self.store
            .append_history(identity, MessageRole::Patient, text, now)?;
        Ok(MessageOutcome {
            disposition: Disposition::AwaitingCompanion,
            extracted,
            verdict: None,
            reminder: None,
            reply: None,
        })
    }

    /// Append a turn produced outside the core (model reply, upload
    /// notification) to a session's history.
    pub fn record_external_turn(
        &self,
        identity: &str,
        role: MessageRole,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        self.store.append_history(identity, role, text, now)?;
        Ok(())
    }

    /// Build the progress report for a session (created empty if unknown).
    pub fn report(&self, identity: &str) -> Result<String, EngineError> {
        let handle = self.store.resolve(identity)?;
        let record = handle.lock()?;
        Ok(report::summarize(&record))
    }

    // ── Stage helpers ───────────────────────────────────────

    fn escalate(
        &self,
        identity: &str,
        text: &str,
        verdict: TriageVerdict,
        extracted: Vec<(LogCategory, String)>,
        now: DateTime<Utc>,
    ) -> Result<MessageOutcome, StoreError> {
        self.store.append_alert(
            identity,
            Alert {
                timestamp: now,
                severity: verdict.severity,
                reason: verdict.reason.clone(),
            },
        )?;

        let reply = match verdict.severity {
            AlertSeverity::High => format!(
                "This sounds serious: {}. Please call emergency services or contact your doctor immediately.",
                verdict.reason
            ),
            AlertSeverity::Medium => format!(
                "I noticed: {}. Please consider contacting your doctor; I will log this and notify them if needed.",
                verdict.reason
            ),
        };
        self.append_exchange(identity, text, &reply, now)?;

        Ok(MessageOutcome {
            disposition: Disposition::Escalated,
            extracted,
            verdict: Some(verdict),
            reminder: None,
            reply: Some(reply),
        })
    }

    /// Append a patient turn and the companion's final reply together.
    fn append_exchange(
        &self,
        identity: &str,
        patient_text: &str,
        reply: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.store
            .append_history(identity, MessageRole::Patient, patient_text, now)?;
        self.store
            .append_history(identity, MessageRole::Companion, reply, now)?;
        Ok(())
    }
}

impl Default for CareEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 8, 26, 15, 0, 0).unwrap()
    }

    #[test]
    fn empty_message_rejected_before_mutation() {
        let engine = CareEngine::new();
        let err = engine.handle_message("sess-1", "   ", now()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyMessage));
        assert!(engine.store().is_empty(), "no session may be created");
    }

    #[test]
    fn benign_message_defers_to_companion() {
        let engine = CareEngine::new();
        let outcome = engine
            .handle_message("sess-1", "good morning, slept well", now())
            .unwrap();
        assert_eq!(outcome.disposition, Disposition::AwaitingCompanion);
        assert!(outcome.reply.is_none());

        // Patient turn recorded, companion turn pending
        let handle = engine.store().get("sess-1").unwrap().unwrap();
        let record = handle.lock().unwrap();
        assert_eq!(record.history.len(), 1);
        assert_eq!(record.history[0].role, MessageRole::Patient);
    }

    #[test]
    fn record_external_turn_completes_exchange() {
        let engine = CareEngine::new();
        engine.handle_message("sess-1", "hello there", now()).unwrap();
        engine
            .record_external_turn("sess-1", MessageRole::Companion, "Good to hear from you.", now())
            .unwrap();

        let handle = engine.store().get("sess-1").unwrap().unwrap();
        let record = handle.lock().unwrap();
        assert_eq!(record.history.len(), 2);
        assert_eq!(record.history[1].role, MessageRole::Companion);
    }

    #[test]
    fn high_triage_short_circuits() {
        let engine = CareEngine::new();
        let outcome = engine
            .handle_message("sess-1", "I have chest pain", now())
            .unwrap();

        assert_eq!(outcome.disposition, Disposition::Escalated);
        let verdict = outcome.verdict.unwrap();
        assert_eq!(verdict.severity, AlertSeverity::High);
        assert!(outcome.reply.unwrap().contains("This sounds serious"));

        let handle = engine.store().get("sess-1").unwrap().unwrap();
        let record = handle.lock().unwrap();
        assert_eq!(record.alerts.len(), 1);
        assert_eq!(record.alerts[0].reason, "Immediate attention required: chest pain");
        // Patient turn + escalation reply, nothing else
        assert_eq!(record.history.len(), 2);
    }

    #[test]
    fn medium_triage_logs_and_advises() {
        let engine = CareEngine::new();
        let outcome = engine
            .handle_message("sess-1", "pain is 8, I feel dizzy", now())
            .unwrap();

        assert_eq!(outcome.disposition, Disposition::Escalated);
        let verdict = outcome.verdict.unwrap();
        assert_eq!(verdict.severity, AlertSeverity::Medium);
        assert_eq!(verdict.reason, "Possible complication: dizzy");
        assert!(outcome.reply.unwrap().contains("I noticed"));

        // Extraction still ran before the short-circuit
        let handle = engine.store().get("sess-1").unwrap().unwrap();
        let record = handle.lock().unwrap();
        assert_eq!(record.log(LogCategory::Pain)[0].value, "8/10");
        assert_eq!(record.log(LogCategory::Symptoms).len(), 1);
        assert_eq!(record.alerts[0].reason, "Possible complication: dizzy");
    }

    #[tokio::test]
    async fn triage_takes_precedence_over_reminder() {
        let engine = CareEngine::new();
        let outcome = engine
            .handle_message("sess-1", "remind me at 5 pm to check my fever", now())
            .unwrap();
        // "fever" fires the medium list before the reminder stage runs
        assert_eq!(outcome.disposition, Disposition::Escalated);
        assert!(engine.scheduler().is_empty());
    }

    #[tokio::test]
    async fn reminder_message_schedules_and_confirms() {
        let engine = CareEngine::new();
        let outcome = engine
            .handle_message("sess-1", "remind me at 5 pm to take antibiotic", now())
            .unwrap();

        assert_eq!(outcome.disposition, Disposition::ReminderScheduled);
        let reminder = outcome.reminder.unwrap();
        assert_eq!(reminder.body, "take antibiotic");
        // now() is 15:00 UTC, so 5 pm resolves to 17:00 today
        assert_eq!(
            reminder.deliver_at,
            chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 8, 26, 17, 0, 0).unwrap()
        );
        assert!(outcome.reply.unwrap().starts_with("Reminder scheduled at 2026-08-26 17:00"));

        let handle = engine.store().get("sess-1").unwrap().unwrap();
        let record = handle.lock().unwrap();
        assert_eq!(record.pending_reminders, vec![reminder.id]);
        assert_eq!(record.history.len(), 2);
    }

    #[test]
    fn report_request_returns_summary() {
        let engine = CareEngine::new();
        engine.handle_message("sess-1", "pain is 4 today", now()).unwrap();
        let outcome = engine
            .handle_message("sess-1", "show my progress please", now())
            .unwrap();

        assert_eq!(outcome.disposition, Disposition::ReportRequested);
        let reply = outcome.reply.unwrap();
        assert!(reply.contains("Pain logs: 1 entries; last: 4/10"));
        assert!(reply.contains("No active alerts."));
    }

    #[test]
    fn outcome_serializes_for_transport() {
        let engine = CareEngine::new();
        let outcome = engine.handle_message("sess-1", "pain is 2", now()).unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["disposition"], "AwaitingCompanion");
        assert_eq!(json["extracted"][0][0], "Pain");
        assert_eq!(json["extracted"][0][1], "2/10");
    }

    #[test]
    fn report_on_fresh_identity_never_fails() {
        let engine = CareEngine::new();
        let report = engine.report("brand-new").unwrap();
        assert!(report.contains("Pain logs: no entries yet."));
        assert!(report.contains("No active alerts."));
    }
}
