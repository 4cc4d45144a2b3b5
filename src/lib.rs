//! Aftercare — stateful core of a post-surgery patient monitoring
//! companion.
//!
//! Everything deterministic lives here: per-patient session state,
//! signal extraction from free-text messages, rule-based triage,
//! reminder scheduling with exactly-once delivery, and progress
//! reports. Conversational replies are the transport's problem; the
//! core hands back a structured outcome and records the model's turns
//! through [`CareEngine::record_external_turn`].

pub mod config;
pub mod engine;
pub mod extraction;
pub mod models;
pub mod reminders;
pub mod report;
pub mod store;
pub mod triage;

pub use engine::{CareEngine, Disposition, EngineError, MessageOutcome};
pub use models::{Alert, AlertSeverity, HistoryTurn, LogCategory, LogEntry, MessageRole, Reminder};
pub use reminders::{DeliveryOutcome, ReminderScheduler};
pub use store::{SessionStore, StoreError};
pub use triage::TriageVerdict;

use tracing_subscriber::EnvFilter;

/// Initialize tracing once at startup. Respects `RUST_LOG` and falls
/// back to the crate-level default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
