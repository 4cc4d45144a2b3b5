//! Triage rules — deterministic urgency classification of one message.
//!
//! Rules are checked in strict priority order: the high-severity keyword
//! list first, then the medium list, then the numeric pain escalation
//! fallback. First match wins and classification stops. We do not defer
//! this to the language model — escalation decisions stay rule-based.

use serde::{Deserialize, Serialize};

use crate::config::PAIN_ESCALATION_THRESHOLD;
use crate::extraction::pain_score;
use crate::models::AlertSeverity;

/// Keywords that demand immediate escalation, in priority order.
static HIGH_KEYWORDS: &[&str] = &[
    "chest pain",
    "severe bleeding",
    "difficulty breathing",
    "unconscious",
    "passing out",
];

/// Keywords suggesting a possible complication, in priority order.
static MEDIUM_KEYWORDS: &[&str] = &[
    "fever",
    "dizzy",
    "dizziness",
    "severe pain",
    "swelling",
    "pus",
    "infection",
];

/// A severity classification plus human-readable reason, derived from
/// rule matching on message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageVerdict {
    pub severity: AlertSeverity,
    pub reason: String,
}

/// Classify one message. Returns `None` when no rule fires and processing
/// may continue to later pipeline stages.
pub fn classify(text: &str) -> Option<TriageVerdict> {
    let lowered = text.to_lowercase();

    for kw in HIGH_KEYWORDS {
        if lowered.contains(kw) {
            let verdict = TriageVerdict {
                severity: AlertSeverity::High,
                reason: format!("Immediate attention required: {kw}"),
            };
            tracing::warn!(keyword = kw, severity = "high", "Triage rule fired");
            return Some(verdict);
        }
    }

    for kw in MEDIUM_KEYWORDS {
        if lowered.contains(kw) {
            let verdict = TriageVerdict {
                severity: AlertSeverity::Medium,
                reason: format!("Possible complication: {kw}"),
            };
            tracing::warn!(keyword = kw, severity = "medium", "Triage rule fired");
            return Some(verdict);
        }
    }

    // Numeric pain escalation: same pattern the extractor uses
    if let Some(score) = pain_score(&lowered) {
        if score >= PAIN_ESCALATION_THRESHOLD {
            let verdict = TriageVerdict {
                severity: AlertSeverity::Medium,
                reason: format!("High pain reported ({score}/10)"),
            };
            tracing::warn!(score, severity = "medium", "Triage rule fired");
            return Some(verdict);
        }
    }

    None
}
