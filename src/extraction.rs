//! Pattern-based signal extraction from free-text patient messages.
//!
//! Pure scan of one message into zero or more (category, value) entries.
//! A message may hit several categories, but each rule emits at most one
//! entry per call. Timestamping is the caller's job.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::LogCategory;

static PAIN_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)pain\s*(?:is|=|:)?\s*(\d{1,2})").expect("Invalid pain regex")
});

static STEPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{2,6})\s*steps").expect("Invalid steps regex"));

static MEDICATION_CONFIRM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:took|taken|medicine|medication|tablet|pill)\b")
        .expect("Invalid medication regex")
});

static MOOD_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:mood|feeling|anxious|sad|depressed|happy|ok)\b")
        .expect("Invalid mood regex")
});

/// Symptom keywords, checked in order; the first hit logs the message and
/// stops the scan (one symptoms entry max).
static SYMPTOM_KEYWORDS: &[&str] = &[
    "fever",
    "dizzy",
    "dizziness",
    "nausea",
    "bleeding",
    "swelling",
    "pus",
    "infection",
    "shortness of breath",
    "chest pain",
];

/// Extract the pain score from a message, if any ("pain 7", "pain is 7",
/// "pain: 7"). Shared with triage's numeric escalation rule.
pub fn pain_score(text: &str) -> Option<u8> {
    PAIN_SCORE
        .captures(text)
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Scan a message and emit the (category, value) entries it carries.
///
/// Rules apply independently; order of the returned entries is fixed
/// (pain, mobility, medication, mood, symptoms, wound).
pub fn extract(text: &str) -> Vec<(LogCategory, String)> {
    let mut entries = Vec::new();
    let lowered = text.to_lowercase();

    if let Some(score) = pain_score(text) {
        entries.push((LogCategory::Pain, format!("{score}/10")));
    }

    if let Some(cap) = STEPS.captures(text) {
        entries.push((LogCategory::Mobility, format!("{} steps", &cap[1])));
    }

    if MEDICATION_CONFIRM.is_match(text) {
        entries.push((LogCategory::Medication, text.to_string()));
    }

    if MOOD_MENTION.is_match(text) {
        entries.push((LogCategory::Mood, text.to_string()));
    }

    if SYMPTOM_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        entries.push((LogCategory::Symptoms, text.to_string()));
    }

    if lowered.contains("wound") || lowered.contains("photo") || lowered.contains("upload") {
        entries.push((LogCategory::Wound, text.to_string()));
    }

    entries
}
