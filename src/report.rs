//! Read-only progress report over a session's logs and alerts.
//!
//! Total over its input: every category has an explicit empty-case line,
//! so a freshly created session produces a complete report, never an
//! error.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{MOOD_SAMPLE_DISPLAY, MOOD_SAMPLE_WINDOW};
use crate::models::LogCategory;
use crate::store::SessionRecord;

static STEP_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*steps").expect("Invalid step count regex"));

/// Build the textual progress summary for one session.
pub fn summarize(record: &SessionRecord) -> String {
    let mut lines = Vec::with_capacity(7);

    // Pain: count + most recent value
    let pains = record.log(LogCategory::Pain);
    match pains.last() {
        Some(last) => lines.push(format!(
            "Pain logs: {} entries; last: {}",
            pains.len(),
            last.value
        )),
        None => lines.push("Pain logs: no entries yet.".to_string()),
    }

    // Medication: count only
    let meds = record.log(LogCategory::Medication);
    if meds.is_empty() {
        lines.push("Medication logs: no entries yet.".to_string());
    } else {
        lines.push(format!("Medication logs: {} entries.", meds.len()));
    }

    // Mobility: re-apply the steps pattern across logged values. Entries
    // without a parseable number are counted but not summed.
    let mobility = record.log(LogCategory::Mobility);
    match mobility.last() {
        Some(last) => {
            let total_steps: u64 = mobility
                .iter()
                .filter_map(|entry| {
                    STEP_COUNT
                        .captures(&entry.value)
                        .and_then(|cap| cap[1].parse::<u64>().ok())
                })
                .sum();
            if total_steps > 0 {
                lines.push(format!(
                    "Mobility: total steps recorded {total_steps}. Last: {}",
                    last.value
                ));
            } else {
                lines.push(format!("Mobility logs: {} entries.", mobility.len()));
            }
        }
        None => lines.push("Mobility: no entries yet.".to_string()),
    }

    // Mood: last MOOD_SAMPLE_DISPLAY of the most recent MOOD_SAMPLE_WINDOW
    let moods = record.log(LogCategory::Mood);
    if moods.is_empty() {
        lines.push("Mood: no entries yet.".to_string());
    } else {
        let window_start = moods.len().saturating_sub(MOOD_SAMPLE_WINDOW);
        let window = &moods[window_start..];
        let display_start = window.len().saturating_sub(MOOD_SAMPLE_DISPLAY);
        let samples: Vec<&str> = window[display_start..]
            .iter()
            .map(|entry| entry.value.as_str())
            .collect();
        lines.push(format!("Recent mood samples: {}", samples.join(", ")));
    }

    // Symptoms and wound: counts
    let symptoms = record.log(LogCategory::Symptoms);
    if symptoms.is_empty() {
        lines.push("Symptom reports: no entries yet.".to_string());
    } else {
        lines.push(format!("Symptom reports: {}", symptoms.len()));
    }

    let wounds = record.log(LogCategory::Wound);
    if wounds.is_empty() {
        lines.push("Wound checks: no entries yet.".to_string());
    } else {
        lines.push(format!("Wound/photo notes: {}", wounds.len()));
    }

    // Alerts: count + most recent reason
    match record.alerts.last() {
        Some(last) => lines.push(format!(
            "Active alerts: {}; last: {}",
            record.alerts.len(),
            last.reason
        )),
        None => lines.push("No active alerts.".to_string()),
    }

    lines.join("\n")
}
