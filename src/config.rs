/// Application-level constants
pub const APP_NAME: &str = "Aftercare";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Fallback delay when a reminder's time expression carries no
/// recognizable hour[:minute][am/pm] token. A deliberate demo-grade
/// simplification, not a natural-language time parser.
pub const REMINDER_FALLBACK_DELAY_SECS: i64 = 60;

/// Pain score (out of 10) at or above which triage raises a medium alert.
pub const PAIN_ESCALATION_THRESHOLD: u8 = 8;

/// How many of the most recent mood entries the report samples from.
pub const MOOD_SAMPLE_WINDOW: usize = 7;

/// How many sampled mood entries the report actually shows.
pub const MOOD_SAMPLE_DISPLAY: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_aftercare() {
        assert_eq!(APP_NAME, "Aftercare");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_filter_names_crate() {
        assert_eq!(default_log_filter(), "aftercare=info");
    }

    #[test]
    fn mood_display_fits_window() {
        assert!(MOOD_SAMPLE_DISPLAY <= MOOD_SAMPLE_WINDOW);
    }
}
