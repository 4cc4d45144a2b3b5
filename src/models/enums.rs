use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(MessageRole {
    Patient => "patient",
    Companion => "companion",
    System => "system",
});

str_enum!(LogCategory {
    Pain => "pain",
    Medication => "medication",
    Mobility => "mobility",
    Mood => "mood",
    Symptoms => "symptoms",
    Wound => "wound",
    Reminders => "reminders",
});

impl LogCategory {
    /// The closed category set, in report order. Every session carries a
    /// (possibly empty) log for each of these from the moment it is created.
    pub const ALL: [LogCategory; 7] = [
        LogCategory::Pain,
        LogCategory::Medication,
        LogCategory::Mobility,
        LogCategory::Mood,
        LogCategory::Symptoms,
        LogCategory::Wound,
        LogCategory::Reminders,
    ];
}

str_enum!(AlertSeverity {
    Medium => "medium",
    High => "high",
});

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn log_category_round_trips() {
        for cat in LogCategory::ALL {
            assert_eq!(LogCategory::from_str(cat.as_str()).unwrap(), cat);
        }
    }

    #[test]
    fn all_covers_every_category() {
        assert_eq!(LogCategory::ALL.len(), 7);
        assert_eq!(LogCategory::ALL[0], LogCategory::Pain);
        assert_eq!(LogCategory::ALL[6], LogCategory::Reminders);
    }

    #[test]
    fn invalid_enum_value_errors() {
        let err = MessageRole::from_str("doctor").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("MessageRole"));
        assert!(msg.contains("doctor"));
    }

    #[test]
    fn severity_as_str() {
        assert_eq!(AlertSeverity::Medium.as_str(), "medium");
        assert_eq!(AlertSeverity::High.as_str(), "high");
    }
}
