use std::fmt;

use serde::{Deserialize, Serialize};

/// Blood-pressure classification derived from a patient's vital records.
///
/// Derived per invocation, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodPressureStatus {
    Hypertension,
    Hypotension,
    Normal,
}

impl BloodPressureStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BloodPressureStatus::Hypertension => "Hypertension",
            BloodPressureStatus::Hypotension => "Hypotension",
            BloodPressureStatus::Normal => "Normal",
        }
    }
}

impl fmt::Display for BloodPressureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_is_capitalized() {
        assert_eq!(BloodPressureStatus::Hypertension.to_string(), "Hypertension");
        assert_eq!(BloodPressureStatus::Hypotension.to_string(), "Hypotension");
        assert_eq!(BloodPressureStatus::Normal.to_string(), "Normal");
    }

    #[test]
    fn status_serializes_as_variant_name() {
        let json = serde_json::to_string(&BloodPressureStatus::Hypotension).unwrap();
        assert_eq!(json, "\"Hypotension\"");
    }
}
