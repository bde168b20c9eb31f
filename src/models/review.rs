use serde::{Deserialize, Serialize};

use super::BloodPressureStatus;

/// Structured result of one patient review — the single output of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatmentReview {
    pub patient_id: String,
    pub status: BloodPressureStatus,
    /// Generated treatment summary, or the fixed bypass message when the
    /// blood pressure is normal.
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_serializes_with_status_string() {
        let review = TreatmentReview {
            patient_id: "p1".into(),
            status: BloodPressureStatus::Hypertension,
            output: "documented regimen addresses the abnormality".into(),
        };
        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["patient_id"], "p1");
        assert_eq!(json["status"], "Hypertension");
        assert!(json["output"].as_str().unwrap().contains("regimen"));
    }
}
