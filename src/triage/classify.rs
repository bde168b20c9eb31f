//! Blood-pressure classifier.
//!
//! Pure function over a patient's vital rows. Only rows whose component is
//! the blood-pressure marker participate. First-match-wins is the policy:
//! rows are evaluated in dataset order and the first abnormal reading
//! decides the status.

use crate::models::{BloodPressureStatus, VitalRecord};
use crate::triage::TriageError;

/// Component id marking a blood-pressure observation in the vital dataset.
pub const BLOOD_PRESSURE_COMPONENT: &str = "BloodPressure";

/// Hypertension: above 140/90. Hypotension: below 90/60.
const SYSTOLIC_HIGH: i32 = 140;
const DIASTOLIC_HIGH: i32 = 90;
const SYSTOLIC_LOW: i32 = 90;
const DIASTOLIC_LOW: i32 = 60;

/// Classify a patient's blood pressure from their vital records.
///
/// Returns `Normal` when no blood-pressure row qualifies, including the case
/// of zero matching rows. A reading that satisfies both thresholds reports
/// `Hypertension` — the hypertension check runs first.
pub fn classify(
    patient_id: &str,
    vitals: &[VitalRecord],
) -> Result<BloodPressureStatus, TriageError> {
    let readings = vitals
        .iter()
        .filter(|v| v.patient_id == patient_id && v.component_id == BLOOD_PRESSURE_COMPONENT);

    for record in readings {
        let (systolic, diastolic) = parse_reading(&record.observation_result)?;

        if systolic > SYSTOLIC_HIGH || diastolic > DIASTOLIC_HIGH {
            return Ok(BloodPressureStatus::Hypertension);
        }
        if systolic < SYSTOLIC_LOW || diastolic < DIASTOLIC_LOW {
            return Ok(BloodPressureStatus::Hypotension);
        }
    }

    Ok(BloodPressureStatus::Normal)
}

/// Parse a `"SYSTOLIC/DIASTOLIC"` reading into its two integers.
///
/// Anything other than exactly two integer halves is a
/// [`TriageError::MalformedReading`].
pub fn parse_reading(raw: &str) -> Result<(i32, i32), TriageError> {
    let malformed = || TriageError::MalformedReading(raw.to_string());

    let mut parts = raw.split('/');
    let (systolic, diastolic) = match (parts.next(), parts.next(), parts.next()) {
        (Some(top), Some(bottom), None) => (top, bottom),
        _ => return Err(malformed()),
    };

    let systolic: i32 = systolic.trim().parse().map_err(|_| malformed())?;
    let diastolic: i32 = diastolic.trim().parse().map_err(|_| malformed())?;
    Ok((systolic, diastolic))
}
