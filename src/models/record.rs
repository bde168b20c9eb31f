use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// One row of the vital dataset. Immutable, sourced externally.
///
/// For blood-pressure rows (`component_id == "BloodPressure"`) the
/// `observation_result` field holds a `"SYSTOLIC/DIASTOLIC"` reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalRecord {
    pub patient_id: String,
    pub component_id: String,
    pub observation_date: Option<NaiveDate>,
    pub observation_time: Option<NaiveTime>,
    pub observation_result: String,
    pub observation_units: Option<String>,
}

/// One row of the medication dataset. Immutable, sourced externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub patient_id: String,
    pub med_interval: Option<String>,
    pub order_start_date: Option<NaiveDateTime>,
    pub description: String,
    pub amount: Option<f64>,
    pub units: Option<String>,
    pub dosage_form: Option<String>,
    pub provider_instructions: String,
}
