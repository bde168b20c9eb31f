pub mod enums;
pub mod record;
pub mod review;

pub use enums::BloodPressureStatus;
pub use record::{MedicationRecord, VitalRecord};
pub use review::TreatmentReview;
