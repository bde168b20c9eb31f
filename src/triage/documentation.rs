//! Medication documentation summarizer.
//!
//! Flattens a patient's medication rows into the records block fed to the
//! prompt builder. The byte format is a contract with the few-shot examples:
//! `DESCRIPTION: <description> ||` newline `PROVIDER INSTRUCTIONS:
//! <instructions>`, one blank line between records.

use crate::models::MedicationRecord;

/// Flatten a patient's medication records into a documentation string.
///
/// Rows are kept in dataset order — no sorting, no deduplication — with
/// description and instructions trimmed and lowercased. An empty set yields
/// the literal sentinel `No medication found for <patient_id>`.
pub fn medication_documentation(patient_id: &str, medications: &[MedicationRecord]) -> String {
    let mut documentation = String::new();

    for med in medications.iter().filter(|m| m.patient_id == patient_id) {
        documentation.push_str(&format!(
            "DESCRIPTION: {} ||\nPROVIDER INSTRUCTIONS: {}\n\n",
            med.description.trim().to_lowercase(),
            med.provider_instructions.trim().to_lowercase(),
        ));
    }

    if documentation.is_empty() {
        return format!("No medication found for {patient_id}");
    }
    documentation
}
