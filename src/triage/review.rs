//! Review orchestrator: records → classification → documentation → prompt →
//! model → structured result.

use rusqlite::Connection;

use crate::db::repository::{medication, vital};
use crate::models::{BloodPressureStatus, TreatmentReview};
use crate::triage::classify::classify;
use crate::triage::documentation::medication_documentation;
use crate::triage::ollama::{ChatModel, GenerationOptions, LlmError};
use crate::triage::template::{ChatMessage, PromptTemplate};
use crate::triage::TriageError;

/// Fixed output when classification finds nothing abnormal; the model
/// collaborator is never invoked on this path.
pub const NORMAL_BYPASS_MESSAGE: &str = "Patient blood pressure is normal";

/// Token budget for the generated treatment summary.
const MAX_OUTPUT_TOKENS: i32 = 256;

/// Maximum model attempts for transient failures.
const MAX_LLM_ATTEMPTS: usize = 3;

/// Base delay between attempts; doubles per retry.
const RETRY_BASE_DELAY_MS: u64 = 200;

/// Runs one patient review end to end.
///
/// Holds the model collaborator behind the [`ChatModel`] seam, the few-shot
/// template, and the model name; record access goes through the repository
/// with a caller-supplied connection.
pub struct TreatmentReviewer {
    llm: Box<dyn ChatModel>,
    model: String,
    template: PromptTemplate,
}

impl TreatmentReviewer {
    pub fn new(llm: Box<dyn ChatModel>, model: &str, template: PromptTemplate) -> Self {
        Self {
            llm,
            model: model.to_string(),
            template,
        }
    }

    /// Review one patient and return the structured result.
    ///
    /// A patient absent from the vital dataset is a
    /// [`TriageError::PatientNotFound`], raised before classification. A
    /// normal classification bypasses the model entirely.
    pub fn review(
        &self,
        conn: &Connection,
        patient_id: &str,
    ) -> Result<TreatmentReview, TriageError> {
        if !vital::patient_has_vitals(conn, patient_id)? {
            return Err(TriageError::PatientNotFound(patient_id.to_string()));
        }

        let vitals = vital::vitals_for_patient(conn, patient_id)?;
        let status = classify(patient_id, &vitals)?;
        tracing::info!(patient = %patient_id, status = %status, "blood pressure classified");

        if status == BloodPressureStatus::Normal {
            return Ok(TreatmentReview {
                patient_id: patient_id.to_string(),
                status,
                output: NORMAL_BYPASS_MESSAGE.to_string(),
            });
        }

        let medications = medication::medications_for_patient(conn, patient_id)?;
        let documentation = medication_documentation(patient_id, &medications);
        let conversation = self.template.build_conversation(patient_id, status, &documentation);

        let raw = self.call_with_retry(&conversation, patient_id)?;
        let output = truncate_at_marker(&raw, &self.template.stop_marker);

        Ok(TreatmentReview {
            patient_id: patient_id.to_string(),
            status,
            output,
        })
    }

    /// Call the model, retrying transient failures with doubling backoff.
    fn call_with_retry(
        &self,
        conversation: &[ChatMessage],
        patient_id: &str,
    ) -> Result<String, LlmError> {
        let options =
            GenerationOptions::deterministic(MAX_OUTPUT_TOKENS, &self.template.stop_marker);
        let mut delay_ms = RETRY_BASE_DELAY_MS;

        for attempt in 1..=MAX_LLM_ATTEMPTS {
            match self.llm.chat(&self.model, conversation, &options) {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_transient() && attempt < MAX_LLM_ATTEMPTS => {
                    tracing::warn!(
                        patient = %patient_id,
                        attempt,
                        error = %e,
                        "model call failed, retrying"
                    );
                    std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                    delay_ms *= 2;
                }
                Err(e) => return Err(e),
            }
        }
        unreachable!("retry loop always returns")
    }
}

/// Truncate generated text at the first occurrence of the stop marker.
///
/// The marker is also sent as the collaborator's stop sequence; a
/// collaborator that echoes the marker anyway is still truncated here.
fn truncate_at_marker(text: &str, marker: &str) -> String {
    match text.find(marker) {
        Some(index) => text[..index].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::db::repository::{medication::insert_medication, vital::insert_vital};
    use crate::db::sqlite::open_memory_database;
    use crate::models::{MedicationRecord, VitalRecord};
    use crate::triage::ollama::MockChatModel;

    fn bp(patient_id: &str, result: &str) -> VitalRecord {
        VitalRecord {
            patient_id: patient_id.to_string(),
            component_id: "BloodPressure".to_string(),
            observation_date: None,
            observation_time: None,
            observation_result: result.to_string(),
            observation_units: Some("mmHg".to_string()),
        }
    }

    fn med(patient_id: &str, description: &str, instructions: &str) -> MedicationRecord {
        MedicationRecord {
            patient_id: patient_id.to_string(),
            med_interval: None,
            order_start_date: None,
            description: description.to_string(),
            amount: None,
            units: None,
            dosage_form: None,
            provider_instructions: instructions.to_string(),
        }
    }

    fn reviewer_with(mock: Rc<MockChatModel>) -> (TreatmentReviewer, rusqlite::Connection) {
        let conn = open_memory_database().unwrap();
        let reviewer =
            TreatmentReviewer::new(Box::new(mock), "medgemma:4b", PromptTemplate::embedded());
        (reviewer, conn)
    }

    #[test]
    fn unknown_patient_short_circuits_before_the_model() {
        let mock = Rc::new(MockChatModel::replying("should never be used"));
        let (reviewer, conn) = reviewer_with(Rc::clone(&mock));

        let err = reviewer.review(&conn, "ghost").unwrap_err();
        assert!(matches!(err, TriageError::PatientNotFound(ref id) if id == "ghost"));
        assert_eq!(mock.calls(), 0);
    }

    #[test]
    fn normal_patient_bypasses_the_model() {
        let conn = open_memory_database().unwrap();
        insert_vital(&conn, &bp("p1", "120/70")).unwrap();
        let mock = MockChatModel::replying("should never be used");
        let reviewer =
            TreatmentReviewer::new(Box::new(mock), "medgemma:4b", PromptTemplate::embedded());

        let review = reviewer.review(&conn, "p1").unwrap();
        assert_eq!(review.status, BloodPressureStatus::Normal);
        assert_eq!(review.output, NORMAL_BYPASS_MESSAGE);
    }

    #[test]
    fn normal_patient_makes_zero_model_calls() {
        let conn = open_memory_database().unwrap();
        insert_vital(&conn, &bp("p1", "120/70")).unwrap();
        let mock = Rc::new(MockChatModel::replying("unused"));
        let reviewer = TreatmentReviewer::new(
            Box::new(Rc::clone(&mock)),
            "medgemma:4b",
            PromptTemplate::embedded(),
        );
        let review = reviewer.review(&conn, "p1").unwrap();
        assert_eq!(mock.calls(), 0);
        assert_eq!(review.output, NORMAL_BYPASS_MESSAGE);
    }

    #[test]
    fn abnormal_patient_gets_generated_summary() {
        let conn = open_memory_database().unwrap();
        insert_vital(&conn, &bp("p1", "150/95")).unwrap();
        insert_medication(&conn, &med("p1", "Lisinopril 20 MG", "take once daily")).unwrap();
        let mock = MockChatModel::replying(
            " The records do address the abnormality: lisinopril treats hypertension.",
        );
        let reviewer =
            TreatmentReviewer::new(Box::new(mock), "medgemma:4b", PromptTemplate::embedded());

        let review = reviewer.review(&conn, "p1").unwrap();
        assert_eq!(review.status, BloodPressureStatus::Hypertension);
        assert!(review.output.contains("lisinopril treats hypertension"));
    }

    #[test]
    fn round_trip_truncates_echo_at_stop_marker() {
        let conn = open_memory_database().unwrap();
        insert_vital(&conn, &bp("p2", "85/55")).unwrap();
        let template = PromptTemplate::embedded();
        let reply = format!(
            "no documented treatment for the hypotension{}ignored trailing text",
            template.stop_marker
        );
        let mock = MockChatModel::replying(&reply);
        let reviewer = TreatmentReviewer::new(Box::new(mock), "medgemma:4b", template);

        let review = reviewer.review(&conn, "p2").unwrap();
        assert_eq!(review.output, "no documented treatment for the hypotension");
        assert_eq!(review.status, BloodPressureStatus::Hypotension);
    }

    #[test]
    fn transient_failures_are_retried() {
        let conn = open_memory_database().unwrap();
        insert_vital(&conn, &bp("p1", "150/95")).unwrap();
        let mock = MockChatModel::failing_first(
            vec![LlmError::Timeout(1), LlmError::Network("reset".into())],
            "recovered summary",
        );
        let reviewer =
            TreatmentReviewer::new(Box::new(mock), "medgemma:4b", PromptTemplate::embedded());

        let review = reviewer.review(&conn, "p1").unwrap();
        assert_eq!(review.output, "recovered summary");
    }

    #[test]
    fn transient_failures_exhaust_the_attempt_budget() {
        let conn = open_memory_database().unwrap();
        insert_vital(&conn, &bp("p1", "150/95")).unwrap();
        let mock = MockChatModel::failing_first(
            vec![
                LlmError::Timeout(1),
                LlmError::Timeout(1),
                LlmError::Timeout(1),
            ],
            "never reached",
        );
        let reviewer =
            TreatmentReviewer::new(Box::new(mock), "medgemma:4b", PromptTemplate::embedded());

        let err = reviewer.review(&conn, "p1").unwrap_err();
        assert!(matches!(err, TriageError::Llm(LlmError::Timeout(_))));
    }

    #[test]
    fn non_transient_failure_surfaces_immediately() {
        let conn = open_memory_database().unwrap();
        insert_vital(&conn, &bp("p1", "150/95")).unwrap();
        let mock = MockChatModel::failing_first(
            vec![LlmError::Api {
                status: 404,
                body: "model not found".into(),
            }],
            "never reached",
        );
        let reviewer =
            TreatmentReviewer::new(Box::new(mock), "medgemma:4b", PromptTemplate::embedded());

        let err = reviewer.review(&conn, "p1").unwrap_err();
        assert!(matches!(
            err,
            TriageError::Llm(LlmError::Api { status: 404, .. })
        ));
    }

    #[test]
    fn malformed_reading_propagates() {
        let conn = open_memory_database().unwrap();
        insert_vital(&conn, &bp("p1", "not-a-reading")).unwrap();
        let mock = MockChatModel::replying("unused");
        let reviewer =
            TreatmentReviewer::new(Box::new(mock), "medgemma:4b", PromptTemplate::embedded());

        let err = reviewer.review(&conn, "p1").unwrap_err();
        assert!(matches!(err, TriageError::MalformedReading(_)));
    }

    #[test]
    fn missing_medications_flow_through_as_sentinel() {
        let conn = open_memory_database().unwrap();
        insert_vital(&conn, &bp("p2", "85/55")).unwrap();
        // No medications inserted: the documentation sentinel reaches the
        // prompt and the review still succeeds.
        let mock = MockChatModel::replying("no documented treatment");
        let reviewer =
            TreatmentReviewer::new(Box::new(mock), "medgemma:4b", PromptTemplate::embedded());

        let review = reviewer.review(&conn, "p2").unwrap();
        assert_eq!(review.output, "no documented treatment");
    }

    #[test]
    fn truncate_without_marker_returns_text_unchanged() {
        assert_eq!(truncate_at_marker("plain text", "<END>"), "plain text");
        assert_eq!(truncate_at_marker("before<END>after", "<END>"), "before");
        assert_eq!(truncate_at_marker("<END>", "<END>"), "");
    }
}
