//! Few-shot prompt template for the treatment review conversation.
//!
//! The worked examples are calibration data, not live data: they steer the
//! model's output format and must reach the model byte-for-byte. They ship
//! as a versioned JSON resource embedded in the binary; an external file can
//! replace it (TENSIO_PROMPT_TEMPLATE) so tests and deployments are not
//! coupled to the wording.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::BloodPressureStatus;
use crate::triage::TriageError;

/// Role tag of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged message in the prompt conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Placeholders the query template must carry.
pub const PATIENT_PLACEHOLDER: &str = "{patient_id}";
pub const STATUS_PLACEHOLDER: &str = "{status}";
pub const RECORDS_PLACEHOLDER: &str = "{documentation}";

const EMBEDDED_TEMPLATE: &str =
    include_str!("../../resources/prompts/treatment_review_v1.json");

/// Versioned few-shot prompt template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    pub version: u32,
    /// Literal token the model must emit to end generation; also sent as
    /// the collaborator's stop sequence.
    pub stop_marker: String,
    /// Physician persona instruction.
    pub system: String,
    /// Worked example turns, each a complete user message ending in a
    /// terminated TREATMENT answer.
    pub examples: Vec<String>,
    /// Live query with `{patient_id}`, `{status}` and `{documentation}`
    /// placeholders and an empty TREATMENT field.
    pub query_template: String,
}

impl PromptTemplate {
    /// The template compiled into the binary.
    pub fn embedded() -> Self {
        Self::parse(EMBEDDED_TEMPLATE).expect("embedded prompt template is valid")
    }

    /// Load a template from an external JSON file.
    pub fn load(path: &Path) -> Result<Self, TriageError> {
        let json = std::fs::read_to_string(path).map_err(|e| TriageError::TemplateRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&json)
    }

    fn parse(json: &str) -> Result<Self, TriageError> {
        let template: PromptTemplate = serde_json::from_str(json)
            .map_err(|e| TriageError::TemplateInvalid(e.to_string()))?;
        template.validate()?;
        Ok(template)
    }

    fn validate(&self) -> Result<(), TriageError> {
        if self.stop_marker.is_empty() {
            return Err(TriageError::TemplateInvalid("empty stop marker".into()));
        }
        if self.system.is_empty() {
            return Err(TriageError::TemplateInvalid("empty system instruction".into()));
        }
        if self.examples.is_empty() {
            return Err(TriageError::TemplateInvalid("no worked examples".into()));
        }
        for (i, example) in self.examples.iter().enumerate() {
            if !example.ends_with(&self.stop_marker) {
                return Err(TriageError::TemplateInvalid(format!(
                    "example {i} is not terminated by the stop marker"
                )));
            }
        }
        for placeholder in [PATIENT_PLACEHOLDER, STATUS_PLACEHOLDER, RECORDS_PLACEHOLDER] {
            if !self.query_template.contains(placeholder) {
                return Err(TriageError::TemplateInvalid(format!(
                    "query template is missing the {placeholder} placeholder"
                )));
            }
        }
        Ok(())
    }

    /// Compose the full conversation: system instruction, worked examples
    /// verbatim, then the live query with an empty TREATMENT field.
    ///
    /// Trailing blank lines of the documentation are collapsed so TREATMENT:
    /// always starts on the line after the records block. Produces a data
    /// structure only — never calls the model.
    pub fn build_conversation(
        &self,
        patient_id: &str,
        status: BloodPressureStatus,
        documentation: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.examples.len() + 2);
        messages.push(ChatMessage::system(self.system.clone()));
        for example in &self.examples {
            messages.push(ChatMessage::user(example.clone()));
        }

        let query = self
            .query_template
            .replace(PATIENT_PLACEHOLDER, patient_id)
            .replace(STATUS_PLACEHOLDER, status.as_str())
            .replace(RECORDS_PLACEHOLDER, documentation.trim_end());
        messages.push(ChatMessage::user(query));

        messages
    }
}
