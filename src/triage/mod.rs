pub mod classify;
pub mod documentation;
pub mod ollama;
pub mod review;
pub mod template;

use thiserror::Error;

use crate::db::DatabaseError;
use ollama::LlmError;

#[derive(Error, Debug)]
pub enum TriageError {
    /// The patient id is absent from the vital dataset. Raised before
    /// classification; the model collaborator is never invoked.
    #[error("No vital records found for patient '{0}'")]
    PatientNotFound(String),

    /// A blood-pressure reading that is not two integers joined by a single
    /// slash. Propagated, never skipped: a malformed reading must not be
    /// mistaken for "no data".
    #[error("Malformed blood pressure reading: '{0}'")]
    MalformedReading(String),

    #[error("Cannot read prompt template {path}: {reason}")]
    TemplateRead { path: String, reason: String },

    #[error("Invalid prompt template: {0}")]
    TemplateInvalid(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Model collaborator failed: {0}")]
    Llm(#[from] LlmError),
}
