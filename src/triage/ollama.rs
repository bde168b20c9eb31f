//! Ollama HTTP client for the model collaborator.
//!
//! The review pipeline talks to the model through the [`ChatModel`] trait;
//! [`OllamaClient`] implements it against a local Ollama `/api/chat`
//! endpoint, and [`MockChatModel`] stands in for tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{DEFAULT_OLLAMA_URL, DEFAULT_TIMEOUT_SECS};
use crate::triage::template::ChatMessage;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Ollama is not reachable at {0}")]
    NotReachable(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Ollama returned an error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Invalid model name: '{0}'")]
    InvalidModelName(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl LlmError {
    /// Whether a retry with backoff may succeed: timeouts, connection
    /// failures and server-side errors are transient; client errors and
    /// malformed responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::NotReachable(_) | LlmError::Timeout(_) | LlmError::Network(_) => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::ResponseParsing(_) | LlmError::InvalidModelName(_) => false,
        }
    }
}

/// Generation parameters for Ollama `/api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOptions {
    /// Sampling temperature. The review pipeline uses 0.0 for
    /// reproducible output.
    pub temperature: f32,
    /// Maximum tokens in the generated response.
    pub num_predict: i32,
    /// Stop sequences; generation halts at the first occurrence.
    pub stop: Vec<String>,
}

impl GenerationOptions {
    /// Deterministic options with the given token budget and stop marker.
    pub fn deterministic(num_predict: i32, stop_marker: &str) -> Self {
        Self {
            temperature: 0.0,
            num_predict,
            stop: vec![stop_marker.to_string()],
        }
    }
}

/// The model collaborator seam.
pub trait ChatModel {
    /// Send a conversation and return the generated text.
    fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, LlmError>;
}

impl<M: ChatModel + ?Sized> ChatModel for std::rc::Rc<M> {
    fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        (**self).chat(model, messages, options)
    }
}

/// Ollama HTTP client for local LLM inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    /// Create a new OllamaClient pointing at an Ollama instance.
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    /// Default local Ollama instance with the default timeout.
    pub fn default_local() -> Self {
        Self::new(DEFAULT_OLLAMA_URL, DEFAULT_TIMEOUT_SECS)
    }
}

/// Request body for Ollama /api/chat
#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: &'a GenerationOptions,
}

/// Response body from Ollama /api/chat
#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

impl ChatModel for OllamaClient {
    fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        validate_model_name(model)?;

        let url = format!("{}/api/chat", self.base_url);
        let body = OllamaChatRequest {
            model,
            messages,
            stream: false,
            options,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                LlmError::NotReachable(self.base_url.clone())
            } else if e.is_timeout() {
                LlmError::Timeout(self.timeout_secs)
            } else {
                LlmError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaChatResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        Ok(parsed.message.content)
    }
}

/// Validate a model name against the Ollama naming convention
/// (`[namespace/]model[:tag]`) before any HTTP call.
pub fn validate_model_name(name: &str) -> Result<(), LlmError> {
    if name.is_empty() {
        return Err(LlmError::InvalidModelName(name.to_string()));
    }

    let valid = regex::Regex::new(
        r"^[a-zA-Z0-9][a-zA-Z0-9._-]*(/[a-zA-Z0-9][a-zA-Z0-9._-]*)?(:[a-zA-Z0-9._-]+)?$",
    )
    .expect("static regex");

    if !valid.is_match(name) {
        return Err(LlmError::InvalidModelName(name.to_string()));
    }

    Ok(())
}

/// Mock collaborator for testing — consumes scripted failures first, then
/// replies with a fixed response.
pub struct MockChatModel {
    reply: String,
    failures: std::cell::RefCell<std::collections::VecDeque<LlmError>>,
    calls: std::cell::Cell<usize>,
}

impl MockChatModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            failures: std::cell::RefCell::new(std::collections::VecDeque::new()),
            calls: std::cell::Cell::new(0),
        }
    }

    /// Fail the first `failures` calls before replying normally.
    pub fn failing_first(failures: Vec<LlmError>, reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            failures: std::cell::RefCell::new(failures.into()),
            calls: std::cell::Cell::new(0),
        }
    }

    /// Number of chat calls received.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl ChatModel for MockChatModel {
    fn chat(
        &self,
        _model: &str,
        _messages: &[ChatMessage],
        _options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(err) = self.failures.borrow_mut().pop_front() {
            return Err(err);
        }
        Ok(self.reply.clone())
    }
}
