use std::env;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "tensio";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Ollama endpoint (local instance).
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default model for treatment reviews.
pub const DEFAULT_MODEL: &str = "medgemma:4b";

/// Default per-request timeout for the model collaborator.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info")
}

/// Get the application data directory (~/.tensio/)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join(".tensio")
}

/// Default SQLite database path.
pub fn default_database_path() -> PathBuf {
    app_data_dir().join("tensio.db")
}

/// Runtime settings, resolved once at startup and injected into the
/// pipeline. Every field has a TENSIO_* environment override.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    pub ollama_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// External prompt template file; None uses the embedded template.
    pub prompt_template: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            database_path: env::var("TENSIO_DATABASE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_database_path()),
            ollama_url: env::var("TENSIO_OLLAMA_URL")
                .unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string()),
            model: env::var("TENSIO_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            timeout_secs: env::var("TENSIO_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            prompt_template: env::var("TENSIO_PROMPT_TEMPLATE").map(PathBuf::from).ok(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            prompt_template: None,
        }
    }
}
