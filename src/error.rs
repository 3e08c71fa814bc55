use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating, encoding or analyzing drawings.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The backend did not answer the health check.
    #[error(
        "cannot connect to the inference backend at {base_url}. \
         Please ensure Ollama is installed and running ('ollama serve') \
         and the model is pulled ('ollama pull <model>'). Error: {reason}"
    )]
    Connection { base_url: String, reason: String },

    /// A call to the backend failed after the connection was verified.
    #[error("error calling the inference backend: {0}")]
    Network(#[source] reqwest::Error),

    /// The backend did not produce a response in time.
    #[error(
        "model took too long to respond (timeout after {secs}s). \
         Try again - it should be faster next time."
    )]
    Timeout { secs: u64 },

    /// A local image path does not resolve to a readable file.
    #[error("image file not found: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// User input was rejected before contacting the backend.
    #[error("{0}")]
    Validation(String),

    /// The uploaded images exceed the size cap.
    #[error("uploaded images exceed the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalyzerError {
    pub fn validation(message: impl Into<String>) -> Self {
        AnalyzerError::Validation(message.into())
    }

    /// Whether the error means the backend could not be reached at all.
    pub fn is_connection(&self) -> bool {
        matches!(self, AnalyzerError::Connection { .. })
    }
}
