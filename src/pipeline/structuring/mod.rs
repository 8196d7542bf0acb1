pub mod types;
pub mod prompt;
pub mod parser;
pub mod ollama;
pub mod adapter;

pub use types::*;
pub use prompt::*;
pub use parser::*;
pub use ollama::*;
pub use adapter::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("Ollama is not running at {0}")]
    OllamaConnection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Input text too short for structuring (< 10 characters)")]
    InputTooShort,
}

impl StructuringError {
    /// Transport-level failure worth another call.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::OllamaConnection(_) | Self::HttpClient(_) | Self::OllamaError { .. }
        )
    }

    /// The model answered but the answer was unusable.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse(_) | Self::JsonParsing(_) | Self::ResponseParsing(_)
        )
    }
}
