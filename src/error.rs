//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

/// Banner text shown when the service replied with something unusable.
pub const RETRY_MESSAGE: &str = "AI analysis failed. Please try again.";

/// Banner text shown when a generated CV came back without any sections.
pub const EMPTY_GENERATION_MESSAGE: &str =
    "AI failed to generate CV sections. Please try with a more specific goal.";

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Missing input: {0}")]
    InputValidation(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Response does not match schema: {0}")]
    SchemaViolation(String),

    #[error("Generation produced no CV sections")]
    EmptyGeneration,

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Section refinement failed: {0}")]
    Refinement(String),

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("A task is already in flight")]
    TaskInFlight,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

impl Error {
    /// True for failures of the network call itself rather than of its payload.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::AiProvider(_))
    }

    /// Message stored in the request state for display.
    pub fn user_message(&self) -> String {
        match self {
            Error::MalformedResponse(_) | Error::SchemaViolation(_) => RETRY_MESSAGE.to_string(),
            Error::EmptyGeneration => EMPTY_GENERATION_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
