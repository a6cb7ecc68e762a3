//! Error types for the agent subsystem

use thiserror::Error;

/// Errors that can occur while driving an agent run
#[derive(Debug, Error)]
pub enum AgentError {
    /// No agent registered under the requested name
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Invalid agent configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Model adapter error
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Run-level execution error
    #[error("Execution error: {0}")]
    Execution(String),

    /// Round limit reached without any assistant text to finalize with
    #[error("Round limit ({0}) reached without a final response")]
    RoundLimit(u32),

    /// The client went away before the run finished
    #[error("Run was cancelled")]
    Cancelled,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Serialization(err.to_string())
    }
}

/// Errors surfaced by the model client adapter
///
/// The variants distinguish transient transport conditions from request
/// problems so the adapter's retry policy can decide what is worth retrying.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Non-success HTTP status from the completion API
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the remote side
    #[error("Rate limited by completion API")]
    RateLimited,

    /// Missing or rejected credentials
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// The response stream broke mid-flight
    #[error("Streaming error: {0}")]
    Streaming(String),

    /// The response could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// The request was rejected as malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ModelError {
    /// Whether a retry of the same request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Network(_) | ModelError::Timeout | ModelError::RateLimited => true,
            ModelError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Timeout
        } else if err.is_connect() {
            ModelError::Network(format!("Connection error: {}", err))
        } else {
            ModelError::Network(err.to_string())
        }
    }
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Result type alias for model client operations
pub type ModelResult<T> = Result<T, ModelError>;
