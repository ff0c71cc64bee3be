//! Error types for daemon communication
//!
//! This module defines the errors surfaced by the inference client and the
//! model resolver. Model-not-available during a switch is a normal negative
//! result, not an error; everything here is a genuine failure.

use std::fmt;

/// Errors from talking to the inference daemon
#[derive(Debug)]
pub enum ClientError {
    /// Daemon unreachable at the network level
    ConnectionFailed { url: String, reason: String },
    /// Daemon does not know the requested model
    ModelNotFound {
        model: String,
        available: Vec<String>,
    },
    /// Daemon reachable but generation returned an error or malformed result
    GenerationFailed { model: String, reason: String },
    /// Daemon response did not have the expected shape
    UnexpectedPayload { url: String, reason: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::ConnectionFailed { url, reason } => {
                write!(f, "Failed to connect to daemon at {}: {}", url, reason)
            }
            ClientError::ModelNotFound { model, available } => {
                write!(f, "Model '{}' not found", model)?;
                if !available.is_empty() {
                    write!(f, ". Available models: {}", available.join(", "))?;
                }
                Ok(())
            }
            ClientError::GenerationFailed { model, reason } => {
                write!(f, "Generation failed for model '{}': {}", model, reason)
            }
            ClientError::UnexpectedPayload { url, reason } => {
                write!(f, "Unexpected payload from {}: {}", url, reason)
            }
        }
    }
}

impl std::error::Error for ClientError {}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Convert from reqwest errors to client errors
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::ConnectionFailed {
            url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            reason: err.to_string(),
        }
    }
}
