//! Error types for the proof-of-human collector

use thiserror::Error;

/// Errors that can occur while collecting, encoding or solving
#[derive(Debug, Error)]
pub enum ProofError {
    #[error("Invalid {field} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid hex in {0}")]
    InvalidHex(String),

    #[error("Failed to parse interaction input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl ProofError {
    /// Build an `InvalidLength` error for a fixed-size buffer
    pub fn invalid_length(field: &'static str, expected: usize, actual: usize) -> Self {
        ProofError::InvalidLength {
            field,
            expected,
            actual,
        }
    }
}
