//! Error types for pedon operations.
//!
//! One crate-wide enum covers the whole failure taxonomy: training-time
//! configuration problems, startup artifact loading, request validation,
//! and numeric failures during fitting or prediction. No component
//! retries; every failure is synchronous and visible to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pedon operations.
#[derive(Debug, Error)]
pub enum PedonError {
    /// Dataset file or a required column is missing at training time. Fatal.
    #[error("configuration error: {message}")]
    Config {
        /// What was missing or malformed
        message: String,
    },

    /// A required persisted artifact is missing or unreadable at startup.
    /// Fatal; the serving process must not reach Ready.
    #[error("artifact load failed from {}: missing or unreadable [{}]", dir.display(), missing.join(", "))]
    ArtifactLoad {
        /// Artifact directory that was inspected
        dir: PathBuf,
        /// Names of the missing or corrupt artifact files
        missing: Vec<String>,
    },

    /// An inference request is missing a required field or carries a
    /// non-numeric value. Surfaced to the caller, no retry.
    #[error("validation error: {message}")]
    Validation {
        /// What failed to validate
        message: String,
    },

    /// Unexpected failure during scaling or model invocation.
    #[error("prediction failed: {message}")]
    Prediction {
        /// Descriptive failure message
        message: String,
    },

    /// Matrix/vector dimensions don't match for the operation.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// The normal-equations system is singular (not positive definite).
    #[error("singular matrix: normal equations are not positive definite")]
    SingularMatrix,

    /// Invalid hyperparameter value provided.
    #[error("invalid hyperparameter: {param} = {value}, expected {constraint}")]
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// I/O error (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Generic error with string message.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for PedonError {
    fn from(msg: &str) -> Self {
        PedonError::Other(msg.to_string())
    }
}

impl From<String> for PedonError {
    fn from(msg: String) -> Self {
        PedonError::Other(msg)
    }
}

impl PedonError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a prediction error.
    #[must_use]
    pub fn prediction(message: impl Into<String>) -> Self {
        Self::Prediction {
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error with descriptive context.
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, PedonError>;
