//! Error types for Linewatch
//!
//! This module defines all error types used throughout the engine.

use thiserror::Error;

/// Result type alias for Linewatch operations
pub type Result<T> = std::result::Result<T, SpcError>;

/// Main error type for SPC engine operations
#[derive(Error, Debug)]
pub enum SpcError {
    /// A production line definition is not usable
    #[error("Invalid line '{name}': {reason}")]
    InvalidLine { name: String, reason: String },

    /// Two lines share the same name
    #[error("Duplicate line: {0}")]
    DuplicateLine(String),

    /// Lookup of a line that is not registered
    #[error("Unknown line: {0}")]
    UnknownLine(String),

    /// Run parameters are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Estimator or limits input is not usable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A sampling distribution could not be built
    #[error("Distribution error: {0}")]
    Distribution(String),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpcError {
    /// Build an [`SpcError::InvalidLine`] for the named line
    pub fn invalid_line(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLine {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
