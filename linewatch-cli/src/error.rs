// Linewatch CLI - Console driver for the Linewatch SPC engine
//
// Licensed under AGPL-3.0.
// See LICENSE file for details.

//! Error types for the console driver.

use thiserror::Error;

/// Errors raised while driving a run.
#[derive(Error, Debug)]
pub enum CliError {
    /// Engine or configuration error.
    #[error("{0}")]
    Engine(#[from] linewatch::SpcError),

    /// Console or file I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON output error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Metrics registry or encoding error.
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Metrics text was not valid UTF-8.
    #[error("Metrics encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Result type alias for the console driver.
pub type Result<T> = std::result::Result<T, CliError>;
