//! Error types for the debate system.

use thiserror::Error;

/// Top-level failures while reading a case file.
///
/// Malformed individual elements never produce one of these; they are
/// skipped during ingestion.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Expected an array at top-level or under `cases`")]
    Shape,
}

/// Failures raised by an export adapter.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Report export is unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DebateError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to load cases: {0}")]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Unknown case: {0}")]
    UnknownCase(String),
}
