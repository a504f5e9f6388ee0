use std::path::PathBuf;
use thiserror::Error;

use crate::models::SkipReason;

/// All errors produced by the state-peaks pipeline.
#[derive(Error, Debug)]
pub enum PeaksError {
    /// The input had no header line at all.
    #[error("input CSV is empty")]
    EmptyInput,

    /// The header lacks one or more of the date / region / value columns.
    #[error("missing required columns in CSV header: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// A data row was rejected while running in strict mode.
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: SkipReason },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The report could not be written to its destination.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON configuration document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the peaks crates.
pub type Result<T> = std::result::Result<T, PeaksError>;
