//! Error types for the fieldmerge pipeline.
//!
//! - [`CsvError`] - reading, decoding, encoding and writing delimited files
//! - [`MergeError`] - positional field access during lookup and merge
//! - [`ConfigError`] - loading and validating configuration
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Malformed records are not errors: the reader skips them and reports
//! them to the log sink.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Delimited I/O Errors
// =============================================================================

/// Errors while reading or writing delimited files.
#[derive(Debug, Error)]
pub enum CsvError {
    /// File could not be opened, read or written.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding label is unknown or cannot be used in this direction.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Delimiter is empty or contains a quote or line break.
    #[error("Invalid delimiter {0:?}: must be non-empty and contain no quote or line break")]
    InvalidDelimiter(String),
}

impl CsvError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// =============================================================================
// Merge Errors
// =============================================================================

/// Which dataset a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Source,
    Input,
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetKind::Source => write!(f, "source"),
            DatasetKind::Input => write!(f, "input"),
        }
    }
}

/// Errors during lookup construction and merging.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A configured field index is beyond a row's field count.
    ///
    /// `record` is the 1-based data row number (the header is record 0).
    #[error("{dataset} record {record}: field index {index} out of range (row has {len} fields)")]
    IndexOutOfRange {
        dataset: DatasetKind,
        record: usize,
        index: usize,
        len: usize,
    },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Cannot read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`crate::config::MergeConfig`].
    #[error("Invalid config file '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A required path was not supplied.
    #[error("Missing {0} path")]
    MissingPath(&'static str),

    /// A path does not point to an existing file or directory.
    #[error("{field} not found: {}", path.display())]
    NotFound { field: &'static str, path: PathBuf },

    /// A delimiter value is unusable.
    #[error("Invalid {field} delimiter {value:?}")]
    InvalidDelimiter { field: &'static str, value: String },

    /// An encoding value is unknown.
    #[error("Unsupported {field} encoding {value:?}")]
    UnsupportedEncoding { field: &'static str, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run`] and
/// [`crate::transform::pipeline::run_config`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Reading or writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Field addressing error.
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for delimited I/O.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for lookup and merge.
pub type MergeResult<T> = Result<T, MergeError>;

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;
