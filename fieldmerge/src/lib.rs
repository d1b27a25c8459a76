//! # Fieldmerge - key-matched field updates between delimited files
//!
//! Fieldmerge takes a *source* file and an *input* file, matches their rows on
//! one key column each (case-insensitively), and overwrites one column of every
//! matched source row with a column of the input row.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐
//! │ Source file │────▶│   Parser    │──────────────────────┐
//! └─────────────┘     └─────────────┘                      ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Input file  │────▶│   Parser    │────▶│ LookupIndex │────▶│    Merge    │────▶│   Writer    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fieldmerge::{run, ConsoleSink, MergeConfig};
//!
//! let config = MergeConfig {
//!     source_path: Some("catalog.csv".into()),
//!     input_path: Some("updates.csv".into()),
//!     ..MergeConfig::default()
//! };
//! let summary = run(&config.validate()?, &ConsoleSink::default())?;
//! println!("Updated {} rows", summary.matched);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Rows, datasets and delimiters
//! - [`parser`] - Streaming delimited reader with encoding support
//! - [`writer`] - Delimited writer
//! - [`transform`] - Lookup index, merge engine and pipeline
//! - [`config`] - Layered configuration and validation
//! - [`logs`] - Injected diagnostic sinks

// Core modules
pub mod error;
pub mod models;

// Reading and writing
pub mod parser;
pub mod writer;

// Lookup and merge
pub mod transform;

// Configuration
pub mod config;

// Diagnostics
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, CsvError, DatasetKind, MergeError, PipelineError, PipelineResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Dataset, Delimiter, Row};

// =============================================================================
// Re-exports - Reading and writing
// =============================================================================

pub use parser::{
    detect_encoding, encoding_for_label, parse, parse_str, preview, read_dataset,
    resolve_read_encoding, RecordReader,
};
pub use writer::{encode_text, serialize_rows, write_rows};

// =============================================================================
// Re-exports - Lookup and merge
// =============================================================================

pub use transform::{
    ignore_case, merge, run, run_config, FieldMapping, KeyNormalizer, LookupIndex, MergeOutcome,
    MergeSummary,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{ConfigOverrides, FileSettings, MergeConfig, MergeSettings};

// =============================================================================
// Re-exports - Diagnostics
// =============================================================================

pub use logs::{ConsoleSink, JsonSink, LogEntry, LogLevel, LogSink, MemorySink, NullSink};
