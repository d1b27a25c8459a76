//! High-level pipeline: read, index, merge, write.
//!
//! # Example
//!
//! ```rust,ignore
//! use fieldmerge::{run, ConsoleSink, MergeConfig};
//!
//! let (config, _) = MergeConfig::load(None)?;
//! let summary = run(&config.validate()?, &ConsoleSink::default())?;
//! println!("Updated {} rows", summary.matched);
//! ```

use serde::Serialize;
use std::path::PathBuf;

use super::lookup::LookupIndex;
use super::merge::merge;
use crate::config::{MergeConfig, MergeSettings};
use crate::error::PipelineResult;
use crate::logs::{LogEntry, LogSink};
use crate::parser::{encoding_for_label, read_dataset, resolve_read_encoding};
use crate::writer::write_rows;

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    /// Source data rows (header excluded).
    pub source_rows: usize,
    /// Input data rows (header excluded).
    pub input_rows: usize,
    /// Distinct keys in the lookup index.
    pub input_keys: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub output: PathBuf,
}

/// Validate `config`, then run a full merge.
pub fn run_config(config: &MergeConfig, sink: &dyn LogSink) -> PipelineResult<MergeSummary> {
    let settings = config.validate()?;
    run(&settings, sink)
}

/// Run a full merge.
///
/// Nothing is written unless reading, indexing and merging all succeed.
pub fn run(settings: &MergeSettings, sink: &dyn LogSink) -> PipelineResult<MergeSummary> {
    let source_encoding = resolve_read_encoding(&settings.source.encoding, &settings.source.path)?;
    let input_encoding = resolve_read_encoding(&settings.input.encoding, &settings.input.path)?;
    let output_encoding = encoding_for_label(&settings.output.encoding)?;

    // Step 1: source
    sink.info(format!("📖 Reading source: {}", settings.source.path.display()));
    sink.log(
        LogEntry::info(format!(
            "encoding {}, delimiter '{}'",
            source_encoding.name(),
            settings.source.delimiter
        ))
        .with_indent(1),
    );
    let source = read_dataset(
        &settings.source.path,
        &settings.source.delimiter,
        source_encoding,
        sink,
    )?;
    let source_rows = source.data_len();
    sink.success(format!("Read {} source rows", source_rows));

    // Step 2: input → index
    sink.info(format!("📖 Reading input: {}", settings.input.path.display()));
    sink.log(
        LogEntry::info(format!(
            "encoding {}, delimiter '{}'",
            input_encoding.name(),
            settings.input.delimiter
        ))
        .with_indent(1),
    );
    let input = read_dataset(
        &settings.input.path,
        &settings.input.delimiter,
        input_encoding,
        sink,
    )?;
    let input_rows = input.data_len();
    let (_header, input_data) = input.into_parts();
    let index = LookupIndex::build(input_data, settings.mapping.input_match_by, sink)?;
    sink.success(format!(
        "Indexed {} input rows ({} distinct keys)",
        input_rows,
        index.len()
    ));

    // Step 3: merge
    sink.info("⚙️  Merging...".to_string());
    let outcome = merge(source, &index, &settings.mapping, sink)?;
    sink.success(format!(
        "{} rows updated, {} without a match",
        outcome.matched, outcome.unmatched
    ));

    // Step 4: write
    sink.info(format!("💾 Writing: {}", settings.output.path.display()));
    write_rows(
        outcome.dataset.rows(),
        &settings.output.path,
        &settings.output.delimiter,
        output_encoding,
        sink,
    )?;
    sink.success(format!("Wrote {} rows", outcome.dataset.len()));

    Ok(MergeSummary {
        source_rows,
        input_rows,
        input_keys: index.len(),
        matched: outcome.matched,
        unmatched: outcome.unmatched,
        output: settings.output.path.clone(),
    })
}
