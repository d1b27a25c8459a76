//! Merge engine: overwrite one source field from the matched input row.
//!
//! ```text
//! source row  [1, Alice, X1]      index["1"] = [1, NEW1]
//!                        ▲                         │
//!                        └──── source_field ◀──────┘ input_field
//! ```
//!
//! The header passes through untouched. Row order and row count never change.

use serde::{Deserialize, Serialize};

use super::lookup::LookupIndex;
use crate::error::{DatasetKind, MergeResult};
use crate::logs::LogSink;
use crate::models::Dataset;

/// The four field positions a merge works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    /// Key column in the source dataset.
    pub source_match_by: usize,
    /// Column in the source dataset that gets overwritten.
    pub source_field: usize,
    /// Key column in the input dataset.
    pub input_match_by: usize,
    /// Column in the input dataset supplying the new value.
    pub input_field: usize,
}

/// Merged rows plus match counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub dataset: Dataset,
    pub matched: usize,
    pub unmatched: usize,
}

/// Apply `index` to every data row of `source`.
///
/// Fails on the first source row too short for `source_match_by` or
/// `source_field`, or the first matched input row too short for `input_field`.
pub fn merge(
    mut source: Dataset,
    index: &LookupIndex,
    mapping: &FieldMapping,
    sink: &dyn LogSink,
) -> MergeResult<MergeOutcome> {
    let mut matched = 0;
    let mut unmatched = 0;

    for (record, row) in source.rows_mut().iter_mut().enumerate().skip(1) {
        let key = row.field(mapping.source_match_by, DatasetKind::Source, record)?;
        row.field(mapping.source_field, DatasetKind::Source, record)?;

        let Some((input_record, found)) = index.lookup(key) else {
            sink.debug(format!("Source record {}: no input row for key '{}'", record, key));
            unmatched += 1;
            continue;
        };

        let value = found
            .field(mapping.input_field, DatasetKind::Input, input_record)?
            .to_string();
        row.set(mapping.source_field, value);
        matched += 1;
    }

    Ok(MergeOutcome {
        dataset: source,
        matched,
        unmatched,
    })
}
