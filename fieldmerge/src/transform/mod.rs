//! Merge module.
//!
//! - Lookup: input rows keyed by their match-by field
//! - Merge: overwrite one source field per matched row
//! - Pipeline: read, index, merge, write

pub mod lookup;
pub mod merge;
pub mod pipeline;

pub use lookup::{ignore_case, KeyNormalizer, LookupIndex};
pub use merge::{merge, FieldMapping, MergeOutcome};
pub use pipeline::{run, run_config, MergeSummary};
