//! Key-indexed lookup over the input dataset.
//!
//! ```text
//! Input rows                       LookupIndex (match_by = 0)
//! ┌───────────────────┐           ┌──────────────────────────┐
//! │ abc, old          │           │ "ABC" → [Abc, new]       │
//! │ xyz, 42           │    →      │ "XYZ" → [xyz, 42]        │
//! │ Abc, new          │           └──────────────────────────┘
//! └───────────────────┘
//! ```
//!
//! Keys go through an explicit normalizer before hashing, so equality never
//! depends on the current locale. Later rows replace earlier ones.

use std::collections::HashMap;

use crate::error::{DatasetKind, MergeResult};
use crate::logs::LogSink;
use crate::models::Row;

/// Maps a raw field value to the key it is stored and looked up under.
pub type KeyNormalizer = fn(&str) -> String;

/// Case-insensitive ordinal key: each character becomes its simple uppercase
/// form. Characters whose uppercase is several characters (`ß`) stay as-is.
pub fn ignore_case(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(u), None) => u,
                _ => c,
            }
        })
        .collect()
}

/// Input rows keyed by their match-by field.
#[derive(Clone)]
pub struct LookupIndex {
    normalize: KeyNormalizer,
    /// Normalized key → (1-based input record number, row).
    entries: HashMap<String, (usize, Row)>,
}

impl std::fmt::Debug for LookupIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupIndex")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl LookupIndex {
    /// Empty index using `normalize` for every key.
    pub fn new(normalize: KeyNormalizer) -> Self {
        Self {
            normalize,
            entries: HashMap::new(),
        }
    }

    /// Build a case-insensitive index from input data rows (header excluded).
    pub fn build<I>(rows: I, match_by: usize, sink: &dyn LogSink) -> MergeResult<Self>
    where
        I: IntoIterator<Item = Row>,
    {
        Self::build_with(ignore_case, rows, match_by, sink)
    }

    /// Same as [`LookupIndex::build`] with a custom normalizer.
    pub fn build_with<I>(
        normalize: KeyNormalizer,
        rows: I,
        match_by: usize,
        sink: &dyn LogSink,
    ) -> MergeResult<Self>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut index = Self::new(normalize);

        for (i, row) in rows.into_iter().enumerate() {
            let record = i + 1;
            let key = row.field(match_by, DatasetKind::Input, record)?.to_string();
            if index.insert(&key, record, row).is_some() {
                sink.warning(format!(
                    "Input record {}: duplicate key '{}' replaces an earlier row",
                    record, key
                ));
            }
        }

        Ok(index)
    }

    /// Store input record `record` under `key`, returning the row it replaced.
    pub fn insert(&mut self, key: &str, record: usize, row: Row) -> Option<Row> {
        self.entries
            .insert((self.normalize)(key), (record, row))
            .map(|(_, old)| old)
    }

    pub fn get(&self, key: &str) -> Option<&Row> {
        self.lookup(key).map(|(_, row)| row)
    }

    /// The matching row together with its input record number.
    pub fn lookup(&self, key: &str) -> Option<(usize, &Row)> {
        self.entries
            .get(&(self.normalize)(key))
            .map(|(record, row)| (*record, row))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MergeError;
    use crate::logs::{LogLevel, MemorySink, NullSink};

    #[test]
    fn test_ignore_case() {
        assert_eq!(ignore_case("abc"), "ABC");
        assert_eq!(ignore_case("AbC-9"), "ABC-9");
        assert_eq!(ignore_case("éß"), "Éß");
        assert_eq!(ignore_case(""), "");
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let rows = vec![Row::from(["abc", "val"])];
        let index = LookupIndex::build(rows, 0, &NullSink).unwrap();

        assert_eq!(index.get("ABC").unwrap().fields(), ["abc", "val"]);
        assert!(index.contains_key("aBc"));
        assert!(!index.contains_key("abd"));
    }

    #[test]
    fn test_last_write_wins() {
        let rows = vec![
            Row::from(["k1", "first"]),
            Row::from(["other", "x"]),
            Row::from(["K1", "second"]),
        ];
        let sink = MemorySink::new();
        let index = LookupIndex::build(rows, 0, &sink).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("k1").unwrap().get(1), Some("second"));
        assert_eq!(index.lookup("K1").unwrap().0, 3);

        let warnings = sink.messages(LogLevel::Warning);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("record 3"));
    }

    #[test]
    fn test_match_by_other_column() {
        let rows = vec![Row::from(["v1", "KEY"]), Row::from(["v2", "other"])];
        let index = LookupIndex::build(rows, 1, &NullSink).unwrap();

        assert_eq!(index.get("key").unwrap().get(0), Some("v1"));
    }

    #[test]
    fn test_short_row_is_index_out_of_range() {
        let rows = vec![Row::from(["a", "b"]), Row::from(["c"])];
        let err = LookupIndex::build(rows, 1, &NullSink).unwrap_err();

        let MergeError::IndexOutOfRange { dataset, record, index, len } = err;
        assert_eq!(dataset, DatasetKind::Input);
        assert_eq!((record, index, len), (2, 1, 1));
    }

    #[test]
    fn test_custom_normalizer_is_exact() {
        fn exact(value: &str) -> String {
            value.to_string()
        }
        let rows = vec![Row::from(["abc", "1"])];
        let index = LookupIndex::build_with(exact, rows, 0, &NullSink).unwrap();

        assert!(index.contains_key("abc"));
        assert!(!index.contains_key("ABC"));
    }

    #[test]
    fn test_empty_input() {
        let index = LookupIndex::build(Vec::new(), 3, &NullSink).unwrap();
        assert!(index.is_empty());
    }
}
