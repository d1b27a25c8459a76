//! Domain models: rows, datasets and delimiters.
//!
//! Rows are addressed by position only. The header is an ordinary row that
//! happens to come first; nothing looks fields up by name.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CsvError, CsvResult, DatasetKind, MergeError, MergeResult};

// =============================================================================
// Row
// =============================================================================

/// One record of a delimited file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Vec<String>);

impl Row {
    pub fn new(fields: Vec<String>) -> Self {
        Self(fields)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn into_fields(self) -> Vec<String> {
        self.0
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Field at `index`, or `IndexOutOfRange` naming the row.
    pub fn field(&self, index: usize, dataset: DatasetKind, record: usize) -> MergeResult<&str> {
        self.get(index).ok_or(MergeError::IndexOutOfRange {
            dataset,
            record,
            index,
            len: self.len(),
        })
    }

    /// Overwrite the field at `index`, returning the previous value.
    pub fn set(&mut self, index: usize, value: String) -> Option<String> {
        self.0
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, value))
    }
}

impl From<Vec<String>> for Row {
    fn from(fields: Vec<String>) -> Self {
        Self(fields)
    }
}

impl From<Vec<&str>> for Row {
    fn from(fields: Vec<&str>) -> Self {
        Self(fields.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Row {
    fn from(fields: [&str; N]) -> Self {
        Self(fields.iter().map(|s| s.to_string()).collect())
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// All records of one file, header first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// The first row, if any.
    pub fn header(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Every row after the header.
    pub fn data_rows(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Split into header and data rows.
    pub fn into_parts(self) -> (Option<Row>, Vec<Row>) {
        let mut rows = self.rows.into_iter();
        let header = rows.next();
        (header, rows.collect())
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Number of rows, header included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows excluding the header.
    pub fn data_len(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

impl From<Vec<Row>> for Dataset {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

impl FromIterator<Row> for Dataset {
    fn from_iter<I: IntoIterator<Item = Row>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// =============================================================================
// Delimiter
// =============================================================================

/// Field separator. Any non-empty string without a quote or line break.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiter(String);

impl Delimiter {
    pub fn new(value: impl Into<String>) -> CsvResult<Self> {
        let value = value.into();
        if value.is_empty() || value.contains(['"', '\r', '\n']) {
            return Err(CsvError::InvalidDelimiter(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The delimiter as one byte, when it is exactly one ASCII character.
    pub fn as_byte(&self) -> Option<u8> {
        match self.0.as_bytes() {
            [b] if b.is_ascii() => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_str() {
            "\t" => write!(f, "\\t"),
            other => write!(f, "{}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_set_replaces_single_field() {
        let mut row = Row::from(["1", "Alice", "X1"]);
        let old = row.set(2, "NEW1".to_string());

        assert_eq!(old.as_deref(), Some("X1"));
        assert_eq!(row, Row::from(["1", "Alice", "NEW1"]));
    }

    #[test]
    fn test_row_set_out_of_range_is_noop() {
        let mut row = Row::from(["a"]);
        assert_eq!(row.set(3, "b".to_string()), None);
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn test_row_field_reports_position() {
        let row = Row::from(["a", "b"]);
        assert_eq!(row.field(1, DatasetKind::Source, 1).unwrap(), "b");

        let err = row.field(2, DatasetKind::Input, 9).unwrap_err();
        let MergeError::IndexOutOfRange { dataset, record, index, len } = err;
        assert_eq!(dataset, DatasetKind::Input);
        assert_eq!((record, index, len), (9, 2, 2));
    }

    #[test]
    fn test_dataset_header_and_data_rows() {
        let dataset = Dataset::new(vec![Row::from(["id"]), Row::from(["1"]), Row::from(["2"])]);

        assert_eq!(dataset.header(), Some(&Row::from(["id"])));
        assert_eq!(dataset.data_rows().len(), 2);
        assert_eq!(dataset.data_len(), 2);

        let (header, rows) = dataset.into_parts();
        assert_eq!(header, Some(Row::from(["id"])));
        assert_eq!(rows, vec![Row::from(["1"]), Row::from(["2"])]);
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset::default();
        assert!(dataset.header().is_none());
        assert!(dataset.data_rows().is_empty());
        assert_eq!(dataset.data_len(), 0);
    }

    #[test]
    fn test_delimiter_validation() {
        assert!(Delimiter::new(",").is_ok());
        assert!(Delimiter::new("||").is_ok());
        assert!(Delimiter::new("").is_err());
        assert!(Delimiter::new("\"").is_err());
        assert!(Delimiter::new(";\n").is_err());
    }

    #[test]
    fn test_delimiter_as_byte() {
        assert_eq!(Delimiter::new(";").unwrap().as_byte(), Some(b';'));
        assert_eq!(Delimiter::new("\t").unwrap().as_byte(), Some(b'\t'));
        assert_eq!(Delimiter::new("::").unwrap().as_byte(), None);
        assert_eq!(Delimiter::new("¦").unwrap().as_byte(), None);
    }

    #[test]
    fn test_dataset_serializes_as_nested_arrays() {
        let dataset = Dataset::new(vec![Row::from(["id", "name"]), Row::from(["1", "Alice"])]);
        let json = serde_json::to_string(&dataset).unwrap();
        assert_eq!(json, r#"[["id","name"],["1","Alice"]]"#);
    }
}
