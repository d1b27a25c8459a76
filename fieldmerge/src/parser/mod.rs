//! Delimited text reader.
//!
//! [`parse`] opens a file and returns a [`RecordReader`]: a forward-only
//! iterator that owns the file handle, decodes bytes incrementally with
//! `encoding_rs` and yields one [`Row`] per record, header first.
//!
//! Malformed records (a quote that never closes, text after a closing quote)
//! are skipped: the reader drops the record's first physical line, reports it
//! to the log sink and carries on with the next line.
//!
//! # Example
//! ```ignore
//! use fieldmerge::{parse, Delimiter, NullSink};
//!
//! let delimiter = Delimiter::new(";")?;
//! for row in parse("catalog.csv", &delimiter, encoding_rs::UTF_8, &NullSink)? {
//!     println!("{:?}", row?);
//! }
//! ```

pub mod encoding;
pub mod scanner;

use encoding_rs::{CoderResult, Decoder, Encoding};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{CsvError, CsvResult};
use crate::logs::LogSink;
use crate::models::{Dataset, Delimiter, Row};
use scanner::{count_line_breaks, scan_record, Scan};

pub use encoding::{detect_encoding, detect_file_encoding, encoding_for_label, resolve_read_encoding};

/// Bytes requested from the source per read.
const CHUNK_SIZE: usize = 8 * 1024;

/// Fields shown in a row preview.
const PREVIEW_FIELDS: usize = 3;

/// Characters kept per previewed field.
const PREVIEW_WIDTH: usize = 16;

/// Open `path` and iterate over its records, header first.
pub fn parse<'a, P: AsRef<Path>>(
    path: P,
    delimiter: &Delimiter,
    encoding: &'static Encoding,
    sink: &'a dyn LogSink,
) -> CsvResult<RecordReader<'a, File>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CsvError::io(path, e))?;
    Ok(RecordReader::new(file, path, delimiter, encoding, sink))
}

/// Read every record of `path` into memory.
pub fn read_dataset<P: AsRef<Path>>(
    path: P,
    delimiter: &Delimiter,
    encoding: &'static Encoding,
    sink: &dyn LogSink,
) -> CsvResult<Dataset> {
    parse(path, delimiter, encoding, sink)?.collect()
}

/// Parse text that is already in memory.
pub fn parse_str(text: &str, delimiter: &Delimiter, sink: &dyn LogSink) -> CsvResult<Dataset> {
    RecordReader::new(text.as_bytes(), "<memory>", delimiter, encoding_rs::UTF_8, sink).collect()
}

/// Short, deterministic rendering of the first few fields of a row.
pub fn preview(row: &Row) -> String {
    let mut parts: Vec<String> = row
        .fields()
        .iter()
        .take(PREVIEW_FIELDS)
        .map(|field| {
            if field.chars().count() > PREVIEW_WIDTH {
                let cut: String = field.chars().take(PREVIEW_WIDTH).collect();
                format!("{}…", cut)
            } else {
                field.clone()
            }
        })
        .collect();
    if row.len() > PREVIEW_FIELDS {
        parts.push("…".to_string());
    }
    parts.join(" | ")
}

/// Streaming record iterator over any byte source.
pub struct RecordReader<'a, R> {
    source: R,
    path: PathBuf,
    delimiter: String,
    decoder: Decoder,
    raw: Vec<u8>,
    /// Decoded text; `text[start..]` is not yet turned into records and
    /// begins at a record boundary.
    text: String,
    start: usize,
    eof: bool,
    failed: bool,
    /// 1-based physical line where the next record starts.
    line: usize,
    /// Records yielded so far; the header is record 0.
    records: usize,
    sink: &'a dyn LogSink,
}

impl<'a, R: Read> RecordReader<'a, R> {
    pub fn new(
        source: R,
        path: impl Into<PathBuf>,
        delimiter: &Delimiter,
        encoding: &'static Encoding,
        sink: &'a dyn LogSink,
    ) -> Self {
        Self {
            source,
            path: path.into(),
            delimiter: delimiter.as_str().to_string(),
            decoder: encoding.new_decoder(),
            raw: vec![0; CHUNK_SIZE],
            text: String::new(),
            start: 0,
            eof: false,
            failed: false,
            line: 1,
            records: 0,
            sink,
        }
    }

    /// Decode more input until the unscanned text has at least doubled.
    ///
    /// A record that spans many chunks is rescanned from its start after
    /// every refill, so growth is geometric to keep the total work linear.
    fn fill(&mut self) -> CsvResult<()> {
        if self.start > 0 {
            self.text.drain(..self.start);
            self.start = 0;
        }
        let goal = self.text.len() * 2;
        loop {
            self.fill_chunk()?;
            if self.eof || self.text.len() >= goal {
                return Ok(());
            }
        }
    }

    /// Decode the next chunk into `text`.
    fn fill_chunk(&mut self) -> CsvResult<()> {
        let read = loop {
            match self.source.read(&mut self.raw) {
                Ok(n) => break n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(CsvError::io(&self.path, e)),
            }
        };
        let last = read == 0;
        let mut input = &self.raw[..read];

        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(CHUNK_SIZE * 4);
            self.text.reserve(needed);
            let (result, consumed, had_errors) =
                self.decoder.decode_to_string(input, &mut self.text, last);
            if had_errors {
                self.sink.warning(format!(
                    "{}: undecodable bytes near line {} replaced with U+FFFD",
                    self.path.display(),
                    self.line
                ));
            }
            input = &input[consumed..];
            if let CoderResult::InputEmpty = result {
                break;
            }
        }

        self.eof = last;
        Ok(())
    }

    /// Move past `consumed` bytes of pending text and advance the line counter.
    fn advance(&mut self, consumed: usize) {
        let end = self.start + consumed;
        self.line += count_line_breaks(&self.text[self.start..end]);
        self.start = end;
    }

    fn report(&self, row: &Row) {
        if self.records == 0 {
            self.sink.info(format!("Header: {}", row.fields().join(", ")));
        } else {
            self.sink.debug(format!("Row {}: {}", self.records, preview(row)));
        }
    }

    fn next_record(&mut self) -> CsvResult<Option<Row>> {
        loop {
            match scan_record(&self.text[self.start..], &self.delimiter, self.eof) {
                Scan::Record { fields, consumed } => {
                    self.advance(consumed);
                    let row = Row::new(fields);
                    self.report(&row);
                    self.records += 1;
                    return Ok(Some(row));
                }
                Scan::Blank { consumed } => self.advance(consumed),
                Scan::Malformed { reason, consumed } => {
                    self.sink.warning(format!(
                        "{}: skipped malformed record at line {} ({})",
                        self.path.display(),
                        self.line,
                        reason
                    ));
                    self.advance(consumed);
                }
                Scan::Incomplete if self.eof => return Ok(None),
                Scan::Incomplete => self.fill()?,
            }
        }
    }
}

impl<R: Read> Iterator for RecordReader<'_, R> {
    type Item = CsvResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_record() {
            Ok(row) => row.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{LogLevel, MemorySink, NullSink};

    fn comma() -> Delimiter {
        Delimiter::new(",").unwrap()
    }

    fn rows(dataset: &Dataset) -> Vec<Vec<String>> {
        dataset.rows().iter().map(|r| r.fields().to_vec()).collect()
    }

    /// Hands out one byte per read, so every record spans refills.
    struct Trickle<'b>(&'b [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.0.split_first() {
                Some((b, rest)) if !buf.is_empty() => {
                    buf[0] = *b;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    fn trickle_dataset(text: &str, delimiter: &Delimiter, sink: &dyn LogSink) -> Dataset {
        RecordReader::new(Trickle(text.as_bytes()), "trickle", delimiter, encoding_rs::UTF_8, sink)
            .collect::<CsvResult<_>>()
            .unwrap()
    }

    #[test]
    fn test_header_is_first_row() {
        let dataset = parse_str("id,name\n1,Alice\n2,Bob\n", &comma(), &NullSink).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.header().unwrap().fields(), ["id", "name"]);
        assert_eq!(dataset.data_rows()[1].fields(), ["2", "Bob"]);
    }

    #[test]
    fn test_semicolon_and_quotes() {
        let csv = "name;value\n\"Alice\";\"Hello; World\"\n";
        let dataset = parse_str(csv, &Delimiter::new(";").unwrap(), &NullSink).unwrap();

        assert_eq!(dataset.data_rows()[0].fields(), ["Alice", "Hello; World"]);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let dataset = parse_str("a;b\n1;2\n\n3;4\n", &Delimiter::new(";").unwrap(), &NullSink)
            .unwrap();
        assert_eq!(dataset.data_len(), 2);
    }

    #[test]
    fn test_ragged_rows_kept_as_is() {
        let dataset = parse_str("a,b,c\n1\n1,2,3,4\n", &comma(), &NullSink).unwrap();
        assert_eq!(dataset.data_rows()[0].len(), 1);
        assert_eq!(dataset.data_rows()[1].len(), 4);
    }

    #[test]
    fn test_unmatched_quote_line_is_skipped() {
        let csv = "id,name,code\n1,Alice,X1\n2,\"Bob,X2\n3,Carol,X3\n";
        let expected = vec![
            vec!["id", "name", "code"],
            vec!["1", "Alice", "X1"],
            vec!["3", "Carol", "X3"],
        ];

        let whole = MemorySink::new();
        let trickled = MemorySink::new();
        let dataset = parse_str(csv, &comma(), &whole).unwrap();
        assert_eq!(rows(&dataset), expected);
        assert_eq!(rows(&trickle_dataset(csv, &comma(), &trickled)), expected);

        for sink in [&whole, &trickled] {
            let warnings = sink.messages(LogLevel::Warning);
            assert_eq!(warnings.len(), 1);
            assert!(warnings[0].contains("line 3"));
            assert!(warnings[0].contains("unterminated"));
        }
    }

    #[test]
    fn test_unmatched_quote_in_large_file_reads_in_linear_time() {
        let rows_after = 200_000;
        let mut csv = String::from("id,name,code\n1,\"Alice,X1\n");
        for i in 0..rows_after {
            csv.push_str(&format!("{},name{},C{}\n", i + 2, i, i));
        }
        assert!(csv.len() > 100 * CHUNK_SIZE);

        let started = std::time::Instant::now();
        let dataset = parse_str(&csv, &comma(), &NullSink).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(dataset.data_len(), rows_after);
        assert_eq!(dataset.data_rows()[0].fields(), ["2", "name0", "C0"]);
        assert_eq!(dataset.data_rows()[rows_after - 1].get(0), Some("200001"));
        assert!(elapsed < std::time::Duration::from_secs(10), "took {:?}", elapsed);
    }

    #[test]
    fn test_long_quoted_field_across_many_chunks() {
        let note = "x".repeat(20 * CHUNK_SIZE);
        let csv = format!("id,note\n1,\"{}\"\n2,short\n", note);

        let dataset = parse_str(&csv, &comma(), &NullSink).unwrap();

        assert_eq!(dataset.data_rows()[0].get(1), Some(note.as_str()));
        assert_eq!(dataset.data_rows()[1].fields(), ["2", "short"]);
    }

    #[test]
    fn test_garbage_after_quote_is_skipped() {
        let csv = "a,b\n\"x\"y,1\n2,3\n";
        let dataset = parse_str(csv, &comma(), &NullSink).unwrap();
        assert_eq!(rows(&dataset), vec![vec!["a", "b"], vec!["2", "3"]]);
    }

    #[test]
    fn test_multiline_quoted_field_spans_lines() {
        let csv = "id,note\n1,\"first\nsecond\"\n2,plain\n";
        let sink = MemorySink::new();
        let dataset = parse_str(csv, &comma(), &sink).unwrap();

        assert_eq!(dataset.data_rows()[0].fields(), ["1", "first\nsecond"]);
        assert_eq!(dataset.data_rows()[1].fields(), ["2", "plain"]);
        assert!(sink.messages(LogLevel::Warning).is_empty());
    }

    #[test]
    fn test_diagnostics_per_row() {
        let csv = "id,name,code,extra\n1,A very long name indeed,X1,e\n";
        let sink = MemorySink::new();
        parse_str(csv, &comma(), &sink).unwrap();

        assert_eq!(sink.messages(LogLevel::Info), vec!["Header: id, name, code, extra"]);
        assert_eq!(
            sink.messages(LogLevel::Debug),
            vec!["Row 1: 1 | A very long name… | X1 | …"]
        );
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let dataset = parse_str("", &comma(), &NullSink).unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_small_reads_cross_chunk_boundaries() {
        let csv = "k::v\r\n\"a::b\"::\"multi\r\nline\"\r\nc::d";
        let dataset = trickle_dataset(csv, &Delimiter::new("::").unwrap(), &NullSink);

        assert_eq!(
            rows(&dataset),
            vec![vec!["k", "v"], vec!["a::b", "multi\r\nline"], vec!["c", "d"]]
        );
    }

    #[test]
    fn test_file_with_latin1_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        // "nom;ville\nSociété;Orléans\n" in windows-1252
        let mut bytes = b"nom;ville\nSoci\xe9t\xe9;Orl\xe9ans\n".to_vec();
        bytes.extend_from_slice(b"X;Y\n");
        std::fs::write(&path, bytes).unwrap();

        let dataset = read_dataset(
            &path,
            &Delimiter::new(";").unwrap(),
            encoding_rs::WINDOWS_1252,
            &NullSink,
        )
        .unwrap();

        assert_eq!(dataset.data_rows()[0].fields(), ["Société", "Orléans"]);
        assert_eq!(dataset.data_len(), 2);
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        std::fs::write(&path, b"\xef\xbb\xbfid,name\n1,A\n").unwrap();

        let dataset = read_dataset(&path, &comma(), encoding_rs::UTF_8, &NullSink).unwrap();
        assert_eq!(dataset.header().unwrap().fields(), ["id", "name"]);
    }

    #[test]
    fn test_second_parse_is_a_fresh_pass() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twice.csv");
        std::fs::write(&path, "a\n1\n2\n").unwrap();

        let mut first = parse(&path, &comma(), encoding_rs::UTF_8, &NullSink).unwrap();
        first.next().unwrap().unwrap();
        let second: Dataset = parse(&path, &comma(), encoding_rs::UTF_8, &NullSink)
            .unwrap()
            .collect::<CsvResult<_>>()
            .unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(first.count(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = parse("/definitely/not/here.csv", &comma(), encoding_rs::UTF_8, &NullSink);
        assert!(matches!(result, Err(CsvError::Io { .. })));
    }
}
