//! Delimited text writer.
//!
//! Rows are serialized to text first (one record per `\n`-terminated line,
//! quoting only where needed), then encoded and written in one go.

use encoding_rs::Encoding;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::logs::LogSink;
use crate::models::{Delimiter, Row};

/// Serialize `rows` to `path` using `delimiter` and `encoding`.
///
/// The file is created or truncated. On error its content is unspecified.
pub fn write_rows<'r, I, P>(
    rows: I,
    path: P,
    delimiter: &Delimiter,
    encoding: &'static Encoding,
    sink: &dyn LogSink,
) -> CsvResult<()>
where
    I: IntoIterator<Item = &'r Row>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = serialize_rows(rows, delimiter)?;
    let bytes = encode_text(&text, encoding)?;
    if bytes.had_errors {
        sink.warning(format!(
            "{}: some characters are not representable in {} and were written as numeric references",
            path.display(),
            encoding.name()
        ));
    }

    let mut file = File::create(path).map_err(|e| CsvError::io(path, e))?;
    file.write_all(&bytes.data).map_err(|e| CsvError::io(path, e))?;
    file.flush().map_err(|e| CsvError::io(path, e))?;
    Ok(())
}

/// Render rows as delimited text.
pub fn serialize_rows<'r, I>(rows: I, delimiter: &Delimiter) -> CsvResult<String>
where
    I: IntoIterator<Item = &'r Row>,
{
    match delimiter.as_byte() {
        Some(byte) => serialize_with_csv(rows, byte),
        None => Ok(serialize_multi(rows, delimiter.as_str())),
    }
}

fn serialize_with_csv<'r, I>(rows: I, delimiter: u8) -> CsvResult<String>
where
    I: IntoIterator<Item = &'r Row>,
{
    let to_io = |e: csv::Error| CsvError::io("<buffer>", std::io::Error::other(e));

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row.fields()).map_err(to_io)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CsvError::io("<buffer>", std::io::Error::other(e.to_string())))?;

    // every field was a String, so the buffer is valid UTF-8
    String::from_utf8(bytes)
        .map_err(|e| CsvError::io("<buffer>", std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn serialize_multi<'r, I>(rows: I, delimiter: &str) -> String
where
    I: IntoIterator<Item = &'r Row>,
{
    let mut out = String::new();
    for row in rows {
        match row.fields() {
            [only] if only.is_empty() => out.push_str("\"\""),
            fields => {
                let escaped: Vec<String> = fields.iter().map(|f| escape_field(f, delimiter)).collect();
                out.push_str(&escaped.join(delimiter));
            }
        }
        out.push('\n');
    }
    out
}

/// Quote a field if it contains the delimiter, a quote or a line break.
pub fn escape_field(field: &str, delimiter: &str) -> String {
    if field.contains(delimiter) || field.contains(['"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Encoded output plus whether anything had to be substituted.
pub struct EncodedText {
    pub data: Vec<u8>,
    pub had_errors: bool,
}

/// Encode `text` into `encoding`.
///
/// UTF-16 is produced without a byte-order mark. The `replacement` encoding
/// has no encoder and is rejected.
pub fn encode_text(text: &str, encoding: &'static Encoding) -> CsvResult<EncodedText> {
    if encoding == encoding_rs::UTF_16LE {
        let data = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        return Ok(EncodedText { data, had_errors: false });
    }
    if encoding == encoding_rs::UTF_16BE {
        let data = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
        return Ok(EncodedText { data, had_errors: false });
    }
    if encoding.output_encoding() != encoding {
        return Err(CsvError::UnsupportedEncoding(encoding.name().to_string()));
    }

    let (data, _, had_errors) = encoding.encode(text);
    Ok(EncodedText {
        data: data.into_owned(),
        had_errors,
    })
}
