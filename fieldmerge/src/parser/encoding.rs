//! Encoding lookup and detection.

use encoding_rs::Encoding;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};

/// Label that asks for detection instead of naming an encoding.
pub const AUTO: &str = "auto";

/// Bytes sampled from the start of a file for detection.
const SAMPLE_SIZE: u64 = 64 * 1024;

/// Resolve a WHATWG encoding label (`utf-8`, `latin1`, `cp1252`, `utf-16le`...).
pub fn encoding_for_label(label: &str) -> CsvResult<&'static Encoding> {
    let normalized = match label.trim().to_lowercase().as_str() {
        "utf8" => "utf-8".to_string(),
        "latin-1" => "latin1".to_string(),
        other => other.to_string(),
    };
    Encoding::for_label(normalized.as_bytes())
        .ok_or_else(|| CsvError::UnsupportedEncoding(label.to_string()))
}

/// Detect the encoding of raw bytes using chardet.
///
/// Falls back to UTF-8 when chardet names something encoding_rs does not know.
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    let (charset, _confidence, _language) = chardet::detect(&bytes.to_vec());

    let label = match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-15".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => chardet::charset2encoding(&charset).to_string(),
    };

    Encoding::for_label(label.as_bytes()).unwrap_or(encoding_rs::UTF_8)
}

/// Detect the encoding of a file from its first 64 KiB.
pub fn detect_file_encoding(path: &Path) -> CsvResult<&'static Encoding> {
    let file = File::open(path).map_err(|e| CsvError::io(path, e))?;
    let mut sample = Vec::new();
    file.take(SAMPLE_SIZE)
        .read_to_end(&mut sample)
        .map_err(|e| CsvError::io(path, e))?;
    Ok(detect_encoding(&sample))
}

/// Resolve a label for reading `path`, running detection for [`AUTO`].
pub fn resolve_read_encoding(label: &str, path: &Path) -> CsvResult<&'static Encoding> {
    if label.trim().eq_ignore_ascii_case(AUTO) {
        detect_file_encoding(path)
    } else {
        encoding_for_label(label)
    }
}
