//! Record scanner for quoted delimited text.
//!
//! Works on a decoded text buffer that starts at a record boundary. The
//! buffer may end mid-record; the scanner then asks for more input instead of
//! guessing, unless the caller says the buffer holds everything that is left.

/// Outcome of scanning one record at the start of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    /// A complete record and the number of bytes it used, terminator included.
    Record { fields: Vec<String>, consumed: usize },
    /// An empty line.
    Blank { consumed: usize },
    /// A record that cannot be parsed. `consumed` covers its first physical
    /// line only, so scanning resumes on the following line.
    Malformed { reason: &'static str, consumed: usize },
    /// The buffer ends before the record can be decided.
    Incomplete,
}

const QUOTE: char = '"';

/// Length of the line terminator at the start of `s`, if any.
///
/// `None` means `s` starts with `\r` and ends there, so it may still become `\r\n`.
fn terminator_len(s: &str, at_eof: bool) -> Option<usize> {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(b'\n') => Some(1),
        Some(b'\r') => match bytes.get(1) {
            Some(b'\n') => Some(2),
            Some(_) => Some(1),
            None if at_eof => Some(1),
            None => None,
        },
        _ => Some(0),
    }
}

/// Byte offset just past the first line break in `s`.
fn first_line_end(s: &str, at_eof: bool) -> Option<usize> {
    match s.find(['\r', '\n']) {
        Some(pos) => terminator_len(&s[pos..], at_eof).map(|len| pos + len),
        None if at_eof => Some(s.len()),
        None => None,
    }
}

fn malformed(buf: &str, at_eof: bool, reason: &'static str) -> Scan {
    match first_line_end(buf, at_eof) {
        Some(consumed) => Scan::Malformed { reason, consumed },
        None => Scan::Incomplete,
    }
}

/// Scan the record at the start of `buf`.
///
/// `at_eof` tells the scanner no more text will follow `buf`.
pub fn scan_record(buf: &str, delimiter: &str, at_eof: bool) -> Scan {
    if buf.is_empty() {
        return Scan::Incomplete;
    }
    match terminator_len(buf, at_eof) {
        None => return Scan::Incomplete,
        Some(0) => {}
        Some(len) => return Scan::Blank { consumed: len },
    }

    let mut fields = Vec::new();
    let mut pos = 0;

    loop {
        let rest = &buf[pos..];

        if rest.starts_with(QUOTE) {
            let mut value = String::new();
            let mut i = 1;
            loop {
                let Some(offset) = rest[i..].find(QUOTE) else {
                    if at_eof {
                        return malformed(buf, at_eof, "unterminated quoted field");
                    }
                    return Scan::Incomplete;
                };
                value.push_str(&rest[i..i + offset]);
                i += offset + 1;
                match rest[i..].chars().next() {
                    Some(QUOTE) => {
                        value.push(QUOTE);
                        i += 1;
                    }
                    None if !at_eof => return Scan::Incomplete,
                    _ => break,
                }
            }
            fields.push(value);
            pos += i;

            let after = &buf[pos..];
            if after.starts_with(delimiter) {
                pos += delimiter.len();
                continue;
            }
            if after.is_empty() {
                // at_eof is set, otherwise the quote loop returned Incomplete
                return Scan::Record { fields, consumed: pos };
            }
            if !at_eof && delimiter.starts_with(after) {
                return Scan::Incomplete;
            }
            match terminator_len(after, at_eof) {
                None => return Scan::Incomplete,
                Some(0) => return malformed(buf, at_eof, "unexpected text after closing quote"),
                Some(len) => return Scan::Record { fields, consumed: pos + len },
            }
        }

        let end = rest
            .char_indices()
            .find(|&(idx, c)| c == '\r' || c == '\n' || rest[idx..].starts_with(delimiter))
            .map(|(idx, _)| idx);

        let Some(end) = end else {
            if !at_eof {
                return Scan::Incomplete;
            }
            fields.push(rest.to_string());
            return Scan::Record { fields, consumed: buf.len() };
        };

        fields.push(rest[..end].to_string());
        pos += end;

        let after = &buf[pos..];
        if after.starts_with(delimiter) {
            pos += delimiter.len();
            // a trailing delimiter still owes one (empty) field
            if pos == buf.len() && !at_eof {
                return Scan::Incomplete;
            }
            continue;
        }
        match terminator_len(after, at_eof) {
            None => return Scan::Incomplete,
            Some(len) => return Scan::Record { fields, consumed: pos + len },
        }
    }
}

/// Number of physical line breaks in `s` (`\r\n` counts once).
pub fn count_line_breaks(s: &str) -> usize {
    let bytes = s.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'\n' || (b == b'\r' && bytes.get(i + 1) != Some(&b'\n')))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(scan: Scan) -> Vec<String> {
        match scan {
            Scan::Record { fields, .. } => fields,
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_record() {
        let scan = scan_record("a,b,c\nnext", ",", false);
        assert_eq!(
            scan,
            Scan::Record { fields: vec!["a".into(), "b".into(), "c".into()], consumed: 6 }
        );
    }

    #[test]
    fn test_crlf_terminator() {
        let scan = scan_record("a;b\r\nc;d", ";", false);
        assert_eq!(scan, Scan::Record { fields: vec!["a".into(), "b".into()], consumed: 5 });
    }

    #[test]
    fn test_lone_cr_at_buffer_end_waits() {
        assert_eq!(scan_record("a;b\r", ";", false), Scan::Incomplete);
        assert_eq!(
            scan_record("a;b\r", ";", true),
            Scan::Record { fields: vec!["a".into(), "b".into()], consumed: 4 }
        );
    }

    #[test]
    fn test_quoted_delimiter_and_newline() {
        let got = fields(scan_record("\"x,y\",\"line1\nline2\",z\n", ",", true));
        assert_eq!(got, vec!["x,y", "line1\nline2", "z"]);
    }

    #[test]
    fn test_doubled_quotes() {
        let got = fields(scan_record("\"say \"\"hi\"\"\",2\n", ",", true));
        assert_eq!(got, vec!["say \"hi\"", "2"]);
    }

    #[test]
    fn test_empty_fields() {
        assert_eq!(fields(scan_record("1,,3\n", ",", true)), vec!["1", "", "3"]);
        assert_eq!(fields(scan_record("1,2,\n", ",", true)), vec!["1", "2", ""]);
        assert_eq!(fields(scan_record("\"\"\n", ",", true)), vec![""]);
    }

    #[test]
    fn test_multi_char_delimiter() {
        let got = fields(scan_record("a::b::\"c::d\"\n", "::", true));
        assert_eq!(got, vec!["a", "b", "c::d"]);
    }

    #[test]
    fn test_stray_quote_in_unquoted_field_is_literal() {
        assert_eq!(fields(scan_record("5'10\",tall\n", ",", true)), vec!["5'10\"", "tall"]);
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(scan_record("\nabc", ",", false), Scan::Blank { consumed: 1 });
        assert_eq!(scan_record("\r\nabc", ",", false), Scan::Blank { consumed: 2 });
    }

    #[test]
    fn test_unterminated_quote_drops_first_line_only() {
        let buf = "3,\"Carol,X3\n4,Dave,X4\n";
        assert_eq!(scan_record(buf, ",", false), Scan::Incomplete);
        assert_eq!(
            scan_record(buf, ",", true),
            Scan::Malformed { reason: "unterminated quoted field", consumed: 12 }
        );
    }

    #[test]
    fn test_text_after_closing_quote_is_malformed() {
        let scan = scan_record("\"ab\"c,d\ne,f\n", ",", false);
        assert_eq!(
            scan,
            Scan::Malformed { reason: "unexpected text after closing quote", consumed: 8 }
        );
    }

    #[test]
    fn test_partial_buffer_is_incomplete() {
        assert_eq!(scan_record("a,b", ",", false), Scan::Incomplete);
        assert_eq!(scan_record("a,", ",", false), Scan::Incomplete);
        assert_eq!(scan_record("\"a\"", ",", false), Scan::Incomplete);
        assert_eq!(scan_record("a::b:", "::", false), Scan::Incomplete);
        assert_eq!(scan_record("\"a\":", "::", false), Scan::Incomplete);
    }

    #[test]
    fn test_last_record_without_newline() {
        assert_eq!(
            scan_record("a,b", ",", true),
            Scan::Record { fields: vec!["a".into(), "b".into()], consumed: 3 }
        );
        assert_eq!(fields(scan_record("a,", ",", true)), vec!["a", ""]);
    }

    #[test]
    fn test_count_line_breaks() {
        assert_eq!(count_line_breaks("a\nb\r\nc\rd"), 3);
        assert_eq!(count_line_breaks("no breaks"), 0);
    }
}
