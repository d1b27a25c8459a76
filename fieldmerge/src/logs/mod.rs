//! Diagnostic log sinks.
//!
//! The reader, lookup builder, merge engine and writer never print anything
//! themselves: they take a `&dyn LogSink` and report record-level events to it.
//! The CLI picks a sink once at startup.
//!
//! - [`ConsoleSink`] - human readable lines on stderr
//! - [`JsonSink`] - one JSON object per line on stderr
//! - [`MemorySink`] - collects entries (tests, embedding)
//! - [`NullSink`] - discards everything

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::io::Write;

/// Severity of a log entry, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn debug(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Debug, message: message.into(), indent: 0 }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Receiver of diagnostic entries.
pub trait LogSink {
    fn log(&self, entry: LogEntry);

    fn debug(&self, msg: String) {
        self.log(LogEntry::debug(msg));
    }

    fn info(&self, msg: String) {
        self.log(LogEntry::info(msg));
    }

    fn success(&self, msg: String) {
        self.log(LogEntry::success(msg));
    }

    fn warning(&self, msg: String) {
        self.log(LogEntry::warning(msg));
    }
}

/// Prints entries at or above `min_level` to stderr.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    min_level: LogLevel,
}

impl ConsoleSink {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}

impl LogSink for ConsoleSink {
    fn log(&self, entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }
        let prefix = match entry.level {
            LogLevel::Debug => "   ·",
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(entry.indent as usize);
        eprintln!("{}{} {}", indent, prefix, entry.message);
    }
}

/// Writes entries as JSON lines to stderr, stamped with the current UTC time.
#[derive(Debug, Clone)]
pub struct JsonSink {
    min_level: LogLevel,
}

impl JsonSink {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    ts: String,
    #[serde(flatten)]
    entry: &'a LogEntry,
}

impl LogSink for JsonSink {
    fn log(&self, entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }
        let line = JsonLine {
            ts: chrono::Utc::now().to_rfc3339(),
            entry: &entry,
        };
        if let Ok(json) = serde_json::to_string(&line) {
            // stderr closed: nothing sensible left to do
            let _ = writeln!(std::io::stderr().lock(), "{}", json);
        }
    }
}

/// Keeps every entry in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: RefCell<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    /// Messages logged at exactly `level`.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, entry: LogEntry) {
        self.entries.borrow_mut().push(entry);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _entry: LogEntry) {}
}
