//! Diagnostics sinks
//!
//! A sink receives the failures of bindings running under the substitute-and-log
//! policy. Raised failures go back to the interpreter instead and never reach a sink.

use super::formatter::{ColorMode, FailureFormatter};
use crate::marshal::{ArgumentError, ErrorKind};
use std::sync::{Arc, Mutex, PoisonError};
use termcolor::StandardStream;

/// One logged call failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    /// Name of the bound function that failed
    pub function: String,
    pub kind: ErrorKind,
    /// The formatted diagnostic
    pub message: String,
}

impl FailureRecord {
    pub fn new(function: &str, error: &ArgumentError) -> Self {
        Self {
            function: function.to_string(),
            kind: error.kind,
            message: error.message.clone(),
        }
    }
}

/// Receiver for substituted call failures
pub trait DiagnosticsSink: Send + Sync {
    fn log(&self, record: FailureRecord);
}

/// Collects failures in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<FailureRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<FailureRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Logged diagnostic strings, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl DiagnosticsSink for MemorySink {
    fn log(&self, record: FailureRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

/// Drops every failure
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn log(&self, _record: FailureRecord) {}
}

/// Emits failures as `tracing` warnings
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn log(&self, record: FailureRecord) {
        tracing::warn!(
            function = %record.function,
            kind = ?record.kind,
            "{}",
            record.message
        );
    }
}

/// Writes failures to stderr through `FailureFormatter`
#[derive(Debug, Clone, Copy)]
pub struct TerminalSink {
    formatter: FailureFormatter,
}

impl TerminalSink {
    pub fn new(color_mode: ColorMode) -> Self {
        Self {
            formatter: FailureFormatter::new(color_mode),
        }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new(ColorMode::Auto)
    }
}

impl DiagnosticsSink for TerminalSink {
    fn log(&self, record: FailureRecord) {
        let mut stream = StandardStream::stderr(self.formatter.color_mode().to_color_choice());
        // stderr is best effort
        let _ = self.formatter.write_failure(&mut stream, &record);
    }
}
