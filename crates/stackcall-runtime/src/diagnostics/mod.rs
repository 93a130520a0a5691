//! Reporting of substituted call failures

pub mod formatter;
pub mod sink;

pub use formatter::{ColorMode, FailureFormatter};
pub use sink::{DiagnosticsSink, FailureRecord, MemorySink, NullSink, TerminalSink, TracingSink};
