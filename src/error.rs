//! Error and diagnostic types for the bibtex-import crate
//!
//! Only total failures surface as [`Error`]. Everything the importer can
//! recover from is reported through a [`DiagnosticSink`] and parsing goes on.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for bibtex-import operations
pub type Result<T> = std::result::Result<T, Error>;

/// Conditions under which no document is produced at all
#[derive(Error, Debug)]
pub enum Error {
    /// The input buffer was empty
    #[error("Cannot create a document from empty input")]
    EmptyInput,

    /// Non-empty input from which not a single element could be read
    #[error("No elements found in {0} characters of input")]
    NoElements(usize),

    /// The caller raised the cancellation flag
    #[error("Loading has been canceled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// How serious a recoverable anomaly is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Purely informational
    Info,
    /// A deterministic auto-correction was applied
    Warning,
    /// Data was likely altered or dropped
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Location information for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single recoverable anomaly found while importing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the anomaly
    pub severity: Severity,
    /// Human-readable description
    pub message: String,
    /// Where in the decoded text it happened, if known
    pub location: Option<Location>,
}

impl Diagnostic {
    /// Create a diagnostic without location
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            location: None,
        }
    }

    /// Attach a location
    #[must_use]
    pub const fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{} at {}: {}", self.severity, location, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Receiver for diagnostics emitted during import
///
/// Reporting must never influence the parse outcome, so implementations
/// only observe.
pub trait DiagnosticSink {
    /// Receive one diagnostic
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<F: FnMut(Diagnostic)> DiagnosticSink for F {
    fn report(&mut self, diagnostic: Diagnostic) {
        self(diagnostic);
    }
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// Forward a diagnostic to the sink and mirror it to the log
pub(crate) fn emit(sink: &mut dyn DiagnosticSink, diagnostic: Diagnostic) {
    match diagnostic.severity {
        Severity::Info => tracing::debug!(location = ?diagnostic.location, "{}", diagnostic.message),
        Severity::Warning => tracing::warn!(location = ?diagnostic.location, "{}", diagnostic.message),
        Severity::Error => tracing::error!(location = ?diagnostic.location, "{}", diagnostic.message),
    }
    sink.report(diagnostic);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        emit(&mut sink, Diagnostic::new(Severity::Warning, "renamed"));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].severity, Severity::Warning);
    }

    #[test]
    fn test_closure_sink() {
        let mut count = 0;
        {
            let mut sink = |_d: Diagnostic| count += 1;
            emit(&mut sink, Diagnostic::new(Severity::Info, "a"));
            emit(&mut sink, Diagnostic::new(Severity::Info, "b"));
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn test_display_with_location() {
        let d = Diagnostic::new(Severity::Error, "missing '='").at(Location { line: 3, column: 7 });
        assert_eq!(d.to_string(), "error at 3:7: missing '='");
    }
}
