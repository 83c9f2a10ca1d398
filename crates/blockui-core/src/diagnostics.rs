#![forbid(unsafe_code)]

//! Diagnostic sink for failures the overlay layer reports but does not raise.
//!
//! Position-solver rejections and exhausted initialization retries are not
//! returned to any caller; they are handed to a [`DiagnosticSink`]. The
//! default [`TracingSink`] turns each report into a `tracing` error event on
//! the `blockui.diagnostic` target. [`MemorySink`] keeps reports for
//! inspection in tests and debug panels.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Which subsystem produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSource {
    /// The floating handle's position computation.
    Position,
    /// The floating handle's deferred initialization.
    Initialization,
}

impl DiagnosticSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Initialization => "initialization",
        }
    }
}

/// A reported failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub source: DiagnosticSource,
    pub message: String,
}

impl Diagnostic {
    pub fn new(source: DiagnosticSource, message: impl Into<String>) -> Self {
        Self {
            source,
            message: message.into(),
        }
    }

    /// Build from any error's `Display` form.
    pub fn from_error(source: DiagnosticSource, err: &dyn std::error::Error) -> Self {
        Self::new(source, err.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source.as_str(), self.message)
    }
}

/// Receiver of reported failures.
pub trait DiagnosticSink {
    fn report(&self, diagnostic: Diagnostic);
}

/// Shared handle to a sink.
pub type SinkRef = Rc<dyn DiagnosticSink>;

/// Emits every diagnostic as a `tracing` error event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::error!(
            target: "blockui.diagnostic",
            source = diagnostic.source.as_str(),
            detail = %diagnostic.message,
            "overlay diagnostic"
        );
    }
}

/// Keeps diagnostics in memory. Cloning shares the buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Rc<RefCell<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries.borrow_mut().push(diagnostic);
    }
}
