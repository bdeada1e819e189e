use std::slice::Iter;

use crate::Span;

use super::errors::{Error, ErrorImpl};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub error: Error,
}

impl Diagnostic {
    pub fn name(&self) -> &str {
        self.error.get_error_name()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Accumulates everything reported during a pass.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn report_error(&mut self, error_impl: ErrorImpl, span: Span) {
        tracing::debug!(error = %error_impl, "reported error");
        self.push(Severity::Error, Error::new(error_impl, span));
    }

    pub fn report_warning(&mut self, error_impl: ErrorImpl, span: Span) {
        tracing::debug!(warning = %error_impl, "reported warning");
        self.push(Severity::Warning, Error::new(error_impl, span));
    }

    pub fn push(&mut self, severity: Severity, error: Error) {
        self.items.push(Diagnostic { severity, error });
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    /// Number of errors recorded after the first `since` entries.
    pub fn errors_since(&self, since: usize) -> usize {
        self.items
            .iter()
            .skip(since)
            .filter(|diagnostic| diagnostic.is_error())
            .count()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Code names of every recorded diagnostic, in report order.
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(Diagnostic::name).collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drops everything reported after the first `len` entries.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }
}
