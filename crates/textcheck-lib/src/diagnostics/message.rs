//! Diagnostic message types.

use crate::text::Span;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    /// Informational record of a successful or discarded match.
    Remark,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Remark => write!(f, "remark"),
        }
    }
}

/// Which buffer a span points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceId {
    CheckFile,
    Input,
    /// Configuration-supplied text with no buffer to excerpt.
    CommandLine,
}

/// A secondary location attached to a diagnostic, e.g. "found here" or
/// "previous match ended here".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedNote {
    pub source: SourceId,
    pub span: Option<Span>,
    pub message: String,
}

/// A diagnostic with its primary location and attached notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub severity: Severity,
    pub message: String,
    pub source: SourceId,
    pub span: Option<Span>,
    pub notes: Vec<RelatedNote>,
}

impl DiagnosticMessage {
    pub(crate) fn new(
        severity: Severity,
        message: impl Into<String>,
        source: SourceId,
        span: Option<Span>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            source,
            span,
            notes: Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(span) = self.span {
            write!(f, " (at {}..{})", span.start, span.end)?;
        }
        for note in &self.notes {
            write!(f, " (note: {})", note.message)?;
        }
        Ok(())
    }
}
