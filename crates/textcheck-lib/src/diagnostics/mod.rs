//! Diagnostics infrastructure: collected messages and their rendering.
//!
//! The matching engine records structured messages here; presentation is
//! the printer's concern, so the core never formats source excerpts itself.

mod message;
mod printer;

#[cfg(test)]
mod tests;

pub use message::{DiagnosticMessage, RelatedNote, Severity, SourceId};
pub use printer::DiagnosticsPrinter;

use crate::text::Span;

/// Collection of diagnostic messages from one checker run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

/// Builder for one diagnostic message.
#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    pub fn error(
        &mut self,
        msg: impl Into<String>,
        source: SourceId,
        span: Option<Span>,
    ) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            message: DiagnosticMessage::new(Severity::Error, msg, source, span),
            diagnostics: self,
        }
    }

    pub fn remark(
        &mut self,
        msg: impl Into<String>,
        source: SourceId,
        span: Option<Span>,
    ) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            message: DiagnosticMessage::new(Severity::Remark, msg, source, span),
            diagnostics: self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_error()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages.iter()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }
}

impl<'a> DiagnosticBuilder<'a> {
    pub fn note(
        mut self,
        source: SourceId,
        span: Option<Span>,
        message: impl Into<String>,
    ) -> Self {
        self.message.notes.push(RelatedNote {
            source,
            span,
            message: message.into(),
        });
        self
    }

    pub fn emit(self) {
        self.diagnostics.messages.push(self.message);
    }
}
