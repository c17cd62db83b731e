//! Builder-pattern printer for rendering diagnostics.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};

use super::message::{DiagnosticMessage, Severity, SourceId};
use super::Diagnostics;
use crate::text::Span;

/// Renders collected diagnostics against the check and input buffers.
pub struct DiagnosticsPrinter<'d, 's> {
    diagnostics: &'d Diagnostics,
    check_source: Option<&'s str>,
    check_path: Option<&'s str>,
    input_source: Option<&'s str>,
    input_path: Option<&'s str>,
    colored: bool,
    /// Include remark-level messages, not just errors.
    with_remarks: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics) -> Self {
        Self {
            diagnostics,
            check_source: None,
            check_path: None,
            input_source: None,
            input_path: None,
            colored: false,
            with_remarks: false,
        }
    }

    pub fn check_source(mut self, source: &'s str) -> Self {
        self.check_source = Some(source);
        self
    }

    pub fn check_path(mut self, path: &'s str) -> Self {
        self.check_path = Some(path);
        self
    }

    pub fn input_source(mut self, source: &'s str) -> Self {
        self.input_source = Some(source);
        self
    }

    pub fn input_path(mut self, path: &'s str) -> Self {
        self.input_path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn with_remarks(mut self, value: bool) -> Self {
        self.with_remarks = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        let mut first = true;
        for diag in self.diagnostics.iter() {
            if diag.severity == Severity::Remark && !self.with_remarks {
                continue;
            }
            if !first {
                w.write_char('\n')?;
            }
            first = false;
            write!(w, "{}", renderer.render(&self.message_groups(diag)))?;
        }
        Ok(())
    }

    fn message_groups<'a>(&'a self, diag: &'a DiagnosticMessage) -> Vec<Group<'a>> {
        let level = severity_to_level(diag.severity);
        let title = level.primary_title(&diag.message);
        let first_group = if let Some((source, path)) = self.source_for(diag.source)
            && let Some(span) = diag.span
        {
            let mut snippet = Snippet::source(source).line_start(1).annotation(
                AnnotationKind::Primary
                    .span(adjust_range(span, source.len()))
                    .label(&diag.message),
            );
            if let Some(p) = path {
                snippet = snippet.path(p);
            }
            title.element(snippet)
        } else {
            Group::with_title(title)
        };
        let mut report: Vec<Group<'a>> = vec![first_group];

        for note in &diag.notes {
            let title = Level::NOTE.secondary_title(&note.message);
            let group = if let Some((source, path)) = self.source_for(note.source)
                && let Some(span) = note.span
            {
                let mut snippet = Snippet::source(source).line_start(1).annotation(
                    AnnotationKind::Context
                        .span(adjust_range(span, source.len()))
                        .label(&note.message),
                );
                if let Some(p) = path {
                    snippet = snippet.path(p);
                }
                title.element(snippet)
            } else {
                Group::with_title(title)
            };
            report.push(group);
        }
        report
    }

    fn source_for(&self, id: SourceId) -> Option<(&'s str, Option<&'s str>)> {
        match id {
            SourceId::CheckFile => self.check_source.map(|s| (s, self.check_path)),
            SourceId::Input => self.input_source.map(|s| (s, self.input_path)),
            SourceId::CommandLine => None,
        }
    }
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Error => Level::ERROR,
        Severity::Remark => Level::INFO,
    }
}

// Zero-width spans widen to one character so the caret stays visible.
fn adjust_range(span: Span, limit: usize) -> std::ops::Range<usize> {
    let range = span.range();
    if range.start == range.end {
        return range.start..(range.start + 1).min(limit);
    }
    range
}

impl Diagnostics {
    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }
}
