use super::{Diagnostics, Severity, SourceId};
use crate::text::Span;

#[test]
fn builder_collects_messages() {
    let mut diags = Diagnostics::new();
    assert!(diags.is_empty());

    diags
        .error(
            "CHECK: expected string not found in input",
            SourceId::CheckFile,
            Some(Span::new(0, 5)),
        )
        .note(SourceId::Input, Some(Span::empty(3)), "scanning from here")
        .emit();
    diags
        .remark("CHECK: expected string found in input", SourceId::CheckFile, None)
        .emit();

    assert_eq!(diags.len(), 2);
    assert!(diags.has_errors());
    assert_eq!(diags.error_count(), 1);

    let first = diags.iter().next().unwrap();
    assert_eq!(first.severity, Severity::Error);
    assert_eq!(first.notes.len(), 1);
    assert_eq!(first.notes[0].message, "scanning from here");
}

#[test]
fn display_is_compact() {
    let mut diags = Diagnostics::new();
    diags
        .error("boom", SourceId::Input, Some(Span::new(2, 4)))
        .note(SourceId::Input, None, "context")
        .emit();
    let msg = diags.iter().next().unwrap();
    assert_eq!(msg.to_string(), "error: boom (at 2..4) (note: context)");
}

#[test]
fn printer_renders_excerpts() {
    let check_src = "CHECK: absent\n";
    let input_src = "line one\nline two\n";

    let mut diags = Diagnostics::new();
    diags
        .error(
            "CHECK: expected string not found in input",
            SourceId::CheckFile,
            Some(Span::new(7, 13)),
        )
        .note(SourceId::Input, Some(Span::empty(0)), "scanning from here")
        .emit();

    let out = diags
        .printer()
        .check_source(check_src)
        .check_path("test.check")
        .input_source(input_src)
        .input_path("<stdin>")
        .render();

    assert!(out.contains("expected string not found in input"));
    assert!(out.contains("test.check"));
    assert!(out.contains("absent"));
    assert!(out.contains("scanning from here"));
}

#[test]
fn printer_skips_remarks_by_default() {
    let mut diags = Diagnostics::new();
    diags
        .remark("found here", SourceId::Input, Some(Span::new(0, 1)))
        .emit();
    let base = diags.printer().input_source("x\n");
    assert_eq!(base.render(), "");

    let verbose = diags.printer().input_source("x\n").with_remarks(true);
    assert!(verbose.render().contains("found here"));
}

#[test]
fn command_line_spans_render_without_excerpt() {
    let mut diags = Diagnostics::new();
    diags
        .error(
            "IMPLICIT-CHECK-NOT: excluded string found in input",
            SourceId::CommandLine,
            None,
        )
        .emit();
    let out = diags.printer().render();
    assert!(out.contains("excluded string found in input"));
}
