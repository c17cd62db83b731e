use crate::text::{canonicalize, count_newlines, edit_distance, line_col, Span};

#[test]
fn span_basics() {
    let span = Span::new(3, 7);
    assert_eq!(span.len(), 4);
    assert!(!span.is_empty());
    assert_eq!(span.range(), 3..7);
    assert!(Span::empty(5).is_empty());
}

#[test]
fn canonicalize_collapses_crlf() {
    assert_eq!(canonicalize("a\r\nb\r\n", false), "a\nb\n");
}

#[test]
fn canonicalize_keeps_lone_cr() {
    assert_eq!(canonicalize("a\rb", false), "a\rb");
}

#[test]
fn canonicalize_collapses_horizontal_whitespace() {
    assert_eq!(canonicalize("a  \t b", false), "a b");
    assert_eq!(canonicalize("\t\tx", false), " x");
}

#[test]
fn canonicalize_strict_keeps_whitespace() {
    assert_eq!(canonicalize("a  \t b", true), "a  \t b");
    assert_eq!(canonicalize("a  \r\nb", true), "a  \nb");
}

#[test]
fn count_newlines_simple() {
    assert_eq!(count_newlines(""), (0, None));
    assert_eq!(count_newlines("abc"), (0, None));
    assert_eq!(count_newlines("a\nb"), (1, Some(2)));
    assert_eq!(count_newlines("a\nb\nc"), (2, Some(2)));
}

#[test]
fn count_newlines_folds_pairs() {
    // \r\n and \n\r each count once; \n\n counts twice.
    assert_eq!(count_newlines("\r\n").0, 1);
    assert_eq!(count_newlines("\n\r").0, 1);
    assert_eq!(count_newlines("\n\n").0, 2);
    assert_eq!(count_newlines("a\r\nb\n\rc").0, 2);
}

#[test]
fn line_col_is_one_based() {
    let text = "ab\ncd\n";
    assert_eq!(line_col(text, 0), (1, 1));
    assert_eq!(line_col(text, 1), (1, 2));
    assert_eq!(line_col(text, 3), (2, 1));
    assert_eq!(line_col(text, 4), (2, 2));
}

#[test]
fn edit_distance_basics() {
    assert_eq!(edit_distance(b"abc", b"abc"), 0);
    assert_eq!(edit_distance(b"abc", b"abd"), 1);
    assert_eq!(edit_distance(b"", b"xy"), 2);
    assert_eq!(edit_distance(b"kitten", b"sitting"), 3);
}
