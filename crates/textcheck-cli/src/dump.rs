//! Line-numbered input dump annotated with match events.

use textcheck_lib::text::line_col;
use textcheck_lib::{CheckLoc, MatchEvent, MatchKind};

/// Marker line drawn under one input line.
struct Annotation {
    input_line: u32,
    col_start: u32,
    col_end: u32,
    label: String,
    marker: char,
}

/// Renders the canonicalized input with one numbered row per line and a
/// marker row under every line an event touches. `^~~~` marks a good match,
/// `!~~~` a match that failed its directive, `X~~~` a search that found
/// nothing, and `?` a fuzzy suggestion.
pub fn annotated_input(input: &str, check: &str, events: &[MatchEvent]) -> String {
    let mut annotations: Vec<Annotation> = events.iter().map(|e| annotation(e, input, check)).collect();
    annotations.sort_by_key(|a| (a.input_line, a.col_start));

    let label_width = annotations
        .iter()
        .map(|a| a.label.len())
        .max()
        .unwrap_or(0)
        .max(5);

    let mut out = String::new();
    out.push_str("<<<<<<\n");
    for (index, line) in input.lines().enumerate() {
        let line_number = index as u32 + 1;
        out.push_str(&format!("{:label_width$} {:4}: {line}\n", "", line_number));
        for ann in annotations.iter().filter(|a| a.input_line == line_number) {
            let pad = (ann.col_start - 1) as usize;
            let width = (ann.col_end.max(ann.col_start + 1) - ann.col_start) as usize;
            let mut marker = String::new();
            marker.push(ann.marker);
            for _ in 1..width {
                marker.push('~');
            }
            out.push_str(&format!(
                "{:<label_width$}       {:pad$}{marker}\n",
                ann.label, ""
            ));
        }
    }
    out.push_str(">>>>>>\n");
    out
}

fn annotation(event: &MatchEvent, input: &str, check: &str) -> Annotation {
    let (input_line, col_start) = line_col(input, event.input_range.start as usize);
    let (end_line, col_end) = line_col(input, event.input_range.end as usize);
    // Clamp multi-line ranges to their first line.
    let col_end = if end_line == input_line {
        col_end
    } else {
        input.lines().nth(input_line as usize - 1).map(|l| l.len() as u32 + 1).unwrap_or(col_start)
    };

    let label = match event.check_loc {
        CheckLoc::File(span) => {
            let (check_line, _) = line_col(check, span.start as usize);
            format!("check:{check_line}")
        }
        CheckLoc::CommandLine => "check:imp".to_string(),
    };

    let marker = match event.kind {
        MatchKind::FoundAndExpected => '^',
        MatchKind::FoundButExcluded
        | MatchKind::FoundButWrongLine
        | MatchKind::FoundButDiscarded => '!',
        MatchKind::NoneAndExcluded | MatchKind::NoneButExpected => 'X',
        MatchKind::Fuzzy => '?',
    };

    Annotation {
        input_line,
        col_start,
        col_end,
        label,
        marker,
    }
}

#[cfg(test)]
mod dump_tests {
    use textcheck_lib::{CheckLoc, DirectiveKind, MatchEvent, MatchKind, Span};

    use super::annotated_input;

    #[test]
    fn renders_lines_and_markers() {
        let input = "hello\nworld\n";
        let check = "CHECK: world\n";
        let events = vec![MatchEvent {
            directive: DirectiveKind::plain(),
            check_loc: CheckLoc::File(Span::new(7, 12)),
            input_range: Span::new(6, 11),
            kind: MatchKind::FoundAndExpected,
        }];
        let out = annotated_input(input, check, &events);
        assert!(out.starts_with("<<<<<<\n"));
        assert!(out.ends_with(">>>>>>\n"));
        assert!(out.contains("   1: hello"));
        assert!(out.contains("   2: world"));
        assert!(out.contains("check:1"));
        assert!(out.contains("^~~~~"));
    }

    #[test]
    fn no_events_still_dumps_input() {
        let out = annotated_input("a\nb\n", "", &[]);
        assert!(out.contains("   1: a"));
        assert!(out.contains("   2: b"));
    }
}
