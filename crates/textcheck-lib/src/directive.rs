//! Directive kinds and the check-file scanner.

use serde::Serialize;

use crate::regex::CheckRegex;

/// Largest count accepted by a `-COUNT-` suffix.
const MAX_COUNT: u64 = i32::MAX as u64;

/// What a directive asks the orchestrator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DirectiveKind {
    /// Ordinary expected match; `count > 1` repeats it consecutively.
    Plain { count: u32 },
    Next,
    Same,
    Not,
    Dag,
    Label,
    Empty,
    /// Matches only the end of input. Synthesized to anchor trailing
    /// NOT/DAG groups.
    EndOfInput,
    /// `-NOT` combined with another suffix; reported as a parse error.
    MalformedNot,
    /// `-COUNT-` with a bad count literal; reported as a parse error.
    MalformedCount,
}

impl DirectiveKind {
    pub fn plain() -> Self {
        DirectiveKind::Plain { count: 1 }
    }

    pub fn count(&self) -> u32 {
        match self {
            DirectiveKind::Plain { count } => *count,
            _ => 1,
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, DirectiveKind::Plain { .. })
    }

    /// Human name of the directive as written with `prefix`.
    pub fn description(&self, prefix: &str) -> String {
        match self {
            DirectiveKind::Plain { count } if *count > 1 => format!("{prefix}-COUNT"),
            DirectiveKind::Plain { .. } => prefix.to_string(),
            DirectiveKind::Next => format!("{prefix}-NEXT"),
            DirectiveKind::Same => format!("{prefix}-SAME"),
            DirectiveKind::Not => format!("{prefix}-NOT"),
            DirectiveKind::Dag => format!("{prefix}-DAG"),
            DirectiveKind::Label => format!("{prefix}-LABEL"),
            DirectiveKind::Empty => format!("{prefix}-EMPTY"),
            DirectiveKind::EndOfInput => "implicit EOF".to_string(),
            DirectiveKind::MalformedNot => "bad NOT".to_string(),
            DirectiveKind::MalformedCount => "bad COUNT".to_string(),
        }
    }
}

/// One directive opening found in the check file.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveMatch<'a> {
    pub prefix: &'a str,
    pub kind: DirectiveKind,
    /// Absolute offset of the prefix.
    pub prefix_start: usize,
    /// Absolute offset just past the suffix, where the payload begins.
    pub payload_start: usize,
}

fn is_part_of_word(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_'
}

/// Classifies the suffix that follows `prefix` at the start of `buffer`.
///
/// Returns the directive kind and the offset (relative to `buffer`) where
/// parsing resumes, or `None` when no recognized suffix follows. Suffix
/// forms, in priority order: `:`, `-COUNT-<n>:`, `-NEXT:`, `-SAME:`,
/// `-NOT:`, `-DAG:`, `-LABEL:`, `-EMPTY:`. A `-NOT` combined with another
/// suffix and a bad count literal yield the two malformed kinds.
fn find_check_type(buffer: &str, prefix: &str) -> Option<(DirectiveKind, usize)> {
    if buffer.len() <= prefix.len() {
        return None;
    }
    let next = buffer.as_bytes()[prefix.len()];
    let rest_at = prefix.len() + 1;
    let rest = &buffer[rest_at..];
    if next == b':' {
        return Some((DirectiveKind::plain(), rest_at));
    }
    if next != b'-' {
        return None;
    }

    if let Some(count_text) = rest.strip_prefix("COUNT-") {
        let count_at = rest_at + "COUNT-".len();
        let digits = count_text
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let count = count_text[..digits].parse::<u64>().ok();
        return Some(match count {
            None => (DirectiveKind::MalformedCount, count_at),
            Some(n) if n == 0 || n > MAX_COUNT => (DirectiveKind::MalformedCount, count_at + digits),
            Some(n) => {
                if count_text[digits..].starts_with(':') {
                    (
                        DirectiveKind::Plain { count: n as u32 },
                        count_at + digits + 1,
                    )
                } else {
                    (DirectiveKind::MalformedCount, count_at + digits)
                }
            }
        });
    }

    const SUFFIXES: [(&str, DirectiveKind); 6] = [
        ("NEXT:", DirectiveKind::Next),
        ("SAME:", DirectiveKind::Same),
        ("NOT:", DirectiveKind::Not),
        ("DAG:", DirectiveKind::Dag),
        ("LABEL:", DirectiveKind::Label),
        ("EMPTY:", DirectiveKind::Empty),
    ];
    for (suffix, kind) in SUFFIXES {
        if rest.starts_with(suffix) {
            return Some((kind, rest_at + suffix.len()));
        }
    }

    // -NOT cannot combine with another suffix.
    const BAD_NOT: [&str; 8] = [
        "DAG-NOT:", "NOT-DAG:", "NEXT-NOT:", "NOT-NEXT:", "SAME-NOT:", "NOT-SAME:", "EMPTY-NOT:",
        "NOT-EMPTY:",
    ];
    if BAD_NOT.iter().any(|bad| rest.starts_with(bad)) {
        return Some((DirectiveKind::MalformedNot, rest_at));
    }

    None
}

/// Finds the next directive opening at or after `from`.
///
/// Candidate prefixes come from `prefix_re`; a candidate is rejected when it
/// is immediately preceded by a word character (it is then part of a larger
/// identifier) or when no valid suffix follows, and scanning resumes past
/// the rejected word. `line_number` advances by every newline consumed up to
/// the returned prefix.
pub fn find_first_matching_prefix<'a>(
    prefix_re: &CheckRegex,
    buffer: &'a str,
    from: usize,
    line_number: &mut u32,
) -> Option<DirectiveMatch<'a>> {
    let mut cursor = from;
    let bytes = buffer.as_bytes();
    while cursor < buffer.len() {
        let (start, end) = prefix_re.search_at(buffer, cursor)?;
        let prefix = &buffer[start..end];

        *line_number += buffer[cursor..start]
            .bytes()
            .filter(|b| *b == b'\n')
            .count() as u32;
        cursor = start;

        let preceded_by_word = start > 0 && is_part_of_word(bytes[start - 1]);
        if !preceded_by_word
            && let Some((kind, resume)) = find_check_type(&buffer[start..], prefix)
        {
            return Some(DirectiveMatch {
                prefix,
                kind,
                prefix_start: start,
                payload_start: start + resume,
            });
        }

        // Skip the rejected prefix and the rest of its check-like word.
        let mut skip_to = start + prefix.len();
        while skip_to < buffer.len() && is_part_of_word(bytes[skip_to]) {
            skip_to += 1;
        }
        cursor = skip_to;
    }
    None
}
