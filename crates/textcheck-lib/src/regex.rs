//! Thin adapter over the backtracking regex engine.
//!
//! Everything the checker compiles goes through here: directive prefix
//! alternations, pattern skeletons after substitution splicing, and the
//! embedded `{{...}}` / `[[name:...]]` pieces that are validated eagerly at
//! parse time. Skeletons rely on one-digit back-references (`\1`..`\9`), so
//! the engine must support them.

use thiserror::Error;

/// Compilation failure for a pattern or an embedded piece.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid regex: {reason}")]
pub struct BadRegex {
    pub reason: String,
}

/// A compiled pattern.
///
/// Patterns are compiled in multi-line mode so `^` and `$` anchor at line
/// boundaries, which the empty-line pattern `(\n$)` and full-line anchoring
/// depend on when matching mid-buffer. `.` does not match `\n`.
#[derive(Debug)]
pub struct CheckRegex {
    inner: fancy_regex::Regex,
}

/// Capture-group byte ranges for one successful search.
#[derive(Debug)]
pub struct SearchMatch {
    groups: Vec<Option<(usize, usize)>>,
}

impl SearchMatch {
    /// Range of the whole match.
    pub fn range(&self) -> (usize, usize) {
        self.groups[0].expect("group 0 always participates")
    }

    /// Range of capture group `index`, if it participated in the match.
    pub fn group(&self, index: usize) -> Option<(usize, usize)> {
        self.groups.get(index).copied().flatten()
    }
}

impl CheckRegex {
    pub fn new(pattern: &str) -> Result<Self, BadRegex> {
        let inner = fancy_regex::Regex::new(&format!("(?m){pattern}")).map_err(|e| BadRegex {
            reason: e.to_string(),
        })?;
        Ok(Self { inner })
    }

    /// Leftmost match in `haystack` with capture-group positions.
    pub fn search(&self, haystack: &str) -> Option<SearchMatch> {
        let caps = self.inner.captures(haystack).ok()??;
        let groups = (0..caps.len())
            .map(|i| caps.get(i).map(|m| (m.start(), m.end())))
            .collect();
        Some(SearchMatch { groups })
    }

    /// Leftmost match at or after `start`, without capture positions.
    pub fn search_at(&self, haystack: &str, start: usize) -> Option<(usize, usize)> {
        let m = self.inner.find_from_pos(haystack, start).ok()??;
        Some((m.start(), m.end()))
    }
}

/// Validates an embedded regex piece and returns the number of capture
/// groups it adds to an enclosing pattern. The count keeps the pattern
/// parser's running group index accurate across `{{...}}` and `[[...]]`
/// sites.
pub fn capture_group_count(piece: &str) -> Result<usize, BadRegex> {
    let re = fancy_regex::Regex::new(piece).map_err(|e| BadRegex {
        reason: e.to_string(),
    })?;
    Ok(re.captures_len() - 1)
}

/// Escapes `text` so it matches literally inside a skeleton.
pub fn escape(text: &str) -> String {
    regex_syntax::escape(text)
}
