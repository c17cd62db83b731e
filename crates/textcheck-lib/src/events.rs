//! Structured record of match attempts, consumed by renderers.

use serde::Serialize;

use crate::directive::DirectiveKind;
use crate::pattern::CheckLoc;
use crate::text::Span;

/// What kind of result a match attempt produced.
///
/// A directive's pattern is either expected (CHECK and friends) or excluded
/// (CHECK-NOT); the `*Excluded` kinds belong to excluded patterns. One
/// pattern can produce several events: discarded DAG candidates before a
/// good match, or a fuzzy suggestion after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchKind {
    /// Good match for an expected pattern.
    FoundAndExpected,
    /// Match for an excluded pattern.
    FoundButExcluded,
    /// Match for an expected pattern on the wrong line (NEXT/SAME/EMPTY).
    FoundButWrongLine,
    /// Discarded match for an expected pattern (DAG overlap retry).
    FoundButDiscarded,
    /// No match for an excluded pattern.
    NoneAndExcluded,
    /// No match for an expected pattern.
    NoneButExpected,
    /// Best-effort suggestion for an expected pattern that failed.
    Fuzzy,
}

/// One match attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEvent {
    pub directive: DirectiveKind,
    /// Where the directive sits in the check file.
    pub check_loc: CheckLoc,
    /// The match range, or the search range for the `None*` kinds.
    pub input_range: Span,
    pub kind: MatchKind,
}

pub type EventLog = Vec<MatchEvent>;
