//! Error types shared across the parsing and matching layers.

use thiserror::Error;

use crate::text::Span;

/// Parse-time failure, located in the check file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// Variable names that failed to resolve while evaluating a substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndefinedVars(pub Vec<String>);

impl std::fmt::Display for UndefinedVars {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "\"{name}\"")?;
        }
        Ok(())
    }
}

/// Why a single pattern failed to produce a match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The pattern simply does not occur in the searched region.
    #[error("string not found in input")]
    NotFound,

    /// A substitution referenced variables with no current value.
    #[error("uses undefined variable(s): {0}")]
    Undefined(UndefinedVars),

    /// Captured digits do not fit in an unsigned 64-bit value.
    #[error("unable to represent numeric value '{0}'")]
    NumericOverflow(String),

    /// The spliced skeleton failed to compile.
    #[error("pattern failed to compile: {0}")]
    ParseFailure(String),
}

impl MatchError {
    /// True for the errors that mean "keep describing the search" rather
    /// than "report the message and stop": a plain no-match, or unresolved
    /// variables (which the substitution notes already name).
    pub(crate) fn is_not_found(&self) -> bool {
        matches!(self, MatchError::NotFound | MatchError::Undefined(_))
    }
}
