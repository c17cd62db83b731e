//! Recognized options and check-prefix handling.

use thiserror::Error;

use crate::regex::{BadRegex, CheckRegex};

/// Options that influence parsing and matching. Passed by reference into
/// every entry point; the checker keeps no global state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefixes to recognize in the check file. Each must be non-empty,
    /// unique, and made of `[A-Za-z0-9_-]` only.
    pub check_prefixes: Vec<String>,
    /// Pattern bodies parsed as NOT directives and prepended to every
    /// anchor's preceding list.
    pub implicit_check_not: Vec<String>,
    /// `VAR=VALUE` / `#VAR=INT` bindings applied before parsing.
    pub global_defines: Vec<String>,
    /// Disables horizontal-whitespace canonicalization.
    pub strict_whitespace: bool,
    /// Anchors every non-NOT pattern to a whole input line.
    pub match_full_lines: bool,
    /// Erases non-`$` variables between label segments.
    pub enable_var_scope: bool,
    /// Merges overlapping DAG matches instead of retrying past them.
    pub allow_deprecated_dag_overlap: bool,
    /// Suppresses the empty-input fatal error.
    pub allow_empty_input: bool,
    /// Emits remark-level events for successful matches.
    pub verbose: bool,
    /// Additionally emits events for discarded and excluded-pattern attempts.
    pub very_verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            check_prefixes: vec!["CHECK".to_string()],
            implicit_check_not: Vec::new(),
            global_defines: Vec::new(),
            strict_whitespace: false,
            match_full_lines: false,
            enable_var_scope: false,
            allow_deprecated_dag_overlap: false,
            allow_empty_input: false,
            verbose: false,
            very_verbose: false,
        }
    }
}

/// Configuration failures, fatal before matching starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("supplied check prefix must not be the empty string")]
    EmptyPrefix,

    #[error("supplied check prefix '{0}' is not unique")]
    DuplicatePrefix(String),

    #[error("supplied check prefix '{0}' is invalid: must match [A-Za-z0-9_-]+")]
    InvalidPrefix(String),

    #[error("invalid global definitions:\n{}", .0.join("\n"))]
    BadDefines(Vec<String>),

    #[error("{}", format_no_check_strings(.0))]
    NoCheckStrings(Vec<String>),

    #[error("input buffer is empty")]
    EmptyInput,

    #[error(transparent)]
    BadRegex(#[from] BadRegex),
}

fn format_no_check_strings(prefixes: &[String]) -> String {
    let plural = if prefixes.len() > 1 { "es" } else { "" };
    let list = prefixes
        .iter()
        .map(|p| format!("'{p}:'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("no check strings found with prefix{plural} {list}")
}

impl Config {
    pub fn validate_prefixes(&self) -> Result<(), ConfigError> {
        let mut seen: Vec<&str> = Vec::new();
        for prefix in &self.check_prefixes {
            if prefix.is_empty() {
                return Err(ConfigError::EmptyPrefix);
            }
            if seen.contains(&prefix.as_str()) {
                return Err(ConfigError::DuplicatePrefix(prefix.clone()));
            }
            if !prefix
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
            {
                return Err(ConfigError::InvalidPrefix(prefix.clone()));
            }
            seen.push(prefix.as_str());
        }
        Ok(())
    }

    /// Builds the alternation matching any configured prefix.
    ///
    /// Prefixes sort longest-first so a prefix that is a proper prefix of
    /// another cannot shadow it on a leftmost-first engine.
    pub fn build_prefix_regex(&self) -> Result<CheckRegex, ConfigError> {
        let mut prefixes: Vec<&str> = self.check_prefixes.iter().map(String::as_str).collect();
        if prefixes.is_empty() {
            prefixes.push("CHECK");
        }
        prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Ok(CheckRegex::new(&prefixes.join("|"))?)
    }
}
