//! textcheck: order-sensitive verification of tool output against a check
//! file of CHECK-style directives.
//!
//! A check file is compiled into patterns (fixed strings, regex skeletons
//! with captures, back-references and numeric expressions), then driven
//! over an input buffer under ordering constraints: plain ordered matches,
//! same-line and next-line adjacency, empty-line checks, exclusion regions,
//! unordered DAG groups with overlap rejection, and label-bounded segments.
//!
//! # Example
//!
//! ```
//! use textcheck_lib::{verify, Config};
//!
//! let check = "CHECK: hello\nCHECK: world\n";
//! let input = "noise\nhello there\nworld!\n";
//!
//! let result = verify(&Config::default(), check, input).expect("valid configuration");
//! assert!(result.success);
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod check;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod directive;
pub mod errors;
pub mod events;
pub mod expr;
pub mod pattern;
pub mod regex;
pub mod text;

#[cfg(test)]
mod check_tests;
#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod context_tests;
#[cfg(test)]
mod regex_tests;
#[cfg(test)]
mod text_tests;

pub use check::{CheckString, check_input, read_check_file};
pub use config::{Config, ConfigError};
pub use context::Context;
pub use diagnostics::{Diagnostics, DiagnosticsPrinter, Severity, SourceId};
pub use directive::DirectiveKind;
pub use errors::{MatchError, ParseError};
pub use events::{EventLog, MatchEvent, MatchKind};
pub use pattern::{CheckLoc, Pattern};
pub use text::{Span, canonicalize};

use crate::regex::CheckRegex;

/// Fatal error raised before matching starts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("check file has {} parse error(s)", .0.len())]
    Parse(Vec<ParseError>),
}

/// Outcome of one checker run.
#[derive(Debug)]
pub struct RunResult {
    /// True when every check was satisfied.
    pub success: bool,
    /// Every recorded match attempt, in directive order.
    pub events: EventLog,
    /// Renderable messages explaining failures (and successes under the
    /// verbose options).
    pub diagnostics: Diagnostics,
}

/// One configured checker instance: validated options, compiled prefix
/// alternation, variable context, and the check strings once loaded.
pub struct Checker {
    config: Config,
    prefix_re: CheckRegex,
    ctx: Context,
    checks: Vec<CheckString>,
}

impl Checker {
    /// Validates the configuration and binds command-line variables.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate_prefixes()?;
        let prefix_re = config.build_prefix_regex()?;
        let mut ctx = Context::new();
        ctx.define_from_cli(&config.global_defines)?;
        ctx.create_line_var();
        Ok(Self {
            config,
            prefix_re,
            ctx,
            checks: Vec::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compiles the check buffer. All parse errors are reported together.
    pub fn load_check_file(&mut self, check: &str) -> Result<(), Vec<ParseError>> {
        self.checks = check::read_check_file(check, &self.prefix_re, &self.config, &mut self.ctx)?;
        Ok(())
    }

    /// True when the loaded check file produced at least one check string.
    pub fn has_checks(&self) -> bool {
        !self.checks.is_empty()
    }

    /// Runs the loaded checks over `input`.
    pub fn check_input(&mut self, input: &str) -> RunResult {
        let mut events = EventLog::new();
        let mut diagnostics = Diagnostics::new();
        let success = check::check_input(
            input,
            &self.checks,
            &mut self.ctx,
            &self.config,
            &mut events,
            &mut diagnostics,
        );
        RunResult {
            success,
            events,
            diagnostics,
        }
    }

    /// Read access to the variable context, mostly for inspecting captured
    /// values after a run.
    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

/// Runs the whole pipeline over pre-canonicalized buffers.
///
/// An empty input is fatal unless `allow_empty_input` is set; with it set,
/// an empty input and an empty check file succeed trivially. A check file
/// that yields no check strings is a configuration error otherwise.
pub fn verify(config: &Config, check: &str, input: &str) -> Result<RunResult, Error> {
    let mut checker = Checker::new(config.clone())?;
    checker.load_check_file(check).map_err(Error::Parse)?;

    if input.is_empty() && !config.allow_empty_input {
        return Err(Error::Config(ConfigError::EmptyInput));
    }
    if !checker.has_checks() {
        if input.is_empty() {
            return Ok(RunResult {
                success: true,
                events: EventLog::new(),
                diagnostics: Diagnostics::new(),
            });
        }
        return Err(Error::Config(ConfigError::NoCheckStrings(
            config.check_prefixes.clone(),
        )));
    }
    Ok(checker.check_input(input))
}
