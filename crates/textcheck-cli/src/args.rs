//! Shared argument builders for the textcheck command line.
//!
//! Each function returns a `clap::Arg` so the definitions stay reusable and
//! individually testable.

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, value_parser};

/// Check file holding the directives (positional).
pub fn check_file_arg() -> Arg {
    Arg::new("check_file")
        .value_name("CHECK-FILE")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("File of CHECK-style directives to verify against")
}

/// Input to verify (--input-file), `-` for stdin.
pub fn input_file_arg() -> Arg {
    Arg::new("input_file")
        .long("input-file")
        .value_name("FILE")
        .default_value("-")
        .help("File to verify (defaults to stdin)")
}

/// Single prefix (--check-prefix), repeatable.
pub fn check_prefix_arg() -> Arg {
    Arg::new("check_prefix")
        .long("check-prefix")
        .value_name("PREFIX")
        .action(ArgAction::Append)
        .help("Prefix to use from the check file (defaults to 'CHECK')")
}

/// Comma-separated prefixes (--check-prefixes), repeatable.
pub fn check_prefixes_arg() -> Arg {
    Arg::new("check_prefixes")
        .long("check-prefixes")
        .value_name("PREFIXES")
        .action(ArgAction::Append)
        .help("Alias for --check-prefix permitting multiple comma-separated values")
}

/// Disable horizontal-whitespace canonicalization (--strict-whitespace).
pub fn strict_whitespace_arg() -> Arg {
    Arg::new("strict_whitespace")
        .long("strict-whitespace")
        .action(ArgAction::SetTrue)
        .help("Do not treat all horizontal whitespace as equivalent")
}

/// Implicit negative check (--implicit-check-not), repeatable.
pub fn implicit_check_not_arg() -> Arg {
    Arg::new("implicit_check_not")
        .long("implicit-check-not")
        .value_name("PATTERN")
        .action(ArgAction::Append)
        .help("Add an implicit negative check with this pattern to every positive check")
}

/// Variable binding (-D), repeatable.
pub fn define_arg() -> Arg {
    Arg::new("define")
        .short('D')
        .value_name("VAR=VALUE")
        .action(ArgAction::Append)
        .help("Define a variable to be used in capture patterns (#VAR=INT for numeric)")
}

/// Allow the input to be empty (--allow-empty).
pub fn allow_empty_arg() -> Arg {
    Arg::new("allow_empty")
        .long("allow-empty")
        .action(ArgAction::SetTrue)
        .help("Allow the input file to be empty")
}

/// Anchor positive matches to whole lines (--match-full-lines).
pub fn match_full_lines_arg() -> Arg {
    Arg::new("match_full_lines")
        .long("match-full-lines")
        .action(ArgAction::SetTrue)
        .help("Require all positive matches to cover an entire input line")
}

/// Scope non-`$` variables to CHECK-LABEL blocks (--enable-var-scope).
pub fn enable_var_scope_arg() -> Arg {
    Arg::new("enable_var_scope")
        .long("enable-var-scope")
        .action(ArgAction::SetTrue)
        .help("Clear variables not starting with '$' at each CHECK-LABEL boundary")
}

/// Legacy overlapping DAG matches (--allow-deprecated-dag-overlap).
pub fn allow_deprecated_dag_overlap_arg() -> Arg {
    Arg::new("allow_deprecated_dag_overlap")
        .long("allow-deprecated-dag-overlap")
        .action(ArgAction::SetTrue)
        .help("Enable overlapping among matches in a group of consecutive CHECK-DAG directives")
}

/// Verbosity (-v, -vv).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .help("Print good matches; give twice to also print discarded and excluded attempts")
}

/// Input dump policy (--dump-input).
pub fn dump_input_arg() -> Arg {
    Arg::new("dump_input")
        .long("dump-input")
        .value_name("WHEN")
        .default_value("never")
        .value_parser(["never", "fail", "always"])
        .help("Dump annotated input to stderr")
}

/// Machine-readable event log (--dump-events).
pub fn dump_events_arg() -> Arg {
    Arg::new("dump_events")
        .long("dump-events")
        .action(ArgAction::SetTrue)
        .help("Print the match-event log as JSON on stdout")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize diagnostics")
}

pub fn build_cli() -> Command {
    Command::new("textcheck")
        .about("Verify that an input stream satisfies an ordered file of CHECK directives")
        .arg(check_file_arg())
        .arg(input_file_arg())
        .arg(check_prefix_arg())
        .arg(check_prefixes_arg())
        .arg(strict_whitespace_arg())
        .arg(implicit_check_not_arg())
        .arg(define_arg())
        .arg(allow_empty_arg())
        .arg(match_full_lines_arg())
        .arg(enable_var_scope_arg())
        .arg(allow_deprecated_dag_overlap_arg())
        .arg(verbose_arg())
        .arg(dump_input_arg())
        .arg(dump_events_arg())
        .arg(color_arg())
}
