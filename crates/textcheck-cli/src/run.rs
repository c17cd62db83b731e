//! Loads the buffers, drives the checker, renders the outcome.

use std::fs::File;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::ArgMatches;
use memmap2::Mmap;
use textcheck_lib::{Config, Diagnostics, Error, SourceId, canonicalize, verify};

use crate::dump;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpMode {
    Never,
    Fail,
    Always,
}

/// Everything `run` needs, extracted from clap matches (or built directly
/// in tests).
#[derive(Debug, Clone)]
pub struct RunParams {
    pub check_file: PathBuf,
    /// `-` reads stdin.
    pub input_file: String,
    pub config: Config,
    pub dump_input: DumpMode,
    pub dump_events: bool,
    pub colored: bool,
}

impl RunParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        let mut check_prefixes: Vec<String> = Vec::new();
        for prefix in m.get_many::<String>("check_prefix").into_iter().flatten() {
            check_prefixes.push(prefix.clone());
        }
        for list in m.get_many::<String>("check_prefixes").into_iter().flatten() {
            check_prefixes.extend(list.split(',').map(str::to_string));
        }
        if check_prefixes.is_empty() {
            check_prefixes.push("CHECK".to_string());
        }

        let verbosity = m.get_count("verbose");
        let config = Config {
            check_prefixes,
            implicit_check_not: m
                .get_many::<String>("implicit_check_not")
                .into_iter()
                .flatten()
                .cloned()
                .collect(),
            global_defines: m
                .get_many::<String>("define")
                .into_iter()
                .flatten()
                .cloned()
                .collect(),
            strict_whitespace: m.get_flag("strict_whitespace"),
            match_full_lines: m.get_flag("match_full_lines"),
            enable_var_scope: m.get_flag("enable_var_scope"),
            allow_deprecated_dag_overlap: m.get_flag("allow_deprecated_dag_overlap"),
            allow_empty_input: m.get_flag("allow_empty"),
            verbose: verbosity >= 1,
            very_verbose: verbosity >= 2,
        };

        let dump_input = match m.get_one::<String>("dump_input").map(String::as_str) {
            Some("always") => DumpMode::Always,
            Some("fail") => DumpMode::Fail,
            _ => DumpMode::Never,
        };
        let colored = match m.get_one::<String>("color").map(String::as_str) {
            Some("always") => true,
            Some("never") => false,
            _ => std::io::stderr().is_terminal(),
        };

        Self {
            check_file: m
                .get_one::<PathBuf>("check_file")
                .cloned()
                .unwrap_or_default(),
            input_file: m
                .get_one::<String>("input_file")
                .cloned()
                .unwrap_or_else(|| "-".to_string()),
            config,
            dump_input,
            dump_events: m.get_flag("dump_events"),
            colored,
        }
    }
}

/// Runs the checker and returns the process exit code: 0 on success, 1 when
/// a check failed, 2 on configuration or parse errors.
pub fn run(params: &RunParams) -> i32 {
    let check_raw = match load_file(&params.check_file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!(
                "textcheck error: could not read check file '{}': {e}",
                params.check_file.display()
            );
            return 2;
        }
    };
    let check_text = canonicalize(&check_raw, params.config.strict_whitespace);

    let input_raw = match load_input(&params.input_file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!(
                "textcheck error: could not read input '{}': {e}",
                params.input_file
            );
            return 2;
        }
    };
    let input_text = canonicalize(&input_raw, params.config.strict_whitespace);

    let check_path = params.check_file.display().to_string();
    let input_path = if params.input_file == "-" {
        "<stdin>".to_string()
    } else {
        params.input_file.clone()
    };

    match verify(&params.config, &check_text, &input_text) {
        Err(Error::Config(e)) => {
            eprintln!("textcheck error: {e}");
            2
        }
        Err(Error::Parse(errors)) => {
            let mut diags = Diagnostics::new();
            for error in &errors {
                diags
                    .error(error.message.clone(), SourceId::CheckFile, Some(error.span))
                    .emit();
            }
            eprint_diagnostics(&diags, &check_text, &check_path, &input_text, &input_path, params);
            2
        }
        Ok(result) => {
            eprint_diagnostics(
                &result.diagnostics,
                &check_text,
                &check_path,
                &input_text,
                &input_path,
                params,
            );
            if params.dump_events {
                match serde_json::to_string_pretty(&result.events) {
                    Ok(json) => println!("{json}"),
                    Err(e) => eprintln!("textcheck error: could not serialize events: {e}"),
                }
            }
            if params.dump_input == DumpMode::Always
                || (params.dump_input == DumpMode::Fail && !result.success)
            {
                eprint!("{}", dump::annotated_input(&input_text, &check_text, &result.events));
            }
            if result.success { 0 } else { 1 }
        }
    }
}

fn eprint_diagnostics(
    diags: &Diagnostics,
    check_text: &str,
    check_path: &str,
    input_text: &str,
    input_path: &str,
    params: &RunParams,
) {
    let rendered = diags
        .printer()
        .check_source(check_text)
        .check_path(check_path)
        .input_source(input_text)
        .input_path(input_path)
        .colored(params.colored)
        .with_remarks(params.config.verbose)
        .render();
    if !rendered.is_empty() {
        eprintln!("{rendered}");
    }
}

fn load_file(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(String::new());
    }
    // Read-only mapping; the file is not expected to change during the run.
    let map = unsafe { Mmap::map(&file)? };
    Ok(String::from_utf8_lossy(&map).into_owned())
}

fn load_input(source: &str) -> std::io::Result<String> {
    if source == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    load_file(Path::new(source))
}

#[cfg(test)]
mod run_tests {
    use std::io::Write;

    use tempfile::NamedTempFile;
    use textcheck_lib::Config;

    use super::{run, DumpMode, RunParams};

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn params(check: &NamedTempFile, input: &NamedTempFile) -> RunParams {
        RunParams {
            check_file: check.path().to_path_buf(),
            input_file: input.path().to_string_lossy().into_owned(),
            config: Config::default(),
            dump_input: DumpMode::Never,
            dump_events: false,
            colored: false,
        }
    }

    #[test]
    fn passing_run_exits_zero() {
        let check = write_temp("CHECK: hello\nCHECK: world\n");
        let input = write_temp("hello\nworld\n");
        assert_eq!(run(&params(&check, &input)), 0);
    }

    #[test]
    fn failing_run_exits_one() {
        let check = write_temp("CHECK: absent\n");
        let input = write_temp("present\n");
        assert_eq!(run(&params(&check, &input)), 1);
    }

    #[test]
    fn parse_error_exits_two() {
        let check = write_temp("CHECK-NOT-DAG: x\n");
        let input = write_temp("x\n");
        assert_eq!(run(&params(&check, &input)), 2);
    }

    #[test]
    fn empty_input_exits_two_without_allow_empty() {
        let check = write_temp("CHECK: x\n");
        let input = write_temp("");
        assert_eq!(run(&params(&check, &input)), 2);
    }

    #[test]
    fn missing_check_file_exits_two() {
        let input = write_temp("x\n");
        let p = RunParams {
            check_file: std::path::PathBuf::from("/nonexistent/check.txt"),
            input_file: input.path().to_string_lossy().into_owned(),
            config: Config::default(),
            dump_input: DumpMode::Never,
            dump_events: false,
            colored: false,
        };
        assert_eq!(run(&p), 2);
    }

    #[test]
    fn crlf_input_is_canonicalized() {
        let check = write_temp("CHECK: a\nCHECK-NEXT: b\n");
        let input = write_temp("a\r\nb\r\n");
        assert_eq!(run(&params(&check, &input)), 0);
    }
}
