use indoc::indoc;

use crate::config::{Config, ConfigError};
use crate::events::MatchKind;
use crate::{verify, Checker, Error};

fn verbose() -> Config {
    Config {
        verbose: true,
        ..Config::default()
    }
}

fn run(config: &Config, check: &str, input: &str) -> crate::RunResult {
    verify(config, check, input).expect("run should reach matching")
}

#[test]
fn basic_fixed_strings() {
    let check = "CHECK: hello\nCHECK: world\n";
    let input = "noise\nhello there\nworld!\n";
    let result = run(&verbose(), check, input);
    assert!(result.success);

    let spans: Vec<(u32, u32)> = result
        .events
        .iter()
        .filter(|e| e.kind == MatchKind::FoundAndExpected)
        .map(|e| (e.input_range.start, e.input_range.end))
        .collect();
    assert_eq!(spans, vec![(6, 11), (18, 23)]);
}

#[test]
fn ordered_matches_do_not_go_backwards() {
    let check = "CHECK: world\nCHECK: hello\n";
    let input = "hello\nworld\n";
    let result = run(&Config::default(), check, input);
    assert!(!result.success);
}

#[test]
fn next_requires_adjacent_line() {
    let check = "CHECK: a\nCHECK-NEXT: b\n";
    let result = run(&Config::default(), check, "a\n\nb\n");
    assert!(!result.success);
    let kinds: Vec<MatchKind> = result.events.iter().map(|e| e.kind).collect();
    insta::assert_yaml_snapshot!(kinds, @r"
    - FoundButWrongLine
    ");

    let result = run(&Config::default(), check, "a\nb\n");
    assert!(result.success);
}

#[test]
fn same_requires_same_line() {
    let check = "CHECK: a\nCHECK-SAME: b\n";
    assert!(run(&Config::default(), check, "a b\n").success);
    assert!(!run(&Config::default(), check, "a\nb\n").success);
}

#[test]
fn empty_directive_matches_blank_line() {
    let check = "CHECK: a\nCHECK-EMPTY:\nCHECK-NEXT: b\n";
    assert!(run(&Config::default(), check, "a\n\nb\n").success);
    assert!(!run(&Config::default(), check, "a\nx\nb\n").success);
}

#[test]
fn string_capture_and_backreference() {
    let mut checker = Checker::new(Config::default()).unwrap();
    checker
        .load_check_file("CHECK: name=[[N:[a-z]+]] again=[[N]]\n")
        .unwrap();
    let result = checker.check_input("name=foo again=foo\n");
    assert!(result.success);
    assert_eq!(checker.context().lookup_string("N"), Some("foo"));
}

#[test]
fn numeric_expression_across_lines() {
    let mut checker = Checker::new(Config::default()).unwrap();
    checker
        .load_check_file("CHECK: line [[#L:]]\nCHECK: next [[#L+1]]\n")
        .unwrap();
    let result = checker.check_input("line 41\nnext 42\n");
    assert!(result.success);
    let id = checker.context().numeric_id("L").unwrap();
    assert_eq!(checker.context().numeric_value(id), Some(41));
}

#[test]
fn dag_matches_in_any_order() {
    let check = "CHECK-DAG: alpha\nCHECK-DAG: beta\nCHECK: gamma\n";
    assert!(run(&Config::default(), check, "beta alpha gamma\n").success);
    assert!(run(&Config::default(), check, "alpha beta gamma\n").success);
    assert!(!run(&Config::default(), check, "beta gamma alpha\n").success);
}

#[test]
fn dag_with_not_between() {
    let check = "CHECK-DAG: a\nCHECK-NOT: X\nCHECK-DAG: b\n";
    assert!(!run(&Config::default(), check, "a X b\n").success);
    assert!(run(&Config::default(), check, "a y b\n").success);
}

#[test]
fn dag_overlap_is_rejected() {
    let check = "CHECK-DAG: aa\nCHECK-DAG: aa\nCHECK: done\n";
    assert!(run(&Config::default(), check, "aa aa done\n").success);
    assert!(!run(&Config::default(), check, "aa done\n").success);
}

#[test]
fn deprecated_dag_overlap_merges() {
    let config = Config {
        allow_deprecated_dag_overlap: true,
        ..Config::default()
    };
    let check = "CHECK-DAG: aa\nCHECK-DAG: aa\nCHECK: done\n";
    assert!(run(&config, check, "aa done\n").success);
}

#[test]
fn discarded_dag_overlap_is_reported_when_very_verbose() {
    let config = Config {
        verbose: true,
        very_verbose: true,
        ..Config::default()
    };
    let check = "CHECK-DAG: aa\nCHECK-DAG: aa\n";
    let result = run(&config, check, "aa aa\n");
    assert!(result.success);
    assert!(result
        .events
        .iter()
        .any(|e| e.kind == MatchKind::FoundButDiscarded));
}

#[test]
fn not_between_anchors() {
    let check = "CHECK: begin\nCHECK-NOT: boom\nCHECK: end\n";
    assert!(run(&Config::default(), check, "begin\nfine\nend\n").success);

    let result = run(&Config::default(), check, "begin\nboom\nend\n");
    assert!(!result.success);
    assert!(result
        .events
        .iter()
        .any(|e| e.kind == MatchKind::FoundButExcluded));
}

#[test]
fn trailing_not_extends_to_end_of_input() {
    let check = "CHECK: a\nCHECK-NOT: b\n";
    assert!(run(&Config::default(), check, "a\nc\n").success);
    assert!(!run(&Config::default(), check, "a\nb\n").success);
}

#[test]
fn count_repeats_consecutively() {
    let check = "CHECK-COUNT-2: foo\n";
    assert!(run(&Config::default(), check, "foo foo\n").success);
    assert!(!run(&Config::default(), check, "foo\n").success);

    let result = run(&verbose(), check, "foo foo\n");
    let spans: Vec<(u32, u32)> = result
        .events
        .iter()
        .filter(|e| e.kind == MatchKind::FoundAndExpected)
        .map(|e| (e.input_range.start, e.input_range.end))
        .collect();
    assert_eq!(spans, vec![(0, 3), (4, 7)]);
}

#[test]
fn labels_bound_segments() {
    let check = indoc! {"
        CHECK-LABEL: func1
        CHECK: a
        CHECK-LABEL: func2
        CHECK: b
    "};
    let input = indoc! {"
        func1:
        a here
        func2:
        b here
    "};
    assert!(run(&Config::default(), check, input).success);

    // "a" after func2 is outside its segment.
    let wrong = indoc! {"
        func1:
        func2:
        a here
        b here
    "};
    assert!(!run(&Config::default(), check, wrong).success);
}

#[test]
fn label_scoping_clears_local_variables() {
    let check = indoc! {"
        CHECK-LABEL: one
        CHECK: v=[[V:[0-9]+]]
        CHECK-LABEL: two
        CHECK: w=[[V]]
    "};
    let input = indoc! {"
        one
        v=1
        two
        w=1
    "};
    assert!(run(&Config::default(), check, input).success);

    let scoped = Config {
        enable_var_scope: true,
        ..Config::default()
    };
    assert!(!run(&scoped, check, input).success);
}

#[test]
fn label_scoping_spares_dollar_variables() {
    let check = indoc! {"
        CHECK-LABEL: one
        CHECK: v=[[$V:[0-9]+]]
        CHECK-LABEL: two
        CHECK: w=[[$V]]
    "};
    let input = indoc! {"
        one
        v=1
        two
        w=1
    "};
    let scoped = Config {
        enable_var_scope: true,
        ..Config::default()
    };
    assert!(run(&scoped, check, input).success);
}

#[test]
fn implicit_check_not_guards_every_region() {
    let config = Config {
        implicit_check_not: vec!["bad".to_string()],
        ..Config::default()
    };
    let check = "CHECK: ok\n";
    assert!(run(&config, check, "good\nok\n").success);
    assert!(!run(&config, check, "bad\nok\n").success);
    assert!(!run(&config, check, "ok\nbad\n").success);
}

#[test]
fn global_defines_reach_patterns() {
    let config = Config {
        global_defines: vec!["WHO=world".to_string(), "#BASE=40".to_string()],
        ..Config::default()
    };
    let check = "CHECK: hello [[WHO]]\nCHECK: n=[[#BASE+2]]\n";
    assert!(run(&config, check, "hello world\nn=42\n").success);
}

#[test]
fn no_match_reports_search_range_and_fuzzy_hint() {
    let check = "CHECK: hello\n";
    let result = run(&Config::default(), check, "say\nhelloo there\n");
    assert!(!result.success);
    let kinds: Vec<MatchKind> = result.events.iter().map(|e| e.kind).collect();
    insta::assert_yaml_snapshot!(kinds, @r"
    - NoneButExpected
    - Fuzzy
    ");
    assert!(result.diagnostics.has_errors());
}

#[test]
fn parse_errors_accumulate() {
    let check = "CHECK-NOT-NEXT: a\nCHECK-COUNT-0: b\nCHECK: ok\n";
    let err = verify(&Config::default(), check, "ok\n").unwrap_err();
    let Error::Parse(errors) = err else {
        panic!("expected parse errors");
    };
    assert_eq!(errors.len(), 2);
    assert!(errors[0].message.contains("unsupported -NOT combo"));
    assert!(errors[1].message.contains("invalid count"));
}

#[test]
fn next_without_predecessor_is_a_parse_error() {
    let err = verify(&Config::default(), "CHECK-NEXT: a\n", "a\n").unwrap_err();
    let Error::Parse(errors) = err else {
        panic!("expected parse errors");
    };
    assert!(errors[0].message.contains("without previous"));
}

#[test]
fn label_with_variables_is_a_parse_error() {
    let err = verify(&Config::default(), "CHECK-LABEL: f [[X:[0-9]+]]\n", "f 1\n").unwrap_err();
    let Error::Parse(errors) = err else {
        panic!("expected parse errors");
    };
    assert!(errors[0].message.contains("variable definition or use"));
}

#[test]
fn empty_input_handling() {
    // Fatal without allow_empty_input.
    let err = verify(&Config::default(), "CHECK: x\n", "").unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::EmptyInput)));

    // Empty input, empty check file, allow_empty_input: trivially true.
    let allow = Config {
        allow_empty_input: true,
        ..Config::default()
    };
    let result = verify(&allow, "", "").unwrap();
    assert!(result.success);
}

#[test]
fn check_file_without_directives_is_an_error() {
    let err = verify(&Config::default(), "no directives here\n", "input\n").unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::NoCheckStrings(_))
    ));
}

#[test]
fn custom_prefixes_select_directives() {
    let config = Config {
        check_prefixes: vec!["MYPFX".to_string()],
        ..Config::default()
    };
    let check = "MYPFX: apple\nCHECK: ignored\n";
    assert!(run(&config, check, "apple\n").success);
}

#[test]
fn events_serialize_for_tooling() {
    let result = run(&verbose(), "CHECK: a\n", "a\n");
    assert!(result.success);
    let json = serde_json::to_value(&result.events).unwrap();
    assert!(json.is_array());
    assert_eq!(json[0]["kind"], "FoundAndExpected");
}

#[test]
fn runs_are_deterministic() {
    let config = verbose();
    let check = "CHECK-DAG: b\nCHECK-DAG: a\nCHECK: c\n";
    let input = "a b c\n";
    let first = run(&config, check, input);
    let second = run(&config, check, input);
    assert!(first.success && second.success);
    assert_eq!(first.events, second.events);
}
