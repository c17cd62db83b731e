use crate::config::{Config, ConfigError};

#[test]
fn default_prefix_is_check() {
    let config = Config::default();
    assert_eq!(config.check_prefixes, vec!["CHECK".to_string()]);
    assert!(config.validate_prefixes().is_ok());
}

#[test]
fn empty_prefix_rejected() {
    let config = Config {
        check_prefixes: vec![String::new()],
        ..Config::default()
    };
    assert_eq!(config.validate_prefixes(), Err(ConfigError::EmptyPrefix));
}

#[test]
fn duplicate_prefix_rejected() {
    let config = Config {
        check_prefixes: vec!["FOO".into(), "FOO".into()],
        ..Config::default()
    };
    assert_eq!(
        config.validate_prefixes(),
        Err(ConfigError::DuplicatePrefix("FOO".into()))
    );
}

#[test]
fn invalid_prefix_rejected() {
    let config = Config {
        check_prefixes: vec!["FOO BAR".into()],
        ..Config::default()
    };
    assert_eq!(
        config.validate_prefixes(),
        Err(ConfigError::InvalidPrefix("FOO BAR".into()))
    );
    let config = Config {
        check_prefixes: vec!["A-OK_2".into()],
        ..Config::default()
    };
    assert!(config.validate_prefixes().is_ok());
}

#[test]
fn prefix_regex_prefers_longest() {
    let config = Config {
        check_prefixes: vec!["CHECK".into(), "CHECKX".into()],
        ..Config::default()
    };
    let re = config.build_prefix_regex().unwrap();
    let m = re.search("CHECKX: x").unwrap();
    assert_eq!(m.range(), (0, 6));
}

#[test]
fn no_check_strings_message() {
    let one = ConfigError::NoCheckStrings(vec!["CHECK".into()]);
    assert_eq!(
        one.to_string(),
        "no check strings found with prefix 'CHECK:'"
    );
    let two = ConfigError::NoCheckStrings(vec!["A".into(), "B".into()]);
    assert_eq!(
        two.to_string(),
        "no check strings found with prefixes 'A:', 'B:'"
    );
}
