use crate::config::ConfigError;
use crate::context::{Context, SubstKind, Substitution};

fn defines(defs: &[&str]) -> Result<Context, ConfigError> {
    let mut ctx = Context::new();
    let defs: Vec<String> = defs.iter().map(|d| d.to_string()).collect();
    ctx.define_from_cli(&defs)?;
    Ok(ctx)
}

#[test]
fn cli_string_define() {
    let ctx = defines(&["FOO=bar"]).unwrap();
    assert_eq!(ctx.lookup_string("FOO"), Some("bar"));
    assert!(ctx.is_string_defined("FOO"));
}

#[test]
fn cli_numeric_define() {
    let ctx = defines(&["#N=42"]).unwrap();
    let id = ctx.numeric_id("N").unwrap();
    assert_eq!(ctx.numeric_value(id), Some(42));
    assert_eq!(ctx.numeric_def_line(id), None);
}

#[test]
fn cli_define_missing_equals() {
    let err = defines(&["FOO"]).unwrap_err();
    let ConfigError::BadDefines(messages) = err else {
        panic!("expected BadDefines");
    };
    assert!(messages[0].contains("missing equal sign"));
}

#[test]
fn cli_define_bad_numeric_value() {
    let err = defines(&["#N=0x2a"]).unwrap_err();
    let ConfigError::BadDefines(messages) = err else {
        panic!("expected BadDefines");
    };
    assert!(messages[0].contains("invalid value"));
}

#[test]
fn cli_define_errors_accumulate() {
    let err = defines(&["FOO", "#N=bad", "@X=1"]).unwrap_err();
    let ConfigError::BadDefines(messages) = err else {
        panic!("expected BadDefines");
    };
    assert_eq!(messages.len(), 3);
}

#[test]
fn cross_kind_collision_rejected_both_ways() {
    let err = defines(&["FOO=bar", "#FOO=1"]).unwrap_err();
    let ConfigError::BadDefines(messages) = err else {
        panic!("expected BadDefines");
    };
    assert!(messages[0].contains("string variable with name 'FOO' already exists"));

    let err = defines(&["#N=1", "N=x"]).unwrap_err();
    let ConfigError::BadDefines(messages) = err else {
        panic!("expected BadDefines");
    };
    assert!(messages[0].contains("numeric variable with name 'N' already exists"));
}

#[test]
fn pseudo_names_rejected_in_defines() {
    assert!(defines(&["@LINE=1"]).is_err());
    assert!(defines(&["#@LINE=1"]).is_err());
}

#[test]
fn clear_local_vars_spares_globals() {
    let mut ctx = defines(&["LOCAL=a", "$GLOBAL=b", "#N=1", "#$G=2"]).unwrap();
    let n = ctx.numeric_id("N").unwrap();
    let g = ctx.numeric_id("$G").unwrap();

    ctx.clear_local_vars();

    assert_eq!(ctx.lookup_string("LOCAL"), None);
    assert_eq!(ctx.lookup_string("$GLOBAL"), Some("b"));
    // The numeric entry survives with its value cleared.
    assert_eq!(ctx.numeric_id("N"), Some(n));
    assert_eq!(ctx.numeric_value(n), None);
    assert_eq!(ctx.numeric_value(g), Some(2));
    // Collision detection still knows the string name.
    assert!(ctx.is_string_defined("LOCAL"));
}

#[test]
fn line_var_lifecycle() {
    let mut ctx = Context::new();
    assert!(ctx.line_var().is_none());
    ctx.create_line_var();
    let line = ctx.line_var().unwrap();
    assert_eq!(ctx.numeric_id("@LINE"), Some(line));
    ctx.set_numeric_value(line, 12);
    assert_eq!(ctx.numeric_value(line), Some(12));
    ctx.clear_numeric_value(line);
    assert_eq!(ctx.numeric_value(line), None);
}

#[test]
fn string_substitution_escapes_value() {
    let mut ctx = Context::new();
    ctx.set_string("V", "a+b".to_string());
    let id = ctx.make_substitution(Substitution {
        from: "V".to_string(),
        kind: SubstKind::StringVar("V".to_string()),
        insert_at: 0,
    });
    assert_eq!(ctx.resolve_substitution(id).unwrap(), "a\\+b");
}

#[test]
fn unresolved_substitution_names_the_variable() {
    let mut ctx = Context::new();
    let id = ctx.make_substitution(Substitution {
        from: "MISSING".to_string(),
        kind: SubstKind::StringVar("MISSING".to_string()),
        insert_at: 0,
    });
    let err = ctx.resolve_substitution(id).unwrap_err();
    assert_eq!(err.0, vec!["MISSING".to_string()]);
}
