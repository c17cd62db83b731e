use crate::regex::{capture_group_count, escape, CheckRegex};

#[test]
fn search_finds_leftmost() {
    let re = CheckRegex::new("hello").unwrap();
    let m = re.search("say hello twice: hello").unwrap();
    assert_eq!(m.range(), (4, 9));
}

#[test]
fn search_reports_groups() {
    let re = CheckRegex::new("a(b+)(c)?").unwrap();
    let m = re.search("xabbb").unwrap();
    assert_eq!(m.range(), (1, 5));
    assert_eq!(m.group(1), Some((2, 5)));
    assert_eq!(m.group(2), None);
}

#[test]
fn anchors_are_line_based() {
    let re = CheckRegex::new("^b$").unwrap();
    let m = re.search("a\nb\nc").unwrap();
    assert_eq!(m.range(), (2, 3));
}

#[test]
fn empty_line_pattern_matches_mid_buffer() {
    // The CHECK-EMPTY skeleton relies on $ asserting before any newline.
    let re = CheckRegex::new(r"(\n$)").unwrap();
    let m = re.search("a\n\nb\n").unwrap();
    assert_eq!(m.range(), (1, 2));
}

#[test]
fn backreferences_are_supported() {
    let re = CheckRegex::new(r"([a-z]+) \1").unwrap();
    let m = re.search("foo foo").unwrap();
    assert_eq!(m.range(), (0, 7));
    assert!(re.search("foo bar").is_none());
}

#[test]
fn dot_does_not_cross_lines() {
    let re = CheckRegex::new("a.b").unwrap();
    assert!(re.search("a\nb").is_none());
    assert!(re.search("axb").is_some());
}

#[test]
fn search_at_skips_earlier_matches() {
    let re = CheckRegex::new("ab").unwrap();
    assert_eq!(re.search_at("ab ab", 0), Some((0, 2)));
    assert_eq!(re.search_at("ab ab", 1), Some((3, 5)));
    assert_eq!(re.search_at("ab ab", 4), None);
}

#[test]
fn bad_pattern_is_rejected() {
    assert!(CheckRegex::new("(").is_err());
}

#[test]
fn group_counting() {
    assert_eq!(capture_group_count("abc").unwrap(), 0);
    assert_eq!(capture_group_count("x|z").unwrap(), 0);
    assert_eq!(capture_group_count("a(b)(c(d))").unwrap(), 3);
    // A paren inside a class is literal.
    assert_eq!(capture_group_count("[(]").unwrap(), 0);
    assert!(capture_group_count("(").is_err());
}

#[test]
fn escape_neutralizes_metacharacters() {
    assert_eq!(escape("a.b"), "a\\.b");
    let re = CheckRegex::new(&escape("1+1=2?")).unwrap();
    assert!(re.search("so 1+1=2? yes").is_some());
}
