//! End-to-end scenarios and negative compile cases, exercising the public
//! façade (`Regex::compile` / `Regex::is_match`) rather than any internal
//! module directly.

use runematch::{Error, Regex};

/// Enables `log` output for a single test when `RUST_LOG` is set; harmless
/// no-op otherwise. Call at the top of a test to see the pipeline's
/// `trace!`/`debug!` milestones on failure.
fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn scenario_table() {
    init();
    let re = Regex::compile(r"(a*|b*)[0-9]?[a-zA-Z]+(x?y?z?|abc)").unwrap();

    assert!(!re.is_match("aaabbb123xyz"), "mixes a and b in the first group");
    assert!(re.is_match("aaabbbabc"));
    assert!(re.is_match("0xabc"));
    assert!(re.is_match("bbbbbbabc"));
}

#[test]
fn return_or_result() {
    let re = Regex::compile("return|result").unwrap();
    assert!(re.is_match("return"));
    assert!(!re.is_match("resul"));
}

#[test]
fn nested_groups_classes_and_escapes() {
    let re = Regex::compile("\\.(a?b|(xy)+|yz*).\\t").unwrap();
    assert!(re.is_match(".xyxy!\t"));
}

#[test]
fn negated_class_is_full_range_complement() {
    let re = Regex::compile("[^a-zA-Z0-9]").unwrap();
    assert!(re.is_match("#"));
    assert!(!re.is_match("a"));
}

#[test]
fn dot_excludes_newline_only() {
    let re = Regex::compile(".").unwrap();
    assert!(re.is_match("x"));
    assert!(re.is_match("\r"));
    assert!(!re.is_match("\n"));
}

macro_rules! assert_compile_err {
    ($pattern:expr) => {
        assert!(Regex::compile($pattern).is_err(), "expected {:?} to fail to compile", $pattern);
    };
}

#[test]
fn negative_compile_cases() {
    assert_compile_err!("");
    assert_compile_err!("a*");
    assert_compile_err!("(");
    assert_compile_err!("*a");
    assert_compile_err!("a**");
    assert_compile_err!("|a");
    assert_compile_err!("a|");
    assert_compile_err!("()");
    assert_compile_err!("[]");
    assert_compile_err!("[z-a]");
    assert_compile_err!("\\q");
}

#[test]
fn empty_string_rejection_is_the_accepts_empty_string_variant() {
    assert!(matches!(Regex::compile("a*"), Err(Error::AcceptsEmptyString)));
}

#[test]
fn a_plus_b_star_top_level_is_fine_since_a_is_required() {
    // `a*b` as a whole does not accept the empty string even though the
    // `a*` sub-pattern does, so only the *overall* start state matters.
    let re = Regex::compile("a*b").unwrap();
    assert!(re.is_match("b"));
    assert!(re.is_match("aaab"));
    assert!(!re.is_match("aaa"));
}
