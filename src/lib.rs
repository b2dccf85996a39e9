//! `runematch` compiles a small regular-expression dialect into a
//! Unicode-aware DFA and runs full-string membership tests against it.
//!
//! The supported syntax is intentionally narrow: concatenation,
//! alternation (`|`), `*`/`+`/`?`, `.`, character classes (`[...]`,
//! `[^...]`), and a handful of escapes. There is no capture, no anchors, no
//! counted repetition, and no partial/substring matching: every compiled
//! pattern is matched against the *whole* input string or not at all. See
//! `SPEC_FULL.md` for the full specification this crate implements.
//!
//! ```
//! use runematch::Regex;
//!
//! let re = Regex::compile(r"return|result").unwrap();
//! assert!(re.is_match("return"));
//! assert!(!re.is_match("resul"));
//! ```

mod class;
mod dfa;
mod error;
mod interval;
mod nfa;
mod parser;
mod subset;

pub use error::Error;

use dfa::Dfa;

/// A compiled pattern, ready to test strings against.
///
/// Compilation (`Regex::compile`) does all the work: parsing into an NFA
/// via Thompson construction, then subset construction into a DFA.
/// Matching (`Regex::is_match`) is a single binary-search walk per input
/// rune and never fails.
#[derive(Debug, Clone)]
pub struct Regex {
    dfa: Dfa,
}

impl Regex {
    /// Compile `pattern` into a matcher. Fails with an [`Error`] describing
    /// the first syntax, class, escape, or semantic violation found, see
    /// `SPEC_FULL.md` §7 for the full taxonomy. Notably, a pattern that
    /// matches the empty string at the top level (e.g. bare `a*`) is
    /// rejected: this is a deliberate, preserved restriction, not an
    /// oversight (`SPEC_FULL.md` §9).
    pub fn compile(pattern: &str) -> Result<Regex, Error> {
        log::debug!("Regex::compile: {:?}", pattern);

        let nfa = parser::compile_nfa(pattern)?;
        let dfa = subset::compile_dfa(&nfa)?;

        Ok(Regex { dfa })
    }

    /// Whether `input` is matched *in full* by this pattern. Iterates by
    /// Unicode scalar value (not byte), walking the DFA one rune at a time;
    /// returns `false` as soon as a rune has no outgoing transition from
    /// the current state, without scanning the rest of the input.
    pub fn is_match(&self, input: &str) -> bool {
        let mut state = 0;

        for c in input.chars() {
            match self.dfa.next_state(state, c) {
                Some(next) => state = next,
                None => return false,
            }
        }

        self.dfa.is_accept(state)
    }
}
