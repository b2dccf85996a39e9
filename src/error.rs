//! The single error type for every fatal, compile-time failure. Matching
//! itself never fails (see [`crate::Regex::is_match`]).

use thiserror::Error;

/// Everything that can go wrong compiling a pattern. All variants are
/// fatal: there is no partial/recoverable compile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `(` with no matching `)`, or vice versa.
    #[error("unbalanced parenthesis at byte offset {offset}")]
    UnbalancedParen { offset: usize },

    /// `*`, `+`, or `?` with nothing to quantify, or stacked on another
    /// quantifier (`a**`).
    #[error("quantifier '{quantifier}' at byte offset {offset} has nothing to repeat")]
    MisplacedQuantifier { offset: usize, quantifier: char },

    /// `|` at the start of a group, or immediately following another `|`.
    #[error("misplaced alternation '|' at byte offset {offset}")]
    MisplacedAlternation { offset: usize },

    /// `()`, a group with no content.
    #[error("empty group at byte offset {offset}")]
    EmptyGroup { offset: usize },

    /// `[...` with no closing `]`.
    #[error("unterminated character class starting at byte offset {offset}")]
    UnterminatedClass { offset: usize },

    /// `[]`, a class with no members (note: `[^]` is not special-cased;
    /// it is simply a negated empty class and is likewise rejected).
    #[error("empty character class at byte offset {offset}")]
    EmptyClass { offset: usize },

    /// `a-b` inside a class with `a > b`.
    #[error("reversed range '{lo}'-'{hi}' at byte offset {offset}")]
    ReversedRange { offset: usize, lo: char, hi: char },

    /// `\x` where `x` is not one of the recognized escapes.
    #[error("unknown escape '\\{escaped}' at byte offset {offset}")]
    UnknownEscape { offset: usize, escaped: char },

    /// The compiled DFA's start state is accepting, meaning the pattern
    /// matches the empty string. This engine disallows that by
    /// construction (see `SPEC_FULL.md` §4.3 and §9).
    #[error("pattern accepts the empty string, which this engine disallows")]
    AcceptsEmptyString,
}
