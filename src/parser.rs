//! Pattern tokenizer and the pushdown parser that drives [`NfaBuilder`].
//!
//! Stack entries are a tagged enum (`Fragment`/`Paren`/`Alt`) rather than
//! sentinel object identity, per the reference implementation's own
//! reconsideration of that trick (see `SPEC_FULL.md` §9).

use crate::class::{decode_escape, parse_class};
use crate::error::Error;
use crate::interval::{RuneRange, FULL_RANGE};
use crate::nfa::{Fragment, Nfa, NfaBuilder};

const NEWLINE: u32 = '\n' as u32;

enum StackItem {
    Fragment(Fragment),
    Paren { offset: usize },
    Alt { offset: usize },
}

struct Parser<'a> {
    builder: NfaBuilder,
    stack: Vec<StackItem>,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    paren_depth: usize,
    last_was_quantifiable: bool,
    last_was_quantifier: bool,
    /// Byte offset and char of the previously consumed token, used to
    /// reject `*`/`+`/`?` with nothing to repeat and misplaced `|`.
    prev: Option<(usize, char)>,
}

/// Parse `pattern` into an NFA via Thompson construction. Fails with an
/// [`Error`] on any of the syntax/class/escape violations in §4.2/§7.
pub fn compile_nfa(pattern: &str) -> Result<Nfa, Error> {
    log::trace!("compile_nfa: tokenizing {:?}", pattern);

    let mut parser = Parser {
        builder: NfaBuilder::new(),
        stack: Vec::new(),
        chars: pattern.char_indices().peekable(),
        paren_depth: 0,
        last_was_quantifiable: false,
        last_was_quantifier: false,
        prev: None,
    };

    while let Some((offset, c)) = parser.chars.next() {
        match c {
            '(' => {
                parser.paren_depth += 1;
                parser.stack.push(StackItem::Paren { offset });
                parser.last_was_quantifiable = false;
                parser.last_was_quantifier = false;
            }
            ')' => {
                if parser.paren_depth == 0 {
                    return Err(Error::UnbalancedParen { offset });
                }
                if matches!(parser.stack.last(), None | Some(StackItem::Paren { .. }) | Some(StackItem::Alt { .. })) {
                    return Err(Error::EmptyGroup { offset });
                }
                parser.paren_depth -= 1;
                close_group(&mut parser, offset)?;
                parser.last_was_quantifiable = true;
                parser.last_was_quantifier = false;
            }
            '*' | '+' | '?' => {
                if !parser.last_was_quantifiable || parser.last_was_quantifier {
                    return Err(Error::MisplacedQuantifier { offset, quantifier: c });
                }
                let frag = pop_fragment(&mut parser.stack).expect("checked quantifiable above");
                let quantified = match c {
                    '*' => parser.builder.star(frag),
                    '+' => parser.builder.plus(frag),
                    _ => parser.builder.optional(frag),
                };
                parser.stack.push(StackItem::Fragment(quantified));
                parser.last_was_quantifiable = true;
                parser.last_was_quantifier = true;
            }
            '|' => {
                if matches!(parser.stack.last(), None | Some(StackItem::Paren { .. }) | Some(StackItem::Alt { .. })) {
                    return Err(Error::MisplacedAlternation { offset });
                }
                parser.stack.push(StackItem::Alt { offset });
                parser.last_was_quantifiable = false;
                parser.last_was_quantifier = false;
            }
            '.' => {
                let ranges = dot_ranges();
                let frag = parser.builder.from_ranges(ranges);
                parser.stack.push(StackItem::Fragment(frag));
                parser.last_was_quantifiable = true;
                parser.last_was_quantifier = false;
            }
            '[' => {
                let negated = matches!(parser.chars.peek(), Some((_, '^')));
                if negated {
                    parser.chars.next();
                }
                let ranges = parse_class(&mut parser.chars, offset, negated)?;
                let frag = parser.builder.from_ranges(ranges);
                parser.stack.push(StackItem::Fragment(frag));
                parser.last_was_quantifiable = true;
                parser.last_was_quantifier = false;
            }
            '\\' => {
                let (esc_off, esc) = parser.chars.next().ok_or(Error::UnbalancedParen { offset })?;
                let literal = decode_escape(esc_off, esc)?;
                let frag = parser.builder.from_ranges(vec![RuneRange::single(literal)]);
                parser.stack.push(StackItem::Fragment(frag));
                parser.last_was_quantifiable = true;
                parser.last_was_quantifier = false;
            }
            _ => {
                let frag = parser.builder.from_ranges(vec![RuneRange::single(c)]);
                parser.stack.push(StackItem::Fragment(frag));
                parser.last_was_quantifiable = true;
                parser.last_was_quantifier = false;
            }
        }
        parser.prev = Some((offset, c));
    }

    if parser.paren_depth != 0 {
        return Err(Error::UnbalancedParen { offset: pattern.len() });
    }

    close_group(&mut parser, pattern.len())?;

    let top = match parser.stack.pop() {
        Some(StackItem::Fragment(f)) => f,
        _ => return Err(Error::UnbalancedParen { offset: 0 }),
    };
    debug_assert!(parser.stack.is_empty());

    log::debug!("compile_nfa: built {} states", parser.builder.len());
    Ok(parser.builder.finish(top.start, top.end))
}

/// Pop fragments from the stack until hitting a `Paren`/`Alt` marker or
/// the bottom, concatenating the run; repeat across `Alt` markers,
/// alternating the runs together; push the single resulting fragment.
fn close_group(parser: &mut Parser, offset: usize) -> Result<(), Error> {
    let mut alternatives = Vec::new();

    loop {
        let mut run = Vec::new();
        loop {
            match parser.stack.last() {
                Some(StackItem::Fragment(_)) => {
                    if let Some(StackItem::Fragment(f)) = parser.stack.pop() {
                        run.push(f);
                    }
                }
                _ => break,
            }
        }
        run.reverse();

        if run.is_empty() {
            return match parser.stack.last() {
                Some(StackItem::Alt { .. }) => Err(Error::MisplacedAlternation { offset }),
                _ => Err(Error::EmptyGroup { offset }),
            };
        }

        let mut combined = run.remove(0);
        for next in run {
            combined = parser.builder.concat(combined, next);
        }
        alternatives.push(combined);

        match parser.stack.last() {
            Some(StackItem::Alt { .. }) => {
                parser.stack.pop();
                continue;
            }
            Some(StackItem::Paren { .. }) => {
                parser.stack.pop();
                break;
            }
            None => break,
        }
    }

    let mut result = alternatives.remove(0);
    for alt in alternatives {
        result = parser.builder.alternate(result, alt);
    }
    parser.stack.push(StackItem::Fragment(result));
    Ok(())
}

fn pop_fragment(stack: &mut Vec<StackItem>) -> Option<Fragment> {
    match stack.pop()? {
        StackItem::Fragment(f) => Some(f),
        other => {
            stack.push(other);
            None
        }
    }
}

/// `.` matches any rune except `\n`: `[0, '\n'-1]` and `[\n+1, 0x10FFFF]`.
fn dot_ranges() -> Vec<RuneRange> {
    let mut ranges = Vec::new();
    if NEWLINE > FULL_RANGE.lo {
        ranges.push(RuneRange::new(FULL_RANGE.lo, NEWLINE - 1));
    }
    if NEWLINE < FULL_RANGE.hi {
        ranges.push(RuneRange::new(NEWLINE + 1, FULL_RANGE.hi));
    }
    ranges
}
