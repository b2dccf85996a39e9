//! Escape decoding and `[...]` character-class parsing.
//!
//! This module produces plain `(lo, hi)` rune ranges; [`crate::parser`]
//! turns them into NFA fragments and [`crate::interval`] is what merges
//! them once they're attached to transitions.

use crate::error::Error;
use crate::interval::{RuneRange, FULL_RANGE};

/// Decode the character following a `\` outside a class. Returns the
/// literal rune it stands for, or an error if the escape is unknown.
pub fn decode_escape(offset: usize, c: char) -> Result<char, Error> {
    Ok(match c {
        '\\' | '(' | ')' | '*' | '+' | '?' | '|' | '.' | '[' | ']' => c,
        't' => '\u{0009}',
        'r' => '\u{000D}',
        'n' => '\u{000A}',
        _ => return Err(Error::UnknownEscape { offset, escaped: c }),
    })
}

/// Decode the character following a `\` *inside* a class, where `^` and
/// `-` additionally escape to themselves (so they can appear literally
/// without being read as the negation flag or a range dash).
pub fn decode_class_escape(offset: usize, c: char) -> Result<char, Error> {
    match c {
        '^' | '-' => Ok(c),
        _ => decode_escape(offset, c),
    }
}

/// One atom collected while scanning a `[...]` body: either a single rune
/// or an `a-b` range.
struct ClassAtom {
    lo: char,
    hi: char,
}

/// Parses a `[...]` body (the part between the brackets, negation flag
/// already stripped by the caller) into a sorted, disjoint list of
/// `RuneRange`s, applying negation if requested.
///
/// `chars` must be positioned just past the optional leading `^` and will
/// be advanced past the closing `]`. `offset` is the byte offset of the
/// opening `[`, used only for error messages.
pub fn parse_class(
    chars: &mut std::iter::Peekable<std::str::CharIndices>,
    class_offset: usize,
    negated: bool,
) -> Result<Vec<RuneRange>, Error> {
    let mut atoms = Vec::new();

    loop {
        match chars.peek().copied() {
            None => return Err(Error::UnterminatedClass { offset: class_offset }),
            Some((_, ']')) => {
                chars.next();
                break;
            }
            _ => {
                let (lo_off, lo) = read_class_char(chars, class_offset)?;
                let hi = if matches!(chars.peek(), Some((_, '-'))) {
                    chars.next(); // consume '-'
                    let (_, hi) = read_class_char(chars, class_offset)?;
                    if hi < lo {
                        return Err(Error::ReversedRange { offset: lo_off, lo, hi });
                    }
                    hi
                } else {
                    lo
                };
                atoms.push(ClassAtom { lo, hi });
            }
        }
    }

    if atoms.is_empty() {
        return Err(Error::EmptyClass { offset: class_offset });
    }

    let ranges = sweep_atoms(atoms);
    if negated {
        Ok(negate(&ranges))
    } else {
        Ok(ranges)
    }
}

fn read_class_char(
    chars: &mut std::iter::Peekable<std::str::CharIndices>,
    class_offset: usize,
) -> Result<(usize, char), Error> {
    match chars.next() {
        Some((off, '\\')) => match chars.next() {
            Some((esc_off, c)) => Ok((off, decode_class_escape(esc_off, c)?)),
            None => Err(Error::UnterminatedClass { offset: class_offset }),
        },
        Some((off, c)) => Ok((off, c)),
        None => Err(Error::UnterminatedClass { offset: class_offset }),
    }
}

/// Sort atoms by `lo` (ties broken by larger `hi` first) and sweep them
/// into a disjoint, sorted list of ranges.
fn sweep_atoms(mut atoms: Vec<ClassAtom>) -> Vec<RuneRange> {
    atoms.sort_by(|a, b| a.lo.cmp(&b.lo).then(b.hi.cmp(&a.hi)));

    let mut out: Vec<RuneRange> = Vec::new();
    for atom in atoms {
        let lo = atom.lo as u32;
        let hi = atom.hi as u32;
        match out.last_mut() {
            Some(last) if lo <= last.hi.saturating_add(1) => {
                if hi > last.hi {
                    last.hi = hi;
                }
            }
            _ => out.push(RuneRange::new(lo, hi)),
        }
    }
    out
}

/// Complement a sorted, disjoint range list against the full scalar range.
fn negate(ranges: &[RuneRange]) -> Vec<RuneRange> {
    let mut out = Vec::new();
    let mut next_lo = FULL_RANGE.lo;

    for r in ranges {
        if next_lo < r.lo {
            out.push(RuneRange::new(next_lo, r.lo - 1));
        }
        next_lo = r.hi + 1;
    }
    if next_lo <= FULL_RANGE.hi {
        out.push(RuneRange::new(next_lo, FULL_RANGE.hi));
    }
    out
}
