//! Subset construction: turns an [`Nfa`] into a [`Dfa`] by materializing
//! DFA states as subsets of NFA states and deriving their transitions with
//! the interval algebra in [`crate::interval`].

use std::collections::HashMap;

use crate::dfa::{Dfa, DfaState, DfaTransition};
use crate::error::Error;
use crate::interval::{self, Choice};
use crate::nfa::{Nfa, NfaTransition};

/// `E[i]` is the set of NFA states reachable from `i` via zero or more
/// ε-transitions, including `i` itself. Computed once up front via
/// Floyd-Warshall-style transitive closure over an N×N boolean matrix;
/// O(N³), which `SPEC_FULL.md` §4.3 accepts as fine for practical patterns.
struct EpsilonClosures {
    closure: Vec<Vec<bool>>,
}

impl EpsilonClosures {
    fn compute(nfa: &Nfa) -> EpsilonClosures {
        let n = nfa.len();
        let mut closure = vec![vec![false; n]; n];

        for i in 0..n {
            closure[i][i] = true;
        }
        for i in 0..n {
            for t in nfa.transitions_of(i) {
                if let NfaTransition::Epsilon { target } = t {
                    closure[i][*target] = true;
                }
            }
        }

        for k in 0..n {
            for i in 0..n {
                if closure[i][k] {
                    for j in 0..n {
                        if closure[k][j] {
                            closure[i][j] = true;
                        }
                    }
                }
            }
        }

        EpsilonClosures { closure }
    }

    fn of(&self, state: usize) -> &[bool] {
        &self.closure[state]
    }
}

/// For every NFA state `i`, the sorted disjoint interval list obtained by
/// folding the ranged transitions of every state in `E[i]` together. This
/// is computed once per NFA state and reused by every DFA state whose
/// subset contains `i`.
struct PerStateChoices {
    choices: Vec<Vec<Choice<Vec<usize>>>>,
}

impl PerStateChoices {
    fn compute(nfa: &Nfa, closures: &EpsilonClosures) -> PerStateChoices {
        let n = nfa.len();
        let mut choices = Vec::with_capacity(n);

        for i in 0..n {
            let mut acc: Vec<Choice<Vec<usize>>> = Vec::new();
            for (j, &reachable) in closures.of(i).iter().enumerate() {
                if !reachable {
                    continue;
                }
                for t in nfa.transitions_of(j) {
                    if let NfaTransition::Ranged { target, ranges } = t {
                        let raw: Vec<Choice<usize>> =
                            ranges.iter().map(|r| Choice { range: *r, target: *target }).collect();
                        acc = interval::merge_next_raw(&acc, &raw);
                    }
                }
            }
            interval::dedup_targets(&mut acc);
            choices.push(acc);
        }

        PerStateChoices { choices }
    }

    fn of(&self, state: usize) -> &[Choice<Vec<usize>>] {
        &self.choices[state]
    }
}

/// A subset of NFA states, represented as a boolean membership vector, plus
/// a cheap rolling hash used to intern subsets without an O(N) comparison
/// on every lookup. Ties are broken by full vector equality: the hash is
/// an acceleration structure, not a correctness assumption (`SPEC_FULL.md`
/// §9; the reference implementation makes the same call).
fn hash_subset(subset: &[bool]) -> u64 {
    const PRIME: u64 = 1_000_000_007;
    const BASE: u64 = 1_000_003;

    let mut h: u64 = 0;
    for &member in subset {
        h = h.wrapping_mul(BASE).wrapping_add(if member { 1 } else { 0 });
        h %= PRIME;
    }
    h
}

/// Interning table mapping subsets to DFA state indices, with hash-bucketed
/// vector-equality fallback on collision.
#[derive(Default)]
struct StateTable {
    buckets: HashMap<u64, Vec<(Vec<bool>, usize)>>,
    count: usize,
}

impl StateTable {
    fn intern(&mut self, subset: Vec<bool>) -> (usize, bool) {
        let h = hash_subset(&subset);
        let bucket = self.buckets.entry(h).or_default();

        for (existing, idx) in bucket.iter() {
            if existing == &subset {
                return (*idx, false);
            }
        }

        let idx = self.count;
        self.count += 1;
        bucket.push((subset, idx));
        (idx, true)
    }
}

fn union_closure(closures: &EpsilonClosures, targets: &[usize]) -> Vec<bool> {
    let n = closures.closure.len();
    let mut subset = vec![false; n];
    for &t in targets {
        for (i, m) in closures.of(t).iter().enumerate() {
            if *m {
                subset[i] = true;
            }
        }
    }
    subset
}

/// Compile `nfa` into a [`Dfa`] via subset construction. Fails with
/// [`Error::AcceptsEmptyString`] if the start state (the ε-closure of the
/// NFA's start) is accepting, per this engine's preserved top-level-empty
/// rejection rule.
pub fn compile_dfa(nfa: &Nfa) -> Result<Dfa, Error> {
    log::trace!("compile_dfa: {} NFA states", nfa.len());

    let closures = EpsilonClosures::compute(nfa);
    let per_state = PerStateChoices::compute(nfa, &closures);

    let mut table = StateTable::default();
    let mut dfa_states: Vec<DfaState> = Vec::new();
    let mut worklist = std::collections::VecDeque::new();

    let start_subset = closures.of(nfa.start).to_vec();
    let (start_idx, _) = table.intern(start_subset.clone());
    debug_assert_eq!(start_idx, 0);
    dfa_states.push(DfaState { is_end: accepts(&start_subset, nfa), transitions: Vec::new() });
    worklist.push_back((0usize, start_subset));

    if dfa_states[0].is_end {
        return Err(Error::AcceptsEmptyString);
    }

    while let Some((state_idx, subset)) = worklist.pop_front() {
        let mut outgoing: Vec<Choice<Vec<usize>>> = Vec::new();
        for (i, &member) in subset.iter().enumerate() {
            if member {
                outgoing = interval::merge_next_sets(&outgoing, per_state.of(i));
            }
        }
        interval::dedup_targets(&mut outgoing);

        let mut transitions = Vec::with_capacity(outgoing.len());
        for choice in outgoing {
            let next_subset = union_closure(&closures, &choice.target);
            let (next_idx, is_new) = table.intern(next_subset.clone());

            if is_new {
                debug_assert_eq!(next_idx, dfa_states.len());
                dfa_states.push(DfaState {
                    is_end: accepts(&next_subset, nfa),
                    transitions: Vec::new(),
                });
                worklist.push_back((next_idx, next_subset));
            }

            transitions.push(DfaTransition { range: choice.range, target: next_idx });
        }

        dfa_states[state_idx].transitions = transitions;
    }

    log::debug!("compile_dfa: materialized {} DFA states", dfa_states.len());
    Ok(Dfa { states: dfa_states })
}

fn accepts(subset: &[bool], nfa: &Nfa) -> bool {
    subset[nfa.end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::compile_nfa;

    fn ranges_sorted_and_disjoint(dfa: &Dfa) -> bool {
        dfa.states.iter().all(|s| {
            s.transitions.windows(2).all(|w| w[0].range.hi < w[1].range.lo)
                && s.transitions.windows(1).all(|w| w[0].range.lo <= w[0].range.hi)
        })
    }

    #[test]
    fn literal_pattern_compiles_and_matches() {
        let nfa = compile_nfa("abc").unwrap();
        let dfa = compile_dfa(&nfa).unwrap();

        assert!(!dfa.is_accept(0));
        assert!(ranges_sorted_and_disjoint(&dfa));

        let mut state = 0;
        for c in "abc".chars() {
            state = dfa.next_state(state, c).expect("should advance");
        }
        assert!(dfa.is_accept(state));
    }

    #[test]
    fn alternation_accepts_either_branch() {
        let nfa = compile_nfa("a|b").unwrap();
        let dfa = compile_dfa(&nfa).unwrap();

        let after_a = dfa.next_state(0, 'a').unwrap();
        assert!(dfa.is_accept(after_a));

        let after_b = dfa.next_state(0, 'b').unwrap();
        assert!(dfa.is_accept(after_b));

        assert_eq!(dfa.next_state(0, 'c'), None);
    }

    #[test]
    fn top_level_star_is_rejected_for_accepting_empty_string() {
        let nfa = compile_nfa("a*").unwrap();
        assert!(matches!(compile_dfa(&nfa), Err(Error::AcceptsEmptyString)));
    }

    #[test]
    fn plus_requires_at_least_one_match() {
        let nfa = compile_nfa("a+").unwrap();
        let dfa = compile_dfa(&nfa).unwrap();

        assert!(!dfa.is_accept(0));
        let after_one = dfa.next_state(0, 'a').unwrap();
        assert!(dfa.is_accept(after_one));
        let after_two = dfa.next_state(after_one, 'a').unwrap();
        assert!(dfa.is_accept(after_two));
    }

    #[test]
    fn no_two_dfa_states_share_a_subset() {
        let nfa = compile_nfa("(a*|b*)[0-9]?[a-zA-Z]+(x?y?z?|abc)").unwrap();
        let dfa = compile_dfa(&nfa).unwrap();
        assert!(ranges_sorted_and_disjoint(&dfa));
        // interning already guarantees distinct subsets per index; this
        // just exercises a pattern complex enough to produce many states.
        assert!(dfa.len() > 1);
    }

    #[test]
    fn negated_class_matches_complement() {
        let nfa = compile_nfa("[^a-zA-Z0-9]").unwrap();
        let dfa = compile_dfa(&nfa).unwrap();

        let after_hash = dfa.next_state(0, '#').unwrap();
        assert!(dfa.is_accept(after_hash));
        assert_eq!(dfa.next_state(0, 'a'), None);
    }
}
