//! Thompson-style NFA construction.
//!
//! Transitions live in a single growing arena (`Vec<NfaTransition>`),
//! addressed everywhere by a stable integer id rather than by pointer or
//! by position within a state's adjacency list. States (`Vec<NfaState>`)
//! hold nothing but a list of the transition ids leaving them. This
//! mirrors the "arena indexed by integer IDs" design note: a transition's
//! identity never changes once allocated, even when it is later moved
//! from one state's adjacency list into another's, so a
//! [`TransitionHandle`] taken before such a move still addresses the
//! right transition afterward.
//!
//! Composition follows the reference construction's merge discipline
//! rather than always bridging with a fresh epsilon edge: `concat` fuses
//! one fragment's end into the other's start whenever nothing still
//! depends on that start being a distinct state, and `alternate` only
//! allocates a fresh hub state on each side when both sides actually need
//! one. The `to_start`/`to_end` fixup lists are what make this possible:
//! they track every transition currently targeting a fragment's
//! start/end, so a later fuse can retarget exactly those transitions in
//! place, wherever their adjacency list now lives.

use crate::interval::RuneRange;

/// A transition, identified by its position in the shared arena rather
/// than by the state it currently hangs off of.
#[derive(Debug, Clone)]
pub enum NfaTransition {
    /// Consumes no input.
    Epsilon { target: usize },
    /// Consumes one rune falling in any of `ranges`, all routing to the
    /// same `target`.
    Ranged { target: usize, ranges: Vec<RuneRange> },
}

/// A single NFA state: the ids of its outgoing transitions into the
/// shared transition arena.
#[derive(Debug, Clone, Default)]
pub struct NfaState {
    pub transition_ids: Vec<usize>,
}

/// A handle identifying one transition by its stable arena id, used to
/// retarget a `to_start`/`to_end` fixup after the state it pointed at is
/// superseded. Plays the role the reference implementation's
/// `*nfaTransfer` pointer played: an identity that survives the
/// transition being relocated to a different state's adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionHandle(usize);

/// A partial NFA under construction: a single start and single end state
/// (Thompson's invariant), plus every transition currently targeting
/// those endpoints. `to_start`/`to_end` are load-bearing: a fragment
/// that fuses its start or end into another state retargets exactly the
/// handles recorded here, nothing more and nothing less, so they must
/// stay in sync with every transition actually pointing at `start`/`end`
/// at all times. `start`/`end` are absolute indices into the shared
/// [`NfaBuilder`] arena, not positional conventions, so composing two
/// fragments never requires renumbering either one.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub start: usize,
    pub end: usize,
    pub to_start: Vec<TransitionHandle>,
    pub to_end: Vec<TransitionHandle>,
}

/// The shared arena every fragment is built in. Dropped once the final
/// [`Nfa`] is extracted.
#[derive(Debug, Default)]
pub struct NfaBuilder {
    states: Vec<NfaState>,
    transitions: Vec<NfaTransition>,
}

impl NfaBuilder {
    pub fn new() -> NfaBuilder {
        NfaBuilder::default()
    }

    fn new_state(&mut self) -> usize {
        self.states.push(NfaState::default());
        self.states.len() - 1
    }

    /// Number of states allocated so far, for diagnostics.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    fn push_transition(&mut self, from: usize, t: NfaTransition) -> TransitionHandle {
        let id = self.transitions.len();
        self.transitions.push(t);
        self.states[from].transition_ids.push(id);
        TransitionHandle(id)
    }

    fn push_epsilon(&mut self, from: usize, to: usize) -> TransitionHandle {
        self.push_transition(from, NfaTransition::Epsilon { target: to })
    }

    fn retarget(&mut self, h: TransitionHandle, new_target: usize) {
        let t = &mut self.transitions[h.0];
        *t = match t {
            NfaTransition::Epsilon { .. } => NfaTransition::Epsilon { target: new_target },
            NfaTransition::Ranged { ranges, .. } => {
                NfaTransition::Ranged { target: new_target, ranges: std::mem::take(ranges) }
            }
        };
    }

    /// Retarget every handle in `handles` to point at `new_target`: the
    /// mechanism a fuse uses to redirect a fragment's existing
    /// start/end fixups once that endpoint is absorbed into another
    /// state, in place of the pointer rewrite the reference
    /// implementation performs on its `*nfaTransfer` targets. Safe to
    /// call regardless of which state's adjacency list currently holds
    /// these transitions, since handles address the arena directly.
    pub fn retarget_all(&mut self, handles: &[TransitionHandle], new_target: usize) {
        for &h in handles {
            self.retarget(h, new_target);
        }
    }

    /// A fragment matching a single rune drawn from `ranges`: two fresh
    /// states joined by one ranged transition. That transition targets
    /// `end`, so it is itself the fragment's sole `to_end` fixup: if a
    /// later fuse absorbs this fragment's end into another state, this
    /// is the transition that gets retargeted.
    pub fn from_ranges(&mut self, ranges: Vec<RuneRange>) -> Fragment {
        let start = self.new_state();
        let end = self.new_state();
        let to_end = self.push_transition(start, NfaTransition::Ranged { target: end, ranges });
        Fragment { start, end, to_start: Vec::new(), to_end: vec![to_end] }
    }

    /// `concat(a, b)` builds the fragment for `a` followed by `b`. Per
    /// the reference `concatenate`: if `a`'s end has no outgoing
    /// transitions, or `b` carries no `to_start` fixups, the two
    /// endpoints are fused into a single state (`b`'s start transitions
    /// move onto `a`'s end, and every handle in `b.to_start` is
    /// retargeted there) instead of being bridged by a fresh epsilon
    /// edge.
    pub fn concat(&mut self, a: Fragment, b: Fragment) -> Fragment {
        let a_end_has_transitions = !self.states[a.end].transition_ids.is_empty();
        if !a_end_has_transitions || b.to_start.is_empty() {
            let absorbed = std::mem::take(&mut self.states[b.start].transition_ids);
            self.states[a.end].transition_ids.extend(absorbed);
            self.retarget_all(&b.to_start, a.end);
        } else {
            self.push_epsilon(a.end, b.start);
        }
        Fragment { start: a.start, end: b.end, to_start: a.to_start, to_end: b.to_end }
    }

    /// `alternate(a, b)` builds the fragment for `a | b`, following the
    /// reference `alternate`'s four-way merge on each side rather than
    /// unconditionally allocating fresh hub states:
    ///
    /// - Start side: if neither side has `to_start` fixups, `b`'s start
    ///   is fused into `a`'s; if only one side is fixup-free, the other
    ///   side's start becomes the combined start with an epsilon edge
    ///   into the fixup-free side; otherwise a fresh start epsilon-
    ///   branches into both.
    /// - End side: mirrors the start side, but keyed on whether each
    ///   end state already has outgoing transitions rather than on
    ///   `to_end` fixups (an end with outgoing edges is already doing
    ///   something else and can't be safely fused away).
    ///
    /// The combined fragment's `to_start` is always empty afterward:
    /// once two sides are joined, neither side's start can still be the
    /// thing a later fuse would want to retarget.
    pub fn alternate(&mut self, a: Fragment, b: Fragment) -> Fragment {
        let Fragment { start: a_start, end: a_end, to_start: a_to_start, to_end: a_to_end } = a;
        let Fragment { start: b_start, end: b_end, to_start: b_to_start, to_end: b_to_end } = b;

        let new_start = if a_to_start.is_empty() && b_to_start.is_empty() {
            let absorbed = std::mem::take(&mut self.states[b_start].transition_ids);
            self.states[a_start].transition_ids.extend(absorbed);
            a_start
        } else if a_to_start.is_empty() {
            self.push_epsilon(a_start, b_start);
            a_start
        } else if b_to_start.is_empty() {
            self.push_epsilon(b_start, a_start);
            b_start
        } else {
            let start = self.new_state();
            self.push_epsilon(start, a_start);
            self.push_epsilon(start, b_start);
            start
        };

        let a_end_has_transitions = !self.states[a_end].transition_ids.is_empty();
        let b_end_has_transitions = !self.states[b_end].transition_ids.is_empty();

        let (new_end, to_end) = if !a_end_has_transitions && !b_end_has_transitions {
            self.retarget_all(&b_to_end, a_end);
            let mut to_end = a_to_end;
            to_end.extend(b_to_end);
            (a_end, to_end)
        } else if !a_end_has_transitions {
            let h = self.push_epsilon(b_end, a_end);
            let mut to_end = a_to_end;
            to_end.push(h);
            (a_end, to_end)
        } else if !b_end_has_transitions {
            let h = self.push_epsilon(a_end, b_end);
            let mut to_end = b_to_end;
            to_end.push(h);
            (b_end, to_end)
        } else {
            let end = self.new_state();
            let h1 = self.push_epsilon(a_end, end);
            let h2 = self.push_epsilon(b_end, end);
            (end, vec![h1, h2])
        };

        Fragment { start: new_start, end: new_end, to_start: Vec::new(), to_end }
    }

    /// `X*`: skip straight to the end, or loop back to the start after
    /// one pass. Both new edges are appended to `x`'s own fixup lists
    /// rather than replacing them, since `x` may already carry fixups of
    /// its own (e.g. `(a*)*`).
    pub fn star(&mut self, mut x: Fragment) -> Fragment {
        let to_end = self.push_epsilon(x.start, x.end);
        let to_start = self.push_epsilon(x.end, x.start);
        x.to_start.push(to_start);
        x.to_end.push(to_end);
        Fragment { start: x.start, end: x.end, to_start: x.to_start, to_end: x.to_end }
    }

    /// `X+`: one pass required, then may loop back to the start. Only
    /// `to_start` gains a new fixup; `to_end` is untouched since nothing
    /// new now points at `x`'s end.
    pub fn plus(&mut self, mut x: Fragment) -> Fragment {
        let to_start = self.push_epsilon(x.end, x.start);
        x.to_start.push(to_start);
        Fragment { start: x.start, end: x.end, to_start: x.to_start, to_end: x.to_end }
    }

    /// `X?`: one pass optional. Only `to_end` gains a new fixup;
    /// `to_start` is untouched since nothing new now points at `x`'s
    /// start.
    pub fn optional(&mut self, mut x: Fragment) -> Fragment {
        let to_end = self.push_epsilon(x.start, x.end);
        x.to_end.push(to_end);
        Fragment { start: x.start, end: x.end, to_start: x.to_start, to_end: x.to_end }
    }

    /// Finalize construction, producing an immutable [`Nfa`] with the
    /// given overall start/end.
    pub fn finish(self, start: usize, end: usize) -> Nfa {
        Nfa { states: self.states, transitions: self.transitions, start, end }
    }
}

/// The completed NFA: an arena of states, the shared transition arena
/// they index into, and the distinguished start and end state indices.
#[derive(Debug, Clone)]
pub struct Nfa {
    pub states: Vec<NfaState>,
    pub transitions: Vec<NfaTransition>,
    pub start: usize,
    pub end: usize,
}

impl Nfa {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// The transitions leaving `state`, resolved from the shared arena.
    pub fn transitions_of(&self, state: usize) -> impl Iterator<Item = &NfaTransition> {
        self.states[state].transition_ids.iter().map(move |&id| &self.transitions[id])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(c: char) -> RuneRange {
        RuneRange::single(c)
    }

    fn transitions_of(nfa: &Nfa, state: usize) -> Vec<&NfaTransition> {
        nfa.transitions_of(state).collect()
    }

    #[test]
    fn literal_fragment_has_one_ranged_transition() {
        let mut b = NfaBuilder::new();
        let f = b.from_ranges(vec![single('a')]);
        let nfa = b.finish(f.start, f.end);
        let ts = transitions_of(&nfa, f.start);
        assert_eq!(ts.len(), 1);
        match ts[0] {
            NfaTransition::Ranged { target, ranges } => {
                assert_eq!(*target, f.end);
                assert_eq!(ranges.len(), 1);
            }
            _ => panic!("expected a ranged transition"),
        }
    }

    #[test]
    fn literal_fragment_tracks_its_own_transition_as_a_to_end_fixup() {
        let mut b = NfaBuilder::new();
        let f = b.from_ranges(vec![single('a')]);
        assert_eq!(f.to_end.len(), 1);
        assert!(f.to_start.is_empty());
    }

    #[test]
    fn concat_fuses_end_into_start_when_possible() {
        let mut b = NfaBuilder::new();
        let a = b.from_ranges(vec![single('a')]);
        let bb = b.from_ranges(vec![single('b')]);
        let a_end = a.end;
        let bb_start = bb.start;
        let combined = b.concat(a, bb);
        let nfa = b.finish(combined.start, combined.end);

        // bb's start transitions were absorbed into a's end rather than
        // bridged with a fresh epsilon edge.
        assert_eq!(transitions_of(&nfa, bb_start).len(), 0);
        let a_end_ts = transitions_of(&nfa, a_end);
        assert_eq!(a_end_ts.len(), 1);
        match a_end_ts[0] {
            NfaTransition::Ranged { target, .. } => assert_eq!(*target, combined.end),
            _ => panic!("expected the absorbed ranged transition"),
        }
    }

    #[test]
    fn concat_bridges_when_end_has_transitions_and_next_has_to_start_fixups() {
        let mut b = NfaBuilder::new();
        let x = b.from_ranges(vec![single('x')]);
        let x_star = b.star(x);
        let y = b.from_ranges(vec![single('y')]);
        let y_star = b.star(y);
        let x_end = x_star.end;
        let y_start = y_star.start;

        let combined = b.concat(x_star, y_star);
        let nfa = b.finish(combined.start, combined.end);

        let bridged = transitions_of(&nfa, x_end)
            .into_iter()
            .any(|t| matches!(t, NfaTransition::Epsilon { target } if *target == y_start));
        assert!(bridged);
    }

    #[test]
    fn alternate_merges_start_states_when_neither_side_has_fixups() {
        let mut b = NfaBuilder::new();
        let a = b.from_ranges(vec![single('a')]);
        let bb = b.from_ranges(vec![single('b')]);
        let a_start = a.start;
        let bb_start = bb.start;

        let combined = b.alternate(a, bb);
        assert_eq!(combined.start, a_start);
        let nfa = b.finish(combined.start, combined.end);
        assert_eq!(transitions_of(&nfa, bb_start).len(), 0, "bb's start was absorbed");
        assert_eq!(transitions_of(&nfa, a_start).len(), 2, "a's start now carries both arms");
    }

    #[test]
    fn alternate_retargets_base_transitions_when_fusing_ends() {
        let mut b = NfaBuilder::new();
        let a = b.from_ranges(vec![single('a')]);
        let bb = b.from_ranges(vec![single('b')]);
        let a_end = a.end;

        let combined = b.alternate(a, bb);
        // Both arms' literal transitions now target the single fused
        // end state, since neither arm's end had outgoing transitions,
        // even though one of those transitions started life on a state
        // whose adjacency list it has since been moved out of.
        assert_eq!(combined.end, a_end);
        let nfa = b.finish(combined.start, combined.end);
        for t in &nfa.transitions {
            if let NfaTransition::Ranged { target, .. } = t {
                assert_eq!(*target, a_end);
            }
        }
    }

    #[test]
    fn star_adds_skip_and_loop_edges() {
        let mut b = NfaBuilder::new();
        let a = b.from_ranges(vec![single('a')]);
        let (start, end) = (a.start, a.end);
        let starred = b.star(a);
        assert_eq!(starred.start, start);
        assert_eq!(starred.end, end);

        let nfa = b.finish(starred.start, starred.end);
        let skip = transitions_of(&nfa, start)
            .into_iter()
            .any(|t| matches!(t, NfaTransition::Epsilon { target } if *target == end));
        let loop_back = transitions_of(&nfa, end)
            .into_iter()
            .any(|t| matches!(t, NfaTransition::Epsilon { target } if *target == start));
        assert!(skip, "expected an epsilon edge skipping start -> end");
        assert!(loop_back, "expected an epsilon edge looping end -> start");
    }

    #[test]
    fn star_preserves_inner_fixups_instead_of_discarding_them() {
        let mut b = NfaBuilder::new();
        let a = b.from_ranges(vec![single('a')]);
        // `a` already carries one to_end fixup (its own literal
        // transition); star must add to that, not replace it.
        assert_eq!(a.to_end.len(), 1);
        let starred = b.star(a);
        assert_eq!(starred.to_end.len(), 2);
        assert_eq!(starred.to_start.len(), 1);
    }

    #[test]
    fn retarget_all_rewrites_handle_targets() {
        let mut b = NfaBuilder::new();
        let a = b.from_ranges(vec![single('a')]);
        let starred = b.star(a);
        let new_target = b.new_state();
        b.retarget_all(&starred.to_start, new_target);

        let nfa = b.finish(starred.start, new_target);
        let retargeted = transitions_of(&nfa, starred.end)
            .into_iter()
            .any(|t| matches!(t, NfaTransition::Epsilon { target } if *target == new_target));
        assert!(retargeted);
    }

    #[test]
    fn retargeting_survives_an_earlier_move_to_another_adjacency_list() {
        // Regression check for handle stability: fusing a's and bb's
        // start states relocates bb's literal transition into a's
        // adjacency list *before* the end-side fuse retargets it via
        // `to_end`. The handle must still resolve correctly afterward.
        let mut b = NfaBuilder::new();
        let a = b.from_ranges(vec![single('a')]);
        let bb = b.from_ranges(vec![single('b')]);
        let a_start = a.start;
        let a_end = a.end;

        let combined = b.alternate(a, bb);
        assert_eq!(combined.start, a_start);
        assert_eq!(combined.end, a_end);

        let nfa = b.finish(combined.start, combined.end);
        let targets: Vec<usize> = transitions_of(&nfa, a_start)
            .into_iter()
            .map(|t| match t {
                NfaTransition::Ranged { target, .. } => *target,
                NfaTransition::Epsilon { target } => *target,
            })
            .collect();
        assert_eq!(targets, vec![a_end, a_end]);
    }
}
