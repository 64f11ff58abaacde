use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::dfa::Dfa;

mod dfa_builder;

pub use dfa_builder::StateSet;

pub type StateId = u64;

/// One NFA state: epsilon successors plus labeled successors.
#[derive(Debug, Clone)]
pub struct Node<I> {
    nil: BTreeSet<StateId>,
    map: BTreeMap<I, BTreeSet<StateId>>,
}

impl<I> Default for Node<I> {
    fn default() -> Self {
        Self {
            nil: BTreeSet::new(),
            map: BTreeMap::new(),
        }
    }
}

impl<I> Node<I> {
    #[inline]
    pub fn nil_edges(&self) -> &BTreeSet<StateId> { &self.nil }

    #[inline]
    pub fn edges(&self) -> impl Iterator<Item = (&I, &BTreeSet<StateId>)> { self.map.iter() }

    #[inline]
    pub(crate) fn insert_nil(&mut self, to: StateId) -> bool { self.nil.insert(to) }
}

impl<I: Ord> Node<I> {
    #[inline]
    pub(crate) fn insert_edge(&mut self, by: I, to: StateId) -> bool {
        self.map.entry(by).or_default().insert(to)
    }
}

/// Nondeterministic automaton with epsilon edges and a single accept state.
#[derive(Debug, Clone)]
pub struct Nfa<I> {
    nodes: BTreeMap<StateId, Node<I>>,
    start: StateId,
    accept: StateId,
}

impl<I: Ord> Nfa<I> {
    pub(crate) fn from_parts(
        nodes: BTreeMap<StateId, Node<I>>,
        start: StateId,
        accept: StateId,
    ) -> Self {
        debug_assert!(nodes.contains_key(&start) && nodes.contains_key(&accept));
        Self {
            nodes,
            start,
            accept,
        }
    }

    #[inline]
    pub fn start(&self) -> StateId { self.start }

    #[inline]
    pub fn accept(&self) -> StateId { self.accept }

    #[inline]
    pub fn len(&self) -> usize { self.nodes.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    #[inline]
    pub fn get(&self, node: StateId) -> Option<&Node<I>> { self.nodes.get(&node) }

    /// The set of states reachable from `seed` through epsilon edges alone,
    /// including `seed` itself.
    pub fn closure<It: IntoIterator<Item = StateId>>(&self, seed: It) -> BTreeSet<StateId> {
        let mut out = BTreeSet::new();
        let mut work: VecDeque<_> = seed.into_iter().collect();

        while let Some(state) = work.pop_front() {
            if out.insert(state) {
                if let Some(node) = self.nodes.get(&state) {
                    work.extend(node.nil.iter().copied());
                }
            }
        }

        out
    }

    /// Runs the automaton over `input` by stepping closure sets.
    pub fn accepts<It: IntoIterator<Item = I>>(&self, input: It) -> bool {
        let mut cur = self.closure([self.start]);

        for sym in input {
            let mut next = BTreeSet::new();
            for state in &cur {
                if let Some(targets) = self.nodes.get(state).and_then(|n| n.map.get(&sym)) {
                    next.extend(targets.iter().copied());
                }
            }

            cur = self.closure(next);
            if cur.is_empty() {
                return false;
            }
        }

        cur.contains(&self.accept)
    }
}

impl<I: Clone + Ord> Nfa<I> {
    /// Subset construction; see [`dfa_builder::DfaBuilder`].
    #[inline]
    #[must_use]
    pub fn determinize(&self) -> Dfa<I, StateSet> { dfa_builder::DfaBuilder::new(self).build() }
}

#[cfg(test)]
mod test {
    use crate::re::Regex;

    fn words(alphabet: &[char], len: usize) -> Vec<Vec<char>> {
        let mut out = vec![Vec::new()];
        for _ in 0..len {
            out = out
                .into_iter()
                .flat_map(|w| {
                    alphabet.iter().map(move |&c| {
                        let mut w = w.clone();
                        w.push(c);
                        w
                    })
                })
                .collect();
        }
        out
    }

    #[test]
    fn literal_runs() {
        let nfa = Regex::parse("(1|22|333)*").unwrap().compile();

        assert!(nfa.accepts("".chars()));
        assert!(nfa.accepts("1".chars()));
        assert!(nfa.accepts("221333".chars()));
        assert!(nfa.accepts("3331".chars()));
        assert!(!nfa.accepts("2".chars()));
        assert!(!nfa.accepts("23".chars()));
    }

    #[test]
    fn empty_language_accepts_nothing() {
        let nfa = Regex::<char>::BOTTOM.compile();
        assert!(!nfa.accepts("".chars()));
        assert!(!nfa.accepts("0".chars()));
    }

    #[test]
    fn determinization_preserves_the_language() {
        for pattern in ["(1|22|333)*", "(00*1)*", "0*0*1*2*", "%|(01)*"] {
            let nfa = Regex::parse(pattern).unwrap().compile();
            let dfa = nfa.determinize();
            let alphabet: Vec<char> = "0123".chars().collect();

            for len in 0..=5 {
                for w in words(&alphabet, len) {
                    assert_eq!(
                        nfa.accepts(w.iter().copied()),
                        dfa.accepts(w.iter().copied()),
                        "{pattern} disagrees on {w:?}",
                    );
                }
            }
        }
    }
}
