use std::collections::{BTreeMap, BTreeSet};

mod atomize;
pub mod eliminate;

/// Deterministic automaton over nodes of type `N`.
///
/// Determinism is structural: each node maps every symbol to at most one
/// successor.
#[derive(Debug, Clone)]
pub struct Dfa<I, N> {
    states: BTreeMap<N, BTreeMap<I, N>>,
    start: N,
    accept: BTreeSet<N>,
}

impl<I: Ord, N: Ord> Dfa<I, N> {
    pub fn new(
        states: impl IntoIterator<Item = (N, BTreeMap<I, N>)>,
        start: N,
        accept: impl IntoIterator<Item = N>,
    ) -> Self {
        Self {
            states: states.into_iter().collect(),
            start,
            accept: accept.into_iter().collect(),
        }
    }

    #[inline]
    pub fn start(&self) -> &N { &self.start }

    #[inline]
    pub fn accept_states(&self) -> &BTreeSet<N> { &self.accept }

    #[inline]
    pub fn len(&self) -> usize { self.states.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.states.is_empty() }

    #[inline]
    pub fn get(&self, node: &N) -> Option<&BTreeMap<I, N>> { self.states.get(node) }

    #[inline]
    pub fn is_accepting(&self, node: &N) -> bool { self.accept.contains(node) }

    pub fn edges(&self) -> impl Iterator<Item = (&N, &I, &N)> {
        self.states
            .iter()
            .flat_map(|(from, out)| out.iter().map(move |(sym, to)| (from, sym, to)))
    }

    /// Walks the automaton; rejects on a missing transition.
    pub fn accepts<It: IntoIterator<Item = I>>(&self, input: It) -> bool {
        let mut cur = &self.start;

        for sym in input {
            match self.states.get(cur).and_then(|out| out.get(&sym)) {
                Some(next) => cur = next,
                None => return false,
            }
        }

        self.accept.contains(cur)
    }
}
