use std::collections::BTreeMap;

use super::Regex;
use crate::{
    free::Free,
    nfa::{Nfa, Node, StateId},
};

/// Thompson construction. Fresh state ids come from the builder's own
/// allocator, so sub-automata built within one compilation own disjoint
/// state ranges and composition only ever adds states and edges.
pub struct NfaBuilder<I> {
    nodes: BTreeMap<StateId, Node<I>>,
    free: Free<StateId>,
    start: StateId,
    accept: StateId,
}

impl<I: Clone + Ord> NfaBuilder<I> {
    pub fn build(regex: &Regex<I>) -> Self {
        let mut me = Self {
            nodes: BTreeMap::new(),
            free: Free::default(),
            start: 0,
            accept: 0,
        };
        let (start, accept) = me.build_fragment(regex);
        me.start = start;
        me.accept = accept;
        me
    }

    #[inline]
    fn fresh_node(&mut self) -> StateId {
        let fresh = self.free.fresh();
        assert!(self.nodes.insert(fresh, Node::default()).is_none());
        fresh
    }

    fn connect(&mut self, from: StateId, to: StateId, by: Option<I>) {
        let node = self.nodes.get_mut(&from).unwrap_or_else(|| unreachable!());
        match by {
            Some(sym) => {
                node.insert_edge(sym, to);
            },
            None => {
                node.insert_nil(to);
            },
        }
    }

    /// Returns the `(start, accept)` pair of the compiled sub-automaton.
    fn build_fragment(&mut self, regex: &Regex<I>) -> (StateId, StateId) {
        match regex {
            Regex::Alt(v) => {
                let head = self.fresh_node();
                let tail = self.fresh_node();
                for sub in v {
                    let (s, t) = self.build_fragment(sub);
                    self.connect(head, s, None);
                    self.connect(t, tail, None);
                }
                (head, tail)
            },
            Regex::Cat(v) => {
                let mut bounds = None;
                for sub in v {
                    let (s, t) = self.build_fragment(sub);
                    bounds = Some(match bounds {
                        None => (s, t),
                        Some((head, prev)) => {
                            self.connect(prev, s, None);
                            (head, t)
                        },
                    });
                }
                bounds.unwrap_or_else(|| self.build_fragment(&Regex::Eps))
            },
            Regex::Star(r) => {
                let head = self.fresh_node();
                let tail = self.fresh_node();
                let (s, t) = self.build_fragment(r);
                self.connect(head, s, None);
                self.connect(t, tail, None);
                self.connect(t, s, None);
                self.connect(head, tail, None);
                (head, tail)
            },
            Regex::Lit(l) => {
                let head = self.fresh_node();
                let tail = self.fresh_node();
                self.connect(head, tail, Some(l.clone()));
                (head, tail)
            },
            // a single state standing for the empty word
            Regex::Eps => {
                let here = self.fresh_node();
                (here, here)
            },
        }
    }

    #[inline]
    #[must_use]
    pub fn finish(self) -> Nfa<I> {
        tracing::trace!(states = self.nodes.len(), "compiled NFA");
        Nfa::from_parts(self.nodes, self.start, self.accept)
    }
}
