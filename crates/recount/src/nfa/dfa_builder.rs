use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    rc::Rc,
};

use hashbrown::HashMap;

use super::{Nfa, StateId};
use crate::dfa::Dfa;

/// A determinized state: the sorted set of NFA states it stands for. Interned
/// so structural equality is cheap and each set is stored once.
pub type StateSet = Rc<BTreeSet<StateId>>;

/// Worklist subset construction.
///
/// Every discovered state-set is expanded exactly once, so the construction
/// reaches its fixed point in one pass and the resulting transition relation
/// is independent of discovery order. Closure and interning caches live on
/// the builder and die with it.
pub struct DfaBuilder<'a, I> {
    nfa: &'a Nfa<I>,
    closures: HashMap<StateId, StateSet>,
    interned: HashMap<BTreeSet<StateId>, StateSet>,
}

impl<'a, I: Clone + Ord> DfaBuilder<'a, I> {
    pub fn new(nfa: &'a Nfa<I>) -> Self {
        Self {
            nfa,
            closures: HashMap::new(),
            interned: HashMap::new(),
        }
    }

    fn intern(&mut self, set: BTreeSet<StateId>) -> StateSet {
        if let Some(rc) = self.interned.get(&set) {
            Rc::clone(rc)
        } else {
            let rc: StateSet = Rc::new(set);
            self.interned.insert((*rc).clone(), Rc::clone(&rc));
            rc
        }
    }

    fn closure(&mut self, state: StateId) -> StateSet {
        if let Some(c) = self.closures.get(&state) {
            return Rc::clone(c);
        }

        let set = self.nfa.closure([state]);
        let rc = self.intern(set);
        self.closures.insert(state, Rc::clone(&rc));
        rc
    }

    #[must_use]
    pub fn build(mut self) -> Dfa<I, StateSet> {
        let start = self.closure(self.nfa.start());

        let mut states: BTreeMap<StateSet, BTreeMap<I, StateSet>> = BTreeMap::new();
        let mut accept: BTreeSet<StateSet> = BTreeSet::new();
        let mut work: VecDeque<_> = [Rc::clone(&start)].into_iter().collect();

        while let Some(set) = work.pop_front() {
            if states.contains_key(&set) {
                continue;
            }

            // union of labeled successors over every member of the set
            let mut out: BTreeMap<I, BTreeSet<StateId>> = BTreeMap::new();
            for &state in set.iter() {
                for (sym, targets) in self.nfa.get(state).into_iter().flat_map(super::Node::edges) {
                    out.entry(sym.clone())
                        .or_default()
                        .extend(targets.iter().copied());
                }
            }

            let mut edges = BTreeMap::new();
            for (sym, targets) in out {
                let mut closed = BTreeSet::new();
                for target in targets {
                    closed.extend(self.closure(target).iter().copied());
                }

                let next = self.intern(closed);
                work.push_back(Rc::clone(&next));
                edges.insert(sym, next);
            }

            if set.contains(&self.nfa.accept()) {
                accept.insert(Rc::clone(&set));
            }
            states.insert(set, edges);
        }

        tracing::debug!(
            nfa_states = self.nfa.len(),
            dfa_states = states.len(),
            "determinized",
        );
        Dfa::new(states, start, accept)
    }
}
