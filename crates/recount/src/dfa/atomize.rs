use std::hash::Hash;

use hashbrown::HashMap;

use super::Dfa;
use crate::free::Free;

struct Atomizer<N> {
    free: Free<u32>,
    used: HashMap<N, u32>,
}

impl<N: Eq + Hash> Atomizer<N> {
    fn get(&mut self, node: N) -> u32 {
        *self.used.entry(node).or_insert_with(|| self.free.fresh())
    }
}

impl<I: Ord, N: Eq + Hash + Ord> Dfa<I, N> {
    /// Renumbers nodes to dense ids `1..=n`, start state first. The returned
    /// map is the (bijective) renumbering; a node is accepting in the result
    /// exactly when its original was.
    #[must_use]
    pub fn atomize(self) -> (Dfa<I, u32>, HashMap<N, u32>) {
        let Self {
            states,
            start,
            accept,
        } = self;

        let mut az = Atomizer {
            free: Free::from(1),
            used: HashMap::new(),
        };

        let start = az.get(start);
        let states: Vec<_> = states
            .into_iter()
            .map(|(node, out)| {
                (
                    az.get(node),
                    out.into_iter().map(|(sym, to)| (sym, az.get(to))).collect(),
                )
            })
            .collect();
        let accept: Vec<_> = accept.into_iter().map(|node| az.get(node)).collect();

        (Dfa::new(states, start, accept), az.used)
    }
}

#[cfg(test)]
mod test {
    use crate::re::Regex;

    #[test]
    fn ids_are_dense_and_start_at_one() {
        let (dfa, map) = Regex::parse("(0|1)*1")
            .unwrap()
            .compile()
            .determinize()
            .atomize();

        let n = u32::try_from(dfa.len()).unwrap();
        assert_eq!(*dfa.start(), 1);
        assert_eq!(map.len(), dfa.len());
        for id in 1..=n {
            assert!(dfa.get(&id).is_some(), "missing state {id}");
        }
    }

    #[test]
    fn acceptance_survives_renumbering() {
        let dfa = Regex::parse("(00*1)*").unwrap().compile().determinize();
        let (atomized, _) = dfa.clone().atomize();

        for w in ["", "01", "001", "0101", "0", "10", "011"] {
            assert_eq!(dfa.accepts(w.chars()), atomized.accepts(w.chars()), "{w:?}");
        }
    }
}
