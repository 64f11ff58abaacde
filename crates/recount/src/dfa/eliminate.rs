//! State elimination: rebuilding a regular expression from a renumbered DFA.

use std::collections::BTreeMap;

use hashbrown::HashMap;

use super::Dfa;
use crate::{Error, re::Regex};

/// Memoized table of path expressions. The cache belongs to one `rebuild`
/// invocation and is dropped with it.
struct Eliminator<I> {
    labels: BTreeMap<(u32, u32), Vec<I>>,
    memo: HashMap<(u32, u32, u32), Regex<I>>,
}

impl<I: Clone + Ord> Eliminator<I> {
    /// The expression for paths from `i` to `j` whose intermediate states
    /// all lie in `{1..=k}`:
    ///
    /// `R(i,j,k) = R(i,j,k-1) | R(i,k,k-1) R(k,k,k-1)* R(k,j,k-1)`
    ///
    /// specialized when `i = k` or `j = k` to drop the redundant factor.
    fn path(&mut self, i: u32, j: u32, k: u32) -> Regex<I> {
        if let Some(re) = self.memo.get(&(i, j, k)) {
            return re.clone();
        }

        let re = if k == 0 {
            let mut alts: Vec<_> = self
                .labels
                .get(&(i, j))
                .into_iter()
                .flatten()
                .map(|l| Regex::Lit(l.clone()))
                .collect();
            if i == j {
                alts.push(Regex::Eps);
            }
            Regex::Alt(alts)
        } else if i != k && j != k {
            Regex::Alt(vec![
                self.path(i, j, k - 1),
                Regex::Cat(vec![
                    self.path(i, k, k - 1),
                    Regex::Star(self.path(k, k, k - 1).into()),
                    self.path(k, j, k - 1),
                ]),
            ])
        } else if i == k && j != k {
            Regex::Cat(vec![
                Regex::Star(self.path(i, i, k - 1).into()),
                self.path(i, j, k - 1),
            ])
        } else {
            Regex::Cat(vec![
                self.path(i, j, k - 1),
                Regex::Star(self.path(j, j, k - 1).into()),
            ])
        };

        // reducing as we go keeps memoized entries at the size of the
        // language structure instead of growing fourfold per level
        let re = re.reduce();
        self.memo.insert((i, j, k), re.clone());
        re
    }
}

/// Rebuilds a reduced regular expression recognizing exactly the language of
/// `dfa`, which must be renumbered to dense ids `1..=n` with start `1`
/// (see [`Dfa::atomize`]).
pub fn rebuild<I: Clone + Ord>(dfa: &Dfa<I, u32>) -> Result<Regex<I>, Error> {
    let n = u32::try_from(dfa.len()).map_err(|_| Error::IllFormedAutomaton(0))?;

    if *dfa.start() != 1 {
        return Err(Error::IllFormedAutomaton(*dfa.start()));
    }
    for id in 1..=n {
        if dfa.get(&id).is_none() {
            return Err(Error::IllFormedAutomaton(id));
        }
    }
    if let Some(&id) = dfa
        .edges()
        .map(|(_, _, to)| to)
        .chain(dfa.accept_states())
        .find(|id| **id < 1 || **id > n)
    {
        return Err(Error::IllFormedAutomaton(id));
    }

    let mut labels: BTreeMap<(u32, u32), Vec<I>> = BTreeMap::new();
    for (&from, sym, &to) in dfa.edges() {
        labels.entry((from, to)).or_default().push(sym.clone());
    }

    let mut el = Eliminator {
        labels,
        memo: HashMap::new(),
    };
    let alts = dfa
        .accept_states()
        .iter()
        .map(|&a| el.path(1, a, n))
        .collect();

    Ok(Regex::Alt(alts).reduce())
}

#[cfg(test)]
mod test {
    use super::rebuild;
    use crate::{Error, dfa::Dfa, re::Regex};

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
    fn rebuilt_regex_recognizes_the_same_language() {
        for pattern in ["(0|1)*1", "(00*1)*", "0*0*1*2*", "(1|22|333)*"] {
            let re = Regex::parse(pattern).unwrap();
            let (dfa, _) = re.compile().determinize().atomize();
            let rebuilt = rebuild(&dfa).unwrap();
            let (rebuilt_dfa, _) = rebuilt.compile().determinize().atomize();

            let alphabet: Vec<char> = "0123".chars().collect();
            for len in 0..=5 {
                for w in words(&alphabet, len) {
                    assert_eq!(
                        dfa.accepts(w.iter().copied()),
                        rebuilt_dfa.accepts(w.iter().copied()),
                        "{pattern} vs {rebuilt} disagree on {w:?}",
                    );
                }
            }
        }
    }

    #[test]
    fn sparse_ids_are_rejected() {
        // state 3 is named but never defined
        let dfa = Dfa::new(
            [
                (1_u32, [('a', 3_u32)].into_iter().collect()),
                (2, [('a', 1)].into_iter().collect()),
            ],
            1,
            [2],
        );
        assert!(matches!(rebuild(&dfa), Err(Error::IllFormedAutomaton(3))));
    }
}
