use std::{collections::BTreeSet, fmt};

use crate::nfa::Nfa;

mod nfa_builder;
pub mod syntax;

/// Regular expression over literals of type `L`.
///
/// `Alt(vec![])` denotes the empty language and `Cat(vec![])` the empty
/// word, so every regular language has a representative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regex<L> {
    Alt(Vec<Regex<L>>),
    Cat(Vec<Regex<L>>),
    Star(Box<Regex<L>>),
    Lit(L),
    Eps,
}

impl<L> Regex<L> {
    pub const BOTTOM: Regex<L> = Regex::Alt(Vec::new());

    #[inline]
    #[must_use]
    pub fn is_bottom(&self) -> bool { matches!(self, Self::Alt(v) if v.is_empty()) }
}

impl<L: Clone + Ord> Regex<L> {
    #[inline]
    #[must_use]
    pub fn compile(&self) -> Nfa<L> { nfa_builder::NfaBuilder::build(self).finish() }

    /// The set of literals occurring in the expression.
    #[must_use]
    pub fn alphabet(&self) -> BTreeSet<L> {
        fn walk<L: Clone + Ord>(re: &Regex<L>, out: &mut BTreeSet<L>) {
            match re {
                Regex::Alt(v) | Regex::Cat(v) => v.iter().for_each(|r| walk(r, out)),
                Regex::Star(r) => walk(r, out),
                Regex::Lit(l) => {
                    out.insert(l.clone());
                },
                Regex::Eps => (),
            }
        }

        let mut out = BTreeSet::new();
        walk(self, &mut out);
        out
    }
}

impl<L: PartialEq> Regex<L> {
    /// Normalizes away algebraic redundancies without changing the language:
    /// unions and concatenations are flattened, empty-language branches and
    /// duplicate alternates dropped, `%.e` collapses to `e`, `e**` to `e*`,
    /// and anything recognizing only the empty word to `%`.
    ///
    /// Idempotent: `x.reduce().reduce() == x.reduce()`.
    #[must_use]
    pub fn reduce(self) -> Self {
        match self {
            Self::Alt(v) => {
                let mut out: Vec<Self> = Vec::new();
                let mut nullable = false;

                for sub in v {
                    match sub.reduce() {
                        Self::Eps => nullable = true,
                        Self::Alt(w) => {
                            for s in w {
                                if s == Self::Eps {
                                    nullable = true;
                                } else if !out.contains(&s) {
                                    out.push(s);
                                }
                            }
                        },
                        s => {
                            if !out.contains(&s) {
                                out.push(s);
                            }
                        },
                    }
                }

                if nullable {
                    out.push(Self::Eps);
                }

                if out.len() == 1 {
                    out.pop().unwrap_or_else(|| unreachable!())
                } else {
                    Self::Alt(out)
                }
            },
            Self::Cat(v) => {
                let mut out: Vec<Self> = Vec::new();

                for sub in v {
                    match sub.reduce() {
                        Self::Eps => (),
                        s if s.is_bottom() => return Self::BOTTOM,
                        Self::Cat(w) => out.extend(w),
                        s => out.push(s),
                    }
                }

                match out.len() {
                    0 => Self::Eps,
                    1 => out.pop().unwrap_or_else(|| unreachable!()),
                    _ => Self::Cat(out),
                }
            },
            Self::Star(r) => match r.reduce() {
                s if s.is_bottom() => Self::Eps,
                Self::Eps => Self::Eps,
                s @ Self::Star(_) => s,
                // (% | e)* = e*
                Self::Alt(w) if w.contains(&Self::Eps) => {
                    let w = w.into_iter().filter(|s| *s != Self::Eps).collect();
                    Self::Star(Box::new(Self::Alt(w))).reduce()
                },
                s => Self::Star(Box::new(s)),
            },
            s => s,
        }
    }
}

impl<L: fmt::Display> Regex<L> {
    fn is_atom(&self) -> bool { matches!(self, Self::Lit(_) | Self::Eps | Self::Star(_)) }

    fn fmt_grouped(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_atom() {
            write!(f, "{self}")
        } else {
            write!(f, "({self})")
        }
    }
}

impl<L: fmt::Display> fmt::Display for Regex<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alt(v) if v.is_empty() => f.write_str("∅"),
            Self::Alt(v) => {
                for (i, sub) in v.iter().enumerate() {
                    if i != 0 {
                        f.write_str("|")?;
                    }
                    write!(f, "{sub}")?;
                }
                Ok(())
            },
            Self::Cat(v) if v.is_empty() => f.write_str("%"),
            Self::Cat(v) => {
                for sub in v {
                    sub.fmt_grouped(f)?;
                }
                Ok(())
            },
            Self::Star(r) => {
                if matches!(**r, Self::Lit(_) | Self::Eps) {
                    write!(f, "{r}*")
                } else {
                    write!(f, "({r})*")
                }
            },
            Self::Lit(l) => write!(f, "{l}"),
            Self::Eps => f.write_str("%"),
        }
    }
}

#[cfg(any(test, feature = "proptest"))]
pub use prop::*;

#[cfg(any(test, feature = "proptest"))]
mod prop {
    use proptest::prelude::*;

    use super::Regex;

    pub fn re(
        depth: u32,
        tree_size: u32,
        branch_size: u32,
        chr: impl Strategy<Value = char> + 'static,
    ) -> impl Strategy<Value = Regex<char>> {
        let leaf = prop_oneof![Just(Regex::Eps), chr.prop_map(Regex::Lit)];
        leaf.prop_recursive(depth, tree_size, branch_size, move |s| {
            let size = 0..=(branch_size as usize);
            prop_oneof![
                prop::collection::vec(s.clone(), size.clone()).prop_map(Regex::Alt),
                prop::collection::vec(s.clone(), size).prop_map(Regex::Cat),
                s.prop_map(|r| Regex::Star(r.into())),
            ]
        })
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::Regex;

    fn lit(c: char) -> Regex<char> { Regex::Lit(c) }

    #[test]
    fn empty_union_reduces_to_bottom() {
        assert_eq!(Regex::<char>::BOTTOM.reduce(), Regex::BOTTOM);
        assert_eq!(
            Regex::Alt(vec![Regex::BOTTOM, Regex::BOTTOM]).reduce(),
            Regex::<char>::BOTTOM,
        );
    }

    #[test]
    fn nullable_only_reduces_to_epsilon() {
        assert_eq!(Regex::<char>::Star(Regex::Eps.into()).reduce(), Regex::Eps);
        assert_eq!(Regex::<char>::Star(Box::new(Regex::BOTTOM)).reduce(), Regex::Eps);
        assert_eq!(
            Regex::Alt(vec![Regex::Eps, Regex::Cat(vec![]), Regex::<char>::BOTTOM]).reduce(),
            Regex::Eps,
        );
    }

    #[test]
    fn unions_flatten_and_dedup() {
        let re = Regex::Alt(vec![
            Regex::Alt(vec![lit('a'), lit('b')]),
            lit('a'),
            Regex::BOTTOM,
        ]);
        assert_eq!(re.reduce(), Regex::Alt(vec![lit('a'), lit('b')]));
    }

    #[test]
    fn epsilon_units_drop_from_concatenation() {
        let re = Regex::Cat(vec![Regex::Eps, lit('a'), Regex::Cat(vec![]), lit('b')]);
        assert_eq!(re.reduce(), Regex::Cat(vec![lit('a'), lit('b')]));
    }

    #[test]
    fn star_collapses() {
        let re = Regex::Star(Box::new(Regex::Star(Box::new(lit('a')))));
        assert_eq!(re.reduce(), Regex::Star(Box::new(lit('a'))));

        let re = Regex::Star(Box::new(Regex::Alt(vec![Regex::Eps, lit('a')])));
        assert_eq!(re.reduce(), Regex::Star(Box::new(lit('a'))));
    }

    proptest! {
        #[test]
        fn reduce_is_idempotent(r in super::re(6, 48, 4, prop::char::range('0', '3'))) {
            let once = r.reduce();
            prop_assert_eq!(once.clone().reduce(), once);
        }
    }
}
