//! Translation of the regex algebra into rational-function algebra.

use std::collections::BTreeSet;

use crate::{poly::Poly, re::Regex};

/// Rational expression over the formal length variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Add(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Num(f64),
    Var,
}

/// Maps a regular expression to its counting generating function:
/// alternation becomes a sum, concatenation a product, star the geometric
/// series `1/(1 - e)`, the empty word the unit, and each token the formal
/// variable, or the unit when a `filter` is given and the token falls
/// outside it (filtered-out symbols carry no length weight).
pub fn transfer<L: Ord>(regex: &Regex<L>, filter: Option<&BTreeSet<L>>) -> Expr {
    match regex {
        Regex::Alt(v) => v
            .iter()
            .map(|sub| transfer(sub, filter))
            .reduce(|a, b| Expr::Add(a.into(), b.into()))
            .unwrap_or(Expr::Num(0.0)),
        Regex::Cat(v) => v
            .iter()
            .map(|sub| transfer(sub, filter))
            .reduce(|a, b| Expr::Mul(a.into(), b.into()))
            .unwrap_or(Expr::Num(1.0)),
        Regex::Star(r) => Expr::Div(
            Expr::Num(1.0).into(),
            Expr::Add(
                Expr::Num(1.0).into(),
                Expr::Neg(transfer(r, filter).into()).into(),
            )
            .into(),
        ),
        Regex::Lit(l) => {
            if filter.is_none_or(|f| f.contains(l)) {
                Expr::Var
            } else {
                Expr::Num(1.0)
            }
        },
        Regex::Eps => Expr::Num(1.0),
    }
}

impl Expr {
    /// Combines fractions bottom-up into a single `(numerator, denominator)`
    /// pair. No cancellation happens here; see
    /// [`Rational::simplify`](crate::poly::Rational::simplify).
    #[must_use]
    pub fn rationalize(&self) -> (Poly, Poly) {
        match self {
            Self::Add(a, b) => {
                let (n1, d1) = a.rationalize();
                let (n2, d2) = b.rationalize();
                (&(&n1 * &d2) + &(&n2 * &d1), &d1 * &d2)
            },
            Self::Mul(a, b) => {
                let (n1, d1) = a.rationalize();
                let (n2, d2) = b.rationalize();
                (&n1 * &n2, &d1 * &d2)
            },
            Self::Div(a, b) => {
                let (n1, d1) = a.rationalize();
                let (n2, d2) = b.rationalize();
                (&n1 * &d2, &d1 * &n2)
            },
            Self::Neg(e) => {
                let (n, d) = e.rationalize();
                (-&n, d)
            },
            Self::Num(k) => (Poly::constant(*k), Poly::constant(1.0)),
            Self::Var => (Poly::var(), Poly::constant(1.0)),
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use super::transfer;
    use crate::{poly::Poly, re::Regex};

    fn poly(terms: &[(u32, f64)]) -> Poly { terms.iter().copied().collect() }

    #[test]
    fn binary_words_make_a_geometric_series() {
        let re = Regex::parse("(0|1)*").unwrap();
        let (top, bottom) = transfer(&re, None).rationalize();

        assert_eq!(top, Poly::constant(1.0));
        assert_eq!(bottom, poly(&[(0, 1.0), (1, -2.0)]));
    }

    #[test]
    fn empty_language_is_the_zero_function() {
        let (top, bottom) = transfer(&Regex::<char>::BOTTOM, None).rationalize();
        assert!(top.is_zero());
        assert_eq!(bottom, Poly::constant(1.0));
    }

    #[test]
    fn filtered_tokens_carry_no_weight() {
        let re = Regex::parse("(01)*").unwrap();
        let filter: BTreeSet<char> = ['0'].into_iter().collect();
        let (top, bottom) = transfer(&re, Some(&filter)).rationalize();

        // counting only the zeroes, (01)* behaves like 0*
        assert_eq!(top, Poly::constant(1.0));
        assert_eq!(bottom, poly(&[(0, 1.0), (1, -1.0)]));
    }
}
