//! Sparse polynomial arithmetic and rational-function simplification.
//!
//! Coefficients are `f64`; every operation renormalizes by dropping terms of
//! magnitude at most [`Poly::PRUNE`], so the zero polynomial is exactly the
//! empty term map and equality checks are meaningful.

use std::{collections::BTreeMap, fmt, ops};

use crate::Error;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Poly(BTreeMap<u32, f64>);

impl Poly {
    /// Coefficients at or below this magnitude are treated as zero.
    pub const PRUNE: f64 = 1e-10;

    #[inline]
    #[must_use]
    pub fn zero() -> Self { Self::default() }

    #[inline]
    #[must_use]
    pub fn constant(c: f64) -> Self { Self::term(0, c) }

    /// The formal variable `z`.
    #[inline]
    #[must_use]
    pub fn var() -> Self { Self::term(1, 1.0) }

    #[must_use]
    pub fn term(exp: u32, coeff: f64) -> Self { [(exp, coeff)].into_iter().collect() }

    fn prune(mut self) -> Self {
        self.0.retain(|_, c| c.abs() > Self::PRUNE);
        self
    }

    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool { self.0.is_empty() }

    #[inline]
    #[must_use]
    pub fn coeff(&self, exp: u32) -> f64 { self.0.get(&exp).copied().unwrap_or(0.0) }

    /// `(max exponent, its coefficient)`, with `(0, 0)` for the zero
    /// polynomial.
    #[must_use]
    pub fn leading_term(&self) -> (u32, f64) {
        self.0.last_key_value().map_or((0, 0.0), |(&e, &c)| (e, c))
    }

    #[inline]
    #[must_use]
    pub fn degree(&self) -> u32 { self.leading_term().0 }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.0.iter().map(|(&e, &c)| (e, c))
    }

    #[must_use]
    pub fn scale(&self, by: f64) -> Self { self.iter().map(|(e, c)| (e, c * by)).collect() }

    fn mul_term(&self, exp: u32, coeff: f64) -> Self {
        self.iter().map(|(e, c)| (e + exp, c * coeff)).collect()
    }

    pub(crate) fn truncate(mut self, deg: u32) -> Self {
        self.0.split_off(&(deg + 1));
        self
    }

    pub(crate) fn remove(&mut self, exp: u32) { self.0.remove(&exp); }

    #[must_use]
    pub fn eval(&self, z: f64) -> f64 {
        self.iter()
            .map(|(e, c)| c * z.powi(i32::try_from(e).unwrap_or(i32::MAX)))
            .sum()
    }

    /// Coefficients `0..=degree` as a dense vector.
    #[must_use]
    pub fn dense(&self) -> Vec<f64> {
        (0..=self.degree()).map(|e| self.coeff(e)).collect()
    }

    /// Long division: `(quotient, remainder)` with
    /// `self = div·quotient + remainder` and `deg(remainder) < deg(div)`.
    ///
    /// The divisor must not be the zero polynomial.
    #[must_use]
    pub fn div_rem(&self, div: &Self) -> (Self, Self) {
        assert!(!div.is_zero(), "polynomial division by zero");

        let (div_deg, div_lead) = div.leading_term();
        let mut quotient = BTreeMap::new();
        let mut rem = self.clone();

        while !rem.is_zero() {
            let (deg, lead) = rem.leading_term();
            if deg < div_deg {
                break;
            }

            let exp = deg - div_deg;
            let coeff = lead / div_lead;
            quotient.insert(exp, coeff);
            rem = &rem - &div.mul_term(exp, coeff);
            // the leading terms cancel by construction; make that exact
            rem.remove(deg);
        }

        (Self(quotient).prune(), rem)
    }

    /// Euclidean greatest common divisor (not normalized to be monic).
    #[must_use]
    pub fn gcd(&self, other: &Self) -> Self {
        let mut p = self.clone().prune();
        let mut q = other.clone().prune();

        while !q.is_zero() {
            let (_, rem) = p.div_rem(&q);
            p = q;
            q = rem;
        }

        p
    }
}

impl FromIterator<(u32, f64)> for Poly {
    fn from_iter<T: IntoIterator<Item = (u32, f64)>>(it: T) -> Self {
        let mut map = BTreeMap::new();
        for (e, c) in it {
            *map.entry(e).or_insert(0.0) += c;
        }
        Self(map).prune()
    }
}

impl ops::Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: Self) -> Poly { self.iter().chain(rhs.iter()).collect() }
}

impl ops::Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: Self) -> Poly {
        self.iter().chain(rhs.iter().map(|(e, c)| (e, -c))).collect()
    }
}

impl ops::Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly { self.scale(-1.0) }
}

impl ops::Mul for &Poly {
    type Output = Poly;

    fn mul(self, rhs: Self) -> Poly {
        self.iter()
            .flat_map(|(e1, c1)| rhs.iter().map(move |(e2, c2)| (e1 + e2, c1 * c2)))
            .collect()
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }

        for (i, (e, c)) in self.iter().enumerate() {
            if i != 0 {
                f.write_str(" + ")?;
            }
            match e {
                0 => write!(f, "{c}")?,
                _ => {
                    if (c - 1.0).abs() > Self::PRUNE {
                        write!(f, "{c}")?;
                    }
                    if e == 1 {
                        f.write_str("z")?;
                    } else {
                        write!(f, "z^{e}")?;
                    }
                },
            }
        }

        Ok(())
    }
}

/// A rational function split as `overflow(z) + top(z)/bottom(z)` with `top`
/// and `bottom` coprime. The overflow part is the polynomial quotient, a
/// finite low-order correction that only contributes at small coefficient
/// indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Rational {
    overflow: Poly,
    top: Poly,
    bottom: Poly,
}

impl Rational {
    /// Splits `p / q`, dividing out the polynomial part and the common
    /// factor of the remainder and `q`.
    ///
    /// # Errors
    /// [`Error::DegenerateRationalFunction`] when `q` is the zero
    /// polynomial, and [`Error::NonCoprimeSimplification`] when dividing out
    /// the GCD leaves a residue; the latter indicates the algebra itself
    /// went wrong and is never silently approximated.
    pub fn simplify(p: &Poly, q: &Poly) -> Result<Self, Error> {
        if q.is_zero() {
            return Err(Error::DegenerateRationalFunction);
        }

        let (overflow, remainder) = p.div_rem(q);
        let g = remainder.gcd(q);
        let (top, top_rem) = remainder.div_rem(&g);
        let (bottom, bottom_rem) = q.div_rem(&g);

        if !top_rem.is_zero() {
            return Err(Error::NonCoprimeSimplification(top_rem));
        }
        if !bottom_rem.is_zero() {
            return Err(Error::NonCoprimeSimplification(bottom_rem));
        }

        Ok(Self {
            overflow,
            top,
            bottom,
        })
    }

    #[inline]
    pub fn overflow(&self) -> &Poly { &self.overflow }

    #[inline]
    pub fn top(&self) -> &Poly { &self.top }

    #[inline]
    pub fn bottom(&self) -> &Poly { &self.bottom }

    /// Evaluates `overflow(z) + top(z)/bottom(z)`.
    #[must_use]
    pub fn eval(&self, z: f64) -> f64 {
        self.overflow.eval(z) + self.top.eval(z) / self.bottom.eval(z)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.top.is_zero() {
            return write!(f, "{}", self.overflow);
        }
        if !self.overflow.is_zero() {
            write!(f, "{} + ", self.overflow)?;
        }
        write!(f, "({}) / ({})", self.top, self.bottom)
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::{Poly, Rational};

    fn poly(terms: &[(u32, f64)]) -> Poly { terms.iter().copied().collect() }

    prop_compose! {
        fn sparse_poly(max_deg: u32)(
            terms in prop::collection::vec((0..=max_deg, -4_i8..=4), 0..=4),
        ) -> Poly {
            terms.into_iter().map(|(e, c)| (e, f64::from(c))).collect()
        }
    }

    #[test]
    fn canonical_form_drops_dust() {
        let p = poly(&[(0, 1.0), (3, 1e-12)]);
        assert_eq!(p, Poly::constant(1.0));
        assert!(poly(&[(2, 1.0), (2, -1.0)]).is_zero());
    }

    #[test]
    fn leading_term_of_zero() {
        assert_eq!(Poly::zero().leading_term(), (0, 0.0));
    }

    #[test]
    fn division_by_larger_degree_is_trivial() {
        let p = Poly::constant(1.0);
        let q = poly(&[(0, 1.0), (1, -1.0)]);
        let (quot, rem) = p.div_rem(&q);
        assert!(quot.is_zero());
        assert_eq!(rem, p);
    }

    #[test]
    fn textbook_division() {
        // (z^2 - 1) / (z - 1) = z + 1
        let p = poly(&[(2, 1.0), (0, -1.0)]);
        let q = poly(&[(1, 1.0), (0, -1.0)]);
        let (quot, rem) = p.div_rem(&q);
        assert_eq!(quot, poly(&[(1, 1.0), (0, 1.0)]));
        assert!(rem.is_zero());
    }

    #[test]
    fn simplify_cancels_common_factors() {
        // (z^2 - 1) / (z^2 - 2z + 1) = (z + 1) / (z - 1)
        let p = poly(&[(2, 1.0), (0, -1.0)]);
        let q = poly(&[(2, 1.0), (1, -2.0), (0, 1.0)]);
        let r = Rational::simplify(&p, &q).unwrap();

        assert!(r.overflow().is_zero());
        assert_eq!(r.top().degree(), 1);
        assert_eq!(r.bottom().degree(), 1);
        for z in [0.0, 0.5, 2.0, -3.0] {
            let expect = (z + 1.0) / (z - 1.0);
            assert!((r.eval(z) - expect).abs() < 1e-9, "at z = {z}");
        }
    }

    proptest! {
        #[test]
        fn division_identity(p in sparse_poly(6), q in sparse_poly(4)) {
            prop_assume!(!q.is_zero());
            let (quot, rem) = p.div_rem(&q);

            if !rem.is_zero() {
                prop_assert!(rem.degree() < q.degree());
            }
            let back = &(&quot * &q) + &rem;
            let diff = &back - &p;
            prop_assert!(
                diff.iter().all(|(_, c)| c.abs() < 1e-6),
                "{quot} * {q} + {rem} != {p}",
            );
        }

        #[test]
        fn gcd_divides_both(p in sparse_poly(5), q in sparse_poly(5)) {
            prop_assume!(!p.is_zero() && !q.is_zero());
            let g = p.gcd(&q);
            prop_assume!(!g.is_zero());

            let (_, rp) = p.div_rem(&g);
            let (_, rq) = q.div_rem(&g);
            prop_assert!(rp.iter().all(|(_, c)| c.abs() < 1e-6), "gcd {g} vs {p}");
            prop_assert!(rq.iter().all(|(_, c)| c.abs() < 1e-6), "gcd {g} vs {q}");
        }

        #[test]
        fn simplify_preserves_the_function(p in sparse_poly(5), q in sparse_poly(3)) {
            prop_assume!(!q.is_zero());
            let Ok(r) = Rational::simplify(&p, &q) else {
                // numerically non-coprime splits are reported, not fudged
                return Ok(());
            };

            for z in [0.3, 0.7, 1.9, -1.3] {
                if q.eval(z).abs() < 1e-3 || r.bottom().eval(z).abs() < 1e-3 {
                    continue;
                }
                let expect = p.eval(z) / q.eval(z);
                prop_assert!(
                    (r.eval(z) - expect).abs() < 1e-5 * (1.0 + expect.abs()),
                    "at z = {z}: {} vs {expect}",
                    r.eval(z),
                );
            }
        }
    }
}
