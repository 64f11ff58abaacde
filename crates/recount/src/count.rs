//! Exact word counts via power-series expansion of the generating function.

use std::collections::BTreeSet;

use crate::{Error, poly::Rational, re::Regex, transfer};

/// A regular language's counting pipeline, built once per regex: the
/// simplified generating function plus the machinery to read exact
/// coefficients off it.
#[derive(Debug, Clone)]
pub struct Enumerator {
    gf: Rational,
}

impl Enumerator {
    /// Builds the enumerator for `regex`, counting every token.
    ///
    /// # Errors
    /// See [`Enumerator::with_filter`].
    pub fn new(regex: &Regex<char>) -> Result<Self, Error> { Self::with_filter(regex, None) }

    /// Builds the enumerator for `regex`. When `filter` is given, only
    /// tokens inside it contribute to a word's counted length.
    ///
    /// # Errors
    /// [`Error::DegenerateRationalFunction`] when the generating function
    /// cannot be expanded at the origin (for instance a starred nullable
    /// subexpression, or a filter that leaves a starred subexpression
    /// weightless), and [`Error::NonCoprimeSimplification`] when rational
    /// simplification fails its own exactness check.
    pub fn with_filter(
        regex: &Regex<char>,
        filter: Option<&BTreeSet<char>>,
    ) -> Result<Self, Error> {
        let (p, q) = transfer::transfer(regex, filter).rationalize();
        let gf = Rational::simplify(&p, &q)?;

        // expandability at the origin; the zero numerator is exempt since
        // the function collapses to its overflow polynomial
        if !gf.top().is_zero() && gf.bottom().coeff(0) == 0.0 {
            return Err(Error::DegenerateRationalFunction);
        }

        tracing::debug!(
            overflow = gf.overflow().degree(),
            top = gf.top().degree(),
            bottom = gf.bottom().degree(),
            "simplified generating function",
        );
        Ok(Self { gf })
    }

    #[inline]
    pub fn generating_function(&self) -> &Rational { &self.gf }

    /// The raw (unrounded) series coefficient at `n`.
    ///
    /// With `p/(1 - q)` the normalized fraction (`q(0) = 0`), the degree-`n`
    /// coefficient of `p + pq + pq² + …` is accumulated over `n + 1` rounds
    /// of one polynomial multiplication each; every round is truncated at
    /// degree `n`, which is exact because `q` only shifts degrees upward.
    pub(crate) fn coefficient(&self, n: usize, use_overflow: bool) -> f64 {
        let deg = u32::try_from(n).unwrap_or(u32::MAX);
        let mut total = if use_overflow {
            self.gf.overflow().coeff(deg)
        } else {
            0.0
        };

        let top = self.gf.top();
        if top.is_zero() {
            return total;
        }

        let b0 = self.gf.bottom().coeff(0);
        let p = top.scale(1.0 / b0).truncate(deg);
        let mut q = self.gf.bottom().scale(-1.0 / b0);
        q.remove(0); // 1 - q(z) is the normalized denominator
        let q = q.truncate(deg);

        let mut pq = p; // p·qⁱ
        for _ in 0..=n {
            total += pq.coeff(deg);
            if pq.is_zero() {
                break;
            }
            pq = (&pq * &q).truncate(deg);
        }

        total
    }

    /// The number of words of (filtered) length `n`.
    #[must_use]
    pub fn exact(&self, n: usize) -> u64 {
        let count = self.coefficient(n, true).round().max(0.0);
        count as u64
    }

    /// An infinite iterator of counts for `n = 0, 1, 2, …`. Each call starts
    /// over from zero.
    #[must_use]
    pub fn coefficients(&self) -> Coefficients {
        Coefficients {
            counter: self.clone(),
            n: 0,
        }
    }
}

/// Infinite, restartable sequence of exact word counts.
#[derive(Debug, Clone)]
pub struct Coefficients {
    counter: Enumerator,
    n: usize,
}

impl Iterator for Coefficients {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let count = self.counter.exact(self.n);
        self.n += 1;
        Some(count)
    }
}
