//! Closed forms straight from the automaton: eigenvalues of the DFA's
//! transition matrix play the role the denominator roots play in
//! [`crate::closed_form`], with counts read off matrix powers instead of the
//! power series.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

use crate::{
    Error,
    closed_form::{choose, cluster, collate},
    re::Regex,
};

/// A spectral closed form: `n ↦ |Σ cᵢ · C(n+kᵢ-1, kᵢ-1) · rᵢ^(n-kᵢ)|`, with
/// per-index corrections for the first few values, where the asymptotic
/// series has not yet taken over.
#[derive(Debug, Clone)]
pub struct SpectralForm {
    clusters: Vec<(Complex64, usize)>,
    terms: Vec<(Complex64, usize)>,
    coefficients: Vec<Complex64>,
    deltas: Vec<f64>,
}

fn basis_term(root: Complex64, k: usize, n: usize) -> Complex64 {
    root.powi(n as i32 - k as i32) * choose(n, k)
}

impl SpectralForm {
    fn series(&self, n: usize) -> f64 {
        let sum: Complex64 = self
            .terms
            .iter()
            .zip(&self.coefficients)
            .map(|(&(root, k), &c)| c * basis_term(root, k, n))
            .sum();
        sum.re
    }

    /// Evaluates the closed form at `n`.
    #[must_use]
    pub fn eval(&self, n: usize) -> f64 {
        let mut value = self.series(n);
        if let Some(delta) = self.deltas.get(n) {
            value += delta;
        }
        value.abs()
    }

    /// Eigenvalue representatives with their multiplicities.
    #[inline]
    pub fn clusters(&self) -> &[(Complex64, usize)] { &self.clusters }

    /// `(eigenvalue, power)` pairs, one per basis function, sorted.
    #[inline]
    pub fn terms(&self) -> &[(Complex64, usize)] { &self.terms }

    /// Solved weights, paired 1:1 with [`SpectralForm::terms`].
    #[inline]
    pub fn coefficients(&self) -> &[Complex64] { &self.coefficients }

    /// Corrections applied below the training window.
    #[inline]
    pub fn deltas(&self) -> &[f64] { &self.deltas }
}

/// Derives a closed form for `regex`'s counting sequence from the spectrum
/// of its DFA's transition matrix.
///
/// Near-zero eigenvalues (magnitude at most `threshold²`) contribute nothing
/// asymptotically and are dropped; what they would have covered is absorbed
/// by the per-index corrections.
///
/// # Errors
/// [`Error::UnstableClosedForm`] when the eigenvalue basis produces a
/// singular system.
pub fn matrix_method(regex: &Regex<char>, threshold: f64) -> Result<SpectralForm, Error> {
    let (dfa, _) = regex.compile().determinize().atomize();
    let states = dfa.len();

    let mut matrix = DMatrix::<f64>::zeros(states, states);
    for (&from, _, &to) in dfa.edges() {
        matrix[(to as usize - 1, from as usize - 1)] += 1.0;
    }

    let eigenvalues: Vec<Complex64> = matrix.complex_eigenvalues().iter().copied().collect();

    let complex = matrix.map(|v| Complex64::new(v, 0.0));
    let residual = |z: Complex64| {
        (&complex - DMatrix::from_diagonal_element(states, states, z))
            .determinant()
            .norm()
    };
    let clusters: Vec<_> = cluster(&eigenvalues, threshold, residual)
        .into_iter()
        .filter(|(root, _)| root.norm() > threshold * threshold)
        .collect();
    let terms = collate(&clusters);
    let degree = terms.len();

    tracing::debug!(states, degree, "clustered transition-matrix spectrum");

    // exact counts e_accept · Aⁿ · e_start for the whole training range
    let accept = DVector::<f64>::from_fn(states, |i, _| {
        f64::from(u8::from(dfa.is_accepting(&(i as u32 + 1))))
    });
    let mut power = DVector::<f64>::zeros(states);
    power[0] = 1.0;
    let counts: Vec<f64> = (0..states + degree)
        .map(|_| {
            let count = accept.dot(&power);
            power = &matrix * &power;
            count
        })
        .collect();

    let coefficients: Vec<Complex64> = if degree == 0 {
        Vec::new()
    } else {
        let basis = DMatrix::from_fn(degree, degree, |row, col| {
            let (root, k) = terms[col];
            basis_term(root, k, states + row)
        });
        let target = DVector::from_fn(degree, |row, _| Complex64::new(counts[states + row], 0.0));

        basis
            .lu()
            .solve(&target)
            .ok_or(Error::UnstableClosedForm)?
            .iter()
            .copied()
            .collect()
    };

    let mut form = SpectralForm {
        clusters,
        terms,
        coefficients,
        deltas: Vec::new(),
    };
    form.deltas = (0..states).map(|n| counts[n] - form.series(n)).collect();
    Ok(form)
}

#[cfg(test)]
mod test {
    use super::matrix_method;
    use crate::{count::Enumerator, re::Regex};

    fn assert_agrees(pattern: &str, up_to: usize) {
        let re = Regex::parse(pattern).unwrap();
        let form = matrix_method(&re, 1e-3).unwrap();
        let counter = Enumerator::new(&re).unwrap();

        for (n, expect) in counter.coefficients().take(up_to).enumerate() {
            let evaluated = form.eval(n);
            assert!(
                (evaluated - expect as f64).abs() < 1e-3 * (1.0 + expect as f64),
                "{pattern} at {n}: {evaluated} vs {expect}",
            );
        }
    }

    #[test]
    fn geometric_growth() { assert_agrees("(0|1)*", 18); }

    #[test]
    fn separated_runs() { assert_agrees("(00*1)*", 18); }

    #[test]
    fn finite_language_is_all_deltas() {
        let re = Regex::parse("0|11").unwrap();
        let form = matrix_method(&re, 1e-3).unwrap();

        assert!(form.terms().is_empty(), "nilpotent spectrum leaves no basis");
        assert_eq!(form.eval(1), 1.0);
        assert_eq!(form.eval(2), 1.0);
        assert_eq!(form.eval(5), 0.0);
    }

    #[test]
    fn compositions() { assert_agrees("(01*)*", 14); }
}
