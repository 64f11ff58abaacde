//! Closed-form reconstruction of the coefficient sequence from the
//! denominator's roots.
//!
//! A root `r` of multiplicity `m` contributes the basis functions
//! `n ↦ C(n+k-1, k-1) · (-1)^k · r^(-n-k)` for `k = 1..=m`; solving a square
//! linear system against exact low-order coefficients recovers the weight of
//! each basis function.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

use crate::{Error, count::Enumerator, poly::Poly};

/// Best-effort recognizer of floats as exact values. Injected into
/// [`Enumerator::extract_with`] so root snapping does not depend on any
/// particular number-theoretic machinery.
pub trait Identify {
    /// Returns a value within `tol` of `x` that is exactly representable
    /// (for whatever notion of "exact" the implementation has), with
    /// integer parts bounded by `max_coeff`, or `None`.
    fn identify(&self, x: f64, tol: f64, max_coeff: i64) -> Option<f64>;
}

/// Default [`Identify`]: continued-fraction rationals `p/q` and quadratic
/// surds `±√(p/q)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Surd;

impl Identify for Surd {
    fn identify(&self, x: f64, tol: f64, max_coeff: i64) -> Option<f64> {
        nearest_rational(x, tol, max_coeff).or_else(|| {
            let sq = nearest_rational(x * x, tol, max_coeff)?;
            (sq >= 0.0)
                .then(|| x.signum() * sq.sqrt())
                .filter(|v| (v - x).abs() <= tol)
        })
    }
}

fn nearest_rational(x: f64, tol: f64, max_coeff: i64) -> Option<f64> {
    let mut a = x.floor();
    let mut frac = x - a;
    let (mut h0, mut k0) = (1_i64, 0_i64);
    let (mut h1, mut k1) = (a as i64, 1_i64);

    for _ in 0..32 {
        let v = h1 as f64 / k1 as f64;
        if (v - x).abs() <= tol {
            return (h1.abs() <= max_coeff && k1 <= max_coeff).then_some(v);
        }
        if frac.abs() < 1e-12 {
            return None;
        }

        let inv = frac.recip();
        a = inv.floor();
        frac = inv - a;
        if a > 1e6 {
            return None;
        }

        let (h2, k2) = (a as i64 * h1 + h0, a as i64 * k1 + k0);
        if h2.abs() > max_coeff || k2 > max_coeff {
            return None;
        }
        (h0, k0, h1, k1) = (h1, k1, h2, k2);
    }

    None
}

fn horner(dense: &[f64], z: Complex64) -> Complex64 {
    dense
        .iter()
        .rev()
        .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * z + c)
}

fn derivative(dense: &[f64]) -> Vec<f64> {
    dense
        .iter()
        .enumerate()
        .skip(1)
        .map(|(e, &c)| c * e as f64)
        .collect()
}

/// All complex roots, as eigenvalues of the companion matrix.
fn roots(dense: &[f64]) -> Vec<Complex64> {
    let deg = dense.len() - 1;
    if deg == 0 {
        return Vec::new();
    }

    let lead = dense[deg];
    let mut companion = DMatrix::<f64>::zeros(deg, deg);
    for i in 1..deg {
        companion[(i, i - 1)] = 1.0;
    }
    for i in 0..deg {
        companion[(i, deg - 1)] = -dense[i] / lead;
    }

    companion.complex_eigenvalues().iter().copied().collect()
}

/// Up to two Newton steps per root. Once the collective derivative norm is
/// small the roots are nearly stationary (or nearly multiple) and further
/// steps would refine round-off noise, so refinement stops.
fn newton(dense: &[f64], roots: &mut [Complex64]) {
    let deriv = derivative(dense);

    for _ in 0..2 {
        let norm: f64 = roots
            .iter()
            .map(|&r| horner(&deriv, r).norm_sqr())
            .sum::<f64>()
            .sqrt();
        if norm < 1e-5 {
            return;
        }

        for r in roots.iter_mut() {
            let slope = horner(&deriv, *r);
            if slope.norm() > 1e-12 {
                *r -= horner(dense, *r) / slope;
            }
        }
    }
}

/// Snaps each root toward a recognized exact value, keeping whichever of the
/// two has the smaller residual.
fn snap(dense: &[f64], roots: &mut [Complex64], ident: &dyn Identify) {
    for r in roots.iter_mut() {
        let re = ident.identify(r.re, 1e-4, 30).unwrap_or(r.re);
        let im = ident.identify(r.im, 1e-4, 30).unwrap_or(r.im);
        let cand = Complex64::new(re, im);

        let residual = horner(dense, cand).norm();
        if horner(dense, *r).norm() > residual || residual < 1e-10 {
            *r = cand;
        }
    }
}

/// Merges roots within `threshold` of each other; each cluster keeps the
/// representative with the smaller residual and its size as multiplicity.
pub(crate) fn cluster(
    roots: &[Complex64],
    threshold: f64,
    residual: impl Fn(Complex64) -> f64,
) -> Vec<(Complex64, usize)> {
    let mut clusters: Vec<(Complex64, usize)> = Vec::new();

    for &root in roots {
        if let Some((rep, count)) = clusters
            .iter_mut()
            .find(|(rep, _)| (*rep - root).norm() <= threshold)
        {
            if residual(root) < residual(*rep) {
                *rep = root;
            }
            *count += 1;
        } else {
            clusters.push((root, 1));
        }
    }

    clusters
}

/// Expands clusters to `(root, power)` terms, one per multiplicity level,
/// ordered by `(re, im, power)` for determinism.
pub(crate) fn collate(clusters: &[(Complex64, usize)]) -> Vec<(Complex64, usize)> {
    let mut terms: Vec<_> = clusters
        .iter()
        .flat_map(|&(root, mult)| (1..=mult).map(move |k| (root, k)))
        .collect();
    terms.sort_by(|a, b| {
        a.0.re
            .total_cmp(&b.0.re)
            .then(a.0.im.total_cmp(&b.0.im))
            .then(a.1.cmp(&b.1))
    });
    terms
}

/// `C(n + k - 1, k - 1)` as a float.
pub(crate) fn choose(n: usize, k: usize) -> f64 {
    (1..k).map(|i| (n + i) as f64 / i as f64).product()
}

fn basis_term(root: Complex64, k: usize, n: usize) -> Complex64 {
    let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
    let exp = -(n as i32) - (k as i32);
    root.powi(exp) * (choose(n, k) * sign)
}

/// A reconstructed closed form: per-term roots, powers and weights, plus the
/// overflow polynomial covering the pre-asymptotic indices.
#[derive(Debug, Clone)]
pub struct ClosedForm {
    clusters: Vec<(Complex64, usize)>,
    terms: Vec<(Complex64, usize)>,
    coefficients: Vec<Complex64>,
    denominator: Poly,
    overflow: Poly,
}

impl ClosedForm {
    /// Evaluates the closed form at `n`.
    #[must_use]
    pub fn eval(&self, n: usize) -> f64 {
        let sum: Complex64 = self
            .terms
            .iter()
            .zip(&self.coefficients)
            .map(|(&(root, k), &c)| c * basis_term(root, k, n))
            .sum();
        sum.norm() + self.overflow.coeff(u32::try_from(n).unwrap_or(u32::MAX))
    }

    /// Root representatives with their multiplicities.
    #[inline]
    pub fn clusters(&self) -> &[(Complex64, usize)] { &self.clusters }

    /// `(root, power)` pairs, one per basis function, sorted.
    #[inline]
    pub fn terms(&self) -> &[(Complex64, usize)] { &self.terms }

    /// Solved weights, paired 1:1 with [`ClosedForm::terms`].
    #[inline]
    pub fn coefficients(&self) -> &[Complex64] { &self.coefficients }

    #[inline]
    pub fn denominator(&self) -> &Poly { &self.denominator }

    #[inline]
    pub fn overflow(&self) -> &Poly { &self.overflow }
}

impl fmt::Display for ClosedForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;

        for (&(root, k), c) in self.terms.iter().zip(&self.coefficients) {
            if !first {
                f.write_str(" + ")?;
            }
            first = false;
            let sign = if k % 2 == 0 { "" } else { "-" };
            write!(f, "{sign}({c:.5})·C(n+{},{})·({root:.5})^(-n-{k})", k - 1, k - 1)?;
        }

        for (e, c) in self.overflow.iter() {
            if !first {
                f.write_str(" + ")?;
            }
            first = false;
            write!(f, "{c}·[n={e}]")?;
        }

        if first {
            f.write_str("0")?;
        }
        Ok(())
    }
}

impl Enumerator {
    /// Reconstructs a closed form with the default clustering threshold and
    /// recognizer.
    ///
    /// # Errors
    /// See [`Enumerator::extract_with`].
    pub fn extract(&self) -> Result<ClosedForm, Error> { self.extract_with(1e-3, &Surd) }

    /// Reconstructs a closed form for the coefficient sequence.
    ///
    /// # Errors
    /// [`Error::UnstableClosedForm`] when the linear system over the root
    /// basis is singular, which happens when distinct roots were merged (or
    /// multiple roots split) by an ill-suited `threshold`.
    pub fn extract_with(&self, threshold: f64, ident: &dyn Identify) -> Result<ClosedForm, Error> {
        let bottom = self.generating_function().bottom();
        let dense = bottom.dense();

        let mut roots = roots(&dense);
        newton(&dense, &mut roots);
        snap(&dense, &mut roots, ident);
        let clusters = cluster(&roots, threshold, |z| horner(&dense, z).norm());
        let terms = collate(&clusters);
        let degree = roots.len();

        tracing::debug!(
            degree,
            clusters = clusters.len(),
            "clustered denominator roots",
        );

        let coefficients = if degree == 0 {
            Vec::new()
        } else {
            let matrix = DMatrix::from_fn(degree, degree, |row, col| {
                let (root, k) = terms[col];
                basis_term(root, k, row)
            });
            let target =
                DVector::from_fn(degree, |row, _| {
                    Complex64::new(self.coefficient(row, false), 0.0)
                });

            let solved = matrix
                .clone()
                .lu()
                .solve(&target)
                .ok_or(Error::UnstableClosedForm)?;

            let residual = (&matrix * &solved - &target).norm();
            if residual > 1e-6 {
                tracing::warn!(residual, "closed-form solve is poorly conditioned");
            }

            solved.iter().copied().collect()
        };

        Ok(ClosedForm {
            clusters,
            terms,
            coefficients,
            denominator: bottom.clone(),
            overflow: self.generating_function().overflow().clone(),
        })
    }
}
