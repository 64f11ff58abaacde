//! Exact and closed-form word enumeration for regular languages.
//!
//! From a regular expression this crate derives the language's counting
//! generating function, a rational function whose degree-`n` coefficient is
//! the number of words of length `n`, and reads exact counts or a
//! root-based closed form off it. The automaton side (NFA, DFA, state
//! elimination) doubles as a canonicalizer and as ground truth.

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    clippy::clone_on_ref_ptr,
    missing_debug_implementations
)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)] // TODO: document the whole public surface

pub mod closed_form;
pub mod count;
pub mod dfa;
pub mod free;
pub mod nfa;
pub mod poly;
pub mod re;
pub mod spectral;
pub mod transfer;

pub use closed_form::{ClosedForm, Identify, Surd};
pub use count::{Coefficients, Enumerator};
pub use poly::{Poly, Rational};
pub use re::{Regex, syntax::ParseError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The generating function's denominator vanishes at the origin, so no
    /// power-series expansion exists there. Typical causes are starred
    /// nullable subexpressions and alphabet filters that leave a starred
    /// subexpression weightless.
    #[error("generating function cannot be expanded at the origin")]
    DegenerateRationalFunction,

    /// Dividing out the GCD during rational simplification left a non-zero
    /// remainder. This indicates the algebra itself misbehaved; it is
    /// reported rather than papered over.
    #[error("rational simplification left a non-zero remainder: {0}")]
    NonCoprimeSimplification(Poly),

    /// A renumbered automaton was not a dense bijection onto `1..=n`.
    #[error("state {0} is missing from the renumbered automaton")]
    IllFormedAutomaton(u32),

    /// The linear system recovering closed-form weights is singular,
    /// usually because roots were clustered at the wrong multiplicity.
    #[error("closed-form linear system is singular")]
    UnstableClosedForm,
}

/// The number of words of length `n` in the language of `pattern`.
///
/// # Errors
/// [`Error::Parse`] on malformed patterns, otherwise as
/// [`Enumerator::new`].
pub fn exact(pattern: &str, n: usize) -> Result<u64, Error> {
    Ok(Enumerator::new(&Regex::parse(pattern)?)?.exact(n))
}

/// An infinite iterator over word counts for `n = 0, 1, 2, …`.
///
/// # Errors
/// As [`exact`].
pub fn exact_coefficients(pattern: &str) -> Result<Coefficients, Error> {
    Ok(Enumerator::new(&Regex::parse(pattern)?)?.coefficients())
}

/// The simplified generating function of `pattern`'s language.
///
/// # Errors
/// As [`exact`].
pub fn generating_function(pattern: &str) -> Result<Rational, Error> {
    Ok(Enumerator::new(&Regex::parse(pattern)?)?
        .generating_function()
        .clone())
}

/// A closed form for `pattern`'s counting sequence, reconstructed from the
/// denominator's roots.
///
/// # Errors
/// As [`exact`], plus [`Error::UnstableClosedForm`] from the solve.
pub fn extract(pattern: &str) -> Result<ClosedForm, Error> {
    Enumerator::new(&Regex::parse(pattern)?)?.extract()
}

/// An unambiguous canonical regex for `pattern`'s language, rebuilt from its
/// determinized automaton.
///
/// # Errors
/// [`Error::Parse`] on malformed patterns.
pub fn canonicalize(pattern: &str) -> Result<Regex<char>, Error> {
    let (dfa, _) = Regex::parse(pattern)?.compile().determinize().atomize();
    dfa::eliminate::rebuild(&dfa)
}

#[cfg(test)]
mod test {
    use super::{Regex, canonicalize, exact, exact_coefficients, extract, generating_function};

    #[test]
    fn counting_end_to_end() {
        assert_eq!(exact("(0|1)*", 10), Ok(1024));
        assert_eq!(
            exact_coefficients("(00*1)*")
                .unwrap()
                .take(8)
                .collect::<Vec<_>>(),
            vec![1, 0, 1, 1, 2, 3, 5, 8],
        );
    }

    #[test]
    fn generating_function_end_to_end() {
        let gf = generating_function("(0|1)*").unwrap();
        assert!(gf.overflow().is_zero());
        assert_eq!(gf.top().to_string(), "1");
        assert_eq!(gf.bottom().to_string(), "1 + -2z");
    }

    #[test]
    fn extraction_end_to_end() {
        let form = extract("(0|1)*").unwrap();
        assert!((form.eval(12) - 4096.0).abs() < 1e-6);
    }

    #[test]
    fn canonicalization_end_to_end() {
        let canonical = canonicalize("(0|0)(1|1)").unwrap();
        let counter = super::Enumerator::new(&canonical).unwrap();

        // the ambiguous original would count four parse trees
        assert_eq!(counter.exact(2), 1);

        assert_eq!(canonicalize("%*").unwrap(), Regex::Eps);
        assert_eq!(canonicalize("0)").unwrap_err().to_string(), "unmatched `)` at offset 1");
    }
}
