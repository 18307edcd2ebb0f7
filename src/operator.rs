//! Linear differential operators `c_0 + c_1 d/dx + ... + c_n (d/dx)^n` with
//! coefficients in a [SeriesDomain], and the sequence recurrence they induce
//! on the Taylor coefficients of their solutions.

use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

use crate::domains::rational::Rational;
use crate::domains::{ConstantRing, DomainError, InternalOrdering, Ring, SeriesDomain};
use crate::matrix::Matrix;
use crate::poly::univariate::{UnivariatePolynomial, UnivariatePolynomialRing};

/// When the indicial polynomial cannot be solved exactly over the constants
/// (parametric coefficients), its non-negative integer roots are searched up
/// to this bound instead.
const PARAMETRIC_ROOT_BOUND: i64 = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperatorError {
    /// The recurrence needs more sequence terms than were supplied.
    InsufficientData { needed: usize },
    /// The recurrence step divides by a leading coefficient that vanishes at
    /// this index; the term must be supplied as an initial value instead.
    ZeroLeadingCoefficient { index: usize },
    Domain(DomainError),
}

impl Display for OperatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatorError::InsufficientData { needed } => {
                write!(f, "The recurrence needs {} sequence terms", needed)
            }
            OperatorError::ZeroLeadingCoefficient { index } => {
                write!(
                    f,
                    "The recurrence cannot determine the term at index {}: the leading coefficient vanishes there",
                    index
                )
            }
            OperatorError::Domain(e) => Display::fmt(e, f),
        }
    }
}

impl std::error::Error for OperatorError {}

impl From<DomainError> for OperatorError {
    fn from(e: DomainError) -> OperatorError {
        OperatorError::Domain(e)
    }
}

/// A linear differential operator, stored as its coefficient list in
/// increasing derivative order with the trailing zeroes trimmed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Operator<R: SeriesDomain> {
    coefficients: Vec<R::Element>,
    ring: R,
}

impl<R: SeriesDomain> InternalOrdering for Operator<R> {
    fn internal_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.coefficients.internal_cmp(&other.coefficients)
    }
}

impl<R: SeriesDomain> Debug for Operator<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl<R: SeriesDomain> Display for Operator<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.coefficients.is_empty() {
            return write!(f, "0");
        }

        for (i, c) in self.coefficients.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "({})", self.ring.printer(c))?;
            if i == 1 {
                write!(f, "*D")?;
            } else if i > 1 {
                write!(f, "*D^{}", i)?;
            }
        }
        Ok(())
    }
}

impl<R: SeriesDomain> Operator<R> {
    pub fn new(mut coefficients: Vec<R::Element>, ring: R) -> Operator<R> {
        while coefficients.last().map(R::is_zero) == Some(true) {
            coefficients.pop();
        }
        Operator { coefficients, ring }
    }

    pub fn ring(&self) -> &R {
        &self.ring
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// The order of the operator: the largest derivative with a nonzero
    /// coefficient.
    pub fn order(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    pub fn coefficients(&self) -> &[R::Element] {
        &self.coefficients
    }

    pub fn leading_coefficient(&self) -> Option<&R::Element> {
        self.coefficients.last()
    }

    /// The companion matrix of the monic form of the operator: identity on
    /// the shifted sub-diagonal and `(-c_0/c_n, ..., -c_{n-1}/c_n)` as the
    /// last row. Fails when the leading coefficient does not divide the
    /// others in the domain.
    pub fn companion_matrix(&self) -> Result<Matrix<R>, DomainError> {
        let n = self.order();
        assert!(n > 0, "The companion matrix needs a positive order");

        let lead = &self.coefficients[n];
        let mut rows: Vec<Vec<R::Element>> = Vec::with_capacity(n);
        for i in 0..n - 1 {
            let mut row = vec![self.ring.zero(); n];
            row[i + 1] = self.ring.one();
            rows.push(row);
        }

        let mut last = Vec::with_capacity(n);
        for c in &self.coefficients[..n] {
            let q = self
                .ring
                .try_div(c, lead)
                .ok_or(DomainError::DivisionByNonUnit)?;
            last.push(self.ring.neg(&q));
        }
        rows.push(last);

        Ok(Matrix::from_nested_vec(rows, self.ring.clone())
            .expect("Companion rows have equal length"))
    }

    /// The largest gap `i - val(c_i)` over the nonzero coefficients. Sequence
    /// term `m + delta` is governed by the recurrence equation for the
    /// coefficient of `x^m`.
    fn delta(&self) -> Result<i64, DomainError> {
        let mut delta = None;
        for (i, c) in self.coefficients.iter().enumerate() {
            if let Some(v) = self.ring.valuation(c)? {
                let d = i as i64 - v as i64;
                if delta.map_or(true, |cur| d > cur) {
                    delta = Some(d);
                }
            }
        }
        delta.ok_or(DomainError::Unsupported(
            "The zero operator has no recurrence",
        ))
    }

    /// The indicial polynomial `rho(m)`: the factor multiplying the sequence
    /// term `a_{m+delta}` in the recurrence equation for `x^m`.
    fn indicial_polynomial(
        &self,
        delta: i64,
    ) -> Result<UnivariatePolynomial<R::Constants>, DomainError> {
        let constants = self.ring.constants();
        let poly_ring = UnivariatePolynomialRing::new(constants.clone(), "m");
        let mut rho = UnivariatePolynomial::zero(poly_ring.clone());

        for (i, c) in self.coefficients.iter().enumerate() {
            if (i as i64) < delta {
                continue;
            }
            let v = (i as i64 - delta) as usize;
            if self.ring.valuation(c)? != Some(v) {
                continue;
            }
            let gamma = self.ring.series_coefficient(c, v)?;

            // gamma * (m + delta) * (m + delta - 1) * ... * (m + delta - i + 1)
            let mut term = poly_ring.constant(gamma);
            for t in 0..i {
                let factor = UnivariatePolynomial::from_coefficients(
                    vec![constants.nth(delta - t as i64), constants.one()],
                    poly_ring.clone(),
                );
                term = term.mul(&factor);
            }
            rho = rho.add(&term);
        }
        Ok(rho)
    }

    /// The smallest index from which the recurrence alone determines every
    /// later sequence term: terms below this threshold must be supplied as
    /// initial values.
    pub fn jump_order(&self) -> Result<usize, DomainError> {
        let delta = self.delta()?;
        let rho = self.indicial_polynomial(delta)?;
        let constants = self.ring.constants();

        // non-negative integer roots of the indicial polynomial
        let bound = match rho
            .coefficients()
            .iter()
            .map(|c| constants.as_rational(c))
            .collect::<Option<Vec<_>>>()
        {
            Some(coeffs) => {
                // Cauchy bound on the root magnitudes
                let lead = coeffs.last().expect("The indicial polynomial is nonzero");
                let mut max = Rational::zero();
                for c in &coeffs[..coeffs.len() - 1] {
                    let q = (c / lead).abs();
                    if q > max {
                        max = q;
                    }
                }
                (Rational::one() + max)
                    .ceil_i64()
                    .unwrap_or(PARAMETRIC_ROOT_BOUND)
            }
            // parametric coefficients: best-effort bounded scan
            None => PARAMETRIC_ROOT_BOUND,
        };

        let mut max_root = None;
        for m in 0..=bound {
            let value = rho.evaluate(&constants.nth(m));
            if <R::Constants as Ring>::is_zero(&value) {
                max_root = Some(m);
            }
        }

        let jump = match max_root {
            Some(r) => delta + 1 + r,
            None => delta,
        };
        Ok(jump.max(0) as usize)
    }

    /// Compute the Taylor sequence term at index `n` from the recurrence and
    /// the first `n` terms.
    pub fn apply(
        &self,
        sequence: &[<R::Constants as Ring>::Element],
        n: usize,
    ) -> Result<<R::Constants as Ring>::Element, OperatorError> {
        if sequence.len() < n {
            return Err(OperatorError::InsufficientData { needed: n });
        }

        let delta = self.delta()?;
        if (n as i64) < delta {
            return Err(OperatorError::ZeroLeadingCoefficient { index: n });
        }
        let m = (n as i64 - delta) as usize;

        let constants = self.ring.constants();
        let rho = self
            .indicial_polynomial(delta)?
            .evaluate(&constants.nth(m as i64));
        if <R::Constants as Ring>::is_zero(&rho) {
            return Err(OperatorError::ZeroLeadingCoefficient { index: n });
        }

        // sum of the known terms in the x^m coefficient of the operator
        // applied to the series
        let mut s = constants.zero();
        for (i, c) in self.coefficients.iter().enumerate() {
            for j in 0..=m {
                let idx = m - j + i;
                if idx == n {
                    continue;
                }

                let gamma = self.ring.series_coefficient(c, j)?;
                if <R::Constants as Ring>::is_zero(&gamma) {
                    continue;
                }

                let ff = Rational::falling_factorial(idx as u64, i as u64);
                let mut t = constants.mul(&gamma, &sequence[idx]);
                constants.mul_assign(&mut t, &constants.from_rational(&ff));
                constants.add_assign(&mut s, &t);
            }
        }

        constants
            .try_div(&constants.neg(&s), &rho)
            .ok_or(OperatorError::ZeroLeadingCoefficient { index: n })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domains::fraction::RationalFunctionField;
    use crate::domains::rational::Rational;

    fn field() -> RationalFunctionField {
        RationalFunctionField::rational_functions()
    }

    fn op(coeffs: &[&[i64]]) -> Operator<RationalFunctionField> {
        let f = field();
        let coefficients = coeffs
            .iter()
            .map(|c| f.polynomial(&c.iter().map(|&v| Rational::from(v)).collect::<Vec<_>>()))
            .collect();
        Operator::new(coefficients, f)
    }

    #[test]
    fn order_and_trimming() {
        let l = op(&[&[1], &[0, 1], &[0]]);
        assert_eq!(l.order(), 1);
        assert!(!l.is_zero());
        assert!(op(&[&[0]]).is_zero());
    }

    #[test]
    fn companion() {
        // y'' + y = 0
        let l = op(&[&[1], &[0], &[1]]);
        let c = l.companion_matrix().unwrap();
        assert_eq!(c.nrows(), 2);
        let f = field();
        assert_eq!(c[(0, 1)], f.one());
        assert_eq!(c[(1, 0)], f.nth(-1));
        assert!(RationalFunctionField::is_zero(&c[(1, 1)]));
    }

    #[test]
    fn jump_orders() {
        // y'' + y = 0: two initial values
        assert_eq!(op(&[&[1], &[0], &[1]]).jump_order().unwrap(), 2);
        // y' - y = 0: one initial value
        assert_eq!(op(&[&[-1], &[1]]).jump_order().unwrap(), 1);
        // x y' - y = 0: indicial root at m = 1, so terms 0 and 1 are initial
        assert_eq!(op(&[&[-1], &[0, 1]]).jump_order().unwrap(), 2);
    }

    #[test]
    fn recurrence_for_the_exponential() {
        // y' - y = 0 with a_0 = 1: a_n = 1/n!
        let l = op(&[&[-1], &[1]]);
        let mut seq = vec![Rational::one()];
        for n in 1..6 {
            let t = l.apply(&seq, n).unwrap();
            assert_eq!(t, Rational::factorial(n as u64).inv());
            seq.push(t);
        }
    }

    #[test]
    fn recurrence_for_the_sine() {
        // y'' + y = 0, a_0 = 0, a_1 = 1
        let l = op(&[&[1], &[0], &[1]]);
        let mut seq = vec![Rational::zero(), Rational::one()];
        for n in 2..8 {
            seq.push(l.apply(&seq, n).unwrap());
        }
        assert_eq!(seq[3], Rational::new(-1, 6));
        assert_eq!(seq[4], Rational::zero());
        assert_eq!(seq[5], Rational::new(1, 120));
    }

    #[test]
    fn recurrence_needs_data() {
        let l = op(&[&[1], &[0], &[1]]);
        assert_eq!(
            l.apply(&[], 2),
            Err(OperatorError::InsufficientData { needed: 2 })
        );

        // x y' - y = 0 cannot produce the term at index 1
        let m = op(&[&[-1], &[0, 1]]);
        assert_eq!(
            m.apply(&[Rational::zero()], 1),
            Err(OperatorError::ZeroLeadingCoefficient { index: 1 })
        );
    }
}
