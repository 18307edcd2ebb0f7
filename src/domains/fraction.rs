//! A field of fractions over a generic integral domain, and the concrete
//! field of rational functions that serves as the depth-0 coefficient domain.

use std::fmt::{Display, Error, Formatter};

use super::rational::{Rational, RationalField, Q};
use super::{
    ConstantRing, Derivable, DomainError, EuclideanDomain, Field, InternalOrdering, Ring,
    SeriesDomain, Substitution,
};
use crate::poly::univariate::{UnivariatePolynomial, UnivariatePolynomialRing};

/// A ring that supports normalization of fractions built over it, such that
/// equal fractions have equal representations.
pub trait FractionNormalization: Ring {
    /// Get the factor that normalizes the denominator `a`.
    fn get_normalization_factor(&self, a: &Self::Element) -> Self::Element;
}

/// The field of fractions over the ring `R`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct FractionField<R: Ring> {
    ring: R,
}

impl<R: Ring> FractionField<R> {
    pub fn new(ring: R) -> FractionField<R> {
        FractionField { ring }
    }

    pub fn base_ring(&self) -> &R {
        &self.ring
    }
}

impl<R: Ring> Display for FractionField<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frac({})", self.ring)
    }
}

/// A fraction of two elements of the underlying ring.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct Fraction<R: Ring> {
    numerator: R::Element,
    denominator: R::Element,
}

impl<R: Ring> Fraction<R> {
    pub fn numerator(&self) -> &R::Element {
        &self.numerator
    }

    pub fn denominator(&self) -> &R::Element {
        &self.denominator
    }
}

impl<R: Ring> InternalOrdering for Fraction<R> {
    fn internal_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.numerator
            .internal_cmp(&other.numerator)
            .then_with(|| self.denominator.internal_cmp(&other.denominator))
    }
}

impl<R: EuclideanDomain + FractionNormalization> FractionField<R> {
    /// Build the normalized fraction `numerator / denominator`. When `do_gcd`
    /// is set, the gcd of the two parts is divided out first.
    pub fn to_element(
        &self,
        mut numerator: R::Element,
        mut denominator: R::Element,
        do_gcd: bool,
    ) -> Fraction<R> {
        assert!(
            !R::is_zero(&denominator),
            "The denominator of a fraction cannot be zero"
        );

        if R::is_zero(&numerator) {
            return Fraction {
                numerator,
                denominator: self.ring.one(),
            };
        }

        if do_gcd {
            let g = self.ring.gcd(&numerator, &denominator);
            if !self.ring.is_one(&g) {
                numerator = self.ring.quot_rem(&numerator, &g).0;
                denominator = self.ring.quot_rem(&denominator, &g).0;
            }
        }

        let factor = self.ring.get_normalization_factor(&denominator);
        if !self.ring.is_one(&factor) {
            numerator = self.ring.mul(&numerator, &factor);
            denominator = self.ring.mul(&denominator, &factor);
        }

        Fraction {
            numerator,
            denominator,
        }
    }

    /// Embed a ring element as a fraction.
    pub fn from_base(&self, e: R::Element) -> Fraction<R> {
        Fraction {
            numerator: e,
            denominator: self.ring.one(),
        }
    }
}

impl<R: EuclideanDomain + FractionNormalization> Ring for FractionField<R> {
    type Element = Fraction<R>;

    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        let r = &self.ring;
        let mut numerator = r.mul(&a.numerator, &b.denominator);
        r.add_mul_assign(&mut numerator, &b.numerator, &a.denominator);
        self.to_element(numerator, r.mul(&a.denominator, &b.denominator), true)
    }

    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        self.add(a, &self.neg(b))
    }

    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        let r = &self.ring;
        self.to_element(
            r.mul(&a.numerator, &b.numerator),
            r.mul(&a.denominator, &b.denominator),
            true,
        )
    }

    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = self.add(a, b);
    }

    fn sub_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = self.sub(a, b);
    }

    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = self.mul(a, b);
    }

    fn add_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element) {
        *a = self.add(a, &self.mul(b, c));
    }

    fn sub_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element) {
        *a = self.sub(a, &self.mul(b, c));
    }

    fn neg(&self, a: &Self::Element) -> Self::Element {
        Fraction {
            numerator: self.ring.neg(&a.numerator),
            denominator: a.denominator.clone(),
        }
    }

    fn zero(&self) -> Self::Element {
        Fraction {
            numerator: self.ring.zero(),
            denominator: self.ring.one(),
        }
    }

    fn one(&self) -> Self::Element {
        Fraction {
            numerator: self.ring.one(),
            denominator: self.ring.one(),
        }
    }

    fn nth(&self, n: i64) -> Self::Element {
        Fraction {
            numerator: self.ring.nth(n),
            denominator: self.ring.one(),
        }
    }

    fn pow(&self, b: &Self::Element, e: u64) -> Self::Element {
        Fraction {
            numerator: self.ring.pow(&b.numerator, e),
            denominator: self.ring.pow(&b.denominator, e),
        }
    }

    fn is_zero(a: &Self::Element) -> bool {
        R::is_zero(&a.numerator)
    }

    fn is_one(&self, a: &Self::Element) -> bool {
        self.ring.is_one(&a.numerator) && self.ring.is_one(&a.denominator)
    }

    fn try_div(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element> {
        if Self::is_zero(b) {
            None
        } else {
            Some(self.div(a, b))
        }
    }

    fn format<W: std::fmt::Write>(&self, element: &Self::Element, f: &mut W) -> Result<(), Error> {
        if self.ring.is_one(&element.denominator) {
            self.ring.format(&element.numerator, f)
        } else {
            f.write_char('(')?;
            self.ring.format(&element.numerator, f)?;
            f.write_str(")/(")?;
            self.ring.format(&element.denominator, f)?;
            f.write_char(')')
        }
    }
}

impl<R: EuclideanDomain + FractionNormalization> FractionNormalization for FractionField<R> {
    fn get_normalization_factor(&self, a: &Self::Element) -> Self::Element {
        self.inv(a)
    }
}

impl<R: EuclideanDomain + FractionNormalization> EuclideanDomain for FractionField<R> {
    fn rem(&self, _a: &Self::Element, _b: &Self::Element) -> Self::Element {
        self.zero()
    }

    fn quot_rem(&self, a: &Self::Element, b: &Self::Element) -> (Self::Element, Self::Element) {
        (self.div(a, b), self.zero())
    }

    fn gcd(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        if Self::is_zero(a) && Self::is_zero(b) {
            self.zero()
        } else {
            self.one()
        }
    }
}

impl<R: EuclideanDomain + FractionNormalization> Field for FractionField<R> {
    fn div(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        self.mul(a, &self.inv(b))
    }

    fn div_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = self.div(a, b);
    }

    fn inv(&self, a: &Self::Element) -> Self::Element {
        assert!(!Self::is_zero(a), "Cannot invert 0");
        self.to_element(a.denominator.clone(), a.numerator.clone(), false)
    }
}

impl<R: EuclideanDomain + FractionNormalization + Derivable> Derivable for FractionField<R> {
    fn derivative(&self, e: &Self::Element) -> Self::Element {
        let r = &self.ring;
        // (n/d)' = (n'd - nd') / d^2
        let mut numerator = r.mul(&r.derivative(&e.numerator), &e.denominator);
        r.sub_mul_assign(&mut numerator, &e.numerator, &r.derivative(&e.denominator));
        if R::is_zero(&numerator) {
            return self.zero();
        }
        self.to_element(numerator, r.mul(&e.denominator, &e.denominator), true)
    }
}

/// The field of univariate rational functions over the rationals, `Q(x)`.
pub type RationalFunctionField = FractionField<UnivariatePolynomialRing<RationalField>>;

/// A univariate rational function over the rationals.
pub type RationalFunction = Fraction<UnivariatePolynomialRing<RationalField>>;

impl RationalFunctionField {
    /// The field `Q(x)` with the standard variable name.
    pub fn rational_functions() -> RationalFunctionField {
        FractionField::new(UnivariatePolynomialRing::new(Q, "x"))
    }

    /// The rational function `x`.
    pub fn var(&self) -> RationalFunction {
        self.from_base(self.base_ring().var())
    }

    /// Embed a polynomial given by its coefficients in increasing degree.
    pub fn polynomial(&self, coefficients: &[Rational]) -> RationalFunction {
        self.from_base(UnivariatePolynomial::from_coefficients(
            coefficients.to_vec(),
            self.base_ring().clone(),
        ))
    }
}

impl SeriesDomain for RationalFunctionField {
    type Constants = RationalField;

    fn constants(&self) -> RationalField {
        Q
    }

    fn series_coefficient(
        &self,
        e: &RationalFunction,
        n: usize,
    ) -> Result<Rational, DomainError> {
        if e.numerator.is_zero() {
            return Ok(Rational::zero());
        }

        let d0 = e.denominator.coefficient(0);
        if d0.is_zero() {
            return Err(DomainError::PoleAtOrigin);
        }

        // Taylor coefficients by the convolution recurrence
        // d_0 a_n = num_n - sum_{k=1..n} d_k a_{n-k}.
        let mut a = Vec::with_capacity(n + 1);
        for m in 0..=n {
            let mut c = e.numerator.coefficient(m);
            for k in 1..=m.min(e.denominator.degree()) {
                c -= &(&e.denominator.coefficient(k) * &a[m - k]);
            }
            a.push(&c / &d0);
        }
        Ok(a.pop().unwrap())
    }

    fn valuation(&self, e: &RationalFunction) -> Result<Option<usize>, DomainError> {
        let Some(v) = e.numerator.valuation() else {
            return Ok(None);
        };

        // fractions are reduced, so a denominator vanishing at 0 is a pole
        if e.denominator.valuation() != Some(0) {
            return Err(DomainError::PoleAtOrigin);
        }

        Ok(Some(v))
    }

    fn lift_constant(&self, c: &Rational) -> RationalFunction {
        self.from_base(self.base_ring().constant(c.clone()))
    }

    fn is_constant(&self, e: &RationalFunction) -> bool {
        e.numerator.is_constant() && e.denominator.is_constant()
    }
}

impl Substitution for RationalFunctionField {
    /// Substitute the variable by the rational function `g`.
    fn substitute(
        &self,
        e: &RationalFunction,
        g: &RationalFunction,
    ) -> Result<RationalFunction, DomainError> {
        let num = compose_with_fraction(&e.numerator, g);
        let den = compose_with_fraction(&e.denominator, g);

        // denominators of the two intermediate fractions are powers of
        // g's denominator; combine and reduce once
        let combined_num = num.0.mul(&den.1);
        let combined_den = den.0.mul(&num.1);
        if combined_den.is_zero() {
            return Err(DomainError::DivisionByNonUnit);
        }

        Ok(self.to_element(combined_num, combined_den, true))
    }

    fn is_identity(&self, e: &RationalFunction) -> bool {
        *e == self.var()
    }
}

/// Compose a polynomial with the fraction `g = p/q`, returning the numerator
/// and denominator of the result separately.
fn compose_with_fraction(
    e: &UnivariatePolynomial<RationalField>,
    g: &RationalFunction,
) -> (
    UnivariatePolynomial<RationalField>,
    UnivariatePolynomial<RationalField>,
) {
    let ring = e.ring().clone();
    let d = e.degree();

    // sum_i c_i p^i q^(d-i) over q^d
    let mut num = UnivariatePolynomial::zero(ring.clone());
    let mut p_pow = UnivariatePolynomial::one(ring.clone());
    let mut q_pows = Vec::with_capacity(d + 1);
    let mut q_pow = UnivariatePolynomial::one(ring);
    for _ in 0..=d {
        q_pows.push(q_pow.clone());
        q_pow = q_pow.mul(&g.denominator);
    }

    for i in 0..=d {
        num = num.add(&p_pow.mul(&q_pows[d - i]).mul_coeff(&e.coefficient(i)));
        p_pow = p_pow.mul(&g.numerator);
    }

    (num, q_pows[d].clone())
}

impl ConstantRing for RationalFunctionField {
    fn as_rational(&self, e: &RationalFunction) -> Option<Rational> {
        if self.is_constant(e) {
            let n = e.numerator.coefficient(0);
            let d = e.denominator.coefficient(0);
            Some(&n / &d)
        } else {
            None
        }
    }

    fn from_rational(&self, r: &Rational) -> RationalFunction {
        self.lift_constant(r)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn field() -> RationalFunctionField {
        RationalFunctionField::rational_functions()
    }

    fn rat(coeffs_num: &[i64], coeffs_den: &[i64]) -> RationalFunction {
        let f = field();
        let num = f.polynomial(&coeffs_num.iter().map(|&c| c.into()).collect::<Vec<_>>());
        let den = f.polynomial(&coeffs_den.iter().map(|&c| c.into()).collect::<Vec<_>>());
        f.to_element(num.numerator().clone(), den.numerator().clone(), true)
    }

    #[test]
    fn normalization() {
        // (2x+2)/(2x^2-2) reduces to 1/(x-1)
        let a = rat(&[2, 2], &[-2, 0, 2]);
        assert_eq!(a, rat(&[1], &[-1, 1]));
    }

    #[test]
    fn arithmetic() {
        let f = field();
        let a = rat(&[1], &[-1, 1]);
        let b = rat(&[1], &[1, 1]);
        // 1/(x-1) + 1/(x+1) = 2x/(x^2-1)
        assert_eq!(f.add(&a, &b), rat(&[0, 2], &[-1, 0, 1]));
        assert_eq!(f.mul(&a, &f.inv(&a)), f.one());
    }

    #[test]
    fn series_expansion() {
        let f = field();
        // 1/(1-x) = 1 + x + x^2 + ...
        let a = rat(&[1], &[1, -1]);
        for n in 0..5 {
            assert_eq!(f.series_coefficient(&a, n).unwrap(), Rational::one());
        }

        // x^2/(1+x): valuation 2
        let b = rat(&[0, 0, 1], &[1, 1]);
        assert_eq!(f.valuation(&b).unwrap(), Some(2));
        assert_eq!(f.series_coefficient(&b, 3).unwrap(), Rational::from(-1));

        // 1/x has a pole at the origin
        let c = rat(&[1], &[0, 1]);
        assert_eq!(f.valuation(&c), Err(DomainError::PoleAtOrigin));
    }

    #[test]
    fn substitution() {
        let f = field();
        // 1/(1-x) at x = x^2: 1/(1-x^2)
        let a = rat(&[1], &[1, -1]);
        let g = rat(&[0, 0, 1], &[1]);
        assert_eq!(f.substitute(&a, &g).unwrap(), rat(&[1], &[1, 0, -1]));

        // (1+x)/(1-x) at x = x/(1+x): (1+2x)
        let b = rat(&[1, 1], &[1, -1]);
        let h = rat(&[0, 1], &[1, 1]);
        assert_eq!(f.substitute(&b, &h).unwrap(), rat(&[1, 2], &[1]));
    }
}
