//! Dense univariate polynomials over a generic coefficient ring.

use std::fmt::{Debug, Display, Error, Formatter, Write};
use std::hash::Hash;

use smartstring::{LazyCompact, SmartString};

use crate::domains::fraction::FractionNormalization;
use crate::domains::{Derivable, EuclideanDomain, Field, InternalOrdering, Ring};

/// The ring of univariate polynomials in one variable over a coefficient
/// ring `F`.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct UnivariatePolynomialRing<F: Ring> {
    ring: F,
    variable: SmartString<LazyCompact>,
}

impl<F: Ring> UnivariatePolynomialRing<F> {
    pub fn new(ring: F, variable: &str) -> UnivariatePolynomialRing<F> {
        UnivariatePolynomialRing {
            ring,
            variable: variable.into(),
        }
    }

    pub fn coefficient_ring(&self) -> &F {
        &self.ring
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// The variable of the ring as a polynomial.
    pub fn var(&self) -> UnivariatePolynomial<F> {
        UnivariatePolynomial::monomial(self.ring.one(), 1, self.clone())
    }

    pub fn constant(&self, c: F::Element) -> UnivariatePolynomial<F> {
        UnivariatePolynomial::constant(c, self.clone())
    }
}

impl<F: Ring> Display for UnivariatePolynomialRing<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.ring, self.variable)
    }
}

/// A univariate polynomial with dense coefficient storage.
#[derive(Clone)]
pub struct UnivariatePolynomial<F: Ring> {
    coefficients: Vec<F::Element>,
    ring: UnivariatePolynomialRing<F>,
}

impl<F: Ring> PartialEq for UnivariatePolynomial<F> {
    fn eq(&self, other: &Self) -> bool {
        self.coefficients == other.coefficients
    }
}

impl<F: Ring> Eq for UnivariatePolynomial<F> {}

impl<F: Ring> Hash for UnivariatePolynomial<F> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.coefficients.hash(state);
    }
}

impl<F: Ring> InternalOrdering for UnivariatePolynomial<F> {
    fn internal_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.coefficients.internal_cmp(&other.coefficients)
    }
}

impl<F: Ring> Debug for UnivariatePolynomial<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl<F: Ring> Display for UnivariatePolynomial<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_zero() {
            return f.write_char('0');
        }

        let mut first = true;
        for (e, c) in self.coefficients.iter().enumerate() {
            if F::is_zero(c) {
                continue;
            }

            if !first {
                f.write_str("+")?;
            }
            first = false;

            if e == 0 {
                write!(f, "({})", self.ring.ring.printer(c))?;
            } else if self.ring.ring.is_one(c) {
                write!(f, "{}", self.ring.variable)?;
            } else {
                write!(f, "({})*{}", self.ring.ring.printer(c), self.ring.variable)?;
            }

            if e > 1 {
                write!(f, "^{}", e)?;
            }
        }

        Ok(())
    }
}

impl<F: Ring> UnivariatePolynomial<F> {
    pub fn zero(ring: UnivariatePolynomialRing<F>) -> Self {
        UnivariatePolynomial {
            coefficients: vec![],
            ring,
        }
    }

    pub fn constant(c: F::Element, ring: UnivariatePolynomialRing<F>) -> Self {
        if F::is_zero(&c) {
            return Self::zero(ring);
        }

        UnivariatePolynomial {
            coefficients: vec![c],
            ring,
        }
    }

    pub fn one(ring: UnivariatePolynomialRing<F>) -> Self {
        let c = ring.ring.one();
        Self::constant(c, ring)
    }

    pub fn monomial(c: F::Element, exp: usize, ring: UnivariatePolynomialRing<F>) -> Self {
        if F::is_zero(&c) {
            return Self::zero(ring);
        }

        let mut coefficients = vec![ring.ring.zero(); exp + 1];
        coefficients[exp] = c;
        UnivariatePolynomial { coefficients, ring }
    }

    /// Construct from a coefficient list in order of increasing exponent.
    pub fn from_coefficients(
        coefficients: Vec<F::Element>,
        ring: UnivariatePolynomialRing<F>,
    ) -> Self {
        let mut p = UnivariatePolynomial { coefficients, ring };
        p.truncate();
        p
    }

    fn truncate(&mut self) {
        while let Some(c) = self.coefficients.last() {
            if F::is_zero(c) {
                self.coefficients.pop();
            } else {
                break;
            }
        }
    }

    pub fn ring(&self) -> &UnivariatePolynomialRing<F> {
        &self.ring
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn is_constant(&self) -> bool {
        self.coefficients.len() <= 1
    }

    pub fn is_one(&self) -> bool {
        self.coefficients.len() == 1 && self.ring.ring.is_one(&self.coefficients[0])
    }

    /// The degree of the polynomial; the zero polynomial has degree 0.
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    pub fn coefficient(&self, n: usize) -> F::Element {
        self.coefficients
            .get(n)
            .cloned()
            .unwrap_or_else(|| self.ring.ring.zero())
    }

    pub fn coefficients(&self) -> &[F::Element] {
        &self.coefficients
    }

    pub fn lcoeff(&self) -> F::Element {
        self.coefficients
            .last()
            .cloned()
            .unwrap_or_else(|| self.ring.ring.zero())
    }

    /// The order of vanishing at 0; `None` for the zero polynomial.
    pub fn valuation(&self) -> Option<usize> {
        self.coefficients.iter().position(|c| !F::is_zero(c))
    }

    pub fn neg(&self) -> Self {
        let coefficients = self
            .coefficients
            .iter()
            .map(|c| self.ring.ring.neg(c))
            .collect();
        UnivariatePolynomial {
            coefficients,
            ring: self.ring.clone(),
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        let f = &self.ring.ring;
        let n = self.coefficients.len().max(other.coefficients.len());
        let mut coefficients = Vec::with_capacity(n);
        for i in 0..n {
            let mut c = self.coefficient(i);
            if let Some(oc) = other.coefficients.get(i) {
                f.add_assign(&mut c, oc);
            }
            coefficients.push(c);
        }
        Self::from_coefficients(coefficients, self.ring.clone())
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero(self.ring.clone());
        }

        let f = &self.ring.ring;
        let mut coefficients =
            vec![f.zero(); self.coefficients.len() + other.coefficients.len() - 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            for (j, b) in other.coefficients.iter().enumerate() {
                f.add_mul_assign(&mut coefficients[i + j], a, b);
            }
        }
        Self::from_coefficients(coefficients, self.ring.clone())
    }

    pub fn mul_coeff(&self, c: &F::Element) -> Self {
        let f = &self.ring.ring;
        let coefficients = self.coefficients.iter().map(|a| f.mul(a, c)).collect();
        Self::from_coefficients(coefficients, self.ring.clone())
    }

    pub fn pow(&self, e: usize) -> Self {
        let mut r = Self::one(self.ring.clone());
        for _ in 0..e {
            r = r.mul(self);
        }
        r
    }

    pub fn derivative(&self) -> Self {
        if self.is_constant() {
            return Self::zero(self.ring.clone());
        }

        let f = &self.ring.ring;
        let mut coefficients = Vec::with_capacity(self.coefficients.len() - 1);
        for (e, c) in self.coefficients.iter().enumerate().skip(1) {
            coefficients.push(f.mul(c, &f.nth(e as i64)));
        }
        Self::from_coefficients(coefficients, self.ring.clone())
    }

    /// Evaluate the polynomial at `x` with Horner's method.
    pub fn evaluate(&self, x: &F::Element) -> F::Element {
        let f = &self.ring.ring;
        let mut r = f.zero();
        for c in self.coefficients.iter().rev() {
            f.mul_assign(&mut r, x);
            f.add_assign(&mut r, c);
        }
        r
    }

    /// Substitute the variable by another polynomial.
    pub fn compose(&self, g: &Self) -> Self {
        let mut r = Self::zero(self.ring.clone());
        for c in self.coefficients.iter().rev() {
            r = r.mul(g);
            r = r.add(&Self::constant(c.clone(), self.ring.clone()));
        }
        r
    }

    /// Divide out a coefficient that divides every coefficient exactly.
    pub fn exact_div_coeff(&self, c: &F::Element) -> Option<Self> {
        let f = &self.ring.ring;
        let mut coefficients = Vec::with_capacity(self.coefficients.len());
        for a in &self.coefficients {
            coefficients.push(f.try_div(a, c)?);
        }
        Some(Self::from_coefficients(coefficients, self.ring.clone()))
    }
}

impl<F: Field> UnivariatePolynomial<F> {
    /// Division with remainder.
    pub fn quot_rem(&self, div: &Self) -> (Self, Self) {
        assert!(!div.is_zero(), "Cannot divide by 0 polynomial");

        if self.coefficients.len() < div.coefficients.len() {
            return (Self::zero(self.ring.clone()), self.clone());
        }

        let f = &self.ring.ring;
        let mut rem = self.coefficients.clone();
        let mut quot = vec![f.zero(); self.coefficients.len() - div.coefficients.len() + 1];
        let div_lcoeff_inv = f.inv(&div.lcoeff());

        while rem.len() >= div.coefficients.len() {
            let last = rem.last().unwrap().clone();
            if F::is_zero(&last) {
                rem.pop();
                continue;
            }

            let q = f.mul(&last, &div_lcoeff_inv);
            let shift = rem.len() - div.coefficients.len();
            for (i, c) in div.coefficients.iter().enumerate() {
                f.sub_mul_assign(&mut rem[shift + i], &q, c);
            }
            rem.pop();
            quot[shift] = q;
        }

        (
            Self::from_coefficients(quot, self.ring.clone()),
            Self::from_coefficients(rem, self.ring.clone()),
        )
    }

    pub fn rem(&self, div: &Self) -> Self {
        self.quot_rem(div).1
    }

    pub fn make_monic(&self) -> Self {
        if self.is_zero() {
            return self.clone();
        }
        self.mul_coeff(&self.ring.ring.inv(&self.lcoeff()))
    }

    /// The monic greatest common divisor.
    pub fn gcd(&self, other: &Self) -> Self {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let r = a.rem(&b);
            a = b;
            b = r;
        }
        a.make_monic()
    }
}

impl<F: Ring> Ring for UnivariatePolynomialRing<F> {
    type Element = UnivariatePolynomial<F>;

    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a.add(b)
    }

    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a.sub(b)
    }

    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a.mul(b)
    }

    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = a.add(b);
    }

    fn sub_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = a.sub(b);
    }

    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = a.mul(b);
    }

    fn add_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element) {
        *a = a.add(&b.mul(c));
    }

    fn sub_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element) {
        *a = a.sub(&b.mul(c));
    }

    fn neg(&self, a: &Self::Element) -> Self::Element {
        a.neg()
    }

    fn zero(&self) -> Self::Element {
        UnivariatePolynomial::zero(self.clone())
    }

    fn one(&self) -> Self::Element {
        UnivariatePolynomial::one(self.clone())
    }

    fn nth(&self, n: i64) -> Self::Element {
        UnivariatePolynomial::constant(self.ring.nth(n), self.clone())
    }

    fn pow(&self, b: &Self::Element, e: u64) -> Self::Element {
        b.pow(e as usize)
    }

    fn is_zero(a: &Self::Element) -> bool {
        a.is_zero()
    }

    fn is_one(&self, a: &Self::Element) -> bool {
        a.is_one()
    }

    fn try_div(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element> {
        if b.is_zero() {
            return None;
        }
        if a.is_zero() {
            return Some(a.clone());
        }
        if b.is_constant() {
            return a.exact_div_coeff(&b.coefficient(0));
        }

        // long division driven by try_div on the leading coefficients
        let f = &self.ring;
        let mut rem = a.clone();
        let mut quot = vec![f.zero(); a.coefficients.len().saturating_sub(b.degree())];
        while !rem.is_zero() && rem.degree() >= b.degree() {
            let q = f.try_div(&rem.lcoeff(), &b.lcoeff())?;
            let shift = rem.degree() - b.degree();
            let m = UnivariatePolynomial::monomial(q.clone(), shift, self.clone());
            rem = rem.sub(&m.mul(b));
            quot[shift] = q;
        }

        if rem.is_zero() {
            Some(UnivariatePolynomial::from_coefficients(quot, self.clone()))
        } else {
            None
        }
    }

    fn format<W: std::fmt::Write>(&self, element: &Self::Element, f: &mut W) -> Result<(), Error> {
        write!(f, "{}", element)
    }
}

impl<F: Field> EuclideanDomain for UnivariatePolynomialRing<F> {
    fn rem(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a.rem(b)
    }

    fn quot_rem(&self, a: &Self::Element, b: &Self::Element) -> (Self::Element, Self::Element) {
        a.quot_rem(b)
    }

    fn gcd(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        if a.is_zero() {
            return b.clone();
        }
        if b.is_zero() {
            return a.clone();
        }
        a.gcd(b)
    }
}

// Normalized denominators are monic.
impl<F: Field> FractionNormalization for UnivariatePolynomialRing<F> {
    fn get_normalization_factor(&self, a: &Self::Element) -> Self::Element {
        if a.is_zero() {
            self.one()
        } else {
            self.constant(self.ring.inv(&a.lcoeff()))
        }
    }
}

impl<F: Ring> Derivable for UnivariatePolynomialRing<F> {
    fn derivative(&self, e: &Self::Element) -> Self::Element {
        e.derivative()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domains::rational::{Rational, RationalField, Q};

    fn ring() -> UnivariatePolynomialRing<RationalField> {
        UnivariatePolynomialRing::new(Q, "x")
    }

    fn poly(coeffs: &[i64]) -> UnivariatePolynomial<RationalField> {
        UnivariatePolynomial::from_coefficients(
            coeffs.iter().map(|&c| Rational::from(c)).collect(),
            ring(),
        )
    }

    #[test]
    fn arithmetic() {
        let a = poly(&[1, 2, 1]);
        let b = poly(&[1, 1]);
        assert_eq!(a, b.mul(&b));
        assert_eq!(a.sub(&a), poly(&[]));
        assert_eq!(a.derivative(), poly(&[2, 2]));
    }

    #[test]
    fn division() {
        let a = poly(&[-1, 0, 0, 0, 1]);
        let b = poly(&[-1, 1]);
        let (q, r) = a.quot_rem(&b);
        assert_eq!(q, poly(&[1, 1, 1, 1]));
        assert!(r.is_zero());

        let r = ring();
        assert_eq!(r.try_div(&a, &b), Some(q));
        assert_eq!(r.try_div(&b, &a), None);
    }

    #[test]
    fn gcd() {
        let a = poly(&[-1, 0, 1]);
        let b = poly(&[1, 2, 1]);
        assert_eq!(a.gcd(&b), poly(&[1, 1]));
    }

    #[test]
    fn compose() {
        // (x+1)^2 at x^2: x^4 + 2x^2 + 1
        let a = poly(&[1, 2, 1]);
        let g = poly(&[0, 0, 1]);
        assert_eq!(a.compose(&g), poly(&[1, 0, 2, 0, 1]));
    }
}
