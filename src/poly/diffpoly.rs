//! Sparse polynomials in an unbounded tower of variables `u0, u1, u2, ...`
//! over a generic coefficient ring.
//!
//! The tower variables stand for the derivatives of an unknown function: `u0`
//! is the function itself, `u1` its first derivative, and so on. The
//! differential-algebraic reduction pipeline eliminates them; the guessing
//! search reuses the same structure with the variables playing the role of
//! undetermined parameters instead.
//!
//! Monomials are kept in descending graded-lexicographic order, so the
//! leading term of a product is the product of the leading terms. This is
//! what makes [DiffPolynomialRing::try_div] a complete exact-division test.

use std::cmp::Ordering;
use std::fmt::{Debug, Display, Error, Formatter};
use std::hash::Hash;

use ahash::HashMap;
use smallvec::SmallVec;
use smartstring::{LazyCompact, SmartString};

use crate::domains::fraction::FractionNormalization;
use crate::domains::rational::{Rational, RationalField};
use crate::domains::{
    ConstantRing, Derivable, DomainError, EuclideanDomain, InternalOrdering, Ring, SeriesDomain,
};

pub type Exponents = SmallVec<[u16; 8]>;

/// The ring of sparse polynomials in the variable tower over `R`.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct DiffPolynomialRing<R: Ring> {
    ring: R,
    prefix: SmartString<LazyCompact>,
}

impl<R: Ring> DiffPolynomialRing<R> {
    pub fn new(ring: R, prefix: &str) -> DiffPolynomialRing<R> {
        DiffPolynomialRing {
            ring,
            prefix: prefix.into(),
        }
    }

    pub fn coefficient_ring(&self) -> &R {
        &self.ring
    }

    pub fn constant(&self, c: R::Element) -> DiffPolynomial<R> {
        DiffPolynomial::constant(c, self.clone())
    }

    /// The tower variable with the given index.
    pub fn var(&self, index: usize) -> DiffPolynomial<R> {
        let mut exponents: Exponents = SmallVec::new();
        exponents.resize(index + 1, 0);
        exponents[index] = 1;
        DiffPolynomial::monomial(self.ring.one(), exponents, self.clone())
    }
}

impl<R: Ring> Display for DiffPolynomialRing<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}*]", self.ring, self.prefix)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Hash)]
struct Term<R: Ring> {
    coefficient: R::Element,
    exponents: Exponents,
}

/// Compare monomials in graded-lexicographic order.
fn cmp_monomials(a: &[u16], b: &[u16]) -> Ordering {
    let da: u64 = a.iter().map(|&e| e as u64).sum();
    let db: u64 = b.iter().map(|&e| e as u64).sum();
    match da.cmp(&db) {
        Ordering::Equal => {}
        ord => return ord,
    }

    for i in 0..a.len().max(b.len()) {
        let ea = a.get(i).copied().unwrap_or(0);
        let eb = b.get(i).copied().unwrap_or(0);
        match ea.cmp(&eb) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }

    Ordering::Equal
}

fn mul_monomials(a: &[u16], b: &[u16]) -> Exponents {
    let mut r: Exponents = SmallVec::new();
    r.resize(a.len().max(b.len()), 0);
    for (i, &e) in a.iter().enumerate() {
        r[i] += e;
    }
    for (i, &e) in b.iter().enumerate() {
        r[i] += e;
    }
    r
}

/// Divide monomial `a` by `b`, if `b` divides `a`.
fn div_monomials(a: &[u16], b: &[u16]) -> Option<Exponents> {
    if b.len() > a.len() {
        return None;
    }

    let mut r: Exponents = SmallVec::from_slice(a);
    for (i, &e) in b.iter().enumerate() {
        if r[i] < e {
            return None;
        }
        r[i] -= e;
    }

    while r.last() == Some(&0) {
        r.pop();
    }
    Some(r)
}

/// A sparse polynomial in the variable tower over `R`, with terms in
/// descending monomial order.
#[derive(Clone)]
pub struct DiffPolynomial<R: Ring> {
    terms: Vec<Term<R>>,
    ring: DiffPolynomialRing<R>,
}

impl<R: Ring> PartialEq for DiffPolynomial<R> {
    fn eq(&self, other: &Self) -> bool {
        self.terms == other.terms
    }
}

impl<R: Ring> Eq for DiffPolynomial<R> {}

impl<R: Ring> Hash for DiffPolynomial<R> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.terms.hash(state);
    }
}

impl<R: Ring> InternalOrdering for DiffPolynomial<R> {
    fn internal_cmp(&self, other: &Self) -> Ordering {
        match self.terms.len().cmp(&other.terms.len()) {
            Ordering::Equal => {}
            ord => return ord,
        }

        for (a, b) in self.terms.iter().zip(&other.terms) {
            match cmp_monomials(&a.exponents, &b.exponents)
                .then_with(|| a.coefficient.internal_cmp(&b.coefficient))
            {
                Ordering::Equal => {}
                ord => return ord,
            }
        }

        Ordering::Equal
    }
}

impl<R: Ring> Debug for DiffPolynomial<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl<R: Ring> Display for DiffPolynomial<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }

        for (i, t) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, "+")?;
            }
            write!(f, "({})", self.ring.ring.printer(&t.coefficient))?;
            for (v, &e) in t.exponents.iter().enumerate() {
                if e == 1 {
                    write!(f, "*{}{}", self.ring.prefix, v)?;
                } else if e > 1 {
                    write!(f, "*{}{}^{}", self.ring.prefix, v, e)?;
                }
            }
        }

        Ok(())
    }
}

impl<R: Ring> DiffPolynomial<R> {
    pub fn zero(ring: DiffPolynomialRing<R>) -> Self {
        DiffPolynomial {
            terms: vec![],
            ring,
        }
    }

    pub fn constant(c: R::Element, ring: DiffPolynomialRing<R>) -> Self {
        Self::monomial(c, SmallVec::new(), ring)
    }

    pub fn monomial(c: R::Element, exponents: Exponents, ring: DiffPolynomialRing<R>) -> Self {
        if R::is_zero(&c) {
            return Self::zero(ring);
        }

        let mut exponents = exponents;
        while exponents.last() == Some(&0) {
            exponents.pop();
        }

        DiffPolynomial {
            terms: vec![Term {
                coefficient: c,
                exponents,
            }],
            ring,
        }
    }

    fn from_terms(mut terms: Vec<Term<R>>, ring: DiffPolynomialRing<R>) -> Self {
        terms.sort_by(|a, b| cmp_monomials(&b.exponents, &a.exponents));

        let mut merged: Vec<Term<R>> = Vec::with_capacity(terms.len());
        for t in terms {
            if let Some(last) = merged.last_mut() {
                if last.exponents == t.exponents {
                    ring.ring.add_assign(&mut last.coefficient, &t.coefficient);
                    if R::is_zero(&last.coefficient) {
                        merged.pop();
                    }
                    continue;
                }
            }
            if !R::is_zero(&t.coefficient) {
                merged.push(t);
            }
        }

        DiffPolynomial {
            terms: merged,
            ring,
        }
    }

    pub fn ring(&self) -> &DiffPolynomialRing<R> {
        &self.ring
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_constant(&self) -> bool {
        self.terms.iter().all(|t| t.exponents.is_empty())
    }

    pub fn is_one(&self) -> bool {
        self.terms.len() == 1
            && self.terms[0].exponents.is_empty()
            && self.ring.ring.is_one(&self.terms[0].coefficient)
    }

    /// The constant part of the polynomial.
    pub fn constant_coefficient(&self) -> R::Element {
        self.terms
            .iter()
            .find(|t| t.exponents.is_empty())
            .map(|t| t.coefficient.clone())
            .unwrap_or_else(|| self.ring.ring.zero())
    }

    /// The coefficient of the given monomial.
    pub fn coefficient_of(&self, exponents: &[u16]) -> R::Element {
        let mut exponents = exponents;
        while exponents.last() == Some(&0) {
            exponents = &exponents[..exponents.len() - 1];
        }

        self.terms
            .iter()
            .find(|t| t.exponents.as_slice() == exponents)
            .map(|t| t.coefficient.clone())
            .unwrap_or_else(|| self.ring.ring.zero())
    }

    /// Iterate the terms as `(exponents, coefficient)` pairs in descending
    /// monomial order.
    pub fn terms(&self) -> impl Iterator<Item = (&[u16], &R::Element)> {
        self.terms
            .iter()
            .map(|t| (t.exponents.as_slice(), &t.coefficient))
    }

    /// The largest tower variable index that occurs, if any.
    pub fn max_variable(&self) -> Option<usize> {
        self.terms
            .iter()
            .filter_map(|t| {
                if t.exponents.is_empty() {
                    None
                } else {
                    Some(t.exponents.len() - 1)
                }
            })
            .max()
    }

    pub fn total_degree(&self) -> u64 {
        self.terms
            .iter()
            .map(|t| t.exponents.iter().map(|&e| e as u64).sum())
            .max()
            .unwrap_or(0)
    }

    pub fn neg(&self) -> Self {
        let terms = self
            .terms
            .iter()
            .map(|t| Term {
                coefficient: self.ring.ring.neg(&t.coefficient),
                exponents: t.exponents.clone(),
            })
            .collect();
        DiffPolynomial {
            terms,
            ring: self.ring.clone(),
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().cloned());
        Self::from_terms(terms, self.ring.clone())
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &Self) -> Self {
        let f = &self.ring.ring;
        let mut acc: HashMap<Exponents, R::Element> = HashMap::default();
        for a in &self.terms {
            for b in &other.terms {
                let m = mul_monomials(&a.exponents, &b.exponents);
                let c = f.mul(&a.coefficient, &b.coefficient);
                match acc.entry(m) {
                    std::collections::hash_map::Entry::Occupied(mut e) => {
                        f.add_assign(e.get_mut(), &c);
                    }
                    std::collections::hash_map::Entry::Vacant(e) => {
                        e.insert(c);
                    }
                }
            }
        }

        let terms = acc
            .into_iter()
            .map(|(exponents, coefficient)| Term {
                coefficient,
                exponents,
            })
            .collect();
        Self::from_terms(terms, self.ring.clone())
    }

    pub fn mul_coeff(&self, c: &R::Element) -> Self {
        let f = &self.ring.ring;
        let terms = self
            .terms
            .iter()
            .map(|t| Term {
                coefficient: f.mul(&t.coefficient, c),
                exponents: t.exponents.clone(),
            })
            .collect();
        Self::from_terms(terms, self.ring.clone())
    }

    pub fn pow(&self, e: usize) -> Self {
        let mut r = Self::constant(self.ring.ring.one(), self.ring.clone());
        for _ in 0..e {
            r = r.mul(self);
        }
        r
    }

    /// Apply the product rule with an explicit derivative for both the
    /// coefficients and the tower variables.
    pub fn derivative_with(
        &self,
        coefficient_derivative: impl Fn(&R::Element) -> R::Element,
        variable_derivative: impl Fn(usize) -> DiffPolynomial<R>,
    ) -> Self {
        let f = &self.ring.ring;
        let mut result = Self::zero(self.ring.clone());

        for t in &self.terms {
            // derivative of the coefficient
            let dc = coefficient_derivative(&t.coefficient);
            if !R::is_zero(&dc) {
                result = result.add(&Self::monomial(dc, t.exponents.clone(), self.ring.clone()));
            }

            // derivative of each variable in the monomial
            for (v, &e) in t.exponents.iter().enumerate() {
                if e == 0 {
                    continue;
                }

                let mut rest = t.exponents.clone();
                rest[v] -= 1;
                let partial = Self::monomial(
                    f.mul(&t.coefficient, &f.nth(e as i64)),
                    rest,
                    self.ring.clone(),
                );
                result = result.add(&partial.mul(&variable_derivative(v)));
            }
        }

        result
    }

    /// Evaluate the polynomial in another ring through maps for the
    /// coefficients and the tower variables.
    pub fn evaluate_in<S: Ring>(
        &self,
        target: &S,
        coefficient_map: impl Fn(&R::Element) -> S::Element,
        variable_map: impl Fn(usize) -> S::Element,
    ) -> S::Element {
        let mut result = target.zero();
        for t in &self.terms {
            let mut m = coefficient_map(&t.coefficient);
            for (v, &e) in t.exponents.iter().enumerate() {
                if e > 0 {
                    target.mul_assign(&mut m, &target.pow(&variable_map(v), e as u64));
                }
            }
            target.add_assign(&mut result, &m);
        }
        result
    }

    fn leading_term(&self) -> Option<&Term<R>> {
        self.terms.first()
    }
}

impl<R: Ring> Ring for DiffPolynomialRing<R> {
    type Element = DiffPolynomial<R>;

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
        DiffPolynomial::zero(self.clone())
    }

    fn one(&self) -> Self::Element {
        DiffPolynomial::constant(self.ring.one(), self.clone())
    }

    fn nth(&self, n: i64) -> Self::Element {
        DiffPolynomial::constant(self.ring.nth(n), self.clone())
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

    /// Exact division. Complete for exact quotients since the leading term of
    /// a product is the product of the leading terms.
    fn try_div(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element> {
        let b_lead = b.leading_term()?;

        let mut rem = a.clone();
        let mut quot: Vec<Term<R>> = vec![];
        while let Some(r_lead) = rem.leading_term() {
            let exponents = div_monomials(&r_lead.exponents, &b_lead.exponents)?;
            let coefficient = self.ring.try_div(&r_lead.coefficient, &b_lead.coefficient)?;
            let m = DiffPolynomial::monomial(coefficient.clone(), exponents.clone(), self.clone());
            rem = rem.sub(&m.mul(b));
            quot.push(Term {
                coefficient,
                exponents,
            });
        }

        Some(DiffPolynomial::from_terms(quot, self.clone()))
    }

    fn format<W: std::fmt::Write>(&self, element: &Self::Element, f: &mut W) -> Result<(), Error> {
        write!(f, "{}", element)
    }
}

// The trivial Euclidean structure: the reduction pipeline only relies on
// exact division, so fractions over this ring are not reduced by a gcd.
impl<R: Ring> EuclideanDomain for DiffPolynomialRing<R> {
    fn rem(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        if self.try_div(a, b).is_some() {
            self.zero()
        } else {
            a.clone()
        }
    }

    fn quot_rem(&self, a: &Self::Element, b: &Self::Element) -> (Self::Element, Self::Element) {
        match self.try_div(a, b) {
            Some(q) => (q, self.zero()),
            None => (self.zero(), a.clone()),
        }
    }

    fn gcd(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        if a.is_zero() && b.is_zero() {
            self.zero()
        } else if self.try_div(a, b).is_some() {
            b.clone()
        } else if self.try_div(b, a).is_some() {
            a.clone()
        } else {
            self.one()
        }
    }
}

impl<R: Ring> FractionNormalization for DiffPolynomialRing<R> {
    fn get_normalization_factor(&self, _: &Self::Element) -> Self::Element {
        self.one()
    }
}

// The tower variables are treated as constants here; the reduction pipeline
// supplies its own variable rule through [DiffPolynomial::derivative_with].
impl<R: Derivable> Derivable for DiffPolynomialRing<R> {
    fn derivative(&self, e: &Self::Element) -> Self::Element {
        e.derivative_with(|c| self.ring.derivative(c), |_| self.zero())
    }
}

/// The ring of polynomials in undetermined rational parameters, used by the
/// guessing search to propagate symbolic sequence terms.
pub type ParameterRing = DiffPolynomialRing<RationalField>;

impl ParameterRing {
    pub fn parameters() -> ParameterRing {
        DiffPolynomialRing::new(RationalField, "a")
    }
}

impl ConstantRing for ParameterRing {
    fn as_rational(&self, e: &DiffPolynomial<RationalField>) -> Option<Rational> {
        if e.is_constant() {
            Some(e.constant_coefficient())
        } else {
            None
        }
    }

    fn from_rational(&self, r: &Rational) -> DiffPolynomial<RationalField> {
        self.constant(r.clone())
    }
}

// Parameters are constants with respect to the series variable.
impl SeriesDomain for ParameterRing {
    type Constants = ParameterRing;

    fn constants(&self) -> ParameterRing {
        self.clone()
    }

    fn series_coefficient(
        &self,
        e: &DiffPolynomial<RationalField>,
        n: usize,
    ) -> Result<DiffPolynomial<RationalField>, DomainError> {
        if n == 0 {
            Ok(e.clone())
        } else {
            Ok(self.zero())
        }
    }

    fn valuation(
        &self,
        e: &DiffPolynomial<RationalField>,
    ) -> Result<Option<usize>, DomainError> {
        if e.is_zero() {
            Ok(None)
        } else {
            Ok(Some(0))
        }
    }

    fn lift_constant(&self, c: &DiffPolynomial<RationalField>) -> DiffPolynomial<RationalField> {
        c.clone()
    }

    fn is_constant(&self, _: &DiffPolynomial<RationalField>) -> bool {
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domains::rational::{Rational, Q};

    fn ring() -> DiffPolynomialRing<RationalField> {
        DiffPolynomialRing::new(Q, "u")
    }

    #[test]
    fn arithmetic() {
        let r = ring();
        let u0 = r.var(0);
        let u1 = r.var(1);

        // (u0 + u1)^2 = u0^2 + 2 u0 u1 + u1^2
        let s = u0.add(&u1);
        let sq = s.pow(2);
        assert_eq!(sq.coefficient_of(&[2]), Rational::one());
        assert_eq!(sq.coefficient_of(&[1, 1]), Rational::from(2));
        assert_eq!(sq.coefficient_of(&[0, 2]), Rational::one());
        assert_eq!(sq.terms.len(), 3);

        assert!(s.sub(&s).is_zero());
    }

    #[test]
    fn exact_division() {
        let r = ring();
        let u0 = r.var(0);
        let u1 = r.var(1);

        let a = u0.add(&u1);
        let b = u0.sub(&u1);
        let p = a.mul(&b);
        assert_eq!(r.try_div(&p, &a), Some(b.clone()));
        assert_eq!(r.try_div(&p, &b), Some(a.clone()));
        assert_eq!(r.try_div(&a, &b), None);
    }

    #[test]
    fn derivative_shifts_tower() {
        let r = ring();
        let u0 = r.var(0);

        // d(u0^2) with the shift rule is 2 u0 u1
        let d = u0.pow(2).derivative_with(|_| Rational::zero(), |v| r.var(v + 1));
        assert_eq!(d.coefficient_of(&[1, 1]), Rational::from(2));
        assert_eq!(d.terms.len(), 1);
    }

    #[test]
    fn evaluate_into_rationals() {
        let r = ring();
        // 3 u0 u1 + 2 at u0 = 2, u1 = 5 is 32
        let p = r
            .var(0)
            .mul(&r.var(1))
            .mul_coeff(&Rational::from(3))
            .add(&r.constant(Rational::from(2)));
        let v = p.evaluate_in(&Q, |c| c.clone(), |v| Rational::from([2, 5][v]));
        assert_eq!(v, Rational::from(32));
    }
}
