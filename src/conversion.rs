//! Mapping between holonomic coefficient domains and the tower polynomial
//! ring the closure engine eliminates over.
//!
//! The derivation matrices of the closure engine are built over the fraction
//! field of [DiffPolynomialRing]. For a depth-1 element the operator
//! coefficients are rational functions and embed as constant polynomials.
//! For deeper elements the coefficients are themselves holonomic functions;
//! each distinct one is registered as a fresh tower variable together with
//! its derivative rule (the variable for the next derivative, or the
//! companion row of its own operator at the top of the tower).
//! [Convertible::to_real] evaluates a polynomial back into the coefficient
//! domain once the kernel has been read off.

use crate::closure;
use crate::domains::fraction::{Fraction, FractionField, FractionNormalization, RationalFunctionField};
use crate::domains::{Derivable, DomainError, EuclideanDomain, Ring, SeriesDomain};
use crate::element::HolonomicRing;
use crate::poly::diffpoly::{DiffPolynomial, DiffPolynomialRing, ParameterRing};

/// A coefficient domain that can exchange its elements with the tower
/// polynomial ring over a base domain.
pub trait Convertible: SeriesDomain {
    type Base: SeriesDomain + EuclideanDomain + FractionNormalization;

    fn conversion_base(&self) -> Self::Base;

    /// Express `e` as a tower polynomial, registering fresh variables in the
    /// system as needed.
    fn to_poly(
        &self,
        e: &Self::Element,
        sys: &mut ConversionSystem<Self>,
    ) -> Result<DiffPolynomial<Self::Base>, DomainError>;

    /// Evaluate a tower polynomial back into the domain.
    fn to_real(
        &self,
        p: &DiffPolynomial<Self::Base>,
        sys: &ConversionSystem<Self>,
    ) -> Result<Self::Element, DomainError>;
}

/// The registered tower variables of one elimination run: which domain
/// element each variable stands for, and the polynomial expressing the
/// variable's derivative.
pub struct ConversionSystem<C: Convertible> {
    poly_ring: DiffPolynomialRing<C::Base>,
    entries: Vec<C::Element>,
    derivatives: Vec<DiffPolynomial<C::Base>>,
}

impl<C: Convertible> ConversionSystem<C> {
    pub fn new(domain: &C) -> ConversionSystem<C> {
        ConversionSystem {
            poly_ring: DiffPolynomialRing::new(domain.conversion_base(), "w"),
            entries: vec![],
            derivatives: vec![],
        }
    }

    pub fn poly_ring(&self) -> &DiffPolynomialRing<C::Base> {
        &self.poly_ring
    }

    pub fn fraction_field(&self) -> FractionField<DiffPolynomialRing<C::Base>> {
        FractionField::new(self.poly_ring.clone())
    }

    pub fn entry(&self, var: usize) -> &C::Element {
        &self.entries[var]
    }

    pub fn position(&self, e: &C::Element) -> Option<usize> {
        self.entries.iter().position(|x| x == e)
    }

    pub fn register(&mut self, entry: C::Element, derivative: DiffPolynomial<C::Base>) -> usize {
        self.entries.push(entry);
        self.derivatives.push(derivative);
        self.entries.len() - 1
    }

    /// The derivative of a tower polynomial, with the registered rules for
    /// the variables and the base derivative for the coefficients.
    pub fn derivative(&self, p: &DiffPolynomial<C::Base>) -> DiffPolynomial<C::Base> {
        let base = self.poly_ring.coefficient_ring().clone();
        p.derivative_with(|c| base.derivative(c), |v| self.derivatives[v].clone())
    }

    /// The derivative of a fraction of tower polynomials by the quotient
    /// rule.
    pub fn fraction_derivative(
        &self,
        e: &Fraction<DiffPolynomialRing<C::Base>>,
    ) -> Fraction<DiffPolynomialRing<C::Base>> {
        let frac = self.fraction_field();
        let dn = self.derivative(e.numerator());
        let dd = self.derivative(e.denominator());

        let mut num = dn.mul(e.denominator());
        num = num.sub(&e.numerator().mul(&dd));
        if num.is_zero() {
            return frac.zero();
        }
        frac.to_element(num, e.denominator().mul(e.denominator()), true)
    }
}

impl Convertible for RationalFunctionField {
    type Base = RationalFunctionField;

    fn conversion_base(&self) -> RationalFunctionField {
        self.clone()
    }

    fn to_poly(
        &self,
        e: &Self::Element,
        sys: &mut ConversionSystem<Self>,
    ) -> Result<DiffPolynomial<Self::Base>, DomainError> {
        Ok(sys.poly_ring.constant(e.clone()))
    }

    fn to_real(
        &self,
        p: &DiffPolynomial<Self::Base>,
        _sys: &ConversionSystem<Self>,
    ) -> Result<Self::Element, DomainError> {
        if !p.is_constant() {
            return Err(DomainError::Unsupported(
                "A rational function domain registers no tower variables",
            ));
        }
        Ok(p.constant_coefficient())
    }
}

impl Convertible for ParameterRing {
    type Base = ParameterRing;

    fn conversion_base(&self) -> ParameterRing {
        self.clone()
    }

    fn to_poly(
        &self,
        e: &Self::Element,
        sys: &mut ConversionSystem<Self>,
    ) -> Result<DiffPolynomial<Self::Base>, DomainError> {
        Ok(sys.poly_ring.constant(e.clone()))
    }

    fn to_real(
        &self,
        p: &DiffPolynomial<Self::Base>,
        _sys: &ConversionSystem<Self>,
    ) -> Result<Self::Element, DomainError> {
        if !p.is_constant() {
            return Err(DomainError::Unsupported(
                "A parameter domain registers no tower variables",
            ));
        }
        Ok(p.constant_coefficient())
    }
}

impl<R> Convertible for HolonomicRing<R>
where
    R: Convertible + EuclideanDomain + FractionNormalization,
{
    type Base = R;

    fn conversion_base(&self) -> R {
        self.coefficient_ring().clone()
    }

    fn to_poly(
        &self,
        e: &Self::Element,
        sys: &mut ConversionSystem<Self>,
    ) -> Result<DiffPolynomial<R>, DomainError> {
        if let Some(c) = e.constant_value() {
            let base = self.coefficient_ring();
            return Ok(sys.poly_ring.constant(base.lift_constant(&c)));
        }

        if let Some(i) = sys.position(e) {
            return Ok(sys.poly_ring.var(i));
        }

        let p = e.operator().order();
        if p == 0 {
            return Err(DomainError::Unsupported(
                "An order-zero operator carries no derivative tower",
            ));
        }
        let companion = e.operator().companion_matrix()?;

        // register the derivative tower e, e', ..., e^(p-1)
        let first = sys.entries.len();
        let mut cur = e.clone();
        for i in 0..p {
            sys.entries.push(cur.clone());
            if i + 1 < p {
                cur = closure::derivative(self, &cur).map_err(|_| {
                    DomainError::Unsupported("The derivative tower could not be extended")
                })?;
            }
        }
        for i in 0..p {
            let rule = if i + 1 < p {
                sys.poly_ring.var(first + i + 1)
            } else {
                // the top of the tower folds back through the companion row
                let mut s = sys.poly_ring.zero();
                for j in 0..p {
                    let c = companion[(p as u32 - 1, j as u32)].clone();
                    s = s.add(&sys.poly_ring.constant(c).mul(&sys.poly_ring.var(first + j)));
                }
                s
            };
            sys.derivatives.push(rule);
        }

        Ok(sys.poly_ring.var(first))
    }

    fn to_real(
        &self,
        p: &DiffPolynomial<R>,
        sys: &ConversionSystem<Self>,
    ) -> Result<Self::Element, DomainError> {
        let mut result = self.zero_element()?;
        for (exponents, coefficient) in p.terms() {
            let mut term = self.from_base(coefficient)?;
            for (v, &e) in exponents.iter().enumerate() {
                for _ in 0..e {
                    term = closure::product(self, &term, sys.entry(v)).map_err(|_| {
                        DomainError::Unsupported("A tower product could not be re-expressed")
                    })?;
                }
            }
            result = closure::sum(self, &result, &term)
                .map_err(|_| DomainError::Unsupported("A tower sum could not be re-expressed"))?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rational_round_trip() {
        let f = RationalFunctionField::rational_functions();
        let mut sys = ConversionSystem::new(&f);
        let x = f.var();
        let p = f.to_poly(&x, &mut sys).unwrap();
        assert!(p.is_constant());
        assert_eq!(f.to_real(&p, &sys).unwrap(), x);
    }

    #[test]
    fn fraction_derivative_uses_quotient_rule() {
        let f = RationalFunctionField::rational_functions();
        let sys = ConversionSystem::<RationalFunctionField>::new(&f);
        let frac = sys.fraction_field();

        // d(1/x) = -1/x^2 within the constant-polynomial embedding
        let x = sys.poly_ring().constant(f.var());
        let one = sys.poly_ring().one();
        let e = frac.to_element(one, x.clone(), false);
        let d = sys.fraction_derivative(&e);

        let expected = frac.neg(&frac.to_element(sys.poly_ring().one(), x.mul(&x), false));
        assert_eq!(frac.sub(&d, &expected), frac.zero());
    }
}
