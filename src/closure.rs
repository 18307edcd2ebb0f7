//! Closure properties of holonomic functions.
//!
//! Sums, products, compositions and derivatives of holonomic functions are
//! holonomic again. Each operation spans a finite basis that is stable under
//! differentiation (derivative towers of the operands, or products of two
//! towers), expresses the derivatives of the result as coordinate vectors
//! over that basis and searches for the first linear dependency among them.
//! The dependency is found with the fraction-free kernel of [Matrix], so no
//! division ever happens in the coefficient domain itself; the coordinate
//! arithmetic runs over the fraction field of the tower polynomial ring of
//! [ConversionSystem].
//!
//! The reciprocal and the exponential of an integral leave the coefficient
//! domain and return elements one level up the holonomic tower.

use std::fmt::{self, Display, Formatter};

use crate::combinatorics::partial_bell;
use crate::conversion::{ConversionSystem, Convertible};
use crate::domains::fraction::{Fraction, FractionNormalization};
use crate::domains::rational::Rational;
use crate::domains::{
    ConstantRing, Derivable, DomainError, EuclideanDomain, Ring, SeriesDomain, Substitution,
};
use crate::element::{Constant, HolonomicElement, HolonomicRing};
use crate::matrix::{canonical_kernel_vector, Matrix};
use crate::operator::{Operator, OperatorError};
use crate::poly::diffpoly::{DiffPolynomial, DiffPolynomialRing};

/// A failure of a closure operation.
#[derive(Clone, Debug)]
pub enum ClosureError {
    /// No linear dependency was found among the derivatives of the result,
    /// even after widening the ansatz once.
    NoAnnihilatorFound { basis_size: usize },
    /// A precondition on the value at the origin was violated: the inner
    /// function of a composition must vanish there, the operand of a
    /// reciprocal must not.
    ZeroValueRequired,
    Domain(DomainError),
    Operator(OperatorError),
}

impl Display for ClosureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ClosureError::NoAnnihilatorFound { basis_size } => write!(
                f,
                "No annihilating operator was found over a basis of {} functions",
                basis_size
            ),
            ClosureError::ZeroValueRequired => {
                write!(f, "A precondition on the value at the origin was violated")
            }
            ClosureError::Domain(e) => write!(f, "{}", e),
            ClosureError::Operator(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ClosureError {}

impl From<DomainError> for ClosureError {
    fn from(e: DomainError) -> ClosureError {
        ClosureError::Domain(e)
    }
}

impl From<OperatorError> for ClosureError {
    fn from(e: OperatorError) -> ClosureError {
        ClosureError::Operator(e)
    }
}

type TowerFraction<C> = Fraction<DiffPolynomialRing<<C as Convertible>::Base>>;

/// The derivation rows of the companion basis `e, e', ..., e^(p-1)` of an
/// operator: `d(b_i) = sum_j rows[i][j] b_j`. The divisions by the leading
/// coefficient happen in the fraction field of the tower polynomial ring, so
/// the coefficient domain itself never divides.
fn symbolic_companion<C: Convertible>(
    domain: &C,
    sys: &mut ConversionSystem<C>,
    op: &Operator<C>,
) -> Result<Vec<Vec<TowerFraction<C>>>, ClosureError> {
    let p = op.order();
    let frac = sys.fraction_field();
    let lead = domain.to_poly(&op.coefficients()[p], sys)?;

    let mut rows = Vec::with_capacity(p);
    for i in 0..p {
        let mut row = vec![frac.zero(); p];
        if i + 1 < p {
            row[i + 1] = frac.one();
        } else {
            for (j, c) in op.coefficients()[..p].iter().enumerate() {
                let c = domain.to_poly(c, sys)?;
                if !c.is_zero() {
                    row[j] = frac.neg(&frac.to_element(c, lead.clone(), true));
                }
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Differentiate a coordinate vector over a derivation-stable basis:
/// `w_j = v_j' + sum_i v_i d[i][j]`.
fn move_vector<C: Convertible>(
    sys: &ConversionSystem<C>,
    d: &[Vec<TowerFraction<C>>],
    v: &[TowerFraction<C>],
) -> Vec<TowerFraction<C>> {
    let frac = sys.fraction_field();
    (0..v.len())
        .map(|j| {
            let mut w = sys.fraction_derivative(&v[j]);
            for (i, e) in v.iter().enumerate() {
                frac.add_mul_assign(&mut w, e, &d[i][j]);
            }
            w
        })
        .collect()
}

/// The canonical kernel vector of the column matrix `(v_0 ... v_k)`, with
/// the denominators of each row cleared first so that the elimination stays
/// fraction-free.
fn kernel_vector<C: Convertible>(
    sys: &ConversionSystem<C>,
    columns: &[Vec<TowerFraction<C>>],
) -> Option<Vec<DiffPolynomial<C::Base>>> {
    let poly_ring = sys.poly_ring().clone();
    let m = columns[0].len();

    let mut rows = Vec::with_capacity(m);
    for r in 0..m {
        let mut row = Vec::with_capacity(columns.len());
        for (ci, col) in columns.iter().enumerate() {
            let mut e = col[r].numerator().clone();
            for (cj, other) in columns.iter().enumerate() {
                if ci != cj {
                    e = e.mul(other[r].denominator());
                }
            }
            row.push(e);
        }
        rows.push(row);
    }

    let m = Matrix::from_nested_vec(rows, poly_ring.clone())
        .expect("Kernel candidate rows have equal length");
    canonical_kernel_vector(&poly_ring, m.right_kernel())
}

/// Search for the lowest-order linear dependency among the derivatives of
/// the coordinate vector `v0`, testing every order up to `bound`. Returns the
/// operator coefficients in the coefficient domain, constant term first.
fn annihilator_search<C: Convertible>(
    domain: &C,
    sys: &ConversionSystem<C>,
    d: &[Vec<TowerFraction<C>>],
    v0: Vec<TowerFraction<C>>,
    bound: usize,
) -> Result<Option<Vec<C::Element>>, ClosureError> {
    let mut columns = vec![v0];
    for _ in 1..=bound {
        let next = move_vector(sys, d, columns.last().unwrap());
        columns.push(next);

        if let Some(lambda) = kernel_vector(sys, &columns) {
            let mut coefficients = Vec::with_capacity(lambda.len());
            for l in &lambda {
                coefficients.push(domain.to_real(l, sys)?);
            }
            // a nonzero polynomial can still evaluate to the zero function
            // when the tower entries are algebraically dependent
            if coefficients.iter().any(|c| !C::is_zero(c)) {
                return Ok(Some(coefficients));
            }
        }
    }
    Ok(None)
}

/// [annihilator_search] with the natural bound of the basis size, retried
/// once with a doubled bound before giving up. The retry covers degenerate
/// kernels in which every syntactic dependency evaluates to the zero
/// operator.
fn search_with_retry<C: Convertible>(
    domain: &C,
    sys: &ConversionSystem<C>,
    d: &[Vec<TowerFraction<C>>],
    v0: &[TowerFraction<C>],
) -> Result<Vec<C::Element>, ClosureError> {
    let m = v0.len();
    if let Some(c) = annihilator_search(domain, sys, d, v0.to_vec(), m)? {
        return Ok(c);
    }
    if let Some(c) = annihilator_search(domain, sys, d, v0.to_vec(), 2 * m)? {
        return Ok(c);
    }
    Err(ClosureError::NoAnnihilatorFound { basis_size: m })
}

/// Build an element from operator coefficients and a rule for its Taylor
/// coefficients, requesting exactly as many terms as the jump order demands.
fn assemble<R: Convertible>(
    ring: &HolonomicRing<R>,
    coefficients: Vec<R::Element>,
    mut terms: impl FnMut(usize) -> Result<Constant<R>, ClosureError>,
) -> Result<HolonomicElement<R>, ClosureError> {
    let op = Operator::new(coefficients, ring.coefficient_ring().clone());
    let jump = op.jump_order()?;
    let mut initials = Vec::with_capacity(jump);
    for n in 0..jump {
        initials.push(terms(n)?);
    }
    Ok(ring.element(op, initials)?)
}

/// The sum of two holonomic elements.
pub fn sum<R: Convertible>(
    ring: &HolonomicRing<R>,
    f: &HolonomicElement<R>,
    g: &HolonomicElement<R>,
) -> Result<HolonomicElement<R>, ClosureError> {
    if f.operator().order() == 0 || f.is_provably_zero() {
        return Ok(g.clone());
    }
    if g.operator().order() == 0 || g.is_provably_zero() {
        return Ok(f.clone());
    }

    let domain = ring.coefficient_ring();
    let mut sys = ConversionSystem::new(domain);
    let cf = symbolic_companion(domain, &mut sys, f.operator())?;
    let cg = symbolic_companion(domain, &mut sys, g.operator())?;

    let p = f.operator().order();
    let q = g.operator().order();
    let frac = sys.fraction_field();

    // block diagonal derivation on the concatenated towers
    let mut d = vec![vec![frac.zero(); p + q]; p + q];
    for (i, row) in cf.into_iter().enumerate() {
        for (j, e) in row.into_iter().enumerate() {
            d[i][j] = e;
        }
    }
    for (i, row) in cg.into_iter().enumerate() {
        for (j, e) in row.into_iter().enumerate() {
            d[p + i][p + j] = e;
        }
    }
    let mut v0 = vec![frac.zero(); p + q];
    v0[0] = frac.one();
    v0[p] = frac.one();

    let coefficients = search_with_retry(domain, &sys, &d, &v0)?;
    let constants = domain.constants();
    assemble(ring, coefficients, |n| {
        Ok(constants.add(&f.sequence(n)?, &g.sequence(n)?))
    })
}

/// The product of two holonomic elements, over the basis of pairwise
/// products of the two derivative towers.
pub fn product<R: Convertible>(
    ring: &HolonomicRing<R>,
    f: &HolonomicElement<R>,
    g: &HolonomicElement<R>,
) -> Result<HolonomicElement<R>, ClosureError> {
    if f.operator().order() == 0 || f.is_provably_zero() || g.operator().order() == 0 {
        return Ok(ring.zero_element()?);
    }
    if g.is_provably_zero() {
        return Ok(ring.zero_element()?);
    }
    if let Some(c) = f.constant_value() {
        return Ok(ring.scale(g, &c)?);
    }
    if let Some(c) = g.constant_value() {
        return Ok(ring.scale(f, &c)?);
    }

    let domain = ring.coefficient_ring();
    let mut sys = ConversionSystem::new(domain);
    let cf = symbolic_companion(domain, &mut sys, f.operator())?;
    let cg = symbolic_companion(domain, &mut sys, g.operator())?;

    let p = f.operator().order();
    let q = g.operator().order();
    let frac = sys.fraction_field();
    let idx = |i: usize, j: usize| i * q + j;

    // d(f_i g_j) = f_i' g_j + f_i g_j', with the towers folding back through
    // their companion rows
    let mut d = vec![vec![frac.zero(); p * q]; p * q];
    for i in 0..p {
        for j in 0..q {
            for (k, e) in cf[i].iter().enumerate() {
                frac.add_assign(&mut d[idx(i, j)][idx(k, j)], e);
            }
            for (k, e) in cg[j].iter().enumerate() {
                frac.add_assign(&mut d[idx(i, j)][idx(i, k)], e);
            }
        }
    }
    let mut v0 = vec![frac.zero(); p * q];
    v0[idx(0, 0)] = frac.one();

    let coefficients = search_with_retry(domain, &sys, &d, &v0)?;
    let constants = domain.constants();
    assemble(ring, coefficients, |n| {
        let mut s = constants.zero();
        for k in 0..=n {
            constants.add_mul_assign(&mut s, &f.sequence(k)?, &g.sequence(n - k)?);
        }
        Ok(s)
    })
}

/// The composition `f(g(x))` with an inner function from the coefficient
/// domain. The inner function must vanish at the origin so that the result
/// is again a power series with computable initial terms.
pub fn compose<R: Convertible + Substitution>(
    ring: &HolonomicRing<R>,
    f: &HolonomicElement<R>,
    g: &R::Element,
) -> Result<HolonomicElement<R>, ClosureError> {
    let domain = ring.coefficient_ring();
    if domain.is_identity(g) {
        return Ok(f.clone());
    }

    let constants = domain.constants();
    if !<R::Constants as Ring>::is_zero(&domain.constant_term(g)?) {
        return Err(ClosureError::ZeroValueRequired);
    }
    if f.operator().order() == 0 || f.is_provably_zero() {
        return Ok(ring.zero_element()?);
    }
    if let Some(c) = f.constant_value() {
        return Ok(ring.constant_element(c)?);
    }
    if domain.is_constant(g) {
        // g vanishes identically, so the composition is the constant f(0)
        return Ok(ring.constant_element(f.sequence(0)?)?);
    }

    let mut sys = ConversionSystem::new(domain);
    let frac = sys.fraction_field();
    let p = f.operator().order();

    // substitute the inner function into the operator coefficients; the
    // basis f(g), f'(g), ..., f^(p-1)(g) differentiates through the chain
    // rule with the extra factor g'
    let gp = domain.to_poly(&domain.derivative(g), &mut sys)?;
    let mut substituted = Vec::with_capacity(p + 1);
    for c in f.operator().coefficients() {
        let s = domain.substitute(c, g)?;
        substituted.push(domain.to_poly(&s, &mut sys)?);
    }
    let lead = substituted[p].clone();

    let mut d = vec![vec![frac.zero(); p]; p];
    for i in 0..p {
        if i + 1 < p {
            d[i][i + 1] = frac.from_base(gp.clone());
        } else {
            for (j, c) in substituted[..p].iter().enumerate() {
                if !c.is_zero() {
                    d[i][j] = frac.neg(&frac.to_element(gp.mul(c), lead.clone(), true));
                }
            }
        }
    }
    let mut v0 = vec![frac.zero(); p];
    v0[0] = frac.one();

    let coefficients = search_with_retry(domain, &sys, &d, &v0)?;

    // initial terms through Faa di Bruno: the n-th derivative of f(g) is a
    // Bell polynomial combination of the derivatives of f and g at 0
    assemble(ring, coefficients, |n| {
        if n == 0 {
            return Ok(f.sequence(0)?);
        }
        let mut inner = Vec::with_capacity(n);
        for j in 1..=n {
            let c = domain.series_coefficient(g, j)?;
            let factor = constants.from_rational(&Rational::factorial(j as u64));
            inner.push(constants.mul(&c, &factor));
        }
        let mut s = constants.zero();
        for k in 1..=n {
            let bell = partial_bell(&constants, n, k, &inner);
            constants.add_mul_assign(&mut s, &f.initial_values(k)?, &bell);
        }
        Ok(constants.mul(
            &s,
            &constants.from_rational(&Rational::factorial(n as u64).inv()),
        ))
    })
}

/// The derivative of a holonomic element.
pub fn derivative<R: Convertible>(
    ring: &HolonomicRing<R>,
    f: &HolonomicElement<R>,
) -> Result<HolonomicElement<R>, ClosureError> {
    if f.operator().order() == 0 || f.constant_value().is_some() || f.is_provably_zero() {
        return Ok(ring.zero_element()?);
    }

    let domain = ring.coefficient_ring();
    let mut sys = ConversionSystem::new(domain);
    let d = symbolic_companion(domain, &mut sys, f.operator())?;

    let p = f.operator().order();
    let frac = sys.fraction_field();
    let mut e0 = vec![frac.zero(); p];
    e0[0] = frac.one();
    let v0 = move_vector(&sys, &d, &e0);

    let coefficients = search_with_retry(domain, &sys, &d, &v0)?;
    let constants = domain.constants();
    assemble(ring, coefficients, |n| {
        Ok(constants.mul(&f.sequence(n + 1)?, &constants.nth(n as i64 + 1)))
    })
}

/// The `times`-th derivative, by iterating [derivative].
pub fn derivative_times<R: Convertible>(
    ring: &HolonomicRing<R>,
    f: &HolonomicElement<R>,
    times: usize,
) -> Result<HolonomicElement<R>, ClosureError> {
    let mut cur = f.clone();
    for _ in 0..times {
        cur = derivative(ring, &cur)?;
    }
    Ok(cur)
}

/// Decide equality of two holonomic elements by proving that their
/// difference vanishes.
pub fn equals<R: Convertible>(
    ring: &HolonomicRing<R>,
    f: &HolonomicElement<R>,
    g: &HolonomicElement<R>,
) -> Result<bool, ClosureError> {
    if f == g {
        return Ok(true);
    }
    let minus = ring.scale(g, &ring.coefficient_ring().constants().nth(-1))?;
    let diff = sum(ring, f, &minus)?;
    Ok(diff.try_valuation()?.is_none())
}

/// The reciprocal `1/f`, as an element one level up the tower: it solves
/// `f y' + f' y = 0` with coefficients in the holonomic ring of `f`.
pub fn reciprocal<R: Convertible>(
    up: &HolonomicRing<HolonomicRing<R>>,
    f: &HolonomicElement<R>,
) -> Result<HolonomicElement<HolonomicRing<R>>, ClosureError> {
    let s_ring = up.coefficient_ring();
    let constants = s_ring.constants();

    let a0 = f.sequence(0)?;
    if <R::Constants as Ring>::is_zero(&a0) {
        return Err(ClosureError::ZeroValueRequired);
    }

    let fp = derivative(s_ring, f)?;
    let op = Operator::new(vec![fp, f.clone()], s_ring.clone());
    let jump = op.jump_order()?;

    // b_0 = 1/a_0 and a_0 b_n = -sum_{k=1}^{n} a_k b_{n-k}
    let b0 = constants
        .try_div(&constants.one(), &a0)
        .ok_or(ClosureError::Domain(DomainError::DivisionByNonUnit))?;
    let mut initials = vec![b0];
    for n in 1..jump {
        let mut s = constants.zero();
        for k in 1..=n {
            constants.add_mul_assign(&mut s, &f.sequence(k)?, &initials[n - k]);
        }
        let b = constants
            .try_div(&s, &a0)
            .ok_or(ClosureError::Domain(DomainError::DivisionByNonUnit))?;
        initials.push(constants.neg(&b));
    }

    Ok(up.element(op, initials)?)
}

/// The solution of `y' = u y` with `y(0) = 1`, the exponential of the
/// integral of `u`. Like the reciprocal it lives one level up the tower.
pub fn exp_integral<R: Convertible>(
    up: &HolonomicRing<HolonomicRing<R>>,
    u: &HolonomicElement<R>,
) -> Result<HolonomicElement<HolonomicRing<R>>, ClosureError> {
    let s_ring = up.coefficient_ring();
    let constants = s_ring.constants();

    let c0 = s_ring.scale(u, &constants.nth(-1))?;
    let c1 = s_ring.constant_element(constants.one())?;
    let op = Operator::new(vec![c0, c1], s_ring.clone());
    let jump = op.jump_order()?;

    // n b_n = sum_{k=0}^{n-1} u_k b_{n-1-k}
    let mut initials = vec![constants.one()];
    for n in 1..jump {
        let mut s = constants.zero();
        for k in 0..n {
            constants.add_mul_assign(&mut s, &u.sequence(k)?, &initials[n - 1 - k]);
        }
        let b = constants
            .try_div(&s, &constants.nth(n as i64))
            .ok_or(ClosureError::Domain(DomainError::DivisionByNonUnit))?;
        initials.push(b);
    }

    Ok(up.element(op, initials)?)
}

impl<R: Convertible> Ring for HolonomicRing<R> {
    type Element = HolonomicElement<R>;

    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        sum(self, a, b).unwrap_or_else(|e| panic!("Holonomic addition failed: {}", e))
    }

    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        self.add(a, &self.neg(b))
    }

    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        product(self, a, b).unwrap_or_else(|e| panic!("Holonomic multiplication failed: {}", e))
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
        self.scale(a, &self.coefficient_ring().constants().nth(-1))
            .unwrap_or_else(|e| panic!("Holonomic negation failed: {}", e))
    }

    fn zero(&self) -> Self::Element {
        self.zero_element()
            .unwrap_or_else(|e| panic!("The zero element could not be built: {}", e))
    }

    fn one(&self) -> Self::Element {
        self.nth(1)
    }

    fn nth(&self, n: i64) -> Self::Element {
        self.constant_element(self.coefficient_ring().constants().nth(n))
            .unwrap_or_else(|e| panic!("A constant element could not be built: {}", e))
    }

    fn pow(&self, b: &Self::Element, e: u64) -> Self::Element {
        let mut r = self.one();
        for _ in 0..e {
            self.mul_assign(&mut r, b);
        }
        r
    }

    fn is_zero(a: &Self::Element) -> bool {
        a.is_provably_zero()
    }

    fn is_one(&self, a: &Self::Element) -> bool {
        a.constant_value()
            .map_or(false, |c| self.coefficient_ring().constants().is_one(&c))
    }

    fn try_div(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element> {
        let constants = self.coefficient_ring().constants();
        if let Some(c) = b.constant_value() {
            let inv = constants.try_div(&constants.one(), &c)?;
            return self.scale(a, &inv).ok();
        }
        if a == b {
            return Some(self.one());
        }
        if a.is_provably_zero() {
            return Some(self.zero());
        }
        None
    }

    fn format<W: std::fmt::Write>(
        &self,
        element: &Self::Element,
        f: &mut W,
    ) -> Result<(), fmt::Error> {
        write!(f, "{}", element)
    }
}

impl<R: Convertible> EuclideanDomain for HolonomicRing<R> {
    fn rem(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        self.quot_rem(a, b).1
    }

    fn quot_rem(&self, a: &Self::Element, b: &Self::Element) -> (Self::Element, Self::Element) {
        match self.try_div(a, b) {
            Some(q) => (q, self.zero()),
            None => (self.zero(), a.clone()),
        }
    }

    fn gcd(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        if Self::is_zero(a) {
            return b.clone();
        }
        if Self::is_zero(b) || self.try_div(a, b).is_some() {
            return b.clone();
        }
        if self.try_div(b, a).is_some() {
            return a.clone();
        }
        self.one()
    }
}

impl<R: Convertible> FractionNormalization for HolonomicRing<R> {
    fn get_normalization_factor(&self, _a: &Self::Element) -> Self::Element {
        self.one()
    }
}

impl<R: Convertible> Derivable for HolonomicRing<R> {
    fn derivative(&self, e: &Self::Element) -> Self::Element {
        derivative(self, e).unwrap_or_else(|e| panic!("Holonomic differentiation failed: {}", e))
    }
}

impl<R: Convertible> SeriesDomain for HolonomicRing<R> {
    type Constants = R::Constants;

    fn constants(&self) -> Self::Constants {
        self.coefficient_ring().constants()
    }

    fn series_coefficient(
        &self,
        e: &Self::Element,
        n: usize,
    ) -> Result<Constant<R>, DomainError> {
        e.sequence(n).map_err(operator_to_domain)
    }

    fn valuation(&self, e: &Self::Element) -> Result<Option<usize>, DomainError> {
        e.try_valuation().map_err(operator_to_domain)
    }

    fn lift_constant(&self, c: &Constant<R>) -> Self::Element {
        self.constant_element(c.clone())
            .unwrap_or_else(|e| panic!("A constant element could not be built: {}", e))
    }

    fn is_constant(&self, e: &Self::Element) -> bool {
        e.constant_value().is_some()
    }
}

impl<R: Convertible> Substitution for HolonomicRing<R> {
    fn substitute(
        &self,
        _e: &Self::Element,
        _g: &Self::Element,
    ) -> Result<Self::Element, DomainError> {
        Err(DomainError::Unsupported(
            "Substitution into a holonomic coefficient domain",
        ))
    }
}

fn operator_to_domain(e: OperatorError) -> DomainError {
    match e {
        OperatorError::Domain(d) => d,
        OperatorError::InsufficientData { .. } => {
            DomainError::Unsupported("The sequence term is not determined by the initial data")
        }
        OperatorError::ZeroLeadingCoefficient { .. } => {
            DomainError::Unsupported("The recurrence has a vanishing leading coefficient")
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domains::fraction::RationalFunctionField;
    use crate::domains::Field;
    use crate::domains::rational::Rational;

    fn setup() -> (HolonomicRing<RationalFunctionField>, RationalFunctionField) {
        let field = RationalFunctionField::rational_functions();
        (HolonomicRing::new(field.clone()), field)
    }

    fn exponential(
        ring: &HolonomicRing<RationalFunctionField>,
        field: &RationalFunctionField,
    ) -> HolonomicElement<RationalFunctionField> {
        ring.element_from_coefficients(
            vec![field.nth(-1), field.one()],
            vec![Rational::one()],
        )
        .unwrap()
    }

    fn sine(
        ring: &HolonomicRing<RationalFunctionField>,
        field: &RationalFunctionField,
    ) -> HolonomicElement<RationalFunctionField> {
        ring.element_from_coefficients(
            vec![field.one(), field.zero(), field.one()],
            vec![Rational::zero(), Rational::one()],
        )
        .unwrap()
    }

    fn cosine(
        ring: &HolonomicRing<RationalFunctionField>,
        field: &RationalFunctionField,
    ) -> HolonomicElement<RationalFunctionField> {
        ring.element_from_coefficients(
            vec![field.one(), field.zero(), field.one()],
            vec![Rational::one(), Rational::zero()],
        )
        .unwrap()
    }

    #[test]
    fn sum_of_sine_and_cosine() {
        let (ring, field) = setup();
        let h = sum(&ring, &sine(&ring, &field), &cosine(&ring, &field)).unwrap();

        // sin + cos = 1 + x - x^2/2 - x^3/6 + x^4/24 + ...
        assert_eq!(h.sequence(0).unwrap(), Rational::one());
        assert_eq!(h.sequence(1).unwrap(), Rational::one());
        assert_eq!(h.sequence(2).unwrap(), Rational::new(-1, 2));
        assert_eq!(h.sequence(3).unwrap(), Rational::new(-1, 6));
        assert_eq!(h.sequence(4).unwrap(), Rational::new(1, 24));
    }

    #[test]
    fn product_of_exponentials() {
        let (ring, field) = setup();
        let e = exponential(&ring, &field);
        let h = product(&ring, &e, &e).unwrap();

        // exp(x)^2 = exp(2x), so the n-th coefficient is 2^n/n!
        for n in 0..6u64 {
            let expected = Rational::new(2, 1).pow(n) * Rational::factorial(n).inv();
            assert_eq!(h.sequence(n as usize).unwrap(), expected);
        }
    }

    #[test]
    fn sum_with_zero_is_identity() {
        let (ring, field) = setup();
        let s = sine(&ring, &field);
        let z = ring.zero_element().unwrap();
        assert_eq!(sum(&ring, &s, &z).unwrap(), s);
        assert_eq!(sum(&ring, &z, &s).unwrap(), s);
    }

    #[test]
    fn derivative_of_sine_is_cosine() {
        let (ring, field) = setup();
        let d = derivative(&ring, &sine(&ring, &field)).unwrap();
        let c = cosine(&ring, &field);
        for n in 0..6 {
            assert_eq!(d.sequence(n).unwrap(), c.sequence(n).unwrap());
        }

        // two more derivatives bring back -sin
        let s = sine(&ring, &field);
        let d3 = derivative_times(&ring, &s, 3).unwrap();
        for n in 0..6 {
            assert_eq!(
                d3.sequence(n).unwrap(),
                -c.sequence(n).unwrap()
            );
        }
    }

    #[test]
    fn pythagorean_identity() {
        let (ring, field) = setup();
        let s = sine(&ring, &field);
        let c = cosine(&ring, &field);
        let s2 = product(&ring, &s, &s).unwrap();
        let c2 = product(&ring, &c, &c).unwrap();
        let total = sum(&ring, &s2, &c2).unwrap();

        let one = ring.constant_element(Rational::one()).unwrap();
        assert!(equals(&ring, &total, &one).unwrap());

        for n in 0..=20 {
            let expected = if n == 0 {
                Rational::one()
            } else {
                Rational::zero()
            };
            assert_eq!(total.sequence(n).unwrap(), expected);
        }
    }

    #[test]
    fn double_angle_identity() {
        let (ring, field) = setup();
        let s = sine(&ring, &field);
        let c = cosine(&ring, &field);
        let p = product(&ring, &s, &c).unwrap();

        let twice = field.polynomial(&[Rational::zero(), Rational::new(2, 1)]);
        let h = compose(&ring, &s, &twice).unwrap();

        // sin(2x) = 2 sin(x) cos(x)
        for n in 0..=20 {
            assert_eq!(
                h.sequence(n).unwrap(),
                Rational::new(2, 1) * p.sequence(n).unwrap()
            );
        }
    }

    #[test]
    fn closure_operators_are_minimal() {
        let (ring, field) = setup();
        let e = exponential(&ring, &field);
        let s = sine(&ring, &field);

        // exp(x)^2 already satisfies y' - 2y = 0
        assert_eq!(product(&ring, &e, &e).unwrap().operator().order(), 1);
        // sin + cos still needs order two
        let t = sum(&ring, &s, &cosine(&ring, &field)).unwrap();
        assert_eq!(t.operator().order(), 2);
    }

    #[test]
    fn composition_with_a_rational_inner_function() {
        let (ring, field) = setup();
        let e = exponential(&ring, &field);

        // g = x/(1-x), so h = exp(x/(1-x)) with h0..h3 = 1, 1, 3/2, 13/6
        let x = field.polynomial(&[Rational::zero(), Rational::one()]);
        let den = field.polynomial(&[Rational::one(), Rational::new(-1, 1)]);
        let g = field.div(&x, &den);

        let h = compose(&ring, &e, &g).unwrap();
        assert_eq!(h.sequence(0).unwrap(), Rational::one());
        assert_eq!(h.sequence(1).unwrap(), Rational::one());
        assert_eq!(h.sequence(2).unwrap(), Rational::new(3, 2));
        assert_eq!(h.sequence(3).unwrap(), Rational::new(13, 6));
    }

    #[test]
    fn composition_with_the_identity_is_trivial() {
        let (ring, field) = setup();
        let s = sine(&ring, &field);
        let h = compose(&ring, &s, &field.var()).unwrap();
        assert_eq!(h, s);
    }

    #[test]
    fn composition_requires_a_vanishing_inner_function() {
        let (ring, field) = setup();
        let s = sine(&ring, &field);
        let g = field.polynomial(&[Rational::one(), Rational::one()]);
        assert!(matches!(
            compose(&ring, &s, &g),
            Err(ClosureError::ZeroValueRequired)
        ));
    }

    #[test]
    fn reciprocal_of_the_exponential() {
        let (ring, field) = setup();
        let up = HolonomicRing::new(ring.clone());
        let r = reciprocal(&up, &exponential(&ring, &field)).unwrap();

        // 1/exp(x) = exp(-x)
        for n in 0..5u64 {
            let expected = Rational::new(-1, 1).pow(n) * Rational::factorial(n).inv();
            assert_eq!(r.sequence(n as usize).unwrap(), expected);
        }
    }

    #[test]
    fn reciprocal_requires_a_unit_at_the_origin() {
        let (ring, field) = setup();
        let up = HolonomicRing::new(ring.clone());
        assert!(matches!(
            reciprocal(&up, &sine(&ring, &field)),
            Err(ClosureError::ZeroValueRequired)
        ));
    }

    #[test]
    fn sum_one_level_up_the_tower() {
        let (ring, field) = setup();
        let e = exponential(&ring, &field);
        let up = HolonomicRing::new(ring.clone());

        let lifted = up.from_base(&e).unwrap();
        let inverse = reciprocal(&up, &e).unwrap();
        let h = sum(&up, &lifted, &inverse).unwrap();

        // exp(x) + exp(-x) = 2 cosh(x)
        assert_eq!(h.sequence(0).unwrap(), Rational::new(2, 1));
        assert_eq!(h.sequence(1).unwrap(), Rational::zero());
        assert_eq!(h.sequence(2).unwrap(), Rational::one());
        assert_eq!(h.sequence(3).unwrap(), Rational::zero());
        assert_eq!(h.sequence(4).unwrap(), Rational::new(1, 12));
    }

    #[test]
    fn exponential_of_an_integral() {
        let (ring, _) = setup();
        let up = HolonomicRing::new(ring.clone());

        // u = 1 gives exp(x)
        let u = ring.constant_element(Rational::one()).unwrap();
        let h = exp_integral(&up, &u).unwrap();
        for n in 0..5u64 {
            assert_eq!(
                h.sequence(n as usize).unwrap(),
                Rational::factorial(n).inv()
            );
        }
    }
}
