//! Guessing lower-depth forms of differential-algebraic relations.
//!
//! Two searches are provided. [guess_homogeneous] peels homogeneous
//! relations: substituting the logarithmic-derivative polynomials for the
//! variables rewrites a relation for `f` as one for `u = f'/f`, and
//! repeating this while the result stays homogeneous often ends in a linear
//! relation whose solution rebuilds `f` through iterated exponentials of
//! integrals. [guess_linear_shapes] goes the other way: it enumerates
//! parametric nested operators of bounded order, reduces each candidate to
//! a differential polynomial with undetermined coefficients, and matches it
//! against a target relation; the resulting polynomial systems are handed
//! to an [EliminationService] for consistency checking.

use std::fmt::{self, Display, Formatter};

use crate::combinatorics::CompositionIterator;
use crate::diffalg::{linear_relation, reduce_depth_once, ReductionError, ReductionOutcome};
use crate::domains::fraction::{Fraction, FractionField};
use crate::domains::rational::{Q, Rational, RationalField};
use crate::domains::{ConstantRing, DomainError, Ring, SeriesDomain};
use crate::element::{Constant, HolonomicElement, HolonomicRing};
use crate::operator::Operator;
use crate::poly::diffpoly::{DiffPolynomial, DiffPolynomialRing, ParameterRing};

use crate::conversion::{ConversionSystem, Convertible};

/// The field of rational functions in the undetermined parameters. Sequence
/// recurrences of parametric elements divide by symbolic leading terms, so
/// the search works over fractions and clears denominators only when the
/// equations are collected.
pub type ParameterField = FractionField<ParameterRing>;

impl ConstantRing for ParameterField {
    fn as_rational(&self, e: &Fraction<ParameterRing>) -> Option<Rational> {
        if e.numerator().is_constant() && e.denominator().is_constant() {
            Some(&e.numerator().constant_coefficient() / &e.denominator().constant_coefficient())
        } else {
            None
        }
    }

    fn from_rational(&self, r: &Rational) -> Fraction<ParameterRing> {
        self.from_base(self.base_ring().constant(r.clone()))
    }
}

// Parameters are constants with respect to the series variable.
impl SeriesDomain for ParameterField {
    type Constants = ParameterField;

    fn constants(&self) -> ParameterField {
        self.clone()
    }

    fn series_coefficient(
        &self,
        e: &Fraction<ParameterRing>,
        n: usize,
    ) -> Result<Fraction<ParameterRing>, DomainError> {
        if n == 0 {
            Ok(e.clone())
        } else {
            Ok(self.zero())
        }
    }

    fn valuation(&self, e: &Fraction<ParameterRing>) -> Result<Option<usize>, DomainError> {
        if Self::is_zero(e) {
            Ok(None)
        } else {
            Ok(Some(0))
        }
    }

    fn lift_constant(&self, c: &Fraction<ParameterRing>) -> Fraction<ParameterRing> {
        c.clone()
    }

    fn is_constant(&self, _: &Fraction<ParameterRing>) -> bool {
        true
    }
}

impl Convertible for ParameterField {
    type Base = ParameterField;

    fn conversion_base(&self) -> ParameterField {
        self.clone()
    }

    fn to_poly(
        &self,
        e: &Fraction<ParameterRing>,
        sys: &mut ConversionSystem<Self>,
    ) -> Result<DiffPolynomial<ParameterField>, DomainError> {
        Ok(sys.poly_ring().constant(e.clone()))
    }

    fn to_real(
        &self,
        p: &DiffPolynomial<ParameterField>,
        _sys: &ConversionSystem<Self>,
    ) -> Result<Fraction<ParameterRing>, DomainError> {
        if !p.is_constant() {
            return Err(DomainError::Unsupported(
                "A parameter domain registers no tower variables",
            ));
        }
        Ok(p.constant_coefficient())
    }
}

/// A failure of the guessing search.
#[derive(Clone, Debug)]
pub enum GuessError {
    /// Not enough initial terms to pin down the transformed element.
    InsufficientData { needed: usize },
    /// The constant term vanishes, so the logarithmic derivative has no
    /// power series at the origin.
    ZeroValueRequired,
    Reduction(ReductionError),
    Domain(DomainError),
}

impl Display for GuessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GuessError::InsufficientData { needed } => {
                write!(f, "The search needs {} initial terms", needed)
            }
            GuessError::ZeroValueRequired => {
                write!(f, "The constant term must not vanish")
            }
            GuessError::Reduction(e) => write!(f, "{}", e),
            GuessError::Domain(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GuessError {}

impl From<ReductionError> for GuessError {
    fn from(e: ReductionError) -> GuessError {
        GuessError::Reduction(e)
    }
}

impl From<DomainError> for GuessError {
    fn from(e: DomainError) -> GuessError {
        GuessError::Domain(e)
    }
}

/// The polynomial expressing `f^(n)/f` in the derivatives of the
/// logarithmic derivative `u = f'/f`: `E_1 = u_0` and
/// `E_n = E_{n-1}' + u_0 E_{n-1}`.
pub fn exponential_polynomial<R: Ring>(
    ring: &DiffPolynomialRing<R>,
    n: usize,
) -> DiffPolynomial<R> {
    assert!(n >= 1, "The exponential polynomials start at index 1");

    let base = ring.coefficient_ring().clone();
    let mut e = ring.var(0);
    for _ in 1..n {
        let d = e.derivative_with(|_| base.zero(), |v| ring.var(v + 1));
        e = d.add(&ring.var(0).mul(&e));
    }
    e
}

/// True iff every term has the same total degree.
pub fn is_homogeneous<R: Ring>(p: &DiffPolynomial<R>) -> bool {
    let mut degrees = p
        .terms()
        .map(|(e, _)| e.iter().map(|&x| x as u64).sum::<u64>());
    match degrees.next() {
        None => false,
        Some(d) => degrees.all(|x| x == d),
    }
}

/// Substitute `y_0 -> 1` and `y_i -> E_i` while the relation stays
/// homogeneous of degree above one, counting the substitutions. Each pass
/// rewrites a relation for `f` as one for its logarithmic derivative.
pub fn simplify_homogeneous<R: Ring>(p: &DiffPolynomial<R>) -> (DiffPolynomial<R>, usize) {
    let ring = p.ring().clone();
    let mut cur = p.clone();
    let mut iterations = 0;

    while is_homogeneous(&cur) && cur.total_degree() > 1 {
        let order = cur.max_variable().unwrap_or(0);
        let subs: Vec<DiffPolynomial<R>> = (0..=order)
            .map(|i| {
                if i == 0 {
                    ring.one()
                } else {
                    exponential_polynomial(&ring, i)
                }
            })
            .collect();
        cur = cur.evaluate_in(&ring, |c| ring.constant(c.clone()), |v| subs[v].clone());
        iterations += 1;
    }
    (cur, iterations)
}

/// Taylor terms of the innermost logarithmic derivative, `depth` levels
/// down, from Taylor terms of the function itself.
///
/// Each level divides out the constant term and reads the next terms off
/// the exponential polynomials, so `init[0]` must be a unit at every level.
pub fn build_initial_from_homogeneous<C: ConstantRing>(
    constants: &C,
    init: &[C::Element],
    order: usize,
    depth: usize,
) -> Result<Vec<C::Element>, GuessError> {
    // to derivative values at the origin
    let mut values = Vec::with_capacity(init.len());
    for (i, c) in init.iter().enumerate() {
        values.push(constants.mul(c, &constants.from_rational(&Rational::factorial(i as u64))));
    }
    let values = transform_values(constants, &values, order, depth)?;

    // back to Taylor terms
    let mut terms = Vec::with_capacity(values.len());
    for (i, v) in values.iter().enumerate() {
        let f = constants.from_rational(&Rational::factorial(i as u64));
        let t = constants
            .try_div(v, &f)
            .ok_or(GuessError::Domain(DomainError::DivisionByNonUnit))?;
        terms.push(t);
    }
    Ok(terms)
}

fn transform_values<C: ConstantRing>(
    constants: &C,
    init: &[C::Element],
    order: usize,
    depth: usize,
) -> Result<Vec<C::Element>, GuessError> {
    if init.len() < order + depth {
        return Err(GuessError::InsufficientData {
            needed: order + depth,
        });
    }
    if depth == 0 {
        return Ok(init[..order].to_vec());
    }

    let inv0 = constants
        .try_div(&constants.one(), &init[0])
        .ok_or(GuessError::ZeroValueRequired)?;

    let len = order + depth - 1;
    let e_ring = DiffPolynomialRing::new(Q, "u");
    let mut next: Vec<C::Element> = Vec::with_capacity(len);
    next.push(constants.mul(&init[1], &inv0));
    for i in 1..len {
        // u^(i)(0) = f^(i+1)(0)/f(0) minus the lower-order part of E_{i+1}
        let e = exponential_polynomial(&e_ring, i + 1);
        let tail = e.sub(&e_ring.var(i));
        let correction = tail.evaluate_in(
            constants,
            |q| constants.from_rational(q),
            |v| next[v].clone(),
        );
        let mut term = constants.mul(&init[i + 1], &inv0);
        constants.sub_assign(&mut term, &correction);
        next.push(term);
    }

    transform_values(constants, &next, order, depth - 1)
}

/// The result of the homogeneous simplification.
#[derive(Clone, Debug)]
pub enum GuessOutcome<R: SeriesDomain> {
    /// The relation collapsed to a linear one for the innermost logarithmic
    /// derivative. Building an element from the coefficients and initials
    /// and applying [closure::exp_integral](crate::closure::exp_integral)
    /// `iterations` times rebuilds the original function.
    Linear {
        coefficients: Vec<R::Element>,
        initials: Vec<Constant<R>>,
        iterations: usize,
    },
    /// The simplification stopped without reaching a linear relation.
    Partial {
        polynomial: DiffPolynomial<R>,
        iterations: usize,
    },
}

/// Peel a homogeneous relation down to a linear one where possible. `init`
/// holds Taylor terms of the function the relation annihilates.
pub fn guess_homogeneous<R: SeriesDomain>(
    p: &DiffPolynomial<R>,
    init: &[Constant<R>],
) -> Result<GuessOutcome<R>, GuessError> {
    let (reduced, iterations) = simplify_homogeneous(p);
    if reduced.total_degree() != 1 || !is_homogeneous(&reduced) {
        return Ok(GuessOutcome::Partial {
            polynomial: reduced,
            iterations,
        });
    }

    let order = reduced.max_variable().unwrap_or(0);
    let coefficients: Vec<R::Element> = (0..=order)
        .map(|i| {
            let mut e = vec![0u16; i + 1];
            e[i] = 1;
            reduced.coefficient_of(&e)
        })
        .collect();

    let constants = p.ring().coefficient_ring().constants();
    let initials = build_initial_from_homogeneous(&constants, init, order, iterations)?;
    Ok(GuessOutcome::Linear {
        coefficients,
        initials,
        iterations,
    })
}

/// An elimination backend for the polynomial systems of the shape search.
pub trait EliminationService {
    /// Return a generating set of the ideal of the system after
    /// elimination. A basis containing a nonzero constant marks the system
    /// as inconsistent.
    fn solve_system(
        &self,
        system: &[DiffPolynomial<RationalField>],
    ) -> Vec<DiffPolynomial<RationalField>>;
}

/// A consistent shape found by [guess_linear_shapes].
pub struct GuessCandidate {
    /// The orders of the parametric operator coefficients.
    pub shape: Vec<usize>,
    /// The parametric nested element whose reduction matched the target.
    pub element: HolonomicElement<HolonomicRing<ParameterField>>,
    /// The eliminated equation system constraining the parameters.
    pub basis: Vec<DiffPolynomial<RationalField>>,
}

/// Search for a nested operator of bounded order whose reduction matches a
/// target differential polynomial with rational coefficients.
///
/// The orders of the candidate coefficients run over the weak compositions
/// of `degree_budget` into `order_bound + 1` parts, capped at
/// `shape_budget` shapes. For each shape the coefficients are built from
/// fresh parameters, the candidate is reduced, a global scale is matched on
/// a parameter-free coefficient, and the per-monomial differences together
/// with the surplus initial terms form the system handed to the solver.
/// With `stop_at_first` the search returns as soon as one consistent shape
/// is found. `init` holds Taylor terms of the target function.
pub fn guess_linear_shapes(
    target: &DiffPolynomial<RationalField>,
    init: &[Rational],
    order_bound: usize,
    degree_budget: usize,
    shape_budget: usize,
    solver: &impl EliminationService,
    stop_at_first: bool,
) -> Result<Vec<GuessCandidate>, GuessError> {
    let params = ParameterField::new(ParameterRing::parameters());
    let lower = HolonomicRing::new(params);
    let upper = HolonomicRing::new(lower.clone());

    let mut candidates = vec![];
    let mut examined = 0;
    let mut shapes = CompositionIterator::new(degree_budget, order_bound + 1);
    while let Some(shape) = shapes.next() {
        if examined == shape_budget {
            break;
        }
        examined += 1;

        let shape = shape.to_vec();
        if let Some(c) = try_shape(target, init, &shape, &lower, &upper, solver)? {
            candidates.push(c);
            if stop_at_first {
                break;
            }
        }
    }
    Ok(candidates)
}

fn parameter(field: &ParameterField, index: usize) -> Fraction<ParameterRing> {
    field.from_base(field.base_ring().var(index))
}

/// Test one composition of coefficient orders. `None` marks a shape that is
/// skipped: degenerate, not reducible, or inconsistent with the target.
fn try_shape(
    target: &DiffPolynomial<RationalField>,
    init: &[Rational],
    shape: &[usize],
    lower: &HolonomicRing<ParameterField>,
    upper: &HolonomicRing<HolonomicRing<ParameterField>>,
    solver: &impl EliminationService,
) -> Result<Option<GuessCandidate>, GuessError> {
    let field = lower.coefficient_ring().clone();
    let mut fresh = 0usize;

    // parametric coefficient functions, one derivative tower each
    let mut coefficients = Vec::with_capacity(shape.len());
    for &order in shape {
        if order == 0 {
            coefficients.push(lower.zero_element()?);
            continue;
        }

        let mut ops = Vec::with_capacity(order + 1);
        for _ in 0..order {
            ops.push(parameter(&field, fresh));
            fresh += 1;
        }
        ops.push(field.one());
        let op = Operator::new(ops, field.clone());

        let jump = match op.jump_order() {
            Ok(j) => j,
            Err(_) => return Ok(None),
        };
        let mut initials = Vec::with_capacity(jump);
        for _ in 0..jump {
            initials.push(parameter(&field, fresh));
            fresh += 1;
        }
        match lower.element(op, initials) {
            Ok(e) => coefficients.push(e),
            Err(_) => return Ok(None),
        }
    }

    let op = Operator::new(coefficients, lower.clone());
    if op.order() == 0 {
        return Ok(None);
    }
    let jump = match op.jump_order() {
        Ok(j) => j,
        Err(_) => return Ok(None),
    };
    if init.len() < jump {
        return Err(GuessError::InsufficientData { needed: jump });
    }
    let initials: Vec<Fraction<ParameterRing>> =
        init.iter().take(jump).map(|r| field.from_rational(r)).collect();
    let f = match upper.element(op, initials) {
        Ok(f) => f,
        Err(_) => return Ok(None),
    };

    let reduced = match reduce_depth_once(&linear_relation(&f)) {
        Ok(ReductionOutcome::Reduced(q)) => q,
        Ok(ReductionOutcome::Incomplete(_)) | Err(_) => return Ok(None),
    };

    // fix the global scale on a parameter-free coefficient
    let mut scale = Rational::one();
    for (e, c) in reduced.terms() {
        if let Some(v) = field.as_rational(c) {
            if !v.is_zero() {
                let t = target.coefficient_of(e);
                if t.is_zero() {
                    return Ok(None);
                }
                scale = &t / &v;
                break;
            }
        }
    }

    let mut system: Vec<DiffPolynomial<RationalField>> = vec![];
    for (e, c) in reduced.terms() {
        // scale * c - target coefficient, cleared of the denominator
        let t = target.coefficient_of(e);
        let eq = c
            .numerator()
            .mul_coeff(&scale)
            .sub(&c.denominator().mul_coeff(&t));
        if !eq.is_zero() {
            system.push(eq);
        }
    }

    // a target monomial the reduction cannot produce rules the shape out
    for (e, t) in target.terms() {
        if !t.is_zero() && ParameterField::is_zero(&reduced.coefficient_of(e)) {
            return Ok(None);
        }
    }

    // surplus initial terms must match as well
    for (n, t) in init.iter().enumerate().skip(f.jump_order()) {
        match f.sequence(n) {
            Ok(c) => {
                let eq = c.numerator().sub(&c.denominator().mul_coeff(t));
                if !eq.is_zero() {
                    system.push(eq);
                }
            }
            Err(_) => break,
        }
    }

    let basis = solver.solve_system(&system);
    if basis.iter().any(|b| b.is_constant() && !b.is_zero()) {
        return Ok(None);
    }
    Ok(Some(GuessCandidate {
        shape: shape.to_vec(),
        element: f,
        basis,
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domains::fraction::RationalFunctionField;

    fn u_ring() -> DiffPolynomialRing<RationalField> {
        DiffPolynomialRing::new(Q, "u")
    }

    #[test]
    fn exponential_polynomials_follow_the_recurrence() {
        let r = u_ring();

        assert_eq!(exponential_polynomial(&r, 1), r.var(0));

        // E2 = u1 + u0^2
        let e2 = exponential_polynomial(&r, 2);
        assert_eq!(e2, r.var(1).add(&r.var(0).pow(2)));

        // E3 = u2 + 3 u0 u1 + u0^3
        let e3 = exponential_polynomial(&r, 3);
        let expected = r
            .var(2)
            .add(&r.var(0).mul(&r.var(1)).mul_coeff(&Rational::new(3, 1)))
            .add(&r.var(0).pow(3));
        assert_eq!(e3, expected);
    }

    fn bell_taylor() -> Vec<Rational> {
        // exp(exp(x) - 1), the exponential generating function of the Bell
        // numbers 1, 1, 2, 5, 15
        vec![
            Rational::one(),
            Rational::one(),
            Rational::one(),
            Rational::new(5, 6),
            Rational::new(5, 8),
        ]
    }

    /// The relation y0 y2 - y1^2 - y0 y1 of exp(exp(x) - 1) over the
    /// rational functions.
    fn bell_relation() -> DiffPolynomial<RationalFunctionField> {
        let field = RationalFunctionField::rational_functions();
        let r = DiffPolynomialRing::new(field, "y");
        r.var(0)
            .mul(&r.var(2))
            .sub(&r.var(1).pow(2))
            .sub(&r.var(0).mul(&r.var(1)))
    }

    #[test]
    fn homogeneous_relation_collapses_to_linear() {
        let p = bell_relation();
        let field = p.ring().coefficient_ring().clone();

        match guess_homogeneous(&p, &bell_taylor()).unwrap() {
            GuessOutcome::Linear {
                coefficients,
                initials,
                iterations,
            } => {
                // u1 - u0: the logarithmic derivative is exp
                assert_eq!(iterations, 1);
                assert_eq!(coefficients.len(), 2);
                assert_eq!(coefficients[0], field.neg(&field.one()));
                assert_eq!(coefficients[1], field.one());
                assert_eq!(initials, vec![Rational::one()]);
            }
            GuessOutcome::Partial { .. } => panic!("The Bell relation must linearize"),
        }
    }

    #[test]
    fn linear_relations_pass_through_unchanged() {
        let field = RationalFunctionField::rational_functions();
        let r = DiffPolynomialRing::new(field, "y");
        let p = r.var(1).sub(&r.var(0));

        match guess_homogeneous(&p, &[Rational::one(), Rational::one()]).unwrap() {
            GuessOutcome::Linear {
                initials,
                iterations,
                ..
            } => {
                assert_eq!(iterations, 0);
                assert_eq!(initials, vec![Rational::one()]);
            }
            GuessOutcome::Partial { .. } => panic!("A linear relation must pass through"),
        }
    }

    #[test]
    fn inhomogeneous_relations_come_back_partial() {
        let field = RationalFunctionField::rational_functions();
        let r = DiffPolynomialRing::new(field, "y");
        let p = r.var(0).pow(2).add(&r.var(1));

        match guess_homogeneous(&p, &[Rational::one()]).unwrap() {
            GuessOutcome::Partial { iterations, .. } => assert_eq!(iterations, 0),
            GuessOutcome::Linear { .. } => panic!("An inhomogeneous relation cannot linearize"),
        }
    }

    #[test]
    fn initial_transformation_needs_enough_terms() {
        match build_initial_from_homogeneous(&Q, &[Rational::one()], 1, 1) {
            Err(GuessError::InsufficientData { needed }) => assert_eq!(needed, 2),
            r => panic!("Expected an insufficient-data failure, got {:?}", r.is_ok()),
        }
    }

    #[test]
    fn initial_transformation_needs_a_unit() {
        match build_initial_from_homogeneous(&Q, &[Rational::zero(), Rational::one()], 1, 1) {
            Err(GuessError::ZeroValueRequired) => {}
            r => panic!("Expected a zero-value failure, got {:?}", r.is_ok()),
        }
    }

    /// A solver that probes the system at one parameter assignment: the
    /// system is reported consistent iff every equation vanishes there.
    struct PointProbe(Vec<Rational>);

    impl EliminationService for PointProbe {
        fn solve_system(
            &self,
            system: &[DiffPolynomial<RationalField>],
        ) -> Vec<DiffPolynomial<RationalField>> {
            let vanishes = system.iter().all(|p| {
                p.evaluate_in(
                    &Q,
                    |c| c.clone(),
                    |v| self.0.get(v).cloned().unwrap_or_else(Rational::zero),
                )
                .is_zero()
            });
            if vanishes {
                vec![]
            } else {
                let ring = ParameterRing::parameters();
                vec![ring.one()]
            }
        }
    }

    fn bell_target() -> DiffPolynomial<RationalField> {
        let r = DiffPolynomialRing::new(Q, "y");
        r.var(0)
            .mul(&r.var(2))
            .sub(&r.var(1).pow(2))
            .sub(&r.var(0).mul(&r.var(1)))
    }

    #[test]
    fn shape_search_finds_the_nested_exponential() {
        // parameters per shape [1, 1]: a0, i0 for the first coefficient and
        // a1, i1 for the second, each coefficient solving y' + a y = 0. The
        // point a0 = 0, i0 = -1, a1 = 1, i1 = 1 encodes the coefficients -1
        // and exp(-x), whose operator -f + exp(-x) f' = 0 is the Bell
        // relation f' = exp(x) f.
        let probe = PointProbe(vec![
            Rational::zero(),
            -Rational::one(),
            Rational::one(),
            Rational::one(),
        ]);

        let found = guess_linear_shapes(&bell_target(), &bell_taylor(), 1, 2, 16, &probe, false)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].shape, vec![1, 1]);
        assert!(found[0].basis.is_empty());
    }

    #[test]
    fn the_shape_budget_caps_the_search() {
        let probe = PointProbe(vec![]);
        let found = guess_linear_shapes(&bell_target(), &bell_taylor(), 1, 2, 1, &probe, false)
            .unwrap();
        assert!(found.is_empty());
    }
}
