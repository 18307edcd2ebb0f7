//! Reduction of nested holonomic elements to differential-algebraic
//! relations over their base domain.
//!
//! A depth-2 element satisfies a linear relation whose coefficients are
//! themselves holonomic. [reduce_depth_once] eliminates those coefficients:
//! every distinct one spans a derivative tower, the relation becomes a
//! coordinate vector over the generated basis, and the determinant of the
//! vector together with its first derivatives is an annihilating
//! differential polynomial over the base domain. Coefficients that are
//! scalar combinations of an existing tower member fold into that member's
//! coordinate first, so the determinant stays as small as the data allows.
//!
//! The same tower polynomials also express the derivatives of a reciprocal
//! and of a compositional inverse, which turns a known relation for `f` into
//! relations for `1/f` and for the inverse function of `f`.

use std::fmt::{self, Display, Formatter};

use smallvec::SmallVec;

use crate::closure::{self, ClosureError};
use crate::combinatorics::partial_bell;
use crate::domains::fraction::{RationalFunction, RationalFunctionField};
use crate::domains::rational::RationalField;
use crate::domains::{Derivable, DomainError, Ring, SeriesDomain};
use crate::element::{Constant, HolonomicElement, HolonomicRing};
use crate::matrix::Matrix;
use crate::operator::OperatorError;
use crate::poly::diffpoly::{DiffPolynomial, DiffPolynomialRing, Exponents};
use crate::poly::univariate::UnivariatePolynomial;

use crate::conversion::Convertible;

/// A failure of the reduction pipeline.
#[derive(Clone, Debug)]
pub enum ReductionError {
    Closure(ClosureError),
    Domain(DomainError),
    Operator(OperatorError),
}

impl Display for ReductionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ReductionError::Closure(e) => write!(f, "{}", e),
            ReductionError::Domain(e) => write!(f, "{}", e),
            ReductionError::Operator(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ReductionError {}

impl From<ClosureError> for ReductionError {
    fn from(e: ClosureError) -> ReductionError {
        ReductionError::Closure(e)
    }
}

impl From<DomainError> for ReductionError {
    fn from(e: DomainError) -> ReductionError {
        ReductionError::Domain(e)
    }
}

impl From<OperatorError> for ReductionError {
    fn from(e: OperatorError) -> ReductionError {
        ReductionError::Operator(e)
    }
}

/// The result of one elimination pass.
#[derive(Clone, Debug)]
pub enum ReductionOutcome<R: Convertible> {
    /// A differential polynomial over the base domain that annihilates the
    /// same function.
    Reduced(DiffPolynomial<R>),
    /// The relation has a shape the elimination does not cover, for example
    /// a coefficient whose companion matrix needs a division the domain
    /// cannot perform. The input is handed back unchanged.
    Incomplete(DiffPolynomial<HolonomicRing<R>>),
}

/// The derivative of a differential polynomial, with the tower rule
/// `y_i -> y_{i+1}` for the variables and the domain derivative for the
/// coefficients.
pub fn infinite_derivative<R: Derivable>(p: &DiffPolynomial<R>) -> DiffPolynomial<R> {
    let ring = p.ring().clone();
    let base = ring.coefficient_ring().clone();
    p.derivative_with(|c| base.derivative(c), |v| ring.var(v + 1))
}

/// The defining operator of an element, written as the linear differential
/// polynomial `sum_i c_i y_i` over its coefficient domain.
pub fn linear_relation<R: SeriesDomain>(f: &HolonomicElement<R>) -> DiffPolynomial<R> {
    let ring = DiffPolynomialRing::new(f.operator().ring().clone(), "y");
    let mut p = ring.zero();
    for (i, c) in f.operator().coefficients().iter().enumerate() {
        let mut exponents: Exponents = SmallVec::new();
        exponents.resize(i + 1, 0);
        exponents[i] = 1;
        p = p.add(&DiffPolynomial::monomial(c.clone(), exponents, ring.clone()));
    }
    p
}

/// Search for constants `c, d` with `f = c g + d`.
///
/// The candidate is read off the first nonzero Taylor terms past the
/// constant one and then confirmed exactly. `None` means no relation could
/// be established, which includes every case where a sequence term or the
/// confirmation itself is unavailable; a miss only costs the caller a
/// larger elimination matrix.
pub fn find_linear_relation<R: Convertible>(
    ring: &HolonomicRing<R>,
    f: &HolonomicElement<R>,
    g: &HolonomicElement<R>,
) -> Option<(Constant<R>, Constant<R>)> {
    let constants = ring.coefficient_ring().constants();
    let window = f
        .jump_order()
        .max(g.jump_order())
        .max(f.operator().order() + g.operator().order())
        + 2;

    // the first nonzero term with index >= 1, within the window
    let first_nonzero = |e: &HolonomicElement<R>| -> Result<Option<usize>, ()> {
        for n in 1..=window {
            match e.sequence(n) {
                Ok(c) if !<R::Constants as Ring>::is_zero(&c) => return Ok(Some(n)),
                Ok(_) => {}
                Err(_) => return Err(()),
            }
        }
        Ok(None)
    };

    let f0 = f.sequence(0).ok()?;
    let g0 = g.sequence(0).ok()?;

    let (c, d) = match (first_nonzero(f).ok()?, first_nonzero(g).ok()?) {
        (None, None) => (constants.zero(), f0),
        (Some(a), Some(b)) if a == b => {
            let fa = f.sequence(a).ok()?;
            let gb = g.sequence(b).ok()?;
            let c = constants.try_div(&fa, &gb)?;
            let mut d = f0;
            constants.sub_mul_assign(&mut d, &c, &g0);
            (c, d)
        }
        _ => return None,
    };

    let scaled = ring.scale(g, &c).ok()?;
    let shifted = match ring.constant_element(d.clone()) {
        Ok(e) => closure::sum(ring, &scaled, &e).ok()?,
        Err(_) => return None,
    };
    if closure::equals(ring, f, &shifted).ok()? {
        Some((c, d))
    } else {
        None
    }
}

/// A coefficient of the relation that blocks the elimination.
enum InsertFailure {
    Shape,
    Closure(ClosureError),
}

struct Tower<R: Convertible> {
    members: Vec<HolonomicElement<R>>,
    vectors: Vec<DiffPolynomial<R>>,
    companion: Matrix<R>,
}

/// The grouping of a relation's coefficients into derivative towers over a
/// shared constant generator.
///
/// Tower heads are the maximal elements: coefficients that are a member of
/// an existing tower, or a scalar combination `c g + d` of a member `g`,
/// fold into that member's coordinate instead of opening a tower of their
/// own. Coefficients that are constants fold into the generator `1`.
struct ReductionPoset<R: Convertible> {
    upper: HolonomicRing<R>,
    goal: DiffPolynomialRing<R>,
    base_vector: DiffPolynomial<R>,
    towers: Vec<Tower<R>>,
}

impl<R: Convertible> ReductionPoset<R> {
    fn new(upper: HolonomicRing<R>, goal: DiffPolynomialRing<R>) -> ReductionPoset<R> {
        ReductionPoset {
            base_vector: goal.zero(),
            upper,
            goal,
            towers: vec![],
        }
    }

    fn monomial(&self, exponents: &[u16], c: R::Element) -> DiffPolynomial<R> {
        DiffPolynomial::monomial(c, SmallVec::from_slice(exponents), self.goal.clone())
    }

    fn insert(
        &mut self,
        exponents: &[u16],
        coefficient: &HolonomicElement<R>,
    ) -> Result<(), InsertFailure> {
        if coefficient.is_provably_zero() {
            return Ok(());
        }

        let base = self.upper.coefficient_ring().clone();
        if let Some(c) = coefficient.constant_value() {
            let mono = self.monomial(exponents, base.lift_constant(&c));
            self.base_vector = self.base_vector.add(&mono);
            return Ok(());
        }

        for t in 0..self.towers.len() {
            for j in 0..self.towers[t].members.len() {
                if &self.towers[t].members[j] == coefficient {
                    let mono = self.monomial(exponents, base.one());
                    self.towers[t].vectors[j] = self.towers[t].vectors[j].add(&mono);
                    return Ok(());
                }
            }
        }

        for t in 0..self.towers.len() {
            for j in 0..self.towers[t].members.len() {
                let member = self.towers[t].members[j].clone();
                if let Some((c, d)) = find_linear_relation(&self.upper, coefficient, &member) {
                    let scaled = self.monomial(exponents, base.lift_constant(&c));
                    self.towers[t].vectors[j] = self.towers[t].vectors[j].add(&scaled);
                    let shift = self.monomial(exponents, base.lift_constant(&d));
                    self.base_vector = self.base_vector.add(&shift);
                    return Ok(());
                }
            }
        }

        let order = coefficient.operator().order();
        if order == 0 {
            return Err(InsertFailure::Shape);
        }
        let companion = match coefficient.operator().companion_matrix() {
            Ok(m) => m,
            Err(_) => return Err(InsertFailure::Shape),
        };

        let mut members = vec![coefficient.clone()];
        for _ in 1..order {
            let next = closure::derivative(&self.upper, members.last().unwrap())
                .map_err(InsertFailure::Closure)?;
            members.push(next);
        }

        let mut vectors = vec![self.goal.zero(); order];
        vectors[0] = self.monomial(exponents, base.one());
        self.towers.push(Tower {
            members,
            vectors,
            companion,
        });
        Ok(())
    }

    /// Total number of generators: the constant one plus every tower member.
    fn size(&self) -> usize {
        let base = if self.base_vector.is_zero() { 0 } else { 1 };
        base + self.towers.iter().map(|t| t.members.len()).sum::<usize>()
    }

    /// The relation as a coordinate vector over the generators.
    fn vector(&self) -> Vec<DiffPolynomial<R>> {
        let mut v = vec![];
        if !self.base_vector.is_zero() {
            v.push(self.base_vector.clone());
        }
        for t in &self.towers {
            v.extend(t.vectors.iter().cloned());
        }
        v
    }

    /// The derivative of a coordinate vector: the tower rule on the entries
    /// plus the companion action of each block.
    fn movement(&self, v: &[DiffPolynomial<R>]) -> Vec<DiffPolynomial<R>> {
        let mut u: Vec<DiffPolynomial<R>> = v.iter().map(infinite_derivative).collect();

        let mut offset = if self.base_vector.is_zero() { 0 } else { 1 };
        for t in &self.towers {
            let m = t.members.len();
            for j in 0..m {
                for i in 0..m {
                    let c = t.companion[(i as u32, j as u32)].clone();
                    u[offset + j] = u[offset + j].add(&v[offset + i].mul_coeff(&c));
                }
            }
            offset += m;
        }
        u
    }
}

/// Eliminate the holonomic coefficients of a relation, producing a
/// differential polynomial over the base domain.
///
/// When every coefficient folds into the base domain the relation maps over
/// directly. Otherwise the coordinate vector of the relation and its first
/// derivatives form a square matrix over the tower generators, and the
/// fraction-free determinant is the reduced relation. The determinant picks
/// up a scalar factor compared to the minimal relation, which does not
/// change the solution set.
pub fn reduce_depth_once<R: Convertible>(
    p: &DiffPolynomial<HolonomicRing<R>>,
) -> Result<ReductionOutcome<R>, ReductionError> {
    let upper = p.ring().coefficient_ring().clone();
    let base = upper.coefficient_ring().clone();
    let goal = DiffPolynomialRing::new(base, "y");

    if p.is_zero() {
        return Ok(ReductionOutcome::Reduced(goal.zero()));
    }

    let mut poset = ReductionPoset::new(upper, goal.clone());
    for (exponents, c) in p.terms() {
        match poset.insert(exponents, c) {
            Ok(()) => {}
            Err(InsertFailure::Shape) => return Ok(ReductionOutcome::Incomplete(p.clone())),
            Err(InsertFailure::Closure(e)) => return Err(e.into()),
        }
    }

    if poset.towers.is_empty() {
        return Ok(ReductionOutcome::Reduced(poset.base_vector));
    }

    let s = poset.size();
    let mut columns = vec![poset.vector()];
    for _ in 1..s {
        columns.push(poset.movement(columns.last().unwrap()));
    }

    let rows: Vec<Vec<DiffPolynomial<R>>> = (0..s)
        .map(|i| (0..s).map(|j| columns[j][i].clone()).collect())
        .collect();
    let m = Matrix::from_nested_vec(rows, goal)
        .expect("The movement columns have equal length");
    let det = m.det().expect("The movement matrix is square");

    if det.is_zero() {
        return Ok(ReductionOutcome::Incomplete(p.clone()));
    }
    Ok(ReductionOutcome::Reduced(det))
}

/// The differential-algebraic relation of a depth-2 element over the base
/// domain: its defining linear relation with one elimination pass applied.
/// Deeper nestings peel one level per call.
pub fn algebraic_relation<R: Convertible>(
    f: &HolonomicElement<HolonomicRing<R>>,
) -> Result<ReductionOutcome<R>, ReductionError> {
    reduce_depth_once(&linear_relation(f))
}

/// Turn a relation for `f` into one for `1/f`.
///
/// The `n`-th derivative of `1/f` is `sum_k (-1)^k k! B_{n,k}(f', ...) /
/// f^{k+1}` by the chain rule, so each variable `y_n` is replaced by that
/// expression over the common denominator `y_0^{n+1}` and the result is
/// cleared of denominators.
pub fn reciprocal_relation<R: Ring>(p: &DiffPolynomial<R>) -> DiffPolynomial<R> {
    let ring = p.ring().clone();
    let base = ring.coefficient_ring().clone();
    let n = p.max_variable().unwrap_or(0);

    // numerators[m] over the denominator y_0^{m+1}
    let mut numerators: Vec<DiffPolynomial<R>> = vec![ring.one()];
    for m in 1..=n {
        let mut num = ring.zero();
        for k in 1..=m {
            let args: Vec<DiffPolynomial<R>> = (1..=m - k + 1).map(|i| ring.var(i)).collect();
            let bell = partial_bell(&ring, m, k, &args);

            let mut kf = base.one();
            for j in 1..=k {
                base.mul_assign(&mut kf, &base.nth(j as i64));
            }
            if k % 2 == 1 {
                kf = base.neg(&kf);
            }

            let scaled = bell.mul_coeff(&kf).mul(&ring.var(0).pow(m - k));
            num = num.add(&scaled);
        }
        numerators.push(num);
    }

    // the common denominator exponent over all substituted terms
    let weight = |exponents: &[u16]| -> usize {
        exponents
            .iter()
            .enumerate()
            .map(|(m, &e)| (m + 1) * e as usize)
            .sum()
    };
    let clear = p.terms().map(|(e, _)| weight(e)).max().unwrap_or(0);

    let mut result = ring.zero();
    for (exponents, c) in p.terms() {
        let mut term = ring.var(0).pow(clear - weight(exponents));
        for (m, &e) in exponents.iter().enumerate() {
            term = term.mul(&numerators[m].pow(e as usize));
        }
        result = result.add(&term.mul_coeff(c));
    }
    result
}

/// The fractions `f^(m)(h)` expressing the derivatives of a function at its
/// own compositional inverse `h`, as `(numerator, denominator)` pairs in the
/// derivatives of `h`.
///
/// `f(h) = seed` and each next pair follows from the chain rule, a
/// derivative of the previous one divided by `h' = y_1`. Shared powers of
/// `y_1` are cancelled as the recursion goes.
pub fn faa_di_bruno_pairs<R: Derivable>(
    ring: &DiffPolynomialRing<R>,
    seed: &R::Element,
    n: usize,
) -> Vec<(DiffPolynomial<R>, DiffPolynomial<R>)> {
    let y1 = ring.var(1);
    let mut pairs = vec![(ring.constant(seed.clone()), ring.one())];

    for _ in 1..=n {
        let (num, den) = pairs.last().unwrap();
        let dn = infinite_derivative(num);
        let dd = infinite_derivative(den);

        let mut next_num = dn.mul(den).sub(&num.mul(&dd));
        let mut next_den = den.mul(den).mul(&y1);
        while let (Some(a), Some(b)) = (
            ring.try_div(&next_num, &y1),
            ring.try_div(&next_den, &y1),
        ) {
            next_num = a;
            next_den = b;
        }
        pairs.push((next_num, next_den));
    }
    pairs
}

/// A differential polynomial annihilating the compositional inverse of `f`.
///
/// If `f` satisfies `sum_i c_i(x) f^(i) = 0`, evaluating at the inverse `h`
/// replaces `x` by `y_0 = h` inside the coefficients and each `f^(i)` by its
/// chain-rule fraction in the derivatives of `h`. The numerator over the
/// common denominator is the relation.
pub fn inverse_relation(
    f: &HolonomicElement<RationalFunctionField>,
) -> DiffPolynomial<RationalFunctionField> {
    let field = f.operator().ring().clone();
    let ring = DiffPolynomialRing::new(field.clone(), "y");
    let order = f.operator().order();
    let pairs = faa_di_bruno_pairs(&ring, &field.var(), order);

    // a rational function with x replaced by y_0, as a fraction of
    // differential polynomials
    let substitute = |c: &RationalFunction| {
        let eval = |p: &UnivariatePolynomial<RationalField>| {
            let mut r = ring.zero();
            for (k, a) in p.coefficients().iter().enumerate() {
                let mono = ring.var(0).pow(k);
                r = r.add(&mono.mul_coeff(&field.polynomial(&[a.clone()])));
            }
            r
        };
        (eval(c.numerator()), eval(c.denominator()))
    };

    let mut num = ring.zero();
    let mut den = ring.one();
    for (i, c) in f.operator().coefficients().iter().enumerate() {
        let (cn, cd) = substitute(c);
        let term_num = cn.mul(&pairs[i].0);
        let term_den = cd.mul(&pairs[i].1);

        num = num.mul(&term_den).add(&term_num.mul(&den));
        den = den.mul(&term_den);
    }
    num
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domains::fraction::RationalFunctionField;
    use crate::domains::rational::Rational;

    fn setup() -> (HolonomicRing<RationalFunctionField>, RationalFunctionField) {
        let field = RationalFunctionField::rational_functions();
        (HolonomicRing::new(field.clone()), field)
    }

    fn exponential(
        ring: &HolonomicRing<RationalFunctionField>,
    ) -> HolonomicElement<RationalFunctionField> {
        let f = ring.coefficient_ring().clone();
        let minus_one = f.polynomial(&[Rational::new(-1, 1)]);
        ring.element_from_coefficients(vec![minus_one, f.one()], vec![Rational::one()])
            .unwrap()
    }

    fn sine(
        ring: &HolonomicRing<RationalFunctionField>,
    ) -> HolonomicElement<RationalFunctionField> {
        let f = ring.coefficient_ring().clone();
        ring.element_from_coefficients(
            vec![f.one(), f.zero(), f.one()],
            vec![Rational::zero(), Rational::one()],
        )
        .unwrap()
    }

    fn cosine(
        ring: &HolonomicRing<RationalFunctionField>,
    ) -> HolonomicElement<RationalFunctionField> {
        let f = ring.coefficient_ring().clone();
        ring.element_from_coefficients(
            vec![f.one(), f.zero(), f.one()],
            vec![Rational::one(), Rational::zero()],
        )
        .unwrap()
    }

    #[test]
    fn infinite_derivative_applies_both_rules() {
        let field = RationalFunctionField::rational_functions();
        let ring = DiffPolynomialRing::new(field.clone(), "y");

        // d(x y0) = y0 + x y1
        let p = ring.var(0).mul_coeff(&field.var());
        let d = infinite_derivative(&p);
        assert_eq!(d.coefficient_of(&[1]), field.one());
        assert_eq!(d.coefficient_of(&[0, 1]), field.var());
    }

    #[test]
    fn linear_relation_reads_off_the_operator() {
        let (ring, field) = setup();
        let p = linear_relation(&sine(&ring));
        assert_eq!(p.coefficient_of(&[1]), field.one());
        assert_eq!(p.coefficient_of(&[0, 0, 1]), field.one());
        assert_eq!(p.coefficient_of(&[0, 1]), field.zero());
    }

    #[test]
    fn constant_coefficients_skip_the_elimination() {
        let (lower, field) = setup();
        let ring = DiffPolynomialRing::new(lower.clone(), "y");

        // y0 - 2 with constant coefficients collapses directly
        let two = lower.constant_element(Rational::new(2, 1)).unwrap();
        let p = ring.var(0).sub(&ring.constant(two));

        match reduce_depth_once(&p).unwrap() {
            ReductionOutcome::Reduced(q) => {
                let goal = q.ring().clone();
                let expected = goal
                    .var(0)
                    .sub(&goal.constant(field.polynomial(&[Rational::new(2, 1)])));
                assert_eq!(q, expected);
            }
            ReductionOutcome::Incomplete(_) => panic!("The trivial relation must reduce"),
        }
    }

    #[test]
    fn reduction_recovers_the_minimal_operator() {
        let (lower, _) = setup();
        let upper = HolonomicRing::new(lower.clone());

        // 1/exp satisfies exp y' + exp y = 0; eliminating the shared tower
        // leaves y' + y
        let inv = closure::reciprocal(&upper, &exponential(&lower)).unwrap();
        match algebraic_relation(&inv).unwrap() {
            ReductionOutcome::Reduced(q) => {
                let goal = q.ring().clone();
                assert_eq!(q, goal.var(0).add(&goal.var(1)));
            }
            ReductionOutcome::Incomplete(_) => panic!("The tower elimination must succeed"),
        }
    }

    /// Truncated Taylor coefficients of the i-th derivative of `f`.
    fn derivative_series(seq: &[Rational], i: usize, terms: usize) -> Vec<Rational> {
        (0..terms)
            .map(|n| {
                let mut c = seq[n + i].clone();
                for j in n + 1..=n + i {
                    c = c * Rational::new(j as i64, 1);
                }
                c
            })
            .collect()
    }

    fn series_mul(a: &[Rational], b: &[Rational]) -> Vec<Rational> {
        let terms = a.len().min(b.len());
        (0..terms)
            .map(|n| {
                let mut s = Rational::zero();
                for k in 0..=n {
                    s = s + &a[k] * &b[n - k];
                }
                s
            })
            .collect()
    }

    #[test]
    fn reduced_relation_annihilates_the_series() {
        let (lower, field) = setup();
        let upper = HolonomicRing::new(lower.clone());

        // exp of the integral of cos, a genuinely nested element
        let f = closure::exp_integral(&upper, &cosine(&lower)).unwrap();
        let relation = match algebraic_relation(&f).unwrap() {
            ReductionOutcome::Reduced(q) => q,
            ReductionOutcome::Incomplete(_) => panic!("The tower elimination must succeed"),
        };

        let terms = 12;
        let order = relation.max_variable().unwrap_or(0);
        let seq: Vec<Rational> = (0..terms + order)
            .map(|n| f.sequence(n).unwrap())
            .collect();

        let mut total = vec![Rational::zero(); terms];
        for (exponents, c) in relation.terms() {
            let mut t: Vec<Rational> = (0..terms)
                .map(|n| field.series_coefficient(c, n).unwrap())
                .collect();
            for (i, &e) in exponents.iter().enumerate() {
                for _ in 0..e {
                    t = series_mul(&t, &derivative_series(&seq, i, terms));
                }
            }
            for (s, v) in total.iter_mut().zip(&t) {
                *s += v;
            }
        }

        for v in &total {
            assert!(v.is_zero(), "The relation must annihilate the series");
        }
    }

    #[test]
    fn scalar_relations_are_recognized() {
        let (ring, _) = setup();
        let s = sine(&ring);

        // f = 2 sin + 1
        let scaled = ring.scale(&s, &Rational::new(2, 1)).unwrap();
        let one = ring.constant_element(Rational::one()).unwrap();
        let f = closure::sum(&ring, &scaled, &one).unwrap();

        let (c, d) = find_linear_relation(&ring, &f, &s).unwrap();
        assert_eq!(c, Rational::new(2, 1));
        assert_eq!(d, Rational::one());
    }

    #[test]
    fn reciprocal_relation_of_the_exponential() {
        let field = RationalFunctionField::rational_functions();
        let ring = DiffPolynomialRing::new(field, "y");

        // y1 - y0 for exp turns into -(y1 + y0) for 1/exp
        let p = ring.var(1).sub(&ring.var(0));
        let q = reciprocal_relation(&p);
        assert_eq!(q, ring.var(1).add(&ring.var(0)).neg());
    }

    #[test]
    fn faa_di_bruno_pairs_start_with_the_chain_rule() {
        let field = RationalFunctionField::rational_functions();
        let ring = DiffPolynomialRing::new(field.clone(), "y");

        let pairs = faa_di_bruno_pairs(&ring, &field.var(), 2);
        assert_eq!(pairs[0].0, ring.constant(field.var()));
        assert_eq!(pairs[0].1, ring.one());
        assert_eq!(pairs[1].0, ring.one());
        assert_eq!(pairs[1].1, ring.var(1));
        assert_eq!(pairs[2].0, ring.var(2).neg());
        assert_eq!(pairs[2].1, ring.var(1).pow(3));
    }

    #[test]
    fn inverse_relation_of_the_exponential() {
        let (ring, field) = setup();

        // the inverse of exp is log, with x h' = 1
        let q = inverse_relation(&exponential(&ring));
        let p_ring = q.ring().clone();
        let expected = p_ring
            .one()
            .sub(&p_ring.var(1).mul_coeff(&field.var()));
        assert_eq!(q, expected);
    }
}
