//! Holonomic elements: a formal power series represented by an annihilating
//! [Operator] plus enough initial Taylor terms, and the ring they form over a
//! coefficient [SeriesDomain].
//!
//! The sequence of Taylor coefficients is extended lazily through the
//! operator's recurrence and cached. The cache is shared between
//! structurally equal elements through the ring's memoization map, which is
//! an explicit member of the ring rather than process-global state.

use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use ahash::HashMap;
use smartstring::{LazyCompact, SmartString};

use crate::domains::rational::Rational;
use crate::domains::{ConstantRing, DomainError, Ring, SeriesDomain};
use crate::operator::{Operator, OperatorError};

pub type Constant<R> = <<R as SeriesDomain>::Constants as Ring>::Element;
type SequenceCache<R> = Arc<Mutex<Vec<Constant<R>>>>;

/// The ring of holonomic elements over the coefficient domain `R`.
///
/// Carries the memoization cache for element construction: two elements built
/// from the same operator and initial data share one sequence cache, so terms
/// extended through one handle are visible through the other.
#[derive(Clone)]
pub struct HolonomicRing<R: SeriesDomain> {
    ring: R,
    cache: Arc<Mutex<HashMap<(Operator<R>, Vec<Constant<R>>), SequenceCache<R>>>>,
}

impl<R: SeriesDomain> PartialEq for HolonomicRing<R> {
    fn eq(&self, other: &Self) -> bool {
        self.ring == other.ring
    }
}

impl<R: SeriesDomain> Eq for HolonomicRing<R> {}

impl<R: SeriesDomain> Hash for HolonomicRing<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ring.hash(state);
    }
}

impl<R: SeriesDomain> Debug for HolonomicRing<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "HolonomicRing({:?})", self.ring)
    }
}

impl<R: SeriesDomain> Display for HolonomicRing<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Holonomic({})", self.ring)
    }
}

impl<R: SeriesDomain> HolonomicRing<R> {
    pub fn new(ring: R) -> HolonomicRing<R> {
        HolonomicRing {
            ring,
            cache: Arc::new(Mutex::new(HashMap::default())),
        }
    }

    pub fn coefficient_ring(&self) -> &R {
        &self.ring
    }

    /// Construct an element from its annihilating operator and initial Taylor
    /// terms. Structurally equal constructions share a sequence cache.
    pub fn element(
        &self,
        operator: Operator<R>,
        initials: Vec<Constant<R>>,
    ) -> Result<HolonomicElement<R>, DomainError> {
        let jump = operator.jump_order()?;

        let sequence = {
            let mut memo = self.cache.lock().unwrap();
            memo.entry((operator.clone(), initials.clone()))
                .or_insert_with(|| Arc::new(Mutex::new(initials.clone())))
                .clone()
        };

        Ok(HolonomicElement {
            operator,
            initials,
            jump,
            label: None,
            sequence,
        })
    }

    /// Construct an element from coefficient lists of polynomials over the
    /// constants, the common case for the special-function catalog.
    pub fn element_from_coefficients(
        &self,
        operator: Vec<R::Element>,
        initials: Vec<Constant<R>>,
    ) -> Result<HolonomicElement<R>, DomainError> {
        self.element(Operator::new(operator, self.ring.clone()), initials)
    }

    /// Embed a coefficient-domain element: `r` satisfies `r y' - r' y = 0`.
    pub fn from_base(&self, r: &R::Element) -> Result<HolonomicElement<R>, DomainError> {
        if self.ring.valuation(r)?.is_none() {
            return self.zero_element();
        }

        let dr = self.ring.derivative(r);
        let operator = Operator::new(
            vec![self.ring.neg(&dr), r.clone()],
            self.ring.clone(),
        );
        let jump = operator.jump_order()?;

        let mut initials = Vec::with_capacity(jump);
        for n in 0..jump {
            initials.push(self.ring.series_coefficient(r, n)?);
        }
        self.element(operator, initials)
    }

    /// The zero element, as a solution of `y' = 0`.
    pub fn zero_element(&self) -> Result<HolonomicElement<R>, DomainError> {
        self.constant_element(self.ring.constants().zero())
    }

    /// A constant, as a solution of `y' = 0`.
    pub fn constant_element(&self, c: Constant<R>) -> Result<HolonomicElement<R>, DomainError> {
        let operator = Operator::new(
            vec![self.ring.zero(), self.ring.one()],
            self.ring.clone(),
        );
        self.element(operator, vec![c])
    }

    /// Scale an element by a constant: the operator is unchanged, the initial
    /// data is scaled.
    pub fn scale(
        &self,
        e: &HolonomicElement<R>,
        c: &Constant<R>,
    ) -> Result<HolonomicElement<R>, DomainError> {
        let constants = self.ring.constants();
        let initials = e
            .initials
            .iter()
            .map(|t| constants.mul(t, c))
            .collect();
        self.element(e.operator.clone(), initials)
    }
}

/// A formal power series singled out by an annihilating operator and initial
/// Taylor terms.
#[derive(Clone)]
pub struct HolonomicElement<R: SeriesDomain> {
    operator: Operator<R>,
    initials: Vec<Constant<R>>,
    jump: usize,
    label: Option<SmartString<LazyCompact>>,
    sequence: SequenceCache<R>,
}

impl<R: SeriesDomain> PartialEq for HolonomicElement<R> {
    /// Structural equality of the defining data; the label and the cache do
    /// not participate. For equality as functions, see
    /// [equals](crate::closure::equals).
    fn eq(&self, other: &Self) -> bool {
        self.operator == other.operator && self.initials == other.initials
    }
}

impl<R: SeriesDomain> Eq for HolonomicElement<R> {}

impl<R: SeriesDomain> Hash for HolonomicElement<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.operator.hash(state);
        self.initials.hash(state);
    }
}

impl<R: SeriesDomain> crate::domains::InternalOrdering for HolonomicElement<R> {
    fn internal_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.operator
            .internal_cmp(&other.operator)
            .then_with(|| self.initials.internal_cmp(&other.initials))
    }
}

impl<R: SeriesDomain> Debug for HolonomicElement<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl<R: SeriesDomain> Display for HolonomicElement<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(label) = &self.label {
            return f.write_str(label);
        }
        write!(
            f,
            "holonomic(order={}, initials={})",
            self.operator.order(),
            self.initials.len()
        )
    }
}

impl<R: SeriesDomain> HolonomicElement<R> {
    pub fn operator(&self) -> &Operator<R> {
        &self.operator
    }

    pub fn initials(&self) -> &[Constant<R>] {
        &self.initials
    }

    /// Attach a cosmetic display name. The label never participates in
    /// equality or hashing.
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The number of leading sequence terms that must come from initial data.
    pub fn jump_order(&self) -> usize {
        self.jump
    }

    /// True iff the supplied initial data reaches the jump order, so every
    /// sequence term is determined.
    pub fn is_fully_defined(&self) -> bool {
        self.initials.len() >= self.jump
    }

    /// The `n`-th Taylor coefficient, extending the cached sequence through
    /// the recurrence as needed.
    pub fn sequence(&self, n: usize) -> Result<Constant<R>, OperatorError> {
        let mut cache = self.sequence.lock().unwrap();
        while cache.len() <= n {
            let k = cache.len();
            if k < self.jump {
                return Err(OperatorError::InsufficientData { needed: self.jump });
            }
            let term = self.operator.apply(&cache, k)?;
            cache.push(term);
        }
        Ok(cache[n].clone())
    }

    /// The value of the `n`-th derivative at the origin, `n! * a_n`.
    pub fn initial_values(&self, n: usize) -> Result<Constant<R>, OperatorError> {
        let constants = self.operator.ring().constants();
        let f = constants.from_rational(&Rational::factorial(n as u64));
        Ok(constants.mul(&self.sequence(n)?, &f))
    }

    /// The first `k` Taylor coefficients.
    pub fn first_terms(&self, k: usize) -> Result<Vec<Constant<R>>, OperatorError> {
        (0..k).map(|n| self.sequence(n)).collect()
    }

    /// The order of vanishing at the origin, or `None` for the zero element.
    /// Fails when the stored initial data cannot decide.
    pub fn try_valuation(&self) -> Result<Option<usize>, OperatorError> {
        for n in 0..self.jump.max(self.initials.len()) {
            if !<R::Constants as Ring>::is_zero(&self.sequence(n)?) {
                return Ok(Some(n));
            }
        }
        // all terms below the jump vanish, so the recurrence propagates zero
        Ok(None)
    }

    /// Zero test from the stored data alone; `false` when the data cannot
    /// prove the element zero.
    pub fn is_provably_zero(&self) -> bool {
        matches!(self.try_valuation(), Ok(None))
    }

    /// Structurally recognize a constant: an element of the form `c_1 y' = 0`.
    /// A best-effort test; constants in disguise are not detected.
    pub fn constant_value(&self) -> Option<Constant<R>> {
        if self.operator.order() == 1
            && R::is_zero(&self.operator.coefficients()[0])
            && !self.initials.is_empty()
        {
            Some(self.initials[0].clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::domains::fraction::RationalFunctionField;
    use crate::domains::rational::Rational;

    fn ring() -> HolonomicRing<RationalFunctionField> {
        HolonomicRing::new(RationalFunctionField::rational_functions())
    }

    fn rat(v: i64) -> Rational {
        Rational::from(v)
    }

    pub fn exp(ring: &HolonomicRing<RationalFunctionField>) -> HolonomicElement<RationalFunctionField> {
        let f = ring.coefficient_ring().clone();
        ring.element_from_coefficients(
            vec![f.nth(-1), f.one()],
            vec![Rational::one()],
        )
        .unwrap()
        .with_label("exp(x)")
    }

    #[test]
    fn exponential_sequence() {
        let r = ring();
        let e = exp(&r);
        assert_eq!(e.jump_order(), 1);
        assert!(e.is_fully_defined());
        assert_eq!(e.sequence(4).unwrap(), Rational::new(1, 24));
        // derivative values are all 1
        assert_eq!(e.initial_values(5).unwrap(), Rational::one());
    }

    #[test]
    fn extension_is_idempotent() {
        let r = ring();
        let e = exp(&r);
        let first: Vec<Rational> = (0..8).map(|n| e.sequence(n).unwrap()).collect();
        let second: Vec<Rational> = (0..8).map(|n| e.sequence(n).unwrap()).collect();
        assert_eq!(first, second);
        // the second pass reads the memo without growing it
        assert_eq!(e.sequence.lock().unwrap().len(), 8);
    }

    #[test]
    fn shared_cache_between_equal_constructions() {
        let r = ring();
        let a = exp(&r);
        let b = exp(&r);
        assert_eq!(a, b);
        // extending through one handle fills the shared cache
        a.sequence(10).unwrap();
        assert_eq!(b.sequence.lock().unwrap().len(), 11);
    }

    #[test]
    fn labels_are_cosmetic() {
        let r = ring();
        let a = exp(&r);
        let b = exp(&r).with_label("renamed");
        assert_eq!(a, b);
        assert_eq!(b.label(), Some("renamed"));
        assert_eq!(format!("{}", b), "renamed");
    }

    #[test]
    fn underdetermined_extension() {
        let r = ring();
        let f = r.coefficient_ring().clone();
        // y'' + y = 0 with a single initial term: not fully defined
        let s = r
            .element_from_coefficients(
                vec![f.one(), f.zero(), f.one()],
                vec![rat(0)],
            )
            .unwrap();
        assert_eq!(s.jump_order(), 2);
        assert!(!s.is_fully_defined());
        assert_eq!(s.sequence(0).unwrap(), rat(0));
        assert_eq!(
            s.sequence(2),
            Err(OperatorError::InsufficientData { needed: 2 })
        );
    }

    #[test]
    fn base_embedding() {
        let r = ring();
        let f = r.coefficient_ring().clone();

        // x/(1-x) = x + x^2 + ...
        let num = f.polynomial(&[rat(0), rat(1)]);
        let den = f.polynomial(&[rat(1), rat(-1)]);
        let q = f.to_element(
            num.numerator().clone(),
            den.numerator().clone(),
            true,
        );
        let e = r.from_base(&q).unwrap();
        assert_eq!(e.sequence(0).unwrap(), rat(0));
        for n in 1..6 {
            assert_eq!(e.sequence(n).unwrap(), rat(1));
        }
    }

    #[test]
    fn constants_and_valuation() {
        let r = ring();
        let c = r.constant_element(rat(3)).unwrap();
        assert_eq!(c.constant_value(), Some(rat(3)));
        assert_eq!(c.try_valuation().unwrap(), Some(0));
        assert!(r.zero_element().unwrap().is_provably_zero());

        let s = r
            .element_from_coefficients(
                vec![r.coefficient_ring().one(), r.coefficient_ring().zero(), r.coefficient_ring().one()],
                vec![rat(0), rat(1)],
            )
            .unwrap();
        assert_eq!(s.try_valuation().unwrap(), Some(1));
    }
}
