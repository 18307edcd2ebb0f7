//! Defines the algebraic traits the holonomic core is generic over.
//!
//! The central trait is [Ring]: a set with addition and multiplication. As in
//! most exact computer algebra kernels, the ring *performs* the operations on
//! its elements rather than the elements implementing them, so that every
//! structure in this crate can be generic over the coefficient domain.
//!
//! On top of the plain ring tower ([Ring], [EuclideanDomain], [Field]) sit the
//! differential extensions that a coefficient domain of a linear differential
//! operator must provide: [Derivable] for the derivative with respect to the
//! distinguished series variable, and [SeriesDomain] for Taylor coefficients
//! and valuations at the origin. [Substitution] is the seam used by the
//! closure engine's composition operation.

pub mod fraction;
pub mod rational;

use std::fmt::{Debug, Display, Error, Formatter};
use std::hash::Hash;

use rational::Rational;

/// An internal ordering used to compare elements of a ring, defined even for
/// rings without a meaningful total ordering.
pub trait InternalOrdering {
    fn internal_cmp(&self, other: &Self) -> std::cmp::Ordering;
}

macro_rules! impl_internal_ordering {
    ($($t:ty),*) => {
        $(
            impl InternalOrdering for $t {
                fn internal_cmp(&self, other: &Self) -> std::cmp::Ordering {
                    self.cmp(other)
                }
            }
        )*
    };
}

impl_internal_ordering!(u8);
impl_internal_ordering!(u16);
impl_internal_ordering!(u64);
impl_internal_ordering!(usize);

macro_rules! impl_internal_ordering_range {
    ($($t:ty),*) => {
        $(
            impl<T: InternalOrdering> InternalOrdering for $t {
                fn internal_cmp(&self, other: &Self) -> std::cmp::Ordering {
                    match self.len().cmp(&other.len()) {
                        std::cmp::Ordering::Equal => (),
                        ord => return ord,
                    }

                    for (i, j) in self.iter().zip(other) {
                        match i.internal_cmp(j) {
                            std::cmp::Ordering::Equal => {}
                            ord => return ord,
                        }
                    }

                    std::cmp::Ordering::Equal
                }
            }
        )*
    };
}

impl_internal_ordering_range!([T]);
impl_internal_ordering_range!(Vec<T>);

/// An invalid operation in a coefficient domain. Fatal for the operation that
/// triggered it; never retried internally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomainError {
    /// Division by an element that is not invertible in the domain.
    DivisionByNonUnit,
    /// A series expansion at the origin was requested for an element with a
    /// pole there.
    PoleAtOrigin,
    /// The domain does not support the requested operation.
    Unsupported(&'static str),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::DivisionByNonUnit => {
                write!(f, "Division by a non-invertible domain element")
            }
            DomainError::PoleAtOrigin => {
                write!(f, "The element has a pole at the expansion point")
            }
            DomainError::Unsupported(what) => {
                write!(f, "Unsupported domain operation: {}", what)
            }
        }
    }
}

impl std::error::Error for DomainError {}

/// A ring is a set with two binary operations, addition and multiplication.
///
/// Each ring has an element type that should not be confused with the ring
/// type itself: the field of rationals [Q](rational::Q) has elements of type
/// [Rational], a [FractionField](fraction::FractionField) has elements of type
/// [Fraction](fraction::Fraction), and so on. The ring elements do not
/// implement the arithmetic; the ring does.
pub trait Ring: Clone + PartialEq + Eq + Hash + Debug + Display {
    type Element: Clone + PartialEq + Eq + Hash + InternalOrdering + Debug;

    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element);
    fn sub_assign(&self, a: &mut Self::Element, b: &Self::Element);
    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element);
    fn add_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element);
    fn sub_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element);
    fn neg(&self, a: &Self::Element) -> Self::Element;
    fn zero(&self) -> Self::Element;
    fn one(&self) -> Self::Element;
    /// Return the nth element by computing `n * 1`.
    fn nth(&self, n: i64) -> Self::Element;
    fn pow(&self, b: &Self::Element, e: u64) -> Self::Element;
    fn is_zero(a: &Self::Element) -> bool;
    fn is_one(&self, a: &Self::Element) -> bool;

    /// Return the result of dividing `a` by `b`, if the quotient exists in the
    /// ring and is unique.
    fn try_div(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element>;

    /// Format a ring element.
    fn format<W: std::fmt::Write>(&self, element: &Self::Element, f: &mut W) -> Result<(), Error>;

    /// Create a printer for the given element, suitable as an argument to
    /// [format!].
    fn printer<'a>(&'a self, element: &'a Self::Element) -> RingPrinter<'a, Self> {
        RingPrinter::new(self, element)
    }
}

/// A Euclidean domain is a ring that supports division with remainder,
/// quotients and gcds.
pub trait EuclideanDomain: Ring {
    fn rem(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn quot_rem(&self, a: &Self::Element, b: &Self::Element) -> (Self::Element, Self::Element);
    fn gcd(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
}

/// A field is a ring that supports division and inversion.
pub trait Field: EuclideanDomain {
    fn div(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;
    fn div_assign(&self, a: &mut Self::Element, b: &Self::Element);
    fn inv(&self, a: &Self::Element) -> Self::Element;
}

/// A ring that supports a derivative with respect to the distinguished series
/// variable.
pub trait Derivable: Ring {
    fn derivative(&self, e: &Self::Element) -> Self::Element;
}

/// The ring the sequence terms of a holonomic element live in. For the
/// concrete tower this is the field of rationals; the parametric guessing
/// elements use a parameter polynomial ring instead, so that sequence terms
/// propagate symbolically.
pub trait ConstantRing: Ring {
    /// Read the element back as a rational number, if it is one. Used by the
    /// jump-order root scan; a `None` makes the scan best-effort.
    fn as_rational(&self, e: &Self::Element) -> Option<Rational>;
    fn from_rational(&self, r: &Rational) -> Self::Element;
}

/// A coefficient domain of a linear differential operator: exact arithmetic,
/// a derivative, and a formal power series view at the origin.
pub trait SeriesDomain: Derivable {
    type Constants: ConstantRing;

    fn constants(&self) -> Self::Constants;

    /// The `n`-th Taylor coefficient of `e` at the origin.
    fn series_coefficient(
        &self,
        e: &Self::Element,
        n: usize,
    ) -> Result<<Self::Constants as Ring>::Element, DomainError>;

    /// The order of vanishing of `e` at the origin; `None` for the zero
    /// element. Fails with [DomainError::PoleAtOrigin] when `e` has a pole.
    fn valuation(&self, e: &Self::Element) -> Result<Option<usize>, DomainError>;

    /// Embed a constant into the domain.
    fn lift_constant(&self, c: &<Self::Constants as Ring>::Element) -> Self::Element;

    /// True iff `e` does not depend on the series variable.
    fn is_constant(&self, e: &Self::Element) -> bool;

    fn constant_term(
        &self,
        e: &Self::Element,
    ) -> Result<<Self::Constants as Ring>::Element, DomainError> {
        self.series_coefficient(e, 0)
    }
}

/// Substitution of the series variable, `e(x) -> e(g(x))`. Implemented for
/// rational function fields; deeper holonomic rings report the substitution
/// as unsupported.
pub trait Substitution: SeriesDomain {
    fn substitute(
        &self,
        e: &Self::Element,
        g: &Self::Element,
    ) -> Result<Self::Element, DomainError>;

    /// True iff `e` is the series variable itself, so that substituting it
    /// changes nothing.
    fn is_identity(&self, _e: &Self::Element) -> bool {
        false
    }
}

/// Provides an interface for printing elements of a ring, suitable as an
/// argument to [format!]. Internally, it calls [Ring::format].
pub struct RingPrinter<'a, R: Ring> {
    pub ring: &'a R,
    pub element: &'a R::Element,
}

impl<'a, R: Ring> RingPrinter<'a, R> {
    pub fn new(ring: &'a R, element: &'a R::Element) -> RingPrinter<'a, R> {
        RingPrinter { ring, element }
    }
}

impl<'a, R: Ring> Display for RingPrinter<'a, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.ring.format(self.element, f)
    }
}
