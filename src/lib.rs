//! A computer algebra core for holonomic (D-finite) formal power series.
//!
//! A holonomic function is represented by a linear differential operator
//! annihilating it together with enough initial Taylor terms to single out
//! one solution of the operator. The class is closed under addition,
//! multiplication, composition with algebraic arguments and several other
//! operations, and every closure is computed exactly by linear algebra over
//! the operator coefficients.
//!
//! For example:
//!
//! ```
//! use holonomic::closure;
//! use holonomic::domains::Field;
//! use holonomic::domains::fraction::RationalFunctionField;
//! use holonomic::domains::rational::Rational;
//! use holonomic::element::HolonomicRing;
//!
//! let field = RationalFunctionField::rational_functions();
//! let ring = HolonomicRing::new(field.clone());
//!
//! // exp solves y' - y = 0 with y(0) = 1
//! let exp = ring
//!     .element_from_coefficients(vec![field.nth(-1), field.one()], vec![Rational::one()])
//!     .unwrap();
//!
//! // sin solves y'' + y = 0 with y(0) = 0, y'(0) = 1
//! let sin = ring
//!     .element_from_coefficients(
//!         vec![field.one(), field.zero(), field.one()],
//!         vec![Rational::zero(), Rational::one()],
//!     )
//!     .unwrap();
//!
//! // the cubic Taylor terms of exp and sin cancel in the sum
//! let s = closure::sum(&ring, &exp, &sin).unwrap();
//! assert_eq!(s.sequence(3).unwrap(), Rational::zero());
//! ```
//!
//! The [diffalg] module reduces relations of nested holonomic functions to
//! differential-algebraic equations over simpler coefficients, and [guess]
//! searches such equations for lower-depth holonomic forms.

pub mod closure;
pub mod combinatorics;
pub mod conversion;
pub mod diffalg;
pub mod domains;
pub mod element;
pub mod guess;
pub mod matrix;
pub mod operator;
pub mod poly;
