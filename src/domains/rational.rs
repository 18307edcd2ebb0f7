//! The field of rational numbers, backed by GMP through [rug].

use std::fmt::{Display, Error, Formatter};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use rug::ops::Pow;
use rug::{Complete, Integer as MultiPrecisionInteger, Rational as MultiPrecisionRational};

use super::fraction::FractionNormalization;
use super::{
    ConstantRing, Derivable, DomainError, EuclideanDomain, Field, InternalOrdering, Ring,
    SeriesDomain, Substitution,
};

/// The field of rational numbers.
pub const Q: RationalField = RationalField::new();

/// The field of rational numbers.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct RationalField;

impl RationalField {
    pub const fn new() -> RationalField {
        RationalField
    }
}

impl Default for RationalField {
    fn default() -> Self {
        RationalField::new()
    }
}

impl Display for RationalField {
    fn fmt(&self, _: &mut Formatter<'_>) -> std::fmt::Result {
        Ok(())
    }
}

/// An arbitrary-precision rational number.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rational(MultiPrecisionRational);

impl Rational {
    pub fn new(numerator: i64, denominator: i64) -> Rational {
        assert!(denominator != 0, "The denominator cannot be zero");
        Rational(MultiPrecisionRational::from((numerator, denominator)))
    }

    pub fn zero() -> Rational {
        Rational(MultiPrecisionRational::new())
    }

    pub fn one() -> Rational {
        Rational(MultiPrecisionRational::from(1))
    }

    pub fn is_zero(&self) -> bool {
        self.0.cmp0() == std::cmp::Ordering::Equal
    }

    pub fn is_one(&self) -> bool {
        self.0 == 1
    }

    pub fn is_negative(&self) -> bool {
        self.0.cmp0() == std::cmp::Ordering::Less
    }

    pub fn is_integer(&self) -> bool {
        self.0.denom().to_u8() == Some(1)
    }

    /// Read the value back as an `i64` when it is an integer that fits.
    pub fn to_i64(&self) -> Option<i64> {
        if self.is_integer() {
            self.0.numer().to_i64()
        } else {
            None
        }
    }

    pub fn inv(&self) -> Rational {
        assert!(!self.is_zero(), "Cannot invert 0");
        Rational(MultiPrecisionRational::from(self.0.recip_ref()))
    }

    pub fn abs(&self) -> Rational {
        Rational(MultiPrecisionRational::from(self.0.abs_ref()))
    }

    pub fn pow(&self, e: u64) -> Rational {
        let e = u32::try_from(e).expect("Power of rational is too large");
        Rational(self.0.clone().pow(e))
    }

    /// `n!` as a rational number.
    pub fn factorial(n: u64) -> Rational {
        Rational(MultiPrecisionRational::from(
            MultiPrecisionInteger::factorial(
                u32::try_from(n).expect("Factorial argument is too large"),
            )
            .complete(),
        ))
    }

    /// The binomial coefficient `n` over `k`.
    pub fn binomial(n: u64, k: u64) -> Rational {
        Rational(MultiPrecisionRational::from(
            MultiPrecisionInteger::from(n).binomial(
                u32::try_from(k).expect("Binomial argument is too large"),
            ),
        ))
    }

    /// The falling factorial `n * (n-1) * ... * (n-k+1)`.
    pub fn falling_factorial(n: u64, k: u64) -> Rational {
        let mut r = MultiPrecisionInteger::from(1);
        for i in 0..k {
            r *= n - i;
        }
        Rational(MultiPrecisionRational::from(r))
    }

    /// The smallest integer not below `self`.
    pub fn ceil_i64(&self) -> Option<i64> {
        self.0.clone().ceil().numer().to_i64()
    }
}

impl Default for Rational {
    fn default() -> Self {
        Rational::zero()
    }
}

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Rational(MultiPrecisionRational::from(n))
    }
}

impl From<(i64, i64)> for Rational {
    fn from((n, d): (i64, i64)) -> Self {
        Rational::new(n, d)
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::fmt::Debug for Rational {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl InternalOrdering for Rational {
    fn internal_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.cmp(other)
    }
}

macro_rules! impl_binop {
    ($trait:ident, $method:ident) => {
        impl $trait for Rational {
            type Output = Rational;

            fn $method(self, rhs: Rational) -> Rational {
                Rational(self.0.$method(rhs.0))
            }
        }

        impl $trait<&Rational> for &Rational {
            type Output = Rational;

            fn $method(self, rhs: &Rational) -> Rational {
                Rational((&self.0).$method(&rhs.0).complete())
            }
        }
    };
}

impl_binop!(Add, add);
impl_binop!(Sub, sub);
impl_binop!(Mul, mul);

impl Div for Rational {
    type Output = Rational;

    fn div(self, rhs: Rational) -> Rational {
        assert!(!rhs.is_zero(), "Cannot divide by 0");
        Rational(self.0.div(rhs.0))
    }
}

impl Div<&Rational> for &Rational {
    type Output = Rational;

    fn div(self, rhs: &Rational) -> Rational {
        assert!(!rhs.is_zero(), "Cannot divide by 0");
        Rational((&self.0).div(&rhs.0).complete())
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational(self.0.neg())
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        Rational((-&self.0).complete())
    }
}

impl AddAssign<&Rational> for Rational {
    fn add_assign(&mut self, rhs: &Rational) {
        self.0.add_assign(&rhs.0)
    }
}

impl SubAssign<&Rational> for Rational {
    fn sub_assign(&mut self, rhs: &Rational) {
        self.0.sub_assign(&rhs.0)
    }
}

impl MulAssign<&Rational> for Rational {
    fn mul_assign(&mut self, rhs: &Rational) {
        self.0.mul_assign(&rhs.0)
    }
}

impl Ring for RationalField {
    type Element = Rational;

    #[inline]
    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a + b
    }

    #[inline]
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a - b
    }

    #[inline]
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a * b
    }

    #[inline]
    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a += b;
    }

    #[inline]
    fn sub_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a -= b;
    }

    #[inline]
    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a *= b;
    }

    #[inline]
    fn add_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element) {
        *a += &(b * c);
    }

    #[inline]
    fn sub_mul_assign(&self, a: &mut Self::Element, b: &Self::Element, c: &Self::Element) {
        *a -= &(b * c);
    }

    #[inline]
    fn neg(&self, a: &Self::Element) -> Self::Element {
        -a
    }

    #[inline]
    fn zero(&self) -> Self::Element {
        Rational::zero()
    }

    #[inline]
    fn one(&self) -> Self::Element {
        Rational::one()
    }

    #[inline]
    fn nth(&self, n: i64) -> Self::Element {
        Rational::from(n)
    }

    #[inline]
    fn pow(&self, b: &Self::Element, e: u64) -> Self::Element {
        b.pow(e)
    }

    #[inline]
    fn is_zero(a: &Self::Element) -> bool {
        a.is_zero()
    }

    #[inline]
    fn is_one(&self, a: &Self::Element) -> bool {
        a.is_one()
    }

    fn try_div(&self, a: &Self::Element, b: &Self::Element) -> Option<Self::Element> {
        if b.is_zero() {
            None
        } else {
            Some(a / b)
        }
    }

    fn format<W: std::fmt::Write>(&self, element: &Self::Element, f: &mut W) -> Result<(), Error> {
        write!(f, "{}", element)
    }
}

impl EuclideanDomain for RationalField {
    fn rem(&self, _a: &Self::Element, _b: &Self::Element) -> Self::Element {
        Rational::zero()
    }

    fn quot_rem(&self, a: &Self::Element, b: &Self::Element) -> (Self::Element, Self::Element) {
        (self.div(a, b), Rational::zero())
    }

    fn gcd(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        if a.is_zero() && b.is_zero() {
            Rational::zero()
        } else {
            Rational::one()
        }
    }
}

impl Field for RationalField {
    #[inline]
    fn div(&self, a: &Self::Element, b: &Self::Element) -> Self::Element {
        a / b
    }

    #[inline]
    fn div_assign(&self, a: &mut Self::Element, b: &Self::Element) {
        *a = &*a / b;
    }

    #[inline]
    fn inv(&self, a: &Self::Element) -> Self::Element {
        a.inv()
    }
}

// Fractions over a field are normalized to a trivial denominator.
impl FractionNormalization for RationalField {
    fn get_normalization_factor(&self, a: &Self::Element) -> Self::Element {
        a.inv()
    }
}

impl Derivable for RationalField {
    fn derivative(&self, _: &Self::Element) -> Self::Element {
        Rational::zero()
    }
}

impl ConstantRing for RationalField {
    fn as_rational(&self, e: &Self::Element) -> Option<Rational> {
        Some(e.clone())
    }

    fn from_rational(&self, r: &Rational) -> Self::Element {
        r.clone()
    }
}

impl SeriesDomain for RationalField {
    type Constants = RationalField;

    fn constants(&self) -> Self::Constants {
        RationalField
    }

    fn series_coefficient(&self, e: &Self::Element, n: usize) -> Result<Rational, DomainError> {
        if n == 0 {
            Ok(e.clone())
        } else {
            Ok(Rational::zero())
        }
    }

    fn valuation(&self, e: &Self::Element) -> Result<Option<usize>, DomainError> {
        if e.is_zero() {
            Ok(None)
        } else {
            Ok(Some(0))
        }
    }

    fn lift_constant(&self, c: &Rational) -> Self::Element {
        c.clone()
    }

    fn is_constant(&self, _: &Self::Element) -> bool {
        true
    }
}

impl Substitution for RationalField {
    fn substitute(
        &self,
        e: &Self::Element,
        _g: &Self::Element,
    ) -> Result<Self::Element, DomainError> {
        Ok(e.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Rational::new(2, 3);
        let b = Rational::new(-1, 6);
        assert_eq!(&a + &b, Rational::new(1, 2));
        assert_eq!(&a * &b, Rational::new(-1, 9));
        assert_eq!(&a / &b, Rational::from(-4));
        assert_eq!(a.inv(), Rational::new(3, 2));
    }

    #[test]
    fn combinatorial_helpers() {
        assert_eq!(Rational::factorial(5), Rational::from(120));
        assert_eq!(Rational::binomial(7, 3), Rational::from(35));
        assert_eq!(Rational::falling_factorial(6, 2), Rational::from(30));
        assert_eq!(Rational::falling_factorial(6, 0), Rational::one());
    }

    #[test]
    fn integer_detection() {
        assert_eq!(Rational::new(9, 3).to_i64(), Some(3));
        assert_eq!(Rational::new(1, 3).to_i64(), None);
        assert_eq!(Rational::new(7, 2).ceil_i64(), Some(4));
    }
}
