//! Floating-point traits.
//!
//! The traits abstract over the width of a floating-point number, so that
//! algorithms can be written once for both `f64` and
//! [DoubleDouble](super::double_double::DoubleDouble).

use std::{
    fmt::{Debug, Display, LowerExp},
    ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign},
};

use rand::Rng;
use rug::{Integer, Rational};

use super::double_double::DoubleDouble;

/// A number, that is potentially floating point.
pub trait NumericalFloatLike:
    PartialEq
    + Clone
    + Debug
    + LowerExp
    + Display
    + std::ops::Neg<Output = Self>
    + Add<Self, Output = Self>
    + Sub<Self, Output = Self>
    + Mul<Self, Output = Self>
    + Div<Self, Output = Self>
    + for<'a> Add<&'a Self, Output = Self>
    + for<'a> Sub<&'a Self, Output = Self>
    + for<'a> Mul<&'a Self, Output = Self>
    + for<'a> Div<&'a Self, Output = Self>
    + for<'a> AddAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + AddAssign<Self>
    + SubAssign<Self>
    + MulAssign<Self>
    + DivAssign<Self>
{
    /// Perform `(self * a) + b`.
    fn mul_add(&self, a: &Self, b: &Self) -> Self;
    fn neg(&self) -> Self;
    fn zero(&self) -> Self;
    /// Create a zero that should only be used as a temporary value.
    fn new_zero() -> Self;
    fn one(&self) -> Self;
    fn pow(&self, e: u64) -> Self;
    fn inv(&self) -> Self;

    fn from_usize(&self, a: usize) -> Self;
    fn from_i64(&self, a: i64) -> Self;

    /// Get the number of precise binary digits.
    fn get_precision(&self) -> u32;
    /// Get the relative accuracy of a single rounded operation.
    fn get_epsilon(&self) -> f64;
    /// Return true iff the precision is fixed.
    fn fixed_precision(&self) -> bool;

    /// Sample a point on the interval [0, 1].
    fn sample_unit<R: Rng + ?Sized>(&self, rng: &mut R) -> Self;
}

/// A number that behaves like a single number.
pub trait SingleFloat: NumericalFloatLike {
    fn is_zero(&self) -> bool;
    fn is_one(&self) -> bool;
    fn is_finite(&self) -> bool;
    /// Convert an exact rational to the closest representable float.
    fn from_rational(&self, rat: &Rational) -> Self;
}

/// A number that can be converted to a usize, f64, or rounded to the nearest integer.
pub trait RealNumberLike: SingleFloat {
    fn to_usize_clamped(&self) -> usize;
    fn to_f64(&self) -> f64;
    /// Round to the nearest integer, with ties away from zero.
    /// Non-finite values are mapped to zero.
    fn round_to_nearest_integer(&self) -> Integer;
}

/// A float that can be constructed without any parameters, such as f64.
pub trait ConstructibleFloat: NumericalFloatLike {
    fn new_one() -> Self;
    fn new_from_usize(a: usize) -> Self;
    fn new_from_i64(a: i64) -> Self;
    /// Sample a point on the interval [0, 1].
    fn new_sample_unit<R: Rng + ?Sized>(rng: &mut R) -> Self;
}

/// Compute `base^e` using binary exponentiation.
pub fn binary_pow<T: NumericalFloatLike>(base: &T, e: u64) -> T {
    let mut result = base.one();
    if e == 0 {
        return result;
    }

    let mut b = base.clone();
    let mut e = e;
    loop {
        if e & 1 == 1 {
            result *= &b;
        }
        e >>= 1;
        if e == 0 {
            break;
        }
        b = b.clone() * &b;
    }

    result
}

impl ConstructibleFloat for f64 {
    fn new_one() -> f64 {
        1.
    }

    fn new_from_usize(a: usize) -> f64 {
        a as f64
    }

    fn new_from_i64(a: i64) -> f64 {
        a as f64
    }

    /// Sample uniformly from `[0, 1)` with 53 random bits.
    fn new_sample_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        rng.gen::<f64>()
    }
}

impl NumericalFloatLike for f64 {
    #[inline]
    fn mul_add(&self, a: &f64, b: &f64) -> f64 {
        f64::mul_add(*self, *a, *b)
    }

    #[inline]
    fn neg(&self) -> f64 {
        -*self
    }

    fn zero(&self) -> f64 {
        f64::new_zero()
    }

    fn new_zero() -> f64 {
        0.
    }

    fn one(&self) -> f64 {
        f64::new_one()
    }

    fn pow(&self, e: u64) -> f64 {
        binary_pow(self, e)
    }

    #[inline]
    fn inv(&self) -> f64 {
        self.recip()
    }

    fn from_usize(&self, a: usize) -> f64 {
        f64::new_from_usize(a)
    }

    fn from_i64(&self, a: i64) -> f64 {
        f64::new_from_i64(a)
    }

    fn get_precision(&self) -> u32 {
        f64::MANTISSA_DIGITS
    }

    /// The unit round-off `2^-53`.
    fn get_epsilon(&self) -> f64 {
        0.5 * f64::EPSILON
    }

    fn fixed_precision(&self) -> bool {
        true
    }

    fn sample_unit<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        f64::new_sample_unit(rng)
    }
}

impl SingleFloat for f64 {
    fn is_zero(&self) -> bool {
        *self == 0.
    }

    fn is_one(&self) -> bool {
        *self == 1.
    }

    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }

    /// The leading part of the closest double-double is the closest `f64`.
    fn from_rational(&self, rat: &Rational) -> f64 {
        DoubleDouble::from_rational(rat).hi()
    }
}

impl RealNumberLike for f64 {
    /// Negative values and `NaN` clamp to zero.
    fn to_usize_clamped(&self) -> usize {
        self.max(0.) as usize
    }

    fn to_f64(&self) -> f64 {
        *self
    }

    fn round_to_nearest_integer(&self) -> Integer {
        // `self + 0.5` rounds up to 1 for the largest double below 0.5
        Integer::from_f64(self.round()).unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn horner<T: NumericalFloatLike>(coefficients: &[T], x: &T) -> T {
        let mut r = x.zero();
        for c in coefficients.iter().rev() {
            r = r.mul_add(x, c);
        }
        r
    }

    #[test]
    fn double() {
        assert_eq!(binary_pow(&3f64, 5), 243.);
        assert_eq!(NumericalFloatLike::pow(&2f64, 0), 1.);
        assert_eq!(NumericalFloatLike::pow(&0.5f64, 3), 0.125);
        assert_eq!(horner(&[1., 2., 3.], &2.), 17.);
    }

    #[test]
    fn rounding() {
        assert_eq!(2.5f64.round_to_nearest_integer(), Integer::from(3));
        assert_eq!((-2.5f64).round_to_nearest_integer(), Integer::from(-3));
        assert_eq!(f64::NAN.round_to_nearest_integer(), Integer::from(0));
        assert_eq!(
            0.49999999999999994f64.round_to_nearest_integer(),
            Integer::from(0)
        );
        assert_eq!(
            (-0.49999999999999994f64).round_to_nearest_integer(),
            Integer::from(0)
        );
        assert_eq!(
            4503599627370497f64.round_to_nearest_integer(),
            Integer::from(4503599627370497u64)
        );
        assert_eq!((-1.5f64).to_usize_clamped(), 0);
        assert_eq!(2f64.get_precision(), 53);
        assert_eq!(1f64.from_rational(&Rational::from((1, 3))), 1. / 3.);
    }
}
