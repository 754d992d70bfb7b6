//! Double-double numbers: the unevaluated sum of two `f64` values, giving
//! about 106 bits of precision.
//!
//! ```
//! use ddnum::domains::double_double::DoubleDouble;
//!
//! // 0.1 + 0.2 computed without loss of the round-off
//! let x = DoubleDouble::of_sum(0.1, 0.2);
//! assert_eq!(x.hi(), 0.30000000000000004);
//! assert_eq!(x.lo(), -2.7755575615628914e-17);
//!
//! let third = DoubleDouble::of_quotient(1., 3.);
//! let one = third * 3.;
//! assert_eq!(one.hi(), 1.);
//! assert!(one.lo().abs() < 1e-31);
//! ```
//!
//! The exact constructors [DoubleDouble::of_sum], [DoubleDouble::of_difference],
//! [DoubleDouble::of_product] and [DoubleDouble::of_square] represent the result
//! of the operation on two `f64` values without any error. Arithmetic on
//! double-doubles is accurate to a few units of `2^-106` relative to the result.
//!
//! Special values are not propagated according to IEEE-754 in every
//! intermediate step. An overflow or a non-finite operand results in a number
//! whose parts are not finite, which can be detected with [DoubleDouble::is_finite].
//! Multiplication does not rescale its operands and therefore yields an
//! invalid result when either operand exceeds `2^996` in magnitude.

use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter, LowerExp},
    hash::{Hash, Hasher},
    io::{Read, Write},
    ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign},
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use bytes::{Buf, BufMut};
use rand::Rng;
use rug::{Float as MultiPrecisionFloat, Integer, Rational};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    error::Error,
    transform::{
        exponent, fast_two_sum_low, frexp, is_normal, scalb, two_diff_low, two_product_low,
        two_product_low_unscaled, two_square_low, two_square_low_unscaled, two_sum, two_sum_low,
    },
};

use super::{
    float::{ConstructibleFloat, NumericalFloatLike, RealNumberLike, SingleFloat},
    triple_double::TripleDouble,
};

/// Below `2^-900` the round-off of the square root estimate may be sub-normal.
const SQRT_SAFE_LOWER: f64 = 1.1830521861667747e-271;
/// Above `2^996` the square of the square root estimate may overflow in the split.
const SQRT_SAFE_UPPER: f64 = 6.696928794914171e299;
/// The (even) power of two used to rescale small and large arguments of the square root.
const SQRT_SCALE_EXPONENT: i32 = 600;
/// `2^-53`
const TWO_POW_MINUS_53: f64 = 1.1102230246251565e-16;
/// The bits used to hash every `NaN`.
const NAN_BITS: u64 = 0x7ff8_0000_0000_0000;
/// The number of bytes of a packed double-double.
const PACKED_SIZE: usize = 16;
/// The precision in bits used for decimal output.
const DISPLAY_PRECISION: u32 = 110;

/// The algorithm used to compute large integer powers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowAccuracy {
    /// Repeated double-double squaring, with an error that grows linearly
    /// with the exponent.
    #[default]
    Standard,
    /// Repeated triple-double squaring, rounded to a double-double at the end.
    /// The error is a few units of `2^-106` independent of the exponent.
    Extended,
}

/// A double-double number `hi + lo`.
///
/// Values returned by the public constructors and operations are normalized:
/// `hi` is the `f64` closest to `hi + lo` and `lo` is the round-off.
///
/// Equality and hashing compare the two parts bitwise, where all `NaN` values
/// are equal and `-0` is equal to `0`. Two different splits of the same real number
/// are therefore not equal.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct DoubleDouble {
    hi: f64,
    lo: f64,
}

impl DoubleDouble {
    /// The number `0`.
    pub const ZERO: DoubleDouble = DoubleDouble { hi: 0., lo: 0. };
    /// The number `1`.
    pub const ONE: DoubleDouble = DoubleDouble { hi: 1., lo: 0. };
    /// The unit of relative accuracy, `2^-106`.
    pub const EPSILON: f64 = 1.232595164407831e-32;

    #[inline(always)]
    pub(crate) const fn new(hi: f64, lo: f64) -> DoubleDouble {
        DoubleDouble { hi, lo }
    }

    /// Create a double-double from its parts, without normalization.
    ///
    /// The parts are taken as is: `of(1. + f64::EPSILON, -f64::EPSILON)` represents `1`
    /// but is not equal to [DoubleDouble::ONE].
    #[inline]
    pub const fn of(hi: f64, lo: f64) -> DoubleDouble {
        DoubleDouble { hi, lo }
    }

    #[inline]
    pub const fn from_f64(x: f64) -> DoubleDouble {
        DoubleDouble { hi: x, lo: 0. }
    }

    /// Create the exact double-double of an integer.
    pub fn from_i64(n: i64) -> DoubleDouble {
        DoubleDouble::from_wide_integer(n as i128)
    }

    /// Create the closest double-double of an integer of at most 106 bits.
    fn from_wide_integer(n: i128) -> DoubleDouble {
        let hi = n as f64;
        let lo = (n - hi as i128) as f64;
        DoubleDouble::normalize(hi, lo)
    }

    /// Compute `x + y` exactly.
    #[inline]
    pub fn of_sum(x: f64, y: f64) -> DoubleDouble {
        let s = x + y;
        DoubleDouble::new(s, two_sum_low(x, y, s))
    }

    /// Compute `x - y` exactly.
    #[inline]
    pub fn of_difference(x: f64, y: f64) -> DoubleDouble {
        let d = x - y;
        DoubleDouble::new(d, two_diff_low(x, y, d))
    }

    /// Compute `x * y` exactly, provided the product is a normal number.
    /// The low part of an overflowing product is `NaN`.
    #[inline]
    pub fn of_product(x: f64, y: f64) -> DoubleDouble {
        let p = x * y;
        DoubleDouble::new(p, two_product_low(x, y, p))
    }

    /// Compute `x * x` exactly, provided the square is a normal number.
    #[inline]
    pub fn of_square(x: f64) -> DoubleDouble {
        let p = x * x;
        DoubleDouble::new(p, two_square_low(x, p))
    }

    /// Compute the closest double-double to `x / y`, using long division.
    /// A zero divisor yields `NaN` in both parts.
    pub fn of_quotient(x: f64, y: f64) -> DoubleDouble {
        DoubleDouble::divide(x, 0., y, 0.)
    }

    /// Create the double-double closest to an exact rational.
    pub fn from_rational(value: &Rational) -> DoubleDouble {
        let hi = MultiPrecisionFloat::with_val(53, value).to_f64();
        let Some(hi_exact) = Rational::from_f64(hi) else {
            return DoubleDouble::new(hi, 0.);
        };

        let remainder = value.clone() - hi_exact;
        let lo = MultiPrecisionFloat::with_val(53, &remainder).to_f64();
        let (hi, lo) = two_sum(hi, lo);
        DoubleDouble::new(hi, lo)
    }

    /// Create the double-double closest to a multi-precision float.
    pub fn from_float(value: &MultiPrecisionFloat) -> DoubleDouble {
        match value.to_rational() {
            Some(r) => DoubleDouble::from_rational(&r),
            None => DoubleDouble::new(value.to_f64(), 0.),
        }
    }

    #[inline(always)]
    pub fn hi(&self) -> f64 {
        self.hi
    }

    #[inline(always)]
    pub fn lo(&self) -> f64 {
        self.lo
    }

    /// Get the closest `f64`, `hi + lo`.
    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.hi + self.lo
    }

    /// Convert to an integer, truncating towards zero and saturating at the bounds
    /// of `i64`. `NaN` is mapped to `0`.
    pub fn to_i64(&self) -> i64 {
        // the sum cannot cross an integer if the high part is not one
        if !self.hi.is_finite() || self.hi.trunc() != self.hi || self.hi.abs() >= 1.8446744073709552e19
        {
            return self.hi as i64;
        }

        let whole = self.hi as i128;
        let correction = if self.hi > 0. {
            self.lo.floor()
        } else if self.hi < 0. {
            self.lo.ceil()
        } else {
            0.
        };

        (whole + correction as i128).clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    /// Convert to an integer, truncating towards zero and saturating at the bounds
    /// of `i32`.
    pub fn to_i32(&self) -> i32 {
        self.to_i64().clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    /// Convert to the exact rational `hi + lo`. Fails if the number is not finite.
    pub fn to_rational(&self) -> Result<Rational, Error> {
        match (Rational::from_f64(self.hi), Rational::from_f64(self.lo)) {
            (Some(hi), Some(lo)) if self.is_finite() => Ok(hi + lo),
            _ => {
                debug!("Cannot convert non-finite double-double {:?}", self);
                Err(Error::NonFinite)
            }
        }
    }

    /// Convert to a multi-precision float with `prec` bits of precision,
    /// rounding to nearest. Fails if the number is not finite or if the precision
    /// is not supported.
    pub fn to_float(&self, prec: u32) -> Result<MultiPrecisionFloat, Error> {
        if prec < rug::float::prec_min() || prec > rug::float::prec_max() {
            debug!("Unsupported precision {}", prec);
            return Err(Error::InvalidPrecision { precision: prec });
        }

        let r = self.to_rational()?;
        Ok(MultiPrecisionFloat::with_val(prec, &r))
    }

    /// Returns true iff `hi + lo` is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.to_f64().is_finite()
    }

    /// Renormalize a pair with `|hi| >= |lo|`.
    #[inline(always)]
    fn normalize(hi: f64, lo: f64) -> DoubleDouble {
        let s = hi + lo;
        DoubleDouble::new(s, fast_two_sum_low(hi, lo, s))
    }

    /// Compute `(x, xx) + y`.
    #[inline]
    fn add_parts_f64(x: f64, xx: f64, y: f64) -> DoubleDouble {
        let s = x + y;
        let e = two_sum_low(x, y, s);
        DoubleDouble::normalize(s, e + xx)
    }

    /// Compute `(x, xx) + (y, yy)`.
    #[inline]
    fn add_parts(x: f64, xx: f64, y: f64, yy: f64) -> DoubleDouble {
        let s = x + y;
        let e = two_sum_low(x, y, s);
        let t = xx + yy;
        let f = two_sum_low(xx, yy, t);

        let r = DoubleDouble::normalize(s, e + t);
        DoubleDouble::normalize(r.hi, r.lo + f)
    }

    /// Compute `(x, xx) * y`, rescaling to keep the round-off of `x * y` exact.
    #[inline]
    fn mul_parts_f64_scaled(x: f64, xx: f64, y: f64) -> DoubleDouble {
        let p = x * y;
        DoubleDouble::normalize(p, two_product_low(x, y, p) + xx * y)
    }

    /// Long division of `(x, xx)` by `(y, yy)`, computing three quotient digits.
    fn divide(x: f64, xx: f64, y: f64, yy: f64) -> DoubleDouble {
        let q0 = x / y;
        let p = DoubleDouble::mul_parts_f64_scaled(y, yy, q0);
        let r = DoubleDouble::add_parts(x, xx, -p.hi, -p.lo);

        let q1 = r.hi / y;
        let p = DoubleDouble::mul_parts_f64_scaled(y, yy, q1);
        let r = DoubleDouble::add_parts(r.hi, r.lo, -p.hi, -p.lo);

        let q2 = r.hi / y;
        let q = DoubleDouble::normalize(q0, q1);
        let (hi, lo) = two_sum(q.hi, q.lo + q2);
        DoubleDouble::new(hi, lo)
    }

    /// Compute `self + other`, with an error of at most `4 * 2^-106` relative to the result.
    #[inline]
    pub fn add(&self, other: &DoubleDouble) -> DoubleDouble {
        DoubleDouble::add_parts(self.hi, self.lo, other.hi, other.lo)
    }

    /// Compute `self + y`, with an error of at most `2 * 2^-106` relative to the result.
    #[inline]
    pub fn add_f64(&self, y: f64) -> DoubleDouble {
        DoubleDouble::add_parts_f64(self.hi, self.lo, y)
    }

    #[inline]
    pub fn sub(&self, other: &DoubleDouble) -> DoubleDouble {
        DoubleDouble::add_parts(self.hi, self.lo, -other.hi, -other.lo)
    }

    #[inline]
    pub fn sub_f64(&self, y: f64) -> DoubleDouble {
        DoubleDouble::add_parts_f64(self.hi, self.lo, -y)
    }

    /// Compute `self * other`, with an error of at most `4 * 2^-106` relative to the result.
    #[inline]
    pub fn mul(&self, other: &DoubleDouble) -> DoubleDouble {
        let p = self.hi * other.hi;
        let e = two_product_low_unscaled(self.hi, other.hi, p);
        DoubleDouble::normalize(p, e + (self.hi * other.lo + self.lo * other.hi))
    }

    /// Compute `self * y`, with an error of at most `3 * 2^-106` relative to the result.
    #[inline]
    pub fn mul_f64(&self, y: f64) -> DoubleDouble {
        let p = self.hi * y;
        let e = two_product_low_unscaled(self.hi, y, p);
        DoubleDouble::normalize(p, e + self.lo * y)
    }

    /// Compute `self / other` using long division, with an error of at most
    /// `4 * 2^-106` relative to the result.
    /// Division by zero yields `NaN` in both parts, not an infinity.
    #[inline]
    pub fn div(&self, other: &DoubleDouble) -> DoubleDouble {
        DoubleDouble::divide(self.hi, self.lo, other.hi, other.lo)
    }

    /// Compute `self / y` using long division, with an error of at most
    /// `2^-106` relative to the result.
    /// Division by zero yields `NaN` in both parts.
    #[inline]
    pub fn div_f64(&self, y: f64) -> DoubleDouble {
        DoubleDouble::divide(self.hi, self.lo, y, 0.)
    }

    /// Compute `1 / self`. The reciprocal of zero has `NaN` in both parts.
    #[inline]
    pub fn reciprocal(&self) -> DoubleDouble {
        DoubleDouble::divide(1., 0., self.hi, self.lo)
    }

    /// Compute `self * self`.
    #[inline]
    pub fn square(&self) -> DoubleDouble {
        let p = self.hi * self.hi;
        let e = two_square_low_unscaled(self.hi, p);
        DoubleDouble::normalize(p, e + 2. * self.hi * self.lo)
    }

    /// Compute the square root using Dekker's algorithm.
    /// Negative numbers yield `NaN`.
    pub fn sqrt(&self) -> DoubleDouble {
        let c = self.hi.sqrt();
        if !is_normal(c) {
            // zero, infinity or NaN
            return DoubleDouble::new(c, 0.);
        }

        if self.hi < SQRT_SAFE_LOWER {
            return self
                .scalb(SQRT_SCALE_EXPONENT)
                .sqrt()
                .scalb(-SQRT_SCALE_EXPONENT / 2);
        }
        if self.hi > SQRT_SAFE_UPPER {
            return self
                .scalb(-SQRT_SCALE_EXPONENT)
                .sqrt()
                .scalb(SQRT_SCALE_EXPONENT / 2);
        }

        let u = c * c;
        let uu = two_square_low_unscaled(c, u);
        let cc = (self.hi - u - uu + self.lo) * 0.5 / c;
        DoubleDouble::normalize(c, cc)
    }

    #[inline]
    pub fn negate(&self) -> DoubleDouble {
        DoubleDouble::new(-self.hi, -self.lo)
    }

    #[inline]
    pub fn abs(&self) -> DoubleDouble {
        if self.hi < 0. {
            self.negate()
        } else {
            *self
        }
    }

    /// Compute the largest integer not above `self`.
    pub fn floor(&self) -> DoubleDouble {
        DoubleDouble::floor_or_ceil(self.hi, self.lo, f64::floor)
    }

    /// Compute the smallest integer not below `self`.
    pub fn ceil(&self) -> DoubleDouble {
        DoubleDouble::floor_or_ceil(self.hi, self.lo, f64::ceil)
    }

    #[inline]
    fn floor_or_ceil(x: f64, xx: f64, op: fn(f64) -> f64) -> DoubleDouble {
        let y = op(x);
        if y == x {
            // an integral high part may still have a fractional low part
            let (hi, lo) = two_sum(y, op(xx));
            DoubleDouble::new(hi, lo)
        } else {
            DoubleDouble::new(y, 0.)
        }
    }

    /// Compute `self^n` using binary exponentiation. Negative powers are computed as
    /// the reciprocal of the positive power.
    ///
    /// The error is bounded by about `16 * (|n| - 1) * 2^-106` relative to the result.
    /// Intermediate overflow yields a non-finite result; use [DoubleDouble::pow_scaled]
    /// for results outside the range of `f64`.
    pub fn pow(&self, n: i32) -> DoubleDouble {
        if n == 0 {
            return DoubleDouble::ONE;
        }
        if n == 1 {
            return *self;
        }

        if !is_normal(self.hi) {
            // zero, sub-normal, infinite or NaN
            return DoubleDouble::new(self.hi.powi(n), 0.);
        }

        let r = self.pow_unsigned(n.unsigned_abs() as u64);
        if n < 0 {
            r.reciprocal()
        } else {
            r
        }
    }

    fn pow_unsigned(&self, n: u64) -> DoubleDouble {
        let mut result: Option<DoubleDouble> = None;
        let mut base = *self;
        let mut n = n;
        while n > 0 {
            if n & 1 == 1 {
                result = Some(match result {
                    Some(r) => r.mul(&base),
                    None => base,
                });
            }
            n >>= 1;
            if n > 0 {
                base = base.square();
            }
        }
        result.unwrap_or(DoubleDouble::ONE)
    }

    /// Compute `self^n` as a fraction `f` with `|f|` in `[0.5, 1)` and an exponent `e`,
    /// such that `self^n = f * 2^e`. The result cannot overflow or underflow.
    ///
    /// Zero, infinite and `NaN` arguments return `self.pow(n)` with exponent `0`.
    #[inline]
    pub fn pow_scaled(&self, n: i32) -> (DoubleDouble, i64) {
        self.pow_scaled_with(n, PowAccuracy::default())
    }

    /// Compute `self^n` as a scaled fraction, like [DoubleDouble::pow_scaled],
    /// using the given algorithm.
    pub fn pow_scaled_with(&self, n: i32, accuracy: PowAccuracy) -> (DoubleDouble, i64) {
        if self.hi == 0. || !self.is_finite() {
            return (self.pow(n), 0);
        }

        if n == 0 {
            return (DoubleDouble::new(0.5, 0.), 1);
        }

        trace!("Computing scaled power {} with {:?} accuracy", n, accuracy);

        let (f, e) = self.frexp();
        let m = n.unsigned_abs();
        let (mut r, mut re) = match accuracy {
            PowAccuracy::Standard => DoubleDouble::pow_fraction(f, e as i64, m),
            PowAccuracy::Extended => DoubleDouble::pow_fraction_extended(f, e as i64, m),
        };

        if n < 0 {
            let (q, k) = r.reciprocal().frexp();
            r = q;
            re = k as i64 - re;
        }

        (r, re)
    }

    /// Compute `(f * 2^e)^n` for a fraction `f` in `[0.5, 1)`, renormalizing after every
    /// operation so that intermediate results stay in `[0.25, 1)`.
    fn pow_fraction(f: DoubleDouble, e: i64, n: u32) -> (DoubleDouble, i64) {
        let mut result = DoubleDouble::ONE;
        let mut result_exp = 0i64;
        let mut base = f;
        let mut base_exp = e;
        let mut n = n;

        loop {
            if n & 1 == 1 {
                let (r, k) = result.mul(&base).frexp();
                result = r;
                result_exp += base_exp + k as i64;
            }
            n >>= 1;
            if n == 0 {
                break;
            }

            let (b, k) = base.square().frexp();
            base = b;
            base_exp = 2 * base_exp + k as i64;
        }

        (result, result_exp)
    }

    /// Compute `(f * 2^e)^n` like [DoubleDouble::pow_fraction], accumulating in triple-double.
    fn pow_fraction_extended(f: DoubleDouble, e: i64, n: u32) -> (DoubleDouble, i64) {
        let mut result = TripleDouble::ONE;
        let mut result_exp = 0i64;
        let mut base = TripleDouble::from(f);
        let mut base_exp = e;
        let mut n = n;

        loop {
            if n & 1 == 1 {
                let (r, k) = result.mul(&base).frexp();
                result = r;
                result_exp += base_exp + k as i64;
            }
            n >>= 1;
            if n == 0 {
                break;
            }

            let (b, k) = base.square().frexp();
            base = b;
            base_exp = 2 * base_exp + k as i64;
        }

        // rounding may carry into the next binade
        let (r, k) = result.to_double_double().frexp();
        (r, result_exp + k as i64)
    }

    /// Split into a fraction `f` with `|f|` in `[0.5, 1)` and an exponent `e`, such that
    /// `self = f * 2^e`. Zero, infinite and `NaN` numbers are returned unchanged with
    /// exponent `0`.
    ///
    /// The high part of the fraction is `±1` if the high part of `self` is a power of two
    /// and the low part has the opposite sign.
    pub fn frexp(&self) -> (DoubleDouble, i32) {
        if self.hi == 0. || !self.hi.is_finite() {
            return (*self, 0);
        }

        let (f, mut e) = frexp(self.hi);
        if f.abs() == 0.5 && self.lo != 0. && (self.lo < 0.) != (self.hi < 0.) {
            e -= 1;
        }

        (self.scalb(-e), e)
    }

    /// Compute `self * 2^n`. This is exact unless a part of the result is sub-normal.
    #[inline]
    pub fn scalb(&self, n: i32) -> DoubleDouble {
        DoubleDouble::new(scalb(self.hi, n), scalb(self.lo, n))
    }

    /// Get the binary exponent of the high part.
    #[inline]
    pub fn exponent(&self) -> i32 {
        exponent(self.hi)
    }

    /// Write the two parts as 16 little-endian bytes.
    pub fn write<W: Write>(&self, mut dest: W) -> std::io::Result<()> {
        dest.write_f64::<LittleEndian>(self.hi)?;
        dest.write_f64::<LittleEndian>(self.lo)
    }

    /// Read a double-double written with [DoubleDouble::write]. The parts are not
    /// renormalized.
    pub fn import<R: Read>(mut source: R) -> std::io::Result<DoubleDouble> {
        let hi = source.read_f64::<LittleEndian>()?;
        let lo = source.read_f64::<LittleEndian>()?;
        Ok(DoubleDouble::new(hi, lo))
    }

    /// Append the two parts to a byte buffer.
    pub fn write_packed(&self, dest: &mut Vec<u8>) {
        dest.put_f64_le(self.hi);
        dest.put_f64_le(self.lo);
    }

    /// Read a packed double-double from the start of `source`, returning the
    /// remaining bytes.
    pub fn from_packed(mut source: &[u8]) -> Result<(DoubleDouble, &[u8]), Error> {
        if source.remaining() < PACKED_SIZE {
            return Err(Error::Truncated {
                needed: PACKED_SIZE,
                available: source.remaining(),
            });
        }

        let hi = source.get_f64_le();
        let lo = source.get_f64_le();
        Ok((DoubleDouble::new(hi, lo), source))
    }

    #[inline(always)]
    fn canonical_bits(x: f64) -> u64 {
        if x.is_nan() {
            NAN_BITS
        } else if x == 0. {
            0
        } else {
            x.to_bits()
        }
    }
}

impl From<f64> for DoubleDouble {
    #[inline]
    fn from(value: f64) -> Self {
        DoubleDouble::from_f64(value)
    }
}

impl From<i32> for DoubleDouble {
    #[inline]
    fn from(value: i32) -> Self {
        DoubleDouble::from_f64(value as f64)
    }
}

impl From<i64> for DoubleDouble {
    #[inline]
    fn from(value: i64) -> Self {
        DoubleDouble::from_i64(value)
    }
}

impl PartialEq for DoubleDouble {
    fn eq(&self, other: &Self) -> bool {
        DoubleDouble::canonical_bits(self.hi) == DoubleDouble::canonical_bits(other.hi)
            && DoubleDouble::canonical_bits(self.lo) == DoubleDouble::canonical_bits(other.lo)
    }
}

impl Eq for DoubleDouble {}

impl Hash for DoubleDouble {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(DoubleDouble::canonical_bits(self.hi));
        state.write_u64(DoubleDouble::canonical_bits(self.lo));
    }
}

impl PartialOrd for DoubleDouble {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        // consistent with `eq`, which treats all `NaN` as equal
        if self == other {
            return Some(Ordering::Equal);
        }

        match self.hi.partial_cmp(&other.hi)? {
            Ordering::Equal => self.lo.partial_cmp(&other.lo),
            o => Some(o),
        }
    }
}

impl Display for DoubleDouble {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.to_float(DISPLAY_PRECISION) {
            Ok(v) => Display::fmt(&v, f),
            Err(_) => Display::fmt(&self.to_f64(), f),
        }
    }
}

impl LowerExp for DoubleDouble {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.to_float(DISPLAY_PRECISION) {
            Ok(v) => LowerExp::fmt(&v, f),
            Err(_) => LowerExp::fmt(&self.to_f64(), f),
        }
    }
}

impl Neg for DoubleDouble {
    type Output = DoubleDouble;

    #[inline]
    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl<'a> Neg for &'a DoubleDouble {
    type Output = DoubleDouble;

    #[inline]
    fn neg(self) -> Self::Output {
        self.negate()
    }
}

macro_rules! impl_binary_op {
    ($op:ident, $op_fn:ident, $assign:ident, $assign_fn:ident, $dd_fn:ident, $f64_fn:ident) => {
        impl $op<DoubleDouble> for DoubleDouble {
            type Output = DoubleDouble;

            #[inline]
            fn $op_fn(self, rhs: DoubleDouble) -> Self::Output {
                DoubleDouble::$dd_fn(&self, &rhs)
            }
        }

        impl<'a> $op<&'a DoubleDouble> for DoubleDouble {
            type Output = DoubleDouble;

            #[inline]
            fn $op_fn(self, rhs: &'a DoubleDouble) -> Self::Output {
                DoubleDouble::$dd_fn(&self, rhs)
            }
        }

        impl<'a> $op<DoubleDouble> for &'a DoubleDouble {
            type Output = DoubleDouble;

            #[inline]
            fn $op_fn(self, rhs: DoubleDouble) -> Self::Output {
                DoubleDouble::$dd_fn(self, &rhs)
            }
        }

        impl<'a, 'b> $op<&'a DoubleDouble> for &'b DoubleDouble {
            type Output = DoubleDouble;

            #[inline]
            fn $op_fn(self, rhs: &'a DoubleDouble) -> Self::Output {
                DoubleDouble::$dd_fn(self, rhs)
            }
        }

        impl $op<f64> for DoubleDouble {
            type Output = DoubleDouble;

            #[inline]
            fn $op_fn(self, rhs: f64) -> Self::Output {
                DoubleDouble::$f64_fn(&self, rhs)
            }
        }

        impl<'a> $op<f64> for &'a DoubleDouble {
            type Output = DoubleDouble;

            #[inline]
            fn $op_fn(self, rhs: f64) -> Self::Output {
                DoubleDouble::$f64_fn(self, rhs)
            }
        }

        impl $assign<DoubleDouble> for DoubleDouble {
            #[inline]
            fn $assign_fn(&mut self, rhs: DoubleDouble) {
                *self = DoubleDouble::$dd_fn(self, &rhs);
            }
        }

        impl<'a> $assign<&'a DoubleDouble> for DoubleDouble {
            #[inline]
            fn $assign_fn(&mut self, rhs: &'a DoubleDouble) {
                *self = DoubleDouble::$dd_fn(self, rhs);
            }
        }

        impl $assign<f64> for DoubleDouble {
            #[inline]
            fn $assign_fn(&mut self, rhs: f64) {
                *self = DoubleDouble::$f64_fn(self, rhs);
            }
        }
    };
}

impl_binary_op!(Add, add, AddAssign, add_assign, add, add_f64);
impl_binary_op!(Sub, sub, SubAssign, sub_assign, sub, sub_f64);
impl_binary_op!(Mul, mul, MulAssign, mul_assign, mul, mul_f64);
impl_binary_op!(Div, div, DivAssign, div_assign, div, div_f64);

impl Add<DoubleDouble> for f64 {
    type Output = DoubleDouble;

    #[inline]
    fn add(self, rhs: DoubleDouble) -> Self::Output {
        rhs.add_f64(self)
    }
}

impl Sub<DoubleDouble> for f64 {
    type Output = DoubleDouble;

    #[inline]
    fn sub(self, rhs: DoubleDouble) -> Self::Output {
        rhs.negate().add_f64(self)
    }
}

impl Mul<DoubleDouble> for f64 {
    type Output = DoubleDouble;

    #[inline]
    fn mul(self, rhs: DoubleDouble) -> Self::Output {
        rhs.mul_f64(self)
    }
}

impl Div<DoubleDouble> for f64 {
    type Output = DoubleDouble;

    #[inline]
    fn div(self, rhs: DoubleDouble) -> Self::Output {
        DoubleDouble::divide(self, 0., rhs.hi, rhs.lo)
    }
}

impl NumericalFloatLike for DoubleDouble {
    #[inline]
    fn mul_add(&self, a: &Self, b: &Self) -> Self {
        DoubleDouble::mul(self, a).add(b)
    }

    #[inline]
    fn neg(&self) -> Self {
        self.negate()
    }

    #[inline]
    fn zero(&self) -> Self {
        DoubleDouble::ZERO
    }

    #[inline]
    fn new_zero() -> Self {
        DoubleDouble::ZERO
    }

    #[inline]
    fn one(&self) -> Self {
        DoubleDouble::ONE
    }

    #[inline]
    fn pow(&self, e: u64) -> Self {
        self.pow_unsigned(e)
    }

    #[inline]
    fn inv(&self) -> Self {
        self.reciprocal()
    }

    #[inline]
    fn from_usize(&self, a: usize) -> Self {
        DoubleDouble::from_wide_integer(a as i128)
    }

    #[inline]
    fn from_i64(&self, a: i64) -> Self {
        DoubleDouble::from_i64(a)
    }

    #[inline]
    fn get_precision(&self) -> u32 {
        106
    }

    #[inline]
    fn get_epsilon(&self) -> f64 {
        DoubleDouble::EPSILON
    }

    #[inline]
    fn fixed_precision(&self) -> bool {
        true
    }

    fn sample_unit<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        DoubleDouble::new_sample_unit(rng)
    }
}

impl SingleFloat for DoubleDouble {
    #[inline]
    fn is_zero(&self) -> bool {
        self.hi == 0.
    }

    #[inline]
    fn is_one(&self) -> bool {
        self.hi == 1. && self.lo == 0.
    }

    #[inline]
    fn is_finite(&self) -> bool {
        DoubleDouble::is_finite(self)
    }

    #[inline]
    fn from_rational(&self, rat: &Rational) -> Self {
        DoubleDouble::from_rational(rat)
    }
}

impl RealNumberLike for DoubleDouble {
    fn to_usize_clamped(&self) -> usize {
        self.to_i64().max(0) as usize
    }

    fn to_f64(&self) -> f64 {
        DoubleDouble::to_f64(self)
    }

    fn round_to_nearest_integer(&self) -> Integer {
        if !self.is_finite() {
            return Integer::new();
        }

        let r = if self.hi < 0. {
            self.sub_f64(0.5).ceil()
        } else {
            self.add_f64(0.5).floor()
        };

        Integer::from_f64(r.hi).unwrap_or_default() + Integer::from_f64(r.lo).unwrap_or_default()
    }
}

impl ConstructibleFloat for DoubleDouble {
    #[inline]
    fn new_one() -> Self {
        DoubleDouble::ONE
    }

    #[inline]
    fn new_from_usize(a: usize) -> Self {
        DoubleDouble::from_wide_integer(a as i128)
    }

    #[inline]
    fn new_from_i64(a: i64) -> Self {
        DoubleDouble::from_i64(a)
    }

    fn new_sample_unit<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let hi: f64 = rng.gen();
        let lo: f64 = rng.gen();
        DoubleDouble::of_sum(hi, lo * TWO_POW_MINUS_53)
    }
}
