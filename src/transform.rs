//! Error-free transformations of floating-point operations.
//!
//! An error-free transformation computes the rounded result of an operation
//! together with the exact rounding error, using only ordinary `f64`
//! arithmetic. For example, [two_sum] returns `(s, e)` with `s = fl(a + b)` and
//! `s + e = a + b` exactly.
//!
//! ```
//! use ddnum::transform::{two_product, two_sum};
//!
//! let (s, e) = two_sum(1e16, 1.);
//! assert_eq!((s, e), (1e16, 1.));
//!
//! let (p, e) = two_product(0.1, 0.1);
//! assert_eq!(p, 0.1 * 0.1);
//! assert!(e != 0.);
//! ```
//!
//! The `*_low` variants take the already rounded result as an argument
//! and only compute the error term, which lets callers reuse a result they
//! computed anyway.
//!
//! The Dekker split used for products overflows for magnitudes above `2^996`.
//! The plain [two_product_low] rescales its operands by powers of two
//! to avoid this, and to avoid sub-normal round-off in the partial products.
//! The `*_unscaled` variants skip these checks: they are cheaper but return `NaN`
//! when the split overflows.

/// The Dekker split multiplier `2^27 + 1`.
const SPLIT_MULTIPLIER: f64 = 134217729.0;
/// Magnitudes above `2^996` cannot be split without overflow.
const SAFE_UPPER: f64 = 6.696928794914171e299;
/// Products below `2^-968` have round-off that may be sub-normal.
const SAFE_LOWER: f64 = 4.008336720017946e-292;
/// `2^-30`
const DOWN_SCALE: f64 = 9.313225746154785e-10;
/// `2^30`
const UP_SCALE: f64 = 1073741824.0;
/// `2^54`
const SMALL_UP_SCALE: f64 = 1.8014398509481984e16;
/// `2^-108`
const SMALL_DOWN_SCALE_SQUARED: f64 = 3.0814879110195774e-33;

const EXPONENT_MASK: u64 = 0x7ff0_0000_0000_0000;
const MANTISSA_MASK: u64 = 0x000f_ffff_ffff_ffff;
const EXPONENT_BIAS: i32 = 1023;
/// `2^1023`
const TWO_POW_1023: f64 = 8.98846567431158e307;
/// `2^-969`, the product of `2^-1022` and `2^53`.
const TWO_POW_MINUS_969: f64 = 2.004168360008973e-292;

/// Compute `(s, e)` with `s = fl(a + b)` and `e = (a + b) - s` exactly, for any
/// ordering of the magnitudes of `a` and `b` (Knuth's algorithm).
#[inline(always)]
pub fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    (s, two_sum_low(a, b, s))
}

/// Compute the round-off of `s = fl(a + b)`.
#[inline(always)]
pub fn two_sum_low(a: f64, b: f64, s: f64) -> f64 {
    let bb = s - a;
    (a - (s - bb)) + (b - bb)
}

/// Compute `(s, e)` with `s = fl(a + b)` and `e = (a + b) - s`, assuming
/// `|a| >= |b|` (or `a == 0`). The result is not exact if this does not hold.
#[inline(always)]
pub fn fast_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    (s, fast_two_sum_low(a, b, s))
}

/// Compute the round-off of `s = fl(a + b)`, assuming `|a| >= |b|`.
#[inline(always)]
pub fn fast_two_sum_low(a: f64, b: f64, s: f64) -> f64 {
    b - (s - a)
}

/// Compute `(d, e)` with `d = fl(a - b)` and `e = (a - b) - d` exactly.
#[inline(always)]
pub fn two_diff(a: f64, b: f64) -> (f64, f64) {
    let d = a - b;
    (d, two_diff_low(a, b, d))
}

/// Compute the round-off of `d = fl(a - b)`.
#[inline(always)]
pub fn two_diff_low(a: f64, b: f64, d: f64) -> f64 {
    let bb = a - d;
    (a - (d + bb)) + (bb - b)
}

/// Get the high part of a Dekker split of `value`: the upper 26 bits of the
/// significand, such that `value - split_high(value)` is exact and fits in 26 bits.
///
/// The result is `NaN` for `|value| > 2^996`.
#[inline(always)]
pub fn split_high(value: f64) -> f64 {
    let c = SPLIT_MULTIPLIER * value;
    c - (c - value)
}

/// Compute `(p, e)` with `p = fl(a * b)` and `e = a * b - p` exactly.
///
/// The error is `0` when `p` is zero or sub-normal and `NaN` when `p` is not finite.
#[inline]
pub fn two_product(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    (p, two_product_low(a, b, p))
}

/// Compute the round-off of `ab = fl(a * b)`.
///
/// The operands are rescaled by powers of two so that the split cannot overflow
/// and the partial products do not lose bits to the sub-normal range. The error
/// is exact whenever `ab` is a normal number, except for a single final rounding
/// if the error itself is sub-normal. The error is `0` when `ab` is zero or
/// sub-normal and `NaN` when `ab` is not finite.
pub fn two_product_low(a: f64, b: f64, ab: f64) -> f64 {
    if !is_normal(ab) {
        // 0 for zero and sub-normals, NaN for infinities and NaN
        return ab * 0.;
    }

    let (mut a, mut b, mut ab) = (a, b, ab);

    if ab.abs() < SAFE_LOWER {
        // both operands are below 2^106 in magnitude
        a *= SMALL_UP_SCALE;
        b *= SMALL_UP_SCALE;
        ab *= SMALL_UP_SCALE * SMALL_UP_SCALE;
        return two_product_low_unscaled(a, b, ab) * SMALL_DOWN_SCALE_SQUARED;
    }

    let mut rescale = 1.;
    if ab.abs() > SAFE_UPPER {
        // the partial products may overflow
        if a.abs() >= b.abs() {
            a *= DOWN_SCALE;
        } else {
            b *= DOWN_SCALE;
        }
        ab *= DOWN_SCALE;
        rescale = UP_SCALE;
    }

    // at most one operand can still be too large to split
    if a.abs() > SAFE_UPPER {
        a *= DOWN_SCALE;
        b *= UP_SCALE;
    } else if b.abs() > SAFE_UPPER {
        a *= UP_SCALE;
        b *= DOWN_SCALE;
    }

    two_product_low_unscaled(a, b, ab) * rescale
}

/// Compute the round-off of `ab = fl(a * b)` using Dekker's algorithm without any
/// rescaling. The result is `NaN` if either operand exceeds `2^996` in magnitude,
/// and may be inexact when the round-off is sub-normal.
#[inline(always)]
pub fn two_product_low_unscaled(a: f64, b: f64, ab: f64) -> f64 {
    let ha = split_high(a);
    let la = a - ha;
    let hb = split_high(b);
    let lb = b - hb;
    la * lb - (((ab - ha * hb) - la * hb) - ha * lb)
}

/// Compute `(p, e)` with `p = fl(a * a)` and `e = a * a - p` exactly.
#[inline]
pub fn two_square(a: f64) -> (f64, f64) {
    let p = a * a;
    (p, two_square_low(a, p))
}

/// Compute the round-off of `a2 = fl(a * a)`, with the same rescaling
/// guarantees as [two_product_low].
#[inline]
pub fn two_square_low(a: f64, a2: f64) -> f64 {
    if !is_normal(a2) {
        return a2 * 0.;
    }

    if a2 < SAFE_LOWER {
        let a = a * SMALL_UP_SCALE;
        return two_square_low_unscaled(a, a * a) * SMALL_DOWN_SCALE_SQUARED;
    }

    if a.abs() > SAFE_UPPER || a2 > SAFE_UPPER {
        let a = a * DOWN_SCALE;
        // scaling the square by 2^-60 is exact as it is far from sub-normal
        return two_square_low_unscaled(a, a * a) * (UP_SCALE * UP_SCALE);
    }

    two_square_low_unscaled(a, a2)
}

/// Compute the round-off of `a2 = fl(a * a)` without rescaling, reusing a single split.
#[inline(always)]
pub fn two_square_low_unscaled(a: f64, a2: f64) -> f64 {
    let ha = split_high(a);
    let la = a - ha;
    la * la - ((a2 - ha * ha) - 2. * la * ha)
}

/// Check if `x` is a normal number: not zero, sub-normal, infinite or `NaN`.
#[inline(always)]
pub fn is_normal(x: f64) -> bool {
    x.is_normal()
}

/// Get the unbiased binary exponent of `x`, such that `2^e <= |x| < 2^(e+1)`.
/// Sub-normal numbers get their true exponent, down to `-1074`.
///
/// Zero yields `i32::MIN` and infinities and `NaN` yield `1024`.
pub fn exponent(x: f64) -> i32 {
    let bits = x.to_bits();
    let biased = ((bits & EXPONENT_MASK) >> 52) as i32;

    if biased == 0x7ff {
        return EXPONENT_BIAS + 1;
    }

    if biased == 0 {
        let mantissa = bits & MANTISSA_MASK;
        if mantissa == 0 {
            return i32::MIN;
        }
        return 63 - mantissa.leading_zeros() as i32 - 1074;
    }

    biased - EXPONENT_BIAS
}

/// Compute `x * 2^n`. The result is exact unless it overflows or is sub-normal,
/// in which case a single rounding is performed.
pub fn scalb(x: f64, n: i32) -> f64 {
    let mut y = x;
    let mut n = n;

    if n > 1023 {
        y *= TWO_POW_1023;
        n -= 1023;
        if n > 1023 {
            y *= TWO_POW_1023;
            n -= 1023;
            if n > 1023 {
                n = 1023;
            }
        }
    } else if n < -1022 {
        // keep the final factor below 2^-53 so that only one rounding is made
        // in the sub-normal range
        y *= TWO_POW_MINUS_969;
        n += 1022 - 53;
        if n < -1022 {
            y *= TWO_POW_MINUS_969;
            n += 1022 - 53;
            if n < -1022 {
                n = -1022;
            }
        }
    }

    y * f64::from_bits(((EXPONENT_BIAS + n) as u64) << 52)
}

/// Split `x` into a fraction with magnitude in `[0.5, 1)` and a power of two,
/// such that `x = f * 2^e`. Zero, infinities and `NaN` are returned unchanged
/// with exponent `0`.
pub fn frexp(x: f64) -> (f64, i32) {
    if x == 0. || !x.is_finite() {
        return (x, 0);
    }

    let e = exponent(x) + 1;
    (scalb(x, -e), e)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sum_round_off() {
        assert_eq!(two_sum(1., 1e-17), (1., 1e-17));
        assert_eq!(two_sum(1e-17, 1.), (1., 1e-17));
        assert_eq!(fast_two_sum(1e16, 1.), (1e16, 1.));
        assert_eq!(two_diff(1., 1e-17), (1., -1e-17));
        assert_eq!(two_sum(0.1, 0.2), (0.30000000000000004, -2.7755575615628914e-17));
    }

    #[test]
    fn split() {
        let x = 0.1;
        let h = split_high(x);
        let l = x - h;
        assert_eq!(h + l, x);
        assert_eq!((h.to_bits() & 0x7ffffff), 0);
        assert!(split_high(1.5e300).is_nan());
    }

    #[test]
    fn product_round_off() {
        let (p, e) = two_product(1. + f64::EPSILON, 1. + f64::EPSILON);
        assert_eq!(p, 1. + 2. * f64::EPSILON);
        assert_eq!(e, f64::EPSILON * f64::EPSILON);

        let (p, e) = two_square(1. + f64::EPSILON);
        assert_eq!(p, 1. + 2. * f64::EPSILON);
        assert_eq!(e, f64::EPSILON * f64::EPSILON);
    }

    #[test]
    fn product_rescaling() {
        let a = (1. + f64::EPSILON) * 1.5e300;
        let b = (1. + f64::EPSILON) * 1e-10;
        let ab = a * b;
        assert!(two_product_low_unscaled(a, b, ab).is_nan());
        let e = two_product_low(a, b, ab);
        assert!(e.is_finite() && e != 0.);

        let big = 1.7976931348623157e308;
        assert_eq!(two_product_low(big, 0.5, big * 0.5), 0.);
        assert!(two_product_low(big, 2., big * 2.).is_nan());
        assert!(two_square_low(big, big * big).is_nan());
        assert_eq!(two_product_low(1e-300, 1e-300, 0.), 0.);
        assert!(two_product_low(f64::NAN, 1., f64::NAN).is_nan());
    }

    #[test]
    fn exponents() {
        assert_eq!(exponent(1.), 0);
        assert_eq!(exponent(3.), 1);
        assert_eq!(exponent(0.75), -1);
        assert_eq!(exponent(5e-324), -1074);
        assert_eq!(exponent(f64::MIN_POSITIVE), -1022);
        assert_eq!(exponent(f64::INFINITY), 1024);
        assert_eq!(exponent(0.), i32::MIN);

        assert_eq!(scalb(1., 10), 1024.);
        assert_eq!(scalb(1., -1074), 5e-324);
        assert_eq!(scalb(5e-324, 1074), 1.);
        assert_eq!(scalb(1., 1024), f64::INFINITY);
        assert_eq!(scalb(f64::MAX, -2000), scalb(scalb(f64::MAX, -1000), -1000));

        assert_eq!(frexp(8.), (0.5, 4));
        assert_eq!(frexp(-3.), (-0.75, 2));
        assert_eq!(frexp(5e-324), (0.5, -1073));
        assert_eq!(frexp(0.), (0., 0));
    }
}
