//! Norms of vectors, computed without intermediate overflow or underflow.
//!
//! ```
//! use ddnum::norm::{euclidean2, Norm};
//!
//! let naive = (3e200f64 * 3e200 + 4e200 * 4e200).sqrt();
//! assert_eq!(naive, f64::INFINITY);
//! let r = euclidean2(3e200, 4e200);
//! assert!((r - 5e200).abs() <= 5e200 * f64::EPSILON);
//!
//! assert_eq!(Norm::Manhattan.of(&[1., -2., 3.]), Ok(6.));
//! ```
//!
//! Any `NaN` input results in `NaN`, and any infinite input without a `NaN`
//! results in `+inf`. The norm of an empty vector is an error.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    domains::double_double::DoubleDouble,
    error::Error,
    sum::Sum,
    transform::{exponent, two_square, two_sum_low},
};

/// Values above `2^496` are scaled down before squaring.
const LARGE_THRESHOLD: f64 = 2.0458691299350887e149;
/// Values below `2^-100` are scaled up before squaring by the fixed-arity norms.
const SMALL_THRESHOLD: f64 = 7.888609052210118e-31;
/// Values below `2^-511` are collected in the small bucket of the vector norm.
const VECTOR_SMALL_THRESHOLD: f64 = 1.4916681462400413e-154;
/// `2^600`
const SCALE_UP: f64 = 4.149515568880993e180;
/// `2^-600`
const SCALE_DOWN: f64 = 2.409919865102884e-181;
const SCALE_EXPONENT: i32 = 600;
/// A smaller square cannot change the rounded norm when the exponents differ by more.
const EXPONENT_GAP: i32 = 54;

/// A vector norm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Norm {
    /// The sum of the absolute values.
    Manhattan,
    /// The square root of the sum of the squares.
    Euclidean,
    /// The largest absolute value.
    Maximum,
}

impl Norm {
    /// Compute the norm of the vector `(x, y)`.
    pub fn of2(&self, x: f64, y: f64) -> f64 {
        match self {
            Norm::Manhattan => manhattan2(x, y),
            Norm::Euclidean => euclidean2(x, y),
            Norm::Maximum => maximum2(x, y),
        }
    }

    /// Compute the norm of the vector `(x, y, z)`.
    pub fn of3(&self, x: f64, y: f64, z: f64) -> f64 {
        match self {
            Norm::Manhattan => manhattan3(x, y, z),
            Norm::Euclidean => euclidean3(x, y, z),
            Norm::Maximum => maximum3(x, y, z),
        }
    }

    /// Compute the norm of a non-empty vector.
    pub fn of(&self, v: &[f64]) -> Result<f64, Error> {
        match self {
            Norm::Manhattan => manhattan(v),
            Norm::Euclidean => euclidean(v),
            Norm::Maximum => maximum(v),
        }
    }
}

/// The result for a vector that contains a value that is not finite.
fn non_finite(v: &[f64]) -> f64 {
    debug!("Norm of a vector with non-finite entries: {:?}", v);
    if v.iter().any(|x| x.is_nan()) {
        f64::NAN
    } else {
        f64::INFINITY
    }
}

fn check_empty(v: &[f64]) -> Result<(), Error> {
    if v.is_empty() {
        debug!("Norm of an empty vector");
        Err(Error::EmptyInput)
    } else {
        Ok(())
    }
}

/// Compute `|x| + |y|`.
pub fn manhattan2(x: f64, y: f64) -> f64 {
    x.abs() + y.abs()
}

/// Compute `|x| + |y| + |z|`.
pub fn manhattan3(x: f64, y: f64, z: f64) -> f64 {
    let mut s = Sum::of(x.abs());
    s.add(y.abs()).add(z.abs());
    s.value()
}

/// Compute the sum of the absolute values of a non-empty vector.
pub fn manhattan(v: &[f64]) -> Result<f64, Error> {
    check_empty(v)?;
    Ok(v.iter().map(|x| x.abs()).collect::<Sum>().value())
}

/// Compute `sqrt(x^2 + y^2)`.
pub fn euclidean2(x: f64, y: f64) -> f64 {
    if !x.is_finite() || !y.is_finite() {
        return non_finite(&[x, y]);
    }

    let (max, min) = if x.abs() >= y.abs() {
        (x.abs(), y.abs())
    } else {
        (y.abs(), x.abs())
    };

    if min == 0. || exponent(max) - exponent(min) > EXPONENT_GAP {
        return max;
    }

    let (scale, exp) = scale_for(max);
    let (a2, a2_low) = two_square(max * scale);
    let (b2, b2_low) = two_square(min * scale);
    let sum = a2 + b2;
    let comp = two_sum_low(a2, b2, sum) + a2_low + b2_low;

    sqrt_scaled(DoubleDouble::of_sum(sum, comp), exp)
}

/// Compute `sqrt(x^2 + y^2 + z^2)`.
pub fn euclidean3(x: f64, y: f64, z: f64) -> f64 {
    if !x.is_finite() || !y.is_finite() || !z.is_finite() {
        return non_finite(&[x, y, z]);
    }

    let max = x.abs().max(y.abs()).max(z.abs());
    if max == 0. {
        return 0.;
    }

    let (scale, exp) = scale_for(max);
    let mut s = Sum::new();
    for v in [x, y, z] {
        let (sq, sq_low) = two_square(v.abs() * scale);
        s.add(sq).add(sq_low);
    }

    sqrt_scaled(s.to_double_double(), exp)
}

/// Compute the square root of the sum of the squares of a non-empty vector.
///
/// The squares are accumulated in three buckets: values above `2^496` are
/// scaled down by `2^600`, values below `2^-511` are scaled up by `2^600` and
/// the others are not scaled. The buckets are combined from large to small.
pub fn euclidean(v: &[f64]) -> Result<f64, Error> {
    check_empty(v)?;

    let mut large = Sum::new();
    let mut normal = Sum::new();
    let mut small = Sum::new();
    for x in v {
        let a = x.abs();
        if !a.is_finite() {
            return Ok(non_finite(v));
        }

        if a > LARGE_THRESHOLD {
            let s = a * SCALE_DOWN;
            large.add_product(s, s);
        } else if a < VECTOR_SMALL_THRESHOLD {
            let s = a * SCALE_UP;
            small.add_product(s, s);
        } else {
            normal.add_product(a, a);
        }
    }

    let large = large.to_double_double();
    let normal = normal.to_double_double();
    let small = small.to_double_double();

    let (squares, exp) = if large.hi() != 0. {
        trace!("Euclidean norm in the large range");
        // the small bucket cannot contribute
        (large + normal.scalb(-2 * SCALE_EXPONENT), SCALE_EXPONENT)
    } else if normal.hi() != 0. {
        trace!("Euclidean norm in the normal range");
        (normal + small.scalb(-2 * SCALE_EXPONENT), 0)
    } else {
        trace!("Euclidean norm in the small range");
        (small, -SCALE_EXPONENT)
    };

    Ok(squares.sqrt().scalb(exp).to_f64())
}

/// Compute `max(|x|, |y|)`.
pub fn maximum2(x: f64, y: f64) -> f64 {
    if x.is_nan() || y.is_nan() {
        return f64::NAN;
    }
    x.abs().max(y.abs())
}

/// Compute `max(|x|, |y|, |z|)`.
pub fn maximum3(x: f64, y: f64, z: f64) -> f64 {
    if x.is_nan() || y.is_nan() || z.is_nan() {
        return f64::NAN;
    }
    x.abs().max(y.abs()).max(z.abs())
}

/// Compute the largest absolute value of a non-empty vector.
pub fn maximum(v: &[f64]) -> Result<f64, Error> {
    check_empty(v)?;

    let mut max = 0f64;
    for x in v {
        if x.is_nan() {
            return Ok(f64::NAN);
        }
        max = max.max(x.abs());
    }
    Ok(max)
}

/// Get the factor that brings `max` into the safe range for squaring, and the
/// base-2 exponent that undoes it.
fn scale_for(max: f64) -> (f64, i32) {
    if max > LARGE_THRESHOLD {
        (SCALE_DOWN, SCALE_EXPONENT)
    } else if max < SMALL_THRESHOLD {
        (SCALE_UP, -SCALE_EXPONENT)
    } else {
        (1., 0)
    }
}

fn sqrt_scaled(squares: DoubleDouble, exp: i32) -> f64 {
    squares.sqrt().scalb(exp).to_f64()
}
