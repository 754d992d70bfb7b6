//! Compensated summation.
//!
//! A [Sum] keeps the rounded running total together with the accumulated
//! round-off of every addition, so that sums and linear combinations of `f64`
//! values are computed with about twice the working precision.
//!
//! ```
//! use ddnum::sum::Sum;
//!
//! let naive = 1e16 + 1. - 1e16;
//! assert_eq!(naive, 0.);
//!
//! let s = Sum::of_all(&[1e16, 1., -1e16]);
//! assert_eq!(s.value(), 1.);
//! ```

use std::{
    io::{Read, Write},
    ops::AddAssign,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    domains::double_double::DoubleDouble,
    error::Error,
    transform::{two_product_low, two_sum_low},
};

/// An accumulator for the compensated sum of `f64` terms and products.
///
/// The accumulator is not exact: for well-conditioned input the value is within
/// about one unit in the last place of the true sum.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sum {
    sum: f64,
    comp: f64,
}

impl Sum {
    /// Create an accumulator with value `0`.
    #[inline]
    pub const fn new() -> Sum {
        Sum { sum: 0., comp: 0. }
    }

    /// Create an accumulator starting at `x`.
    #[inline]
    pub const fn of(x: f64) -> Sum {
        Sum { sum: x, comp: 0. }
    }

    /// Create the sum of all terms.
    pub fn of_all(terms: &[f64]) -> Sum {
        let mut s = Sum::new();
        s.add_all(terms);
        s
    }

    /// Create the sum of the products `a[i] * b[i]`.
    pub fn of_products(a: &[f64], b: &[f64]) -> Result<Sum, Error> {
        let mut s = Sum::new();
        s.add_products(a, b)?;
        Ok(s)
    }

    /// Add a term.
    #[inline]
    pub fn add(&mut self, t: f64) -> &mut Self {
        let new_sum = self.sum + t;
        self.comp += two_sum_low(self.sum, t, new_sum);
        self.sum = new_sum;
        self
    }

    /// Add all terms.
    pub fn add_all(&mut self, terms: &[f64]) -> &mut Self {
        for t in terms {
            self.add(*t);
        }
        self
    }

    /// Add the product `a * b`, including the round-off of the multiplication.
    #[inline]
    pub fn add_product(&mut self, a: f64, b: f64) -> &mut Self {
        let ab = a * b;
        let new_sum = self.sum + ab;
        self.comp += two_sum_low(self.sum, ab, new_sum) + two_product_low(a, b, ab);
        self.sum = new_sum;
        self
    }

    /// Add the products `a[i] * b[i]`. The slices must have the same length.
    pub fn add_products(&mut self, a: &[f64], b: &[f64]) -> Result<&mut Self, Error> {
        if a.len() != b.len() {
            debug!("Cannot pair {} factors with {} factors", a.len(), b.len());
            return Err(Error::DimensionMismatch {
                left: a.len(),
                right: b.len(),
            });
        }

        for (x, y) in a.iter().zip(b) {
            self.add_product(*x, *y);
        }
        Ok(self)
    }

    /// Add the state of another accumulator. An accumulator can be added to itself.
    pub fn add_sum(&mut self, other: Sum) -> &mut Self {
        let Sum { sum, comp } = other;
        self.add(sum);
        self.comp += comp;
        self
    }

    /// Get the compensated value, or the plain sum when the compensated
    /// value is not finite.
    #[inline]
    pub fn value(&self) -> f64 {
        let r = self.sum + self.comp;
        if r.is_finite() {
            r
        } else {
            self.sum
        }
    }

    /// Get the exact sum of the running total and its round-off.
    pub(crate) fn to_double_double(self) -> DoubleDouble {
        DoubleDouble::of_sum(self.sum, self.comp)
    }

    /// Write the running total and the compensation in little-endian order.
    pub fn write<W: Write>(&self, mut dest: W) -> std::io::Result<()> {
        dest.write_f64::<LittleEndian>(self.sum)?;
        dest.write_f64::<LittleEndian>(self.comp)
    }

    /// Read an accumulator written with [Sum::write].
    pub fn import<R: Read>(mut source: R) -> std::io::Result<Sum> {
        let sum = source.read_f64::<LittleEndian>()?;
        let comp = source.read_f64::<LittleEndian>()?;
        Ok(Sum { sum, comp })
    }
}

impl From<f64> for Sum {
    fn from(value: f64) -> Self {
        Sum::of(value)
    }
}

impl FromIterator<f64> for Sum {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        let mut s = Sum::new();
        s.extend(iter);
        s
    }
}

impl Extend<f64> for Sum {
    fn extend<T: IntoIterator<Item = f64>>(&mut self, iter: T) {
        for t in iter {
            self.add(t);
        }
    }
}

impl AddAssign<f64> for Sum {
    #[inline]
    fn add_assign(&mut self, rhs: f64) {
        self.add(rhs);
    }
}

impl AddAssign<Sum> for Sum {
    #[inline]
    fn add_assign(&mut self, rhs: Sum) {
        self.add_sum(rhs);
    }
}

/// Compute the linear combination `a[0] * b[0] + a[1] * b[1] + ...` with
/// compensated summation.
pub fn dot(a: &[f64], b: &[f64]) -> Result<f64, Error> {
    Sum::of_products(a, b).map(|s| s.value())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cancellation() {
        let terms = [1e16, 1., -1e16];
        assert_eq!(terms.iter().fold(0., |acc, t| acc + t), 0.);
        assert_eq!(Sum::of_all(&terms).value(), 1.);

        let mut s = Sum::new();
        s.add(1e16).add(1.).add(-1e16);
        assert_eq!(s.value(), 1.);

        let s: Sum = terms.into_iter().collect();
        assert_eq!(s.value(), 1.);
    }

    #[test]
    fn products() {
        // 0.1 * 0.1 - 0.01 is not zero in double precision
        let r = dot(&[0.1, -1.], &[0.1, 0.01]).unwrap();
        assert_eq!(r, 0.1f64.mul_add(0.1, -0.01));

        let s = Sum::of_products(&[1e16, 1., -1e16], &[1., 1., 1.]).unwrap();
        assert_eq!(s.value(), 1.);

        assert_eq!(
            dot(&[1., 2.], &[1.]),
            Err(Error::DimensionMismatch { left: 2, right: 1 })
        );

        let mut s = Sum::of(3.);
        assert!(s.add_products(&[1.], &[]).is_err());
        assert_eq!(s.value(), 3.);
    }

    #[test]
    fn self_merge() {
        let mut s = Sum::of_all(&[0.1, 0.2, 0.3, 1e-17]);
        let v = s.value();
        s.add_sum(s);
        assert_eq!(s.value(), 2. * v);

        let mut t = Sum::of_all(&[1e16, 1.]);
        t += t;
        t += -2e16;
        assert_eq!(t.value(), 2.);
    }

    #[test]
    fn overflow() {
        let mut s = Sum::of(f64::MAX);
        s.add(f64::MAX);
        assert_eq!(s.value(), f64::INFINITY);

        s.add(f64::NEG_INFINITY);
        assert!(s.value().is_nan());
    }

    #[test]
    fn binary() {
        let s = Sum::of_all(&[1e16, 1.]);
        let mut buf = vec![];
        s.write(&mut buf).unwrap();
        assert_eq!(buf.len(), 16);
        assert_eq!(Sum::import(&buf[..]).unwrap(), s);
        assert!(Sum::import(&buf[..8]).is_err());
    }
}
