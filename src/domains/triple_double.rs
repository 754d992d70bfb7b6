//! A minimal triple-double number, used to evaluate large integer powers
//! of a [DoubleDouble] without the error growth of repeated double-double
//! rounding.

use crate::transform::{
    fast_two_sum, frexp, scalb, two_product_low_unscaled, two_sum,
};

use super::double_double::DoubleDouble;

/// The unevaluated sum `hi + mid + lo` of three non-overlapping `f64` values.
///
/// The type only supports values whose parts are far from overflow and the
/// sub-normal range, such as fractions in `[0.25, 1)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct TripleDouble {
    hi: f64,
    mid: f64,
    lo: f64,
}

impl TripleDouble {
    pub(crate) const ONE: TripleDouble = TripleDouble {
        hi: 1.,
        mid: 0.,
        lo: 0.,
    };

    /// Normalize three components ordered by decreasing magnitude.
    #[inline]
    fn renormalize(a: f64, b: f64, c: f64) -> TripleDouble {
        let (s, t1) = two_sum(b, c);
        let (hi, t0) = two_sum(a, s);
        let (mid, lo) = two_sum(t0, t1);
        let (hi, mid) = fast_two_sum(hi, mid);
        let (mid, lo) = two_sum(mid, lo);
        TripleDouble { hi, mid, lo }
    }

    /// Multiply two triple-doubles, keeping about 150 bits of the product.
    pub(crate) fn mul(&self, other: &TripleDouble) -> TripleDouble {
        let p0 = self.hi * other.hi;
        let q0 = two_product_low_unscaled(self.hi, other.hi, p0);
        let p1 = self.hi * other.mid;
        let q1 = two_product_low_unscaled(self.hi, other.mid, p1);
        let p2 = self.mid * other.hi;
        let q2 = two_product_low_unscaled(self.mid, other.hi, p2);

        let t = self.hi * other.lo + self.mid * other.mid + self.lo * other.hi + q1 + q2;

        let (s1, e1) = two_sum(q0, p1);
        let (s1, e2) = two_sum(s1, p2);
        TripleDouble::renormalize(p0, s1, e1 + e2 + t)
    }

    #[inline]
    pub(crate) fn square(&self) -> TripleDouble {
        self.mul(self)
    }

    /// Split into a fraction with magnitude in `[0.5, 1)` and a power of two.
    /// The value must be finite and non-zero.
    pub(crate) fn frexp(&self) -> (TripleDouble, i32) {
        let (f, mut e) = frexp(self.hi);
        let tail = self.mid + self.lo;
        if f.abs() == 0.5 && tail != 0. && (tail < 0.) != (self.hi < 0.) {
            e -= 1;
        }

        (
            TripleDouble {
                hi: scalb(self.hi, -e),
                mid: scalb(self.mid, -e),
                lo: scalb(self.lo, -e),
            },
            e,
        )
    }

    /// Round to the closest double-double.
    pub(crate) fn to_double_double(self) -> DoubleDouble {
        let (hi, lo) = fast_two_sum(self.hi, self.mid + self.lo);
        DoubleDouble::new(hi, lo)
    }
}

impl From<DoubleDouble> for TripleDouble {
    fn from(value: DoubleDouble) -> Self {
        TripleDouble {
            hi: value.hi(),
            mid: value.lo(),
            lo: 0.,
        }
    }
}
