//! ddnum provides accurate floating-point building blocks on top of `f64`.
//!
//! It contains
//! - error-free transformations that compute the exact round-off of a sum or
//!   product in [transform],
//! - the [DoubleDouble] number with about 106 bits of precision,
//! - the compensated summation accumulator [Sum], and
//! - overflow-free vector [Norm]s.
//!
//! For example:
//!
//! ```
//! use ddnum::{DoubleDouble, Norm, Sum};
//!
//! let x = DoubleDouble::of_quotient(2., 3.) * 3.;
//! assert_eq!(x.hi(), 2.);
//!
//! let s = Sum::of_all(&[1e16, 1., -1e16]);
//! assert_eq!(s.value(), 1.);
//!
//! let r = Norm::Euclidean.of2(3e200, 4e200);
//! assert!((r - 5e200).abs() <= 5e200 * f64::EPSILON);
//! ```
//!
//! Invalid arguments are reported with an [Error]. Numerical invalidity, such as
//! an overflowing product, is encoded in the result instead and can be detected
//! with [DoubleDouble::is_finite].

pub mod domains;
pub mod error;
pub mod norm;
pub mod sum;
pub mod transform;

pub use domains::double_double::{DoubleDouble, PowAccuracy};
pub use error::Error;
pub use norm::Norm;
pub use sum::Sum;
