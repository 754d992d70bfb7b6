//! Floating-point number types and the traits that abstract over their width.
//!
//! The traits in [float] are implemented by `f64` and by the
//! [DoubleDouble](double_double::DoubleDouble), the unevaluated sum of two `f64`
//! values with about 106 bits of precision. Generic numerical code can therefore
//! be run in double or in double-double precision:
//!
//! ```
//! use ddnum::domains::{double_double::DoubleDouble, float::NumericalFloatLike};
//!
//! fn geometric<T: NumericalFloatLike>(x: &T, n: u64) -> T {
//!     let mut r = x.zero();
//!     for _ in 0..n {
//!         r = r.mul_add(x, &x.one());
//!     }
//!     r
//! }
//!
//! let x = DoubleDouble::of_quotient(1., 3.);
//! let s = geometric(&x, 10);
//! assert!((s.hi() - 1.4999745973682874).abs() < 1e-15);
//! ```
pub mod double_double;
pub mod float;
mod triple_double;
