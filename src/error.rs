//! Argument errors reported by fallible operations.
//!
//! Numerical invalidity, such as an overflowing product, is not an error:
//! it is encoded in the returned value and can be detected with
//! [DoubleDouble::is_finite](crate::domains::double_double::DoubleDouble::is_finite).

use std::fmt::{Display, Formatter};

/// Errors that can occur when calling an operation with invalid arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Two sequences that must be paired have different lengths.
    DimensionMismatch { left: usize, right: usize },
    /// A sequence that must contain at least one element is empty.
    EmptyInput,
    /// A non-finite value cannot be converted to an exact representation.
    NonFinite,
    /// The requested precision is not supported by the multi-precision backend.
    InvalidPrecision { precision: u32 },
    /// A packed buffer ended before the value was complete.
    Truncated { needed: usize, available: usize },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::DimensionMismatch { left, right } => {
                write!(f, "Dimension mismatch: {} != {}", left, right)
            }
            Error::EmptyInput => write!(f, "The input is empty"),
            Error::NonFinite => write!(f, "The value is not finite"),
            Error::InvalidPrecision { precision } => {
                write!(f, "Invalid precision: {} bits", precision)
            }
            Error::Truncated { needed, available } => write!(
                f,
                "Buffer too short: {} bytes needed but only {} available",
                needed, available
            ),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::Error;

    #[test]
    fn messages() {
        assert_eq!(
            Error::DimensionMismatch { left: 3, right: 2 }.to_string(),
            "Dimension mismatch: 3 != 2"
        );
        assert_eq!(Error::EmptyInput.to_string(), "The input is empty");
        assert_eq!(
            Error::InvalidPrecision { precision: 0 }.to_string(),
            "Invalid precision: 0 bits"
        );
    }
}
