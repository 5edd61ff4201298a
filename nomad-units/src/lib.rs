//! # Nomad Units
//!
//! Scalar value types for the quantities the Nomad API reports as bare
//! integers: durations (nanoseconds) and data sizes (bits).
//!
//! Both types wrap a single `f64` magnitude in their finest unit. Accessors
//! divide by the unit's constant, arithmetic delegates to the magnitude, and
//! `to_human` renders a compact label string.
//!
//! ```
//! use nomad_units::{Duration, DurationUnit, Size, SizeUnit};
//!
//! let d = Duration::from_unit(2.0, DurationUnit::Hour) + Duration::SECOND * 5.0;
//! assert_eq!(d.to_human(), "2h5s");
//! assert_eq!(d.to_human_until(DurationUnit::Hour), "2h");
//!
//! let s = Size::from_unit(5.0, SizeUnit::Gigabyte);
//! assert_eq!(s.megabytes(), 5000.0);
//! assert_eq!(s.to_string(), "5GB");
//! ```

/// Arithmetic shared by the scalar wrappers: everything delegates to the
/// raw `f64` magnitude.
macro_rules! scalar_ops {
    ($ty:ident) => {
        impl std::ops::Add for $ty {
            type Output = $ty;
            fn add(self, rhs: $ty) -> $ty {
                $ty(self.0 + rhs.0)
            }
        }

        impl std::ops::Add<f64> for $ty {
            type Output = $ty;
            fn add(self, rhs: f64) -> $ty {
                $ty(self.0 + rhs)
            }
        }

        impl std::ops::Sub for $ty {
            type Output = $ty;
            fn sub(self, rhs: $ty) -> $ty {
                $ty(self.0 - rhs.0)
            }
        }

        impl std::ops::Sub<f64> for $ty {
            type Output = $ty;
            fn sub(self, rhs: f64) -> $ty {
                $ty(self.0 - rhs)
            }
        }

        impl std::ops::Mul<f64> for $ty {
            type Output = $ty;
            fn mul(self, rhs: f64) -> $ty {
                $ty(self.0 * rhs)
            }
        }

        impl std::ops::Mul<$ty> for f64 {
            type Output = $ty;
            fn mul(self, rhs: $ty) -> $ty {
                $ty(self * rhs.0)
            }
        }

        impl std::ops::Div<f64> for $ty {
            type Output = $ty;
            fn div(self, rhs: f64) -> $ty {
                $ty(self.0 / rhs)
            }
        }

        impl std::ops::Neg for $ty {
            type Output = $ty;
            fn neg(self) -> $ty {
                $ty(-self.0)
            }
        }

        impl std::ops::AddAssign for $ty {
            fn add_assign(&mut self, rhs: $ty) {
                self.0 += rhs.0;
            }
        }

        impl std::ops::SubAssign for $ty {
            fn sub_assign(&mut self, rhs: $ty) {
                self.0 -= rhs.0;
            }
        }

        impl std::iter::Sum for $ty {
            fn sum<I: Iterator<Item = $ty>>(iter: I) -> $ty {
                $ty(iter.map(|v| v.0).sum())
            }
        }

        impl From<f64> for $ty {
            fn from(raw: f64) -> $ty {
                $ty(raw)
            }
        }

        impl From<i64> for $ty {
            fn from(raw: i64) -> $ty {
                $ty(raw as f64)
            }
        }

        impl From<$ty> for f64 {
            fn from(value: $ty) -> f64 {
                value.0
            }
        }

        impl PartialEq<f64> for $ty {
            fn eq(&self, other: &f64) -> bool {
                self.0 == *other
            }
        }

        impl PartialOrd<f64> for $ty {
            fn partial_cmp(&self, other: &f64) -> Option<std::cmp::Ordering> {
                self.0.partial_cmp(other)
            }
        }
    };
}

mod duration;
mod size;

pub use duration::{Duration, DurationUnit};
pub use size::{Size, SizeUnit};

use thiserror::Error;

/// Errors raised when parsing unit labels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// The label does not name a known unit.
    #[error("Invalid label `{0}'")]
    InvalidLabel(String),
}

/// Result type for unit parsing.
pub type Result<T> = std::result::Result<T, UnitError>;
