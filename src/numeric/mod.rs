//! Numeric element types.
//!
//! Every matrix and vector in this crate is generic over a [`Scalar`].
//! Arithmetic on elements is plain `+=` / `-=` resolved at compile time,
//! so the stamping loop never branches on the value type.
//!
//! Pivot selection only needs an ordering on sizes, so each scalar also
//! provides a cheap [`Scalar::magnitude`]. For complex values this is the
//! 1-norm `|re| + |im|` rather than the modulus, which avoids a square root
//! per comparison.

use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use num_complex::Complex64;

/// A value that can be stored in a sparse matrix and eliminated.
pub trait Scalar:
    Copy
    + PartialEq
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
{
    /// Additive identity
    fn zero() -> Self;

    /// Multiplicative identity
    fn one() -> Self;

    /// Size used for pivot comparisons.
    fn magnitude(&self) -> f64;

    /// Build a value from real and imaginary parts.
    ///
    /// Returns `None` when the type cannot represent a nonzero imaginary part.
    fn from_parts(re: f64, im: f64) -> Option<Self>;

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    fn reciprocal(self) -> Self {
        Self::one() / self
    }
}

impl Scalar for f64 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }

    #[inline]
    fn magnitude(&self) -> f64 {
        self.abs()
    }

    fn from_parts(re: f64, im: f64) -> Option<Self> {
        (im == 0.0).then_some(re)
    }
}

impl Scalar for Complex64 {
    #[inline]
    fn zero() -> Self {
        Complex64::new(0.0, 0.0)
    }

    #[inline]
    fn one() -> Self {
        Complex64::new(1.0, 0.0)
    }

    #[inline]
    fn magnitude(&self) -> f64 {
        self.re.abs() + self.im.abs()
    }

    fn from_parts(re: f64, im: f64) -> Option<Self> {
        Some(Complex64::new(re, im))
    }
}
