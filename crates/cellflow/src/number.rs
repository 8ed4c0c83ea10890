//! Numeric abstraction shared by pressure, velocity and flow storage.
//!
//! The simulator is generic over three independent numeric types so that
//! precision can be varied per quantity. Everything the tick algorithm needs
//! from a number lives on [`Number`].

use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// A scalar usable as pressure, velocity capacity or achieved flow.
pub trait Number:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + Debug
    + Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
{
    fn from_int(value: i32) -> Self;

    /// Nearest representable value.
    fn from_f64(value: f64) -> Self;

    /// Fraction in `[0, 1)` synthesised from one 32-bit random draw.
    fn from_random(bits: u32) -> Self;

    fn to_f64(self) -> f64;

    fn abs(self) -> Self;

    #[inline]
    fn zero() -> Self {
        Self::default()
    }

    #[inline]
    fn one() -> Self {
        Self::from_int(1)
    }

    /// Returns `self` unless `other` is strictly smaller.
    #[inline]
    fn min_of(self, other: Self) -> Self {
        if other < self {
            other
        } else {
            self
        }
    }

    /// Re-expresses this value in another numeric type.
    #[inline]
    fn convert<N: Number>(self) -> N {
        N::from_f64(self.to_f64())
    }
}

impl Number for f32 {
    #[inline]
    fn from_int(value: i32) -> Self {
        value as f32
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn from_random(bits: u32) -> Self {
        // 24 mantissa bits keep the result strictly below 1.0
        (bits >> 8) as f32 / (1u32 << 24) as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn abs(self) -> Self {
        f32::abs(self)
    }
}

impl Number for f64 {
    #[inline]
    fn from_int(value: i32) -> Self {
        value as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn from_random(bits: u32) -> Self {
        bits as f64 / 4_294_967_296.0
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn abs(self) -> Self {
        f64::abs(self)
    }
}
