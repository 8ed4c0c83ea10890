//! Fixed-point fractions with compile-time bit widths.
//!
//! `Fixed<P, Q>` stores a signed integer scaled by `2^Q` in a `P`-bit
//! container. The container is the narrowest of 8/16/32/64 bits that holds
//! `P` bits; the fast variant (`FastFixed<P, Q>`) widens that to the
//! platform's preferred integer width instead. Every result wraps to the
//! container width, the same way native integer arithmetic of that width
//! would. Overflow is never checked.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::number::Number;

/// Container width for the exact variant.
const fn exact_bits(p: u32) -> u32 {
    if p <= 8 {
        8
    } else if p <= 16 {
        16
    } else if p <= 32 {
        32
    } else {
        64
    }
}

/// Container width for the fast variant: bytes stay bytes, anything wider is
/// promoted to at least the native word.
const fn fast_bits(p: u32) -> u32 {
    let exact = exact_bits(p);
    if exact == 8 || exact >= usize::BITS {
        exact
    } else {
        usize::BITS
    }
}

/// Signed fixed-point number with `P` total bits and `Q` fractional bits.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Fixed<const P: u32, const Q: u32, const FAST: bool = false> {
    raw: i64,
}

/// Fixed-point number stored in the fastest integer width holding `P` bits.
pub type FastFixed<const P: u32, const Q: u32> = Fixed<P, Q, true>;

impl<const P: u32, const Q: u32, const FAST: bool> Fixed<P, Q, FAST> {
    const VALID: () = assert!(Q < P && P <= 64, "fixed-point needs Q < P <= 64");

    /// Width of the integer container actually used for arithmetic.
    pub const STORAGE_BITS: u32 = if FAST { fast_bits(P) } else { exact_bits(P) };

    /// Truncates a wide intermediate to the container width (two's complement).
    #[inline]
    const fn wrap(value: i128) -> i64 {
        let shift = 128 - Self::STORAGE_BITS;
        ((value << shift) >> shift) as i64
    }

    #[inline]
    fn scale() -> f64 {
        (1u64 << Q) as f64
    }

    /// Builds a value directly from its scaled integer representation.
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        let () = Self::VALID;
        Self {
            raw: Self::wrap(raw as i128),
        }
    }

    /// Scaled integer representation.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.raw
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.to_f64() as f32
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> Number for Fixed<P, Q, FAST> {
    #[inline]
    fn from_int(value: i32) -> Self {
        let () = Self::VALID;
        Self {
            raw: Self::wrap((value as i128) << Q),
        }
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        let () = Self::VALID;
        Self {
            raw: Self::wrap((value * Self::scale()).round() as i128),
        }
    }

    /// Keeps the low `Q` bits of the draw. Wider fractions shift the draw up
    /// so the result still lies in `[0, 1)`.
    #[inline]
    fn from_random(bits: u32) -> Self {
        let raw = if Q >= 32 {
            (bits as i128) << Q.saturating_sub(32)
        } else {
            (bits as u64 & ((1u64 << Q) - 1)) as i128
        };
        let () = Self::VALID;
        Self {
            raw: Self::wrap(raw),
        }
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self.raw as f64 / Self::scale()
    }

    #[inline]
    fn abs(self) -> Self {
        Self {
            raw: Self::wrap((self.raw as i128).abs()),
        }
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> PartialOrd for Fixed<P, Q, FAST> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> Ord for Fixed<P, Q, FAST> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> Add for Fixed<P, Q, FAST> {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            raw: Self::wrap(self.raw as i128 + other.raw as i128),
        }
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> Sub for Fixed<P, Q, FAST> {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            raw: Self::wrap(self.raw as i128 - other.raw as i128),
        }
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> Mul for Fixed<P, Q, FAST> {
    type Output = Self;

    /// The low `Q` bits of the product are dropped (floor, not rounding).
    #[inline]
    fn mul(self, other: Self) -> Self {
        Self {
            raw: Self::wrap((self.raw as i128 * other.raw as i128) >> Q),
        }
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> Div for Fixed<P, Q, FAST> {
    type Output = Self;

    /// # Panics
    ///
    /// Panics when `other` is zero.
    #[inline]
    fn div(self, other: Self) -> Self {
        Self {
            raw: Self::wrap(((self.raw as i128) << Q) / other.raw as i128),
        }
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> Neg for Fixed<P, Q, FAST> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            raw: Self::wrap(-(self.raw as i128)),
        }
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> AddAssign for Fixed<P, Q, FAST> {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> SubAssign for Fixed<P, Q, FAST> {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> MulAssign for Fixed<P, Q, FAST> {
    #[inline]
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> DivAssign for Fixed<P, Q, FAST> {
    #[inline]
    fn div_assign(&mut self, other: Self) {
        *self = *self / other;
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> fmt::Display for Fixed<P, Q, FAST> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_f64(), f)
    }
}

impl<const P: u32, const Q: u32, const FAST: bool> fmt::Debug for Fixed<P, Q, FAST> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if FAST { "FastFixed" } else { "Fixed" };
        write!(f, "{kind}<{P}, {Q}>({})", self.to_f64())
    }
}
