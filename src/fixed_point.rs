//! 17.14 Fixed-Point Arithmetic
//!
//! Real numbers encoded in an `i32`: 17 integer bits (sign included) and
//! 14 fractional bits. Used by the scheduler for load averages and
//! recent-CPU estimates, where floating point is unavailable in kernel
//! context.
//!
//! Every operation comes in a fixed/fixed and a fixed/integer flavour.
//! Fixed/fixed multiplication and division widen to `i64` before
//! rescaling. Overflow at the limits of the representation wraps the
//! same way plain `i32` arithmetic does in release builds.

use core::fmt;
use core::ops::{Add, Div, Mul, Sub};

/// Number of fractional bits.
pub const FRACTION_BITS: u32 = 14;

/// Scale factor (1.0 in fixed-point).
pub const F: i32 = 1 << FRACTION_BITS;

/// A 17.14 fixed-point number.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Fixed(i32);

impl Fixed {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// One.
    pub const ONE: Self = Self(F);

    /// Wrap a raw 17.14 bit pattern.
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Get the raw bit pattern.
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Convert an integer to fixed-point.
    #[inline]
    pub const fn from_int(n: i32) -> Self {
        Self(n * F)
    }

    /// Convert to an integer, truncating toward zero.
    #[inline]
    pub const fn to_int_trunc(self) -> i32 {
        self.0 / F
    }

    /// Convert to an integer, rounding to nearest (halves away from zero).
    #[inline]
    pub const fn to_int_round(self) -> i32 {
        if self.0 >= 0 {
            (self.0 + F / 2) / F
        } else {
            (self.0 - F / 2) / F
        }
    }

    #[inline]
    pub const fn add_fp(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }

    #[inline]
    pub const fn add_int(self, n: i32) -> Self {
        Self(self.0 + n * F)
    }

    #[inline]
    pub const fn sub_fp(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }

    #[inline]
    pub const fn sub_int(self, n: i32) -> Self {
        Self(self.0 - n * F)
    }

    /// Multiply two fixed-point values.
    #[inline]
    pub const fn mul_fp(self, other: Self) -> Self {
        Self(((self.0 as i64) * (other.0 as i64) / F as i64) as i32)
    }

    #[inline]
    pub const fn mul_int(self, n: i32) -> Self {
        Self(self.0 * n)
    }

    /// Divide two fixed-point values.
    ///
    /// # Panics
    /// Panics if `other` is zero.
    #[inline]
    pub const fn div_fp(self, other: Self) -> Self {
        Self(((self.0 as i64) * F as i64 / other.0 as i64) as i32)
    }

    /// # Panics
    /// Panics if `n` is zero.
    #[inline]
    pub const fn div_int(self, n: i32) -> Self {
        Self(self.0 / n)
    }
}

impl Add for Fixed {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self.add_fp(rhs)
    }
}

impl Add<i32> for Fixed {
    type Output = Self;
    fn add(self, rhs: i32) -> Self {
        self.add_int(rhs)
    }
}

impl Sub for Fixed {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self.sub_fp(rhs)
    }
}

impl Sub<i32> for Fixed {
    type Output = Self;
    fn sub(self, rhs: i32) -> Self {
        self.sub_int(rhs)
    }
}

impl Mul for Fixed {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        self.mul_fp(rhs)
    }
}

impl Mul<i32> for Fixed {
    type Output = Self;
    fn mul(self, rhs: i32) -> Self {
        self.mul_int(rhs)
    }
}

impl Div for Fixed {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        self.div_fp(rhs)
    }
}

impl Div<i32> for Fixed {
    type Output = Self;
    fn div(self, rhs: i32) -> Self {
        self.div_int(rhs)
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({:#x})", self.0)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Two decimal places are enough for load-average style output.
        let scaled = self.0 as i64 * 100;
        let half = F as i64 / 2;
        let hundredths = if scaled >= 0 {
            (scaled + half) / F as i64
        } else {
            (scaled - half) / F as i64
        };
        let sign = if hundredths < 0 { "-" } else { "" };
        let abs = hundredths.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}
