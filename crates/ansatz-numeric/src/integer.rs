//! Arbitrary precision integers.
//!
//! A thin wrapper around `dashu::IBig` exposing what exact exponentiation
//! and root extraction need: floored division, exact n-th roots and
//! conversions to machine types.

use dashu::base::{Abs, BitTest, Signed as DashuSigned};
use dashu::integer::IBig;
use num_traits::{One, Zero};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

/// An arbitrary precision integer.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Integer(IBig);

impl Integer {
    /// Creates a new integer from an i64.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(IBig::from(value))
    }

    /// Returns the absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.clone().abs())
    }

    /// Returns true if this integer is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        DashuSigned::is_negative(&self.0)
    }

    /// Returns true if this integer is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        DashuSigned::is_positive(&self.0)
    }

    /// Floored division: returns `(q, r)` with `self = q * divisor + r` and
    /// `r` carrying the sign of `divisor` (so `r >= 0` for a positive
    /// divisor).
    ///
    /// # Panics
    ///
    /// Panics if `divisor` is zero.
    #[must_use]
    pub fn div_rem_floor(&self, divisor: &Self) -> (Self, Self) {
        assert!(!divisor.is_zero(), "division by zero");
        let mut q = &self.0 / &divisor.0;
        let mut r = self.0.clone() % divisor.0.clone();
        if !r.is_zero() && (DashuSigned::is_negative(&r) != DashuSigned::is_negative(&divisor.0)) {
            q = q - IBig::ONE;
            r = r + &divisor.0;
        }
        (Self(q), Self(r))
    }

    /// Returns the exact non-negative `n`-th root if `self` is a perfect
    /// `n`-th power.
    ///
    /// Negative values have no root here; callers deal with signs.
    #[must_use]
    pub fn nth_root_exact(&self, n: u32) -> Option<Self> {
        if n == 0 || self.is_negative() {
            return None;
        }
        if n == 1 || self.0 <= IBig::ONE {
            return Some(self.clone());
        }

        // Newton iteration from an overestimate: x' = ((n-1)x + a/x^(n-1)) / n
        let bits = self.0.bit_len();
        let shift = u32::try_from(bits / n as usize + 1).ok()?;
        let n_big = IBig::from(n);
        let n_minus_one = IBig::from(n - 1);
        let mut x = IBig::from(2u8).pow(shift as usize);
        loop {
            let y = (&n_minus_one * &x + &self.0 / &x.pow(n as usize - 1)) / &n_big;
            if y >= x {
                break;
            }
            x = y;
        }

        if x.pow(n as usize) == self.0 {
            Some(Self(x))
        } else {
            None
        }
    }

    /// Returns the inner `dashu::IBig`.
    #[must_use]
    pub fn into_inner(self) -> IBig {
        self.0
    }

    /// Attempts to convert to an i64.
    ///
    /// Returns `None` if the value doesn't fit in an i64.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        self.0.clone().try_into().ok()
    }

    /// Converts to the nearest `f64`, saturating to infinity for huge values.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        match self.to_i64() {
            #[allow(clippy::cast_precision_loss)]
            Some(v) => v as f64,
            // decimal round trip keeps correct rounding for any magnitude
            None => self.0.to_string().parse().unwrap_or(f64::NAN),
        }
    }

    /// Computes self^exp for non-negative exp.
    #[must_use]
    pub fn pow(&self, exp: u32) -> Self {
        Self(self.0.pow(exp as usize))
    }
}

impl Zero for Integer {
    fn zero() -> Self {
        Self(IBig::ZERO)
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl One for Integer {
    fn one() -> Self {
        Self(IBig::ONE)
    }

    fn is_one(&self) -> bool {
        self.0 == IBig::ONE
    }
}

impl fmt::Debug for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Integer({})", self.0)
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Integer {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Add for &Integer {
    type Output = Integer;

    fn add(self, rhs: Self) -> Self::Output {
        Integer(&self.0 + &rhs.0)
    }
}

impl Sub for Integer {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sub for &Integer {
    type Output = Integer;

    fn sub(self, rhs: Self) -> Self::Output {
        Integer(&self.0 - &rhs.0)
    }
}

impl Mul for Integer {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl Mul for &Integer {
    type Output = Integer;

    fn mul(self, rhs: Self) -> Self::Output {
        Integer(&self.0 * &rhs.0)
    }
}

impl Div for Integer {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Self(self.0 / rhs.0)
    }
}

impl Rem for Integer {
    type Output = Self;

    fn rem(self, rhs: Self) -> Self::Output {
        Self(self.0 % rhs.0)
    }
}

impl Neg for Integer {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Neg for &Integer {
    type Output = Integer;

    fn neg(self) -> Self::Output {
        Integer(-&self.0)
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<i32> for Integer {
    fn from(value: i32) -> Self {
        Self::new(i64::from(value))
    }
}

impl From<IBig> for Integer {
    fn from(value: IBig) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_ops() {
        let a = Integer::new(10);
        let b = Integer::new(3);

        assert_eq!((a.clone() + b.clone()).to_i64(), Some(13));
        assert_eq!((a.clone() - b.clone()).to_i64(), Some(7));
        assert_eq!((a.clone() * b.clone()).to_i64(), Some(30));
        assert_eq!((a.clone() / b.clone()).to_i64(), Some(3));
        assert_eq!((a % b).to_i64(), Some(1));
    }

    #[test]
    fn test_div_rem_floor() {
        let (q, r) = Integer::new(7).div_rem_floor(&Integer::new(3));
        assert_eq!((q.to_i64(), r.to_i64()), (Some(2), Some(1)));

        // -7 = -3 * 3 + 2
        let (q, r) = Integer::new(-7).div_rem_floor(&Integer::new(3));
        assert_eq!((q.to_i64(), r.to_i64()), (Some(-3), Some(2)));

        let (q, r) = Integer::new(-6).div_rem_floor(&Integer::new(3));
        assert_eq!((q.to_i64(), r.to_i64()), (Some(-2), Some(0)));
    }

    #[test]
    fn test_nth_root_exact() {
        assert_eq!(Integer::new(8).nth_root_exact(3), Some(Integer::new(2)));
        assert_eq!(Integer::new(16).nth_root_exact(2), Some(Integer::new(4)));
        assert_eq!(Integer::new(1).nth_root_exact(5), Some(Integer::new(1)));
        assert_eq!(Integer::new(0).nth_root_exact(2), Some(Integer::new(0)));
        assert_eq!(Integer::new(2).nth_root_exact(2), None);
        assert_eq!(Integer::new(-8).nth_root_exact(3), None);

        let big = Integer::new(1_000_003).pow(7);
        assert_eq!(big.nth_root_exact(7), Some(Integer::new(1_000_003)));
        assert_eq!((big + Integer::new(1)).nth_root_exact(7), None);
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(Integer::new(-42).to_f64(), -42.0);
        let huge = Integer::new(10).pow(30);
        assert!((huge.to_f64() - 1e30).abs() < 1e15);
    }
}
