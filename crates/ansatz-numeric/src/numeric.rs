//! The scalar value carried by numeric expression nodes.
//!
//! A [`Numeric`] is either exact (a complex number with rational real and
//! imaginary parts) or approximate (a pair of `f64`). Arithmetic between two
//! exact values stays exact; anything touching an approximate value becomes
//! approximate. Exponentiation stays exact whenever the mathematical result
//! is exactly representable and falls back to the principal value otherwise.

use num_traits::{One, Zero};
use rustc_hash::FxHasher;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Mul, Neg, Sub};

use crate::{Integer, NumericError, Rational};

/// An exact or approximate complex number.
#[derive(Clone)]
pub enum Numeric {
    /// `re + im*I` with rational parts.
    Exact {
        /// Real part.
        re: Rational,
        /// Imaginary part.
        im: Rational,
    },
    /// `re + im*I` in double precision.
    Approx {
        /// Real part.
        re: f64,
        /// Imaginary part.
        im: f64,
    },
}

impl Numeric {
    /// Creates an exact integer.
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self::from_rational(Rational::from(value))
    }

    /// Creates an exact rational `num/den`.
    ///
    /// # Panics
    ///
    /// Panics if `den` is zero.
    #[must_use]
    pub fn rational(num: i64, den: i64) -> Self {
        Self::from_rational(Rational::from_i64(num, den))
    }

    /// Creates an exact real number.
    #[must_use]
    pub fn from_rational(value: Rational) -> Self {
        Self::Exact {
            re: value,
            im: Rational::zero(),
        }
    }

    /// Creates an exact complex number.
    #[must_use]
    pub fn complex(re: Rational, im: Rational) -> Self {
        Self::Exact { re, im }
    }

    /// The imaginary unit.
    #[must_use]
    pub fn i() -> Self {
        Self::complex(Rational::zero(), Rational::one())
    }

    /// Creates an approximate real number.
    #[must_use]
    pub fn approx(value: f64) -> Self {
        Self::approx_complex(value, 0.0)
    }

    /// Creates an approximate complex number.
    ///
    /// Negative zero parts are stored as positive zero.
    #[must_use]
    pub fn approx_complex(re: f64, im: f64) -> Self {
        Self::Approx {
            re: re + 0.0,
            im: im + 0.0,
        }
    }

    /// Exact `-1`.
    #[must_use]
    pub fn minus_one() -> Self {
        Self::integer(-1)
    }

    // === Predicates ===

    /// Returns true for an exact value.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Exact { .. })
    }

    /// Returns true for an exact complex rational (the "crational" class).
    #[must_use]
    pub fn is_crational(&self) -> bool {
        self.is_exact()
    }

    /// Returns true for an exact real rational.
    #[must_use]
    pub fn is_rational(&self) -> bool {
        matches!(self, Self::Exact { im, .. } if im.is_zero())
    }

    /// Returns true for an exact real integer.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Exact { re, im } if im.is_zero() && re.is_integer())
    }

    /// Returns true for an exact integer greater than zero.
    #[must_use]
    pub fn is_pos_integer(&self) -> bool {
        self.is_integer() && self.is_positive()
    }

    /// Returns true if the imaginary part is zero.
    #[must_use]
    pub fn is_real(&self) -> bool {
        match self {
            Self::Exact { im, .. } => im.is_zero(),
            Self::Approx { im, .. } => *im == 0.0,
        }
    }

    /// Returns true for a real number greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        match self {
            Self::Exact { re, im } => im.is_zero() && re.is_positive(),
            Self::Approx { re, im } => *im == 0.0 && *re > 0.0,
        }
    }

    /// Returns true for a real number less than zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        match self {
            Self::Exact { re, im } => im.is_zero() && re.is_negative(),
            Self::Approx { re, im } => *im == 0.0 && *re < 0.0,
        }
    }

    /// Returns true for exact or approximate `-1`.
    #[must_use]
    pub fn is_minus_one(&self) -> bool {
        match self {
            Self::Exact { re, im } => im.is_zero() && *re == -Rational::one(),
            Self::Approx { re, im } => *im == 0.0 && *re == -1.0,
        }
    }

    // === Accessors ===

    /// The real part, with the same exactness.
    #[must_use]
    pub fn real(&self) -> Self {
        match self {
            Self::Exact { re, .. } => Self::from_rational(re.clone()),
            Self::Approx { re, .. } => Self::approx(*re),
        }
    }

    /// The imaginary part, with the same exactness.
    #[must_use]
    pub fn imag(&self) -> Self {
        match self {
            Self::Exact { im, .. } => Self::from_rational(im.clone()),
            Self::Approx { im, .. } => Self::approx(*im),
        }
    }

    /// Returns the value as a rational if it is an exact real.
    #[must_use]
    pub fn as_rational(&self) -> Option<&Rational> {
        match self {
            Self::Exact { re, im } if im.is_zero() => Some(re),
            _ => None,
        }
    }

    /// Numerator of an exact real.
    #[must_use]
    pub fn numer(&self) -> Option<Integer> {
        self.as_rational().map(Rational::numerator)
    }

    /// Denominator of an exact real.
    #[must_use]
    pub fn denom(&self) -> Option<Integer> {
        self.as_rational().map(Rational::denominator)
    }

    /// Converts an exact integer to `i64`.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        self.as_rational()
            .and_then(Rational::to_integer)
            .and_then(|n| n.to_i64())
    }

    /// Converts an exact integer to `i32`.
    #[must_use]
    pub fn to_i32(&self) -> Option<i32> {
        self.to_i64().and_then(|n| i32::try_from(n).ok())
    }

    /// Returns `(re, im)` as doubles.
    #[must_use]
    pub fn to_f64_pair(&self) -> (f64, f64) {
        match self {
            Self::Exact { re, im } => (re.to_f64(), im.to_f64()),
            Self::Approx { re, im } => (*re, *im),
        }
    }

    /// Converts to an approximate value.
    #[must_use]
    pub fn evalf(&self) -> Self {
        let (re, im) = self.to_f64_pair();
        Self::approx_complex(re, im)
    }

    /// Absolute value. Exact for exact reals, approximate modulus otherwise.
    #[must_use]
    pub fn abs(&self) -> Self {
        match self {
            Self::Exact { re, im } if im.is_zero() => Self::from_rational(re.abs()),
            _ => {
                let (re, im) = self.to_f64_pair();
                Self::approx(re.hypot(im))
            }
        }
    }

    // === Arithmetic ===

    fn binary(
        &self,
        other: &Self,
        exact: impl FnOnce(&Rational, &Rational, &Rational, &Rational) -> (Rational, Rational),
        approx: impl FnOnce(f64, f64, f64, f64) -> (f64, f64),
    ) -> Self {
        match (self, other) {
            (Self::Exact { re: a, im: b }, Self::Exact { re: c, im: d }) => {
                let (re, im) = exact(a, b, c, d);
                Self::Exact { re, im }
            }
            _ => {
                let (a, b) = self.to_f64_pair();
                let (c, d) = other.to_f64_pair();
                let (re, im) = approx(a, b, c, d);
                Self::approx_complex(re, im)
            }
        }
    }

    /// Returns `1/self`.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::DivisionByZero`] for zero.
    pub fn inverse(&self) -> Result<Self, NumericError> {
        if self.is_zero() {
            return Err(NumericError::DivisionByZero);
        }
        Ok(match self {
            Self::Exact { re, im } => {
                let norm = &(re * re) + &(im * im);
                Self::Exact {
                    re: re / &norm,
                    im: -(im / &norm),
                }
            }
            Self::Approx { re, im } => {
                let norm = re * re + im * im;
                Self::approx_complex(re / norm, -im / norm)
            }
        })
    }

    /// Returns `self / other`.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::DivisionByZero`] if `other` is zero.
    pub fn checked_div(&self, other: &Self) -> Result<Self, NumericError> {
        Ok(self * &other.inverse()?)
    }

    /// Raises to an exact integer power by repeated squaring.
    fn pow_int(&self, exp: i64) -> Result<Self, NumericError> {
        if exp < 0 {
            return self.inverse()?.pow_int(-exp);
        }
        let mut result = Self::one().with_exactness_of(self);
        let mut base = self.clone();
        let mut n = exp.unsigned_abs();
        while n > 0 {
            if n & 1 == 1 {
                result = &result * &base;
            }
            n >>= 1;
            if n > 0 {
                base = &base * &base;
            }
        }
        Ok(result)
    }

    fn with_exactness_of(self, other: &Self) -> Self {
        if other.is_exact() {
            self
        } else {
            self.evalf()
        }
    }

    /// Raises `self` to the power `exp`.
    ///
    /// The result is exact when both operands are exact and the result is
    /// representable: integer exponents, rational exponents of non-negative
    /// rationals that are perfect powers, and half-integer exponents of
    /// negative rationals with a rational square root. Otherwise the
    /// principal value is computed in double precision.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::DivisionByZero`] when raising zero to a power
    /// whose real part is not positive.
    pub fn checked_pow(&self, exp: &Self) -> Result<Self, NumericError> {
        if let Some(n) = exp.to_i64() {
            if self.is_exact() && n.unsigned_abs() <= u64::from(u32::MAX) {
                return self.pow_int(n);
            }
        }

        if let (Some(b), Some(e)) = (self.as_rational(), exp.as_rational()) {
            if let Some(exact) = Self::exact_rational_pow(b, e)? {
                return Ok(exact);
            }
        }

        self.approx_pow(exp)
    }

    fn exact_rational_pow(base: &Rational, exp: &Rational) -> Result<Option<Self>, NumericError> {
        if base.is_zero() {
            return if exp.is_positive() {
                Ok(Some(Self::zero()))
            } else {
                Err(NumericError::DivisionByZero)
            };
        }
        let (Some(p), Some(q)) = (
            exp.numerator().to_i64(),
            exp.denominator().to_i64().and_then(|q| u32::try_from(q).ok()),
        ) else {
            return Ok(None);
        };

        if base.is_positive() {
            if let Some(value) = base.nth_root_exact(q).and_then(|root| root.pow_i64(p)) {
                return Ok(Some(Self::from_rational(value)));
            }
        } else if q == 2 {
            // (-a)^(p/2) = (I*sqrt(a))^p
            if let Some(root) = (-base).nth_root_exact(2) {
                return Self::complex(Rational::zero(), root).pow_int(p).map(Some);
            }
        }
        Ok(None)
    }

    fn approx_pow(&self, exp: &Self) -> Result<Self, NumericError> {
        let (a, b) = self.to_f64_pair();
        let (c, d) = exp.to_f64_pair();

        if a == 0.0 && b == 0.0 {
            return if c > 0.0 {
                Ok(Self::approx(0.0))
            } else {
                Err(NumericError::DivisionByZero)
            };
        }
        if b == 0.0 && d == 0.0 && (a > 0.0 || c.fract() == 0.0) {
            return Ok(Self::approx(a.powf(c)));
        }

        // principal branch: exp(exp * ln(base))
        let ln_re = a.hypot(b).ln();
        let ln_im = b.atan2(a);
        let w_re = c * ln_re - d * ln_im;
        let w_im = c * ln_im + d * ln_re;
        let modulus = w_re.exp();
        Ok(Self::approx_complex(modulus * w_im.cos(), modulus * w_im.sin()))
    }

    // === Canonical order and hashing ===

    /// Total order used for canonical sorting: exact before approximate,
    /// then real part, then imaginary part.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Exact { re: a, im: b }, Self::Exact { re: c, im: d }) => {
                a.cmp(c).then_with(|| b.cmp(d))
            }
            (Self::Approx { re: a, im: b }, Self::Approx { re: c, im: d }) => {
                a.total_cmp(c).then_with(|| b.total_cmp(d))
            }
            (Self::Exact { .. }, Self::Approx { .. }) => Ordering::Less,
            (Self::Approx { .. }, Self::Exact { .. }) => Ordering::Greater,
        }
    }

    /// A deterministic 32-bit hash consistent with [`Numeric::compare`].
    #[must_use]
    pub fn hash_value(&self) -> u32 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        let h = hasher.finish();
        #[allow(clippy::cast_possible_truncation)]
        let folded = (h ^ (h >> 32)) as u32;
        folded
    }
}

impl Zero for Numeric {
    fn zero() -> Self {
        Self::integer(0)
    }

    fn is_zero(&self) -> bool {
        match self {
            Self::Exact { re, im } => re.is_zero() && im.is_zero(),
            Self::Approx { re, im } => *re == 0.0 && *im == 0.0,
        }
    }
}

impl One for Numeric {
    fn one() -> Self {
        Self::integer(1)
    }

    fn is_one(&self) -> bool {
        match self {
            Self::Exact { re, im } => re.is_one() && im.is_zero(),
            Self::Approx { re, im } => *re == 1.0 && *im == 0.0,
        }
    }
}

impl PartialEq for Numeric {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Numeric {}

impl Hash for Numeric {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Exact { re, im } => {
                0u8.hash(state);
                re.hash(state);
                im.hash(state);
            }
            Self::Approx { re, im } => {
                1u8.hash(state);
                re.to_bits().hash(state);
                im.to_bits().hash(state);
            }
        }
    }
}

impl fmt::Debug for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Numeric({self})")
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact { re, im } => {
                if im.is_zero() {
                    return write!(f, "{re}");
                }
                let unit = if im.abs().is_one() {
                    String::from("I")
                } else {
                    format!("{}*I", im.abs())
                };
                let sign = if im.is_negative() { "-" } else { "+" };
                if re.is_zero() {
                    write!(f, "{}{unit}", if im.is_negative() { "-" } else { "" })
                } else {
                    write!(f, "{re}{sign}{unit}")
                }
            }
            Self::Approx { re, im } => {
                if *im == 0.0 {
                    write!(f, "{re:?}")
                } else if *re == 0.0 {
                    write!(f, "{im:?}*I")
                } else {
                    let sign = if *im < 0.0 { "-" } else { "+" };
                    write!(f, "{re:?}{sign}{:?}*I", im.abs())
                }
            }
        }
    }
}

impl Add for &Numeric {
    type Output = Numeric;

    fn add(self, rhs: Self) -> Numeric {
        self.binary(
            rhs,
            |a, b, c, d| (a + c, b + d),
            |a, b, c, d| (a + c, b + d),
        )
    }
}

impl Add for Numeric {
    type Output = Numeric;

    fn add(self, rhs: Self) -> Numeric {
        &self + &rhs
    }
}

impl Sub for &Numeric {
    type Output = Numeric;

    fn sub(self, rhs: Self) -> Numeric {
        self.binary(
            rhs,
            |a, b, c, d| (a - c, b - d),
            |a, b, c, d| (a - c, b - d),
        )
    }
}

impl Sub for Numeric {
    type Output = Numeric;

    fn sub(self, rhs: Self) -> Numeric {
        &self - &rhs
    }
}

impl Mul for &Numeric {
    type Output = Numeric;

    fn mul(self, rhs: Self) -> Numeric {
        self.binary(
            rhs,
            |a, b, c, d| (&(a * c) - &(b * d), &(a * d) + &(b * c)),
            |a, b, c, d| (a * c - b * d, a * d + b * c),
        )
    }
}

impl Mul for Numeric {
    type Output = Numeric;

    fn mul(self, rhs: Self) -> Numeric {
        &self * &rhs
    }
}

impl Neg for &Numeric {
    type Output = Numeric;

    fn neg(self) -> Numeric {
        match self {
            Numeric::Exact { re, im } => Numeric::Exact {
                re: -re,
                im: -im,
            },
            Numeric::Approx { re, im } => Numeric::approx_complex(-re, -im),
        }
    }
}

impl Neg for Numeric {
    type Output = Numeric;

    fn neg(self) -> Numeric {
        -&self
    }
}

impl From<i64> for Numeric {
    fn from(value: i64) -> Self {
        Self::integer(value)
    }
}

impl From<i32> for Numeric {
    fn from(value: i32) -> Self {
        Self::integer(i64::from(value))
    }
}

impl From<Integer> for Numeric {
    fn from(value: Integer) -> Self {
        Self::from_rational(Rational::from(value))
    }
}

impl From<Rational> for Numeric {
    fn from(value: Rational) -> Self {
        Self::from_rational(value)
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Self::approx(value)
    }
}
