use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

/// Rational number representation for precise timing
///
/// Always stored reduced with a positive denominator, so the derived
/// `PartialEq`/`Hash` agree with numeric equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    pub numerator: i64,
    pub denominator: i64,
}

impl Fraction {
    /// Create a new fraction and simplify it
    ///
    /// # Panics
    /// Panics if `denominator` is zero.
    pub fn new(numerator: i64, denominator: i64) -> Self {
        if denominator == 0 {
            panic!("Denominator cannot be zero");
        }
        Self::reduce(numerator as i128, denominator as i128)
    }

    /// Create a fraction from a whole number
    pub fn from_int(n: i64) -> Self {
        Fraction {
            numerator: n,
            denominator: 1,
        }
    }

    pub fn zero() -> Self {
        Fraction::from_int(0)
    }

    pub fn one() -> Self {
        Fraction::from_int(1)
    }

    /// Create a fraction from a float (approximation to 1e-6)
    pub fn from_float(f: f64) -> Self {
        if !f.is_finite() {
            return Fraction::zero();
        }
        let n = (f * 1_000_000.0).round() as i64;
        Fraction::new(n, 1_000_000)
    }

    /// Convert to float
    pub fn to_float(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    // Intermediate products are computed in i128; a result that still does
    // not fit in i64 after reduction degrades to the float approximation.
    fn reduce(numerator: i128, denominator: i128) -> Self {
        let gcd = gcd(numerator.abs(), denominator.abs()).max(1);
        let mut n = numerator / gcd;
        let mut d = denominator / gcd;

        // Keep denominator positive
        if d < 0 {
            n = -n;
            d = -d;
        }

        match (i64::try_from(n), i64::try_from(d)) {
            (Ok(numerator), Ok(denominator)) => Fraction {
                numerator,
                denominator,
            },
            _ => Fraction::from_float(n as f64 / d as f64),
        }
    }

    /// Least common multiple
    pub fn lcm(a: i64, b: i64) -> i64 {
        if a == 0 || b == 0 {
            return 0;
        }
        let g = gcd(a.abs() as i128, b.abs() as i128);
        ((a as i128 / g) * b as i128).abs() as i64
    }

    /// Get the reciprocal
    ///
    /// # Panics
    /// Panics on zero.
    pub fn reciprocal(self) -> Self {
        Fraction::new(self.denominator, self.numerator)
    }

    /// Check if fraction is zero
    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// Check if fraction is negative
    pub fn is_negative(&self) -> bool {
        self.numerator < 0
    }

    /// Absolute value
    pub fn abs(self) -> Self {
        Fraction {
            numerator: self.numerator.abs(),
            denominator: self.denominator,
        }
    }

    /// Floor - round toward negative infinity
    pub fn floor(self) -> Self {
        Fraction::from_int(self.numerator.div_euclid(self.denominator))
    }

    /// Ceiling - round toward positive infinity
    pub fn ceil(self) -> Self {
        let floor = self.numerator.div_euclid(self.denominator);
        if self.numerator.rem_euclid(self.denominator) == 0 {
            Fraction::from_int(floor)
        } else {
            Fraction::from_int(floor + 1)
        }
    }

    /// Position within the current cycle, in [0, 1)
    pub fn cycle_pos(self) -> Self {
        self - self.floor()
    }

    /// The cycle number as an integer (floor)
    pub fn cycle(self) -> i64 {
        self.numerator.div_euclid(self.denominator)
    }

    /// Floor modulo: the result has the sign of `modulus`
    pub fn rem_floor(self, modulus: Fraction) -> Fraction {
        self - (self / modulus).floor() * modulus
    }
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    while b != 0 {
        let temp = b;
        b = a % b;
        a = temp;
    }
    a
}

impl Default for Fraction {
    fn default() -> Self {
        Fraction::zero()
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

/// Error returned when a fraction literal cannot be parsed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid fraction literal '{0}'")]
pub struct ParseFractionError(pub String);

impl FromStr for Fraction {
    type Err = ParseFractionError;

    /// Accepts `3`, `1.5` and `3/2`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseFractionError(s.to_string());

        if let Some((num, den)) = s.split_once('/') {
            let num: i64 = num.trim().parse().map_err(|_| err())?;
            let den: i64 = den.trim().parse().map_err(|_| err())?;
            if den == 0 {
                return Err(err());
            }
            return Ok(Fraction::new(num, den));
        }

        if let Ok(n) = s.parse::<i64>() {
            return Ok(Fraction::from_int(n));
        }

        match s.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Fraction::from_float(f)),
            _ => Err(err()),
        }
    }
}

impl From<i64> for Fraction {
    fn from(n: i64) -> Self {
        Fraction::from_int(n)
    }
}

impl From<i32> for Fraction {
    fn from(n: i32) -> Self {
        Fraction::from_int(n as i64)
    }
}

impl From<f64> for Fraction {
    fn from(f: f64) -> Self {
        Fraction::from_float(f)
    }
}

impl From<(i64, i64)> for Fraction {
    fn from((num, den): (i64, i64)) -> Self {
        Fraction::new(num, den)
    }
}

impl Add for Fraction {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let n = self.numerator as i128 * other.denominator as i128
            + other.numerator as i128 * self.denominator as i128;
        let d = self.denominator as i128 * other.denominator as i128;
        Fraction::reduce(n, d)
    }
}

impl Sub for Fraction {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self + (-other)
    }
}

impl Neg for Fraction {
    type Output = Self;

    fn neg(self) -> Self {
        Fraction {
            numerator: -self.numerator,
            denominator: self.denominator,
        }
    }
}

impl Mul for Fraction {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Fraction::reduce(
            self.numerator as i128 * other.numerator as i128,
            self.denominator as i128 * other.denominator as i128,
        )
    }
}

impl Div for Fraction {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn div(self, other: Self) -> Self {
        // Division is multiplication by the reciprocal
        self * other.reciprocal()
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.numerator as i128 * other.denominator as i128;
        let rhs = other.numerator as i128 * self.denominator as i128;
        lhs.cmp(&rhs)
    }
}
