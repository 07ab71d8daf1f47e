//! Exact decimal quantity for prices, sizes and every derived amount.
//!
//! All indicator math goes through [`Num`]. It never narrows to binary
//! floating point; [`Num::to_f64`] exists only for rendering.

use crate::error::{Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

/// Immutable decimal quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Num(Decimal);

impl Num {
    pub const ZERO: Num = Num(Decimal::ZERO);
    pub const ONE: Num = Num(Decimal::ONE);
    pub const TWO: Num = Num(Decimal::TWO);
    pub const THREE: Num = Num(Decimal::from_parts(3, 0, 0, false, 0));
    pub const TEN: Num = Num(Decimal::TEN);
    pub const HUNDRED: Num = Num(Decimal::ONE_HUNDRED);

    /// Wrap a raw decimal.
    #[inline]
    pub const fn from_decimal(value: Decimal) -> Self {
        Num(value)
    }

    /// Build from an integer.
    #[inline]
    pub fn of(value: i64) -> Self {
        Num(Decimal::from(value))
    }

    /// Parse a decimal literal such as `"1234.5"`.
    pub fn parse(text: &str) -> Result<Self> {
        Decimal::from_str(text.trim())
            .map(Num)
            .map_err(|e| Error::parse(format!("{text:?}: {e}")))
    }

    /// The underlying decimal.
    #[inline]
    pub fn decimal(self) -> Decimal {
        self.0
    }

    /// `self + value`.
    ///
    /// # Panics
    /// On overflow of the 96-bit mantissa, like integer overflow.
    #[inline]
    pub fn plus(self, value: Num) -> Num {
        Num(self.0 + value.0)
    }

    /// `self - value`.
    ///
    /// # Panics
    /// On overflow of the 96-bit mantissa.
    #[inline]
    pub fn minus(self, value: Num) -> Num {
        Num(self.0 - value.0)
    }

    /// `self * value`.
    ///
    /// # Panics
    /// On overflow of the 96-bit mantissa.
    #[inline]
    pub fn multiply(self, value: Num) -> Num {
        Num(self.0 * value.0)
    }

    /// `self / value`, failing with [`Error::DivisionByZero`] on a zero divisor.
    pub fn divide(self, value: Num) -> Result<Num> {
        if value.is_zero() {
            return Err(Error::DivisionByZero);
        }
        self.0
            .checked_div(value.0)
            .map(Num)
            .ok_or_else(|| Error::Other(format!("{self} / {value} overflowed")))
    }

    #[inline]
    pub fn abs(self) -> Num {
        Num(self.0.abs())
    }

    #[inline]
    pub fn negate(self) -> Num {
        Num(-self.0)
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        !self.0.is_zero() && self.0.is_sign_negative()
    }

    #[inline]
    pub fn is_greater_than(self, other: Num) -> bool {
        self > other
    }

    #[inline]
    pub fn is_less_than(self, other: Num) -> bool {
        self < other
    }

    /// Round to `dp` decimal places, half away from zero.
    pub fn scale(self, dp: u32) -> Num {
        Num(self
            .0
            .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Largest of the given values, `None` when empty.
    pub fn max_of(values: &[Num]) -> Option<Num> {
        values.iter().copied().max()
    }

    /// Smallest of the given values, `None` when empty.
    pub fn min_of(values: &[Num]) -> Option<Num> {
        values.iter().copied().min()
    }

    /// Lossy projection for rendering. Not for computation.
    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.normalize(), f)
    }
}

impl FromStr for Num {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Num::parse(s)
    }
}

impl From<Decimal> for Num {
    fn from(value: Decimal) -> Self {
        Num(value)
    }
}

impl From<i64> for Num {
    fn from(value: i64) -> Self {
        Num::of(value)
    }
}

impl From<i32> for Num {
    fn from(value: i32) -> Self {
        Num(Decimal::from(value))
    }
}

impl From<usize> for Num {
    fn from(value: usize) -> Self {
        Num(Decimal::from(value))
    }
}

impl Add for Num {
    type Output = Num;

    fn add(self, rhs: Num) -> Num {
        self.plus(rhs)
    }
}

impl Sub for Num {
    type Output = Num;

    fn sub(self, rhs: Num) -> Num {
        self.minus(rhs)
    }
}

impl Mul for Num {
    type Output = Num;

    fn mul(self, rhs: Num) -> Num {
        self.multiply(rhs)
    }
}

impl Neg for Num {
    type Output = Num;

    fn neg(self) -> Num {
        self.negate()
    }
}

impl Sum for Num {
    fn sum<I: Iterator<Item = Num>>(iter: I) -> Num {
        iter.fold(Num::ZERO, Num::plus)
    }
}

impl<'a> Sum<&'a Num> for Num {
    fn sum<I: Iterator<Item = &'a Num>>(iter: I) -> Num {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exact_addition() {
        // 0.1 + 0.2 is exact here, unlike binary floating point
        let sum = Num::parse("0.1").unwrap().plus(Num::parse("0.2").unwrap());
        assert_eq!(sum, Num::parse("0.3").unwrap());
    }

    #[test]
    fn test_divide_by_zero() {
        let err = Num::TEN.divide(Num::ZERO).unwrap_err();
        assert!(matches!(err, Error::DivisionByZero));
    }

    #[test]
    fn test_divide() {
        assert_eq!(Num::TEN.divide(Num::of(4)).unwrap(), Num::from(dec!(2.5)));
    }

    #[test]
    fn test_scale_half_up() {
        assert_eq!(Num::from(dec!(3.45)).scale(1), Num::from(dec!(3.5)));
        assert_eq!(Num::from(dec!(2.34)).scale(1), Num::from(dec!(2.3)));
        assert_eq!(Num::from(dec!(-1.25)).scale(1), Num::from(dec!(-1.3)));
    }

    #[test]
    fn test_comparison_and_sign() {
        let a = Num::of(-3);
        assert!(a.is_negative());
        assert!(!a.is_positive());
        assert!(!Num::ZERO.is_negative());
        assert_eq!(a.abs(), Num::THREE);
        assert!(Num::ONE.is_less_than(Num::TWO));
        assert_eq!(Num::max_of(&[Num::ONE, Num::TEN, Num::TWO]), Some(Num::TEN));
        assert_eq!(Num::min_of(&[]), None);
    }

    #[test]
    fn test_equality_ignores_trailing_zeros() {
        assert_eq!(Num::parse("1.50").unwrap(), Num::parse("1.5").unwrap());
        assert_eq!(Num::parse("1.50").unwrap().to_string(), "1.5");
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(Num::parse("abc"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_sum_and_ops() {
        let values = [Num::ONE, Num::TWO, Num::THREE];
        let total: Num = values.iter().sum();
        assert_eq!(total, Num::of(6));
        assert_eq!(Num::TEN - Num::THREE * Num::TWO, Num::of(4));
        assert_eq!(-Num::ONE, Num::of(-1));
    }

    #[test]
    fn test_to_f64_projection() {
        approx::assert_relative_eq!(Num::from(dec!(1.25)).to_f64(), 1.25);
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Num::from(dec!(12.5))).unwrap();
        let back: Num = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Num::from(dec!(12.5)));
    }
}
