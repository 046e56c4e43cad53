//! Numeric contract shared by every indicator and valuation series.
//!
//! Engine code is written against [`Num`] and receives a [`NumFactory`]
//! wherever it needs constants, so one run can use `f64` and another
//! `Decimal` without touching the algorithms.

use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps};
use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

/// A number representation the engine can compute with.
pub trait Num:
    Copy
    + PartialEq
    + PartialOrd
    + Debug
    + Display
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    fn is_nan(self) -> bool;

    fn is_zero(self) -> bool;

    /// Strictly below zero. `false` for NaN.
    fn is_negative(self) -> bool;

    fn abs(self) -> Self;

    /// Square root; negative inputs yield NaN for `f64` and zero for `Decimal`.
    fn sqrt(self) -> Self;

    /// Natural logarithm; non-positive inputs yield NaN/-inf for `f64` and
    /// zero for `Decimal`.
    fn ln(self) -> Self;

    fn to_f64(self) -> f64;

    /// The larger of the two values. NaN never wins over a real number.
    fn max(self, other: Self) -> Self {
        if other > self || self.is_nan() { other } else { self }
    }

    /// The smaller of the two values. NaN never wins over a real number.
    fn min(self, other: Self) -> Self {
        if other < self || self.is_nan() { other } else { self }
    }
}

impl Num for f64 {
    #[inline]
    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }

    #[inline]
    fn is_zero(self) -> bool {
        self == 0.0
    }

    #[inline]
    fn is_negative(self) -> bool {
        self < 0.0
    }

    #[inline]
    fn abs(self) -> Self {
        f64::abs(self)
    }

    #[inline]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    #[inline]
    fn ln(self) -> Self {
        f64::ln(self)
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}

impl Num for Decimal {
    #[inline]
    fn is_nan(self) -> bool {
        false
    }

    #[inline]
    fn is_zero(self) -> bool {
        Decimal::is_zero(&self)
    }

    #[inline]
    fn is_negative(self) -> bool {
        Decimal::is_sign_negative(&self) && !Decimal::is_zero(&self)
    }

    #[inline]
    fn abs(self) -> Self {
        Decimal::abs(&self)
    }

    fn sqrt(self) -> Self {
        MathematicalOps::sqrt(&self).unwrap_or(Decimal::ZERO)
    }

    fn ln(self) -> Self {
        MathematicalOps::checked_ln(&self).unwrap_or(Decimal::ZERO)
    }

    fn to_f64(self) -> f64 {
        ToPrimitive::to_f64(&self).unwrap_or(f64::NAN)
    }
}

/// Produces numbers and named constants for one representation.
pub trait NumFactory: Copy + Debug + Send + Sync + 'static {
    type Num: Num;

    fn zero(&self) -> Self::Num;

    fn one(&self) -> Self::Num;

    fn hundred(&self) -> Self::Num;

    fn value_of(&self, value: f64) -> Self::Num;

    /// Parses a decimal literal without going through `f64` where the
    /// representation allows it.
    fn parse(&self, text: &str) -> Option<Self::Num>;

    /// Counts (window lengths, bar counts) as numbers.
    fn from_count(&self, count: usize) -> Self::Num;

    fn two(&self) -> Self::Num {
        self.one() + self.one()
    }
}

/// `f64` arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoubleFactory;

impl NumFactory for DoubleFactory {
    type Num = f64;

    fn zero(&self) -> f64 {
        0.0
    }

    fn one(&self) -> f64 {
        1.0
    }

    fn hundred(&self) -> f64 {
        100.0
    }

    fn value_of(&self, value: f64) -> f64 {
        value
    }

    fn parse(&self, text: &str) -> Option<f64> {
        text.trim().parse().ok()
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_count(&self, count: usize) -> f64 {
        count as f64
    }
}

/// 96-bit fixed-point arithmetic via `rust_decimal`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecimalFactory;

impl NumFactory for DecimalFactory {
    type Num = Decimal;

    fn zero(&self) -> Decimal {
        Decimal::ZERO
    }

    fn one(&self) -> Decimal {
        Decimal::ONE
    }

    fn hundred(&self) -> Decimal {
        Decimal::ONE_HUNDRED
    }

    /// Non-finite inputs have no decimal counterpart and map to zero.
    fn value_of(&self, value: f64) -> Decimal {
        Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
    }

    fn parse(&self, text: &str) -> Option<Decimal> {
        let text = text.trim();
        Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .ok()
    }

    fn from_count(&self, count: usize) -> Decimal {
        Decimal::from(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_constants() {
        let f = DoubleFactory;
        assert_eq!(f.zero(), 0.0);
        assert_eq!(f.one(), 1.0);
        assert_eq!(f.two(), 2.0);
        assert_eq!(f.hundred(), 100.0);
        assert_eq!(f.from_count(7), 7.0);
    }

    #[test]
    fn decimal_constants() {
        let f = DecimalFactory;
        assert_eq!(f.zero(), Decimal::ZERO);
        assert_eq!(f.hundred(), Decimal::from(100));
        assert_eq!(f.from_count(3), Decimal::from(3));
    }

    #[test]
    fn decimal_parse_is_exact() {
        let f = DecimalFactory;
        let v = f.parse("0.1").unwrap() + f.parse("0.2").unwrap();
        assert_eq!(v, f.parse("0.3").unwrap());
    }

    #[test]
    fn decimal_parse_rejects_garbage() {
        assert_eq!(DecimalFactory.parse("abc"), None);
        assert_eq!(DoubleFactory.parse("abc"), None);
    }

    #[test]
    fn decimal_value_of_nan_is_zero() {
        assert_eq!(DecimalFactory.value_of(f64::NAN), Decimal::ZERO);
    }

    #[test]
    fn max_ignores_nan() {
        assert_eq!(Num::max(f64::NAN, 3.0), 3.0);
        assert_eq!(Num::max(3.0, f64::NAN), 3.0);
        assert_eq!(Num::min(f64::NAN, -1.0), -1.0);
    }

    #[test]
    fn decimal_math() {
        let f = DecimalFactory;
        assert_eq!(Num::sqrt(f.value_of(16.0)), f.value_of(4.0));
        assert_eq!(Num::abs(f.value_of(-2.5)), f.value_of(2.5));
        assert!(!Num::is_nan(f.value_of(1.0)));
        assert_eq!(Num::ln(f.zero()), f.zero());
        assert!(Num::is_negative(f.value_of(-0.5)));
        assert!(!Num::is_negative(f.zero()));
    }

    #[test]
    fn double_ln_matches_std() {
        assert!((Num::ln(std::f64::consts::E) - 1.0).abs() < 1e-12);
    }
}
