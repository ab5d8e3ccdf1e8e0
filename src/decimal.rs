//! Fixed-point decimal arithmetic for every monetary quantity in the
//! engine: prices, sizes, P&L, equity, commissions, rates.
//!
//! Every quantity is a signed integer mantissa scaled by 10^9.
//! `rust_decimal` already provides that contract (a 96-bit integer mantissa
//! with an explicit base-10 scale, exact add/sub/cmp, checked arithmetic)
//! so this module is a thin wrapper that pins the scale to 9 fractional
//! digits and surfaces failures as `DecimalError` instead of silently
//! wrapping or truncating.

use std::{
    cmp::Ordering,
    fmt,
    ops::{Add, Neg, Sub},
};

use rust_decimal::Decimal as Inner;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::DecimalError;

/// Number of fractional decimal digits every [`Decimal`] is normalized to.
pub const SCALE: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Decimal(Inner);

impl Decimal {
    pub const ZERO: Decimal = Decimal(Inner::ZERO);
    pub const ONE: Decimal = Decimal(Inner::ONE);

    /// Sentinel "not-a-number" value used by indicator vectors during their
    /// warm-up period. `Decimal` has no native NaN, so this is a reserved
    /// bit pattern (`Inner::MIN`) that never arises from ordinary
    /// price/size arithmetic.
    pub const NAN: Decimal = Decimal(Inner::MIN);

    pub fn is_nan(self) -> bool {
        self == Decimal::NAN
    }

    fn from_inner(mut value: Inner) -> Self {
        value.rescale(SCALE);
        Decimal(value)
    }

    pub fn from_int(value: i64) -> Self {
        Self::from_inner(Inner::from(value))
    }

    /// Best-effort construction from a binary float. Lossy by nature; never
    /// use this for values that must round-trip exactly (use
    /// [`Decimal::from_str`] for that).
    pub fn from_float(value: f64) -> Self {
        let inner = Inner::from_f64_retain(value).unwrap_or(Inner::ZERO);
        Self::from_inner(inner)
    }

    /// Exact construction from a decimal string. Fails on malformed input.
    pub fn from_str(s: &str) -> Result<Self, DecimalError> {
        Inner::from_str_exact(s)
            .or_else(|_| s.parse::<Inner>())
            .map(Self::from_inner)
            .map_err(|_| DecimalError::ParseError(s.to_string()))
    }

    /// Lossy conversion to `f64`, used only at statistical boundaries
    /// (Sharpe, mean, stdev) where float semantics are inherent.
    pub fn to_float(self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Self::from_inner(self.0.abs())
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, DecimalError> {
        self.0
            .checked_add(rhs.0)
            .map(Self::from_inner)
            .ok_or(DecimalError::Overflow)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, DecimalError> {
        self.0
            .checked_sub(rhs.0)
            .map(Self::from_inner)
            .ok_or(DecimalError::Overflow)
    }

    pub fn checked_mul(self, rhs: Self) -> Result<Self, DecimalError> {
        self.0
            .checked_mul(rhs.0)
            .map(Self::from_inner)
            .ok_or(DecimalError::Overflow)
    }

    pub fn checked_div(self, rhs: Self) -> Result<Self, DecimalError> {
        if rhs.0.is_zero() {
            return Err(DecimalError::DivideByZero);
        }
        self.0
            .checked_div(rhs.0)
            .map(Self::from_inner)
            .ok_or(DecimalError::Overflow)
    }

    pub fn cmp_to(self, rhs: Self) -> Ordering {
        self.0.cmp(&rhs.0)
    }

    pub fn min(self, rhs: Self) -> Self {
        if self.cmp_to(rhs) == Ordering::Greater { rhs } else { self }
    }

    pub fn max(self, rhs: Self) -> Self {
        if self.cmp_to(rhs) == Ordering::Less { rhs } else { self }
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Decimal::ZERO
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// Infallible operator overloads panic on overflow. The hot loop prefers
// the checked_* methods and propagates `DecimalError` via `?`; these
// operators exist for the common case (test code, literal arithmetic)
// where overflow is not a concern.
impl Add for Decimal {
    type Output = Decimal;
    fn add(self, rhs: Decimal) -> Decimal {
        self.checked_add(rhs).expect("decimal addition overflow")
    }
}

impl Sub for Decimal {
    type Output = Decimal;
    fn sub(self, rhs: Decimal) -> Decimal {
        self.checked_sub(rhs).expect("decimal subtraction overflow")
    }
}

impl Neg for Decimal {
    type Output = Decimal;
    fn neg(self) -> Decimal {
        Self::from_inner(-self.0)
    }
}

impl std::iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::ZERO, |acc, x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn from_str_is_exact() {
        let d = Decimal::from_str("2001.5").unwrap();
        assert_eq!(d.to_float(), 2001.5);
    }

    #[test]
    fn from_str_rejects_garbage() {
        assert!(Decimal::from_str("not-a-number").is_err());
    }

    #[test]
    fn div_by_zero_fails() {
        let a = Decimal::from_int(10);
        let err = a.checked_div(Decimal::ZERO).unwrap_err();
        assert_eq!(err, DecimalError::DivideByZero);
    }

    #[test]
    fn mul_rescales_correctly() {
        let price = Decimal::from_str("2000.0").unwrap();
        let rate = Decimal::from_str("0.001").unwrap();
        let commission = price.checked_mul(rate).unwrap();
        assert_eq!(commission, Decimal::from_str("2.0").unwrap());
    }

    #[test]
    fn overflow_is_detected_not_wrapped() {
        let huge = Decimal(Inner::MAX);
        assert_eq!(huge.checked_add(Decimal::ONE).unwrap_err(), DecimalError::Overflow);
    }

    #[test]
    fn comparisons_are_exact() {
        let a = Decimal::from_str("0.1").unwrap();
        let b = Decimal::from_str("0.1").unwrap();
        assert_eq!(a, b);
        assert!(a.cmp_to(b) == Ordering::Equal);
    }

    #[test]
    fn constants_hold() {
        assert!(Decimal::ZERO.is_zero());
        assert!(Decimal::ONE.is_positive());
        assert_eq!(Decimal::ONE, Decimal::from_int(1));
        let _ = dec!(1.0);
    }
}
