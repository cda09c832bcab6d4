//! Type-safe price representation using decimal arithmetic.
//!
//! The cart backend exchanges prices as plain JSON numbers in the store's
//! single currency, so a `Price` carries no currency code. Amounts are kept
//! as [`Decimal`] internally and only converted to a float at the wire
//! boundary.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize, Serializer};

/// A price in the store currency's standard unit (e.g., dollars, not cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl core::ops::Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl core::iter::Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, p| acc + p)
    }
}

// The backend expects JSON numbers, not the decimal-as-string default.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Integral amounts go out as integers so `20` stays `20`, not `20.0`.
        if self.0.fract().is_zero()
            && let Some(units) = self.0.to_i64()
        {
            return serializer.serialize_i64(units);
        }
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_integral_as_integer() {
        let price = Price::from_units(20);
        assert_eq!(serde_json::to_string(&price).unwrap(), "20");
    }

    #[test]
    fn test_serialize_fraction_as_number() {
        let price: Price = "19.5".parse().unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "19.5");
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let a: Price = serde_json::from_str("20").unwrap();
        let b: Price = serde_json::from_str("\"20.00\"").unwrap();
        let c: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(a, b);
        assert_eq!(c.to_string(), "19.99");
    }

    #[test]
    fn test_times_and_sum() {
        let unit: Price = "2.50".parse().unwrap();
        let total: Price = [unit.times(2), Price::from_units(1)].into_iter().sum();
        assert_eq!(total.to_string(), "6.00");
    }

    #[test]
    fn test_is_negative() {
        assert!("-1".parse::<Price>().unwrap().is_negative());
        assert!(!Price::ZERO.is_negative());
    }
}
