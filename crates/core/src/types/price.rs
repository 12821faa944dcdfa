//! Service prices.
//!
//! The remote API sends prices as plain JSON numbers in rupees. They are held
//! as [`Decimal`] so cart totals never accumulate floating-point drift, and
//! serialized back as numbers so the persisted cart mirrors the wire shape.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price in Indian rupees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal rupee amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of rupees.
    #[must_use]
    pub fn from_rupees(rupees: i64) -> Self {
        Self(Decimal::from(rupees))
    }

    /// The rupee amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    /// Formats as `₹499` for whole amounts and `₹499.50` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.0.round_dp(2);
        if amount.fract().is_zero() {
            write!(f, "₹{}", amount.trunc())
        } else {
            write!(f, "₹{amount:.2}")
        }
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_json_numbers() {
        let whole: Price = serde_json::from_str("499").unwrap();
        assert_eq!(whole, Price::from_rupees(499));

        let fractional: Price = serde_json::from_str("249.5").unwrap();
        assert_eq!(fractional.to_string(), "₹249.50");
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&Price::from_rupees(300)).unwrap();
        assert_eq!(json, "300.0");
    }

    #[test]
    fn test_display_whole_amount() {
        assert_eq!(Price::from_rupees(1200).to_string(), "₹1200");
    }

    #[test]
    fn test_sum() {
        let prices = [Price::from_rupees(100), Price::from_rupees(250)];
        let total: Price = prices.iter().sum();
        assert_eq!(total, Price::from_rupees(350));
    }
}
