//! Non-negative price using decimal arithmetic.
//!
//! Prices are stored in documents as plain JSON numbers, so `Price` carries
//! its own serde implementation: it writes a number and reads either a number
//! or a numeric string. The decimal is parsed from the number's textual form,
//! which keeps values like `699.99` exact instead of going through `f64`.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The amount is above [`Price::MAX`].
    #[error("price exceeds the maximum of {max} (got {0})", max = Price::MAX.0)]
    TooLarge(Decimal),
    /// The value is not a number.
    #[error("price is not numeric")]
    NotNumeric,
}

/// A non-negative amount in the store's single currency.
///
/// Unit prices are capped at [`Price::MAX`]. Line totals and sums saturate
/// instead of overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest accepted unit price (one trillion).
    pub const MAX: Self = Self(Decimal::from_parts(3_567_587_328, 232, 0, false, 0));

    /// Create a price, rejecting negative amounts and amounts above
    /// [`Price::MAX`].
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` or `PriceError::TooLarge`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        Ok(Self(amount.normalize()))
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// Parse a price out of a raw document value.
    ///
    /// Accepts JSON numbers and numeric strings.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotNumeric` for anything else, or
    /// `PriceError::Negative` / `PriceError::TooLarge` for amounts out of
    /// range.
    pub fn from_json(value: &Value) -> Result<Self, PriceError> {
        let text = match value {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_owned(),
            _ => return Err(PriceError::NotNumeric),
        };

        let amount = Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .map_err(|_| PriceError::NotNumeric)?;

        Self::new(amount)
    }

    /// Price of `quantity` units, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(
            self.0
                .checked_mul(Decimal::from(quantity))
                .unwrap_or(Decimal::MAX),
        )
    }

    /// Render as a JSON number for document storage.
    ///
    /// Goes through the decimal's text form so the stored number is the
    /// closest double to the exact amount.
    #[must_use]
    pub fn to_json(&self) -> Value {
        self.0
            .normalize()
            .to_string()
            .parse::<serde_json::Number>()
            .map_or_else(|_| Value::from(0), Value::Number)
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(&Value::String(s.to_owned()))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}
