//! Currency amounts in the smallest unit.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

use crate::error::LootpotError;

/// Smallest units per whole coin (wei-style, 18 decimals).
pub const UNITS_PER_COIN: u128 = 1_000_000_000_000_000_000;

/// Non-negative amount of funds in the smallest currency unit.
///
/// Serialized as a decimal string so JSON clients do not lose `u128`
/// precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
#[schema(value_type = String, example = "100000000000000000")]
pub struct Amount(u128);

impl Amount {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Wraps a raw unit count.
    #[must_use]
    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    /// Returns the raw unit count.
    #[must_use]
    pub const fn get(self) -> u128 {
        self.0
    }

    /// Returns `true` when the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::Overflow`] if the sum does not fit.
    pub fn checked_add(self, rhs: Self) -> Result<Self, LootpotError> {
        self.0.checked_add(rhs.0).map(Self).ok_or(LootpotError::Overflow)
    }

    /// Subtracts `rhs` from `self`.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::Overflow`] if `rhs > self`.
    pub fn checked_sub(self, rhs: Self) -> Result<Self, LootpotError> {
        self.0.checked_sub(rhs.0).map(Self).ok_or(LootpotError::Overflow)
    }

    /// Subtraction clamped at zero.
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Integer percentage of the amount, rounded down.
    ///
    /// `percent` is expected in `0..=100`, so the result never exceeds
    /// `self`.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::Overflow`] if `self * percent` overflows.
    pub fn percent(self, percent: u8) -> Result<Self, LootpotError> {
        self.0
            .checked_mul(u128::from(percent))
            .map(|scaled| Self(scaled / 100))
            .ok_or(LootpotError::Overflow)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = LootpotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u128>()
            .map(Self)
            .map_err(|_| LootpotError::InvalidRequest(format!("invalid amount: {s}")))
    }
}

impl From<u128> for Amount {
    fn from(units: u128) -> Self {
        Self(units)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Number(n) => Ok(Self(u128::from(n))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_down() {
        assert_eq!(Amount::new(99).percent(20).ok(), Some(Amount::new(19)));
        assert_eq!(Amount::new(0).percent(50).ok(), Some(Amount::ZERO));
    }

    #[test]
    fn percent_of_tenth_coin() {
        let tenth = Amount::new(UNITS_PER_COIN / 10);
        assert_eq!(
            tenth.percent(20).ok(),
            Some(Amount::new(UNITS_PER_COIN / 50))
        );
    }

    #[test]
    fn checked_sub_underflow_is_error() {
        assert!(Amount::new(1).checked_sub(Amount::new(2)).is_err());
        assert_eq!(Amount::new(1).saturating_sub(Amount::new(2)), Amount::ZERO);
    }

    #[test]
    fn json_uses_strings_and_accepts_numbers() {
        let json = serde_json::to_string(&Amount::new(u128::MAX)).unwrap_or_default();
        assert_eq!(json, format!("\"{}\"", u128::MAX));
        let from_num: Result<Amount, _> = serde_json::from_str("42");
        assert_eq!(from_num.ok(), Some(Amount::new(42)));
        let bad: Result<Amount, _> = serde_json::from_str("\"-1\"");
        assert!(bad.is_err());
    }
}
