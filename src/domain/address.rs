//! Caller and participant identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::LootpotError;

/// Longest accepted address string.
pub const MAX_ADDRESS_LEN: usize = 128;

/// Account address of a caller, creator or participant.
///
/// Addresses are opaque strings supplied by the signing layer. They are
/// trimmed and lowercased on construction so `0xAbC` and `0xabc` refer to
/// the same account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8")]
pub struct Address(String);

impl Address {
    /// Sentinel address carried by absent participant records.
    pub const ZERO: &'static str = "0x0000000000000000000000000000000000000000";

    /// Builds a normalized address.
    ///
    /// # Errors
    ///
    /// Returns [`LootpotError::InvalidRequest`] if the input is empty after
    /// trimming or longer than [`MAX_ADDRESS_LEN`].
    pub fn new(raw: &str) -> Result<Self, LootpotError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LootpotError::InvalidRequest("empty address".to_string()));
        }
        if trimmed.len() > MAX_ADDRESS_LEN {
            return Err(LootpotError::InvalidRequest(format!(
                "address longer than {MAX_ADDRESS_LEN} characters"
            )));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Returns the zero-address sentinel.
    #[must_use]
    pub fn zero() -> Self {
        Self(Self::ZERO.to_string())
    }

    /// Returns `true` for the zero-address sentinel.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == Self::ZERO
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = LootpotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let Ok(a) = Address::new("  0xAbCd ") else {
            panic!("valid address");
        };
        assert_eq!(a.as_str(), "0xabcd");
    }

    #[test]
    fn rejects_empty() {
        assert!(Address::new("   ").is_err());
    }

    #[test]
    fn rejects_oversized() {
        let long = "a".repeat(MAX_ADDRESS_LEN + 1);
        assert!(Address::new(&long).is_err());
    }

    #[test]
    fn zero_sentinel() {
        assert!(Address::zero().is_zero());
        let Ok(a) = Address::new("0x01") else {
            panic!("valid address");
        };
        assert!(!a.is_zero());
    }

    #[test]
    fn deserialize_goes_through_validation() {
        let ok: Result<Address, _> = serde_json::from_str("\"0xFF\"");
        assert_eq!(ok.ok().map(|a| a.to_string()), Some("0xff".to_string()));
        let bad: Result<Address, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }
}
