//! Token amounts as checked integers over base units.
//!
//! The reward token uses 18 decimals on-chain. Amounts are carried as `u128`
//! base units everywhere; whole-token convenience constructors exist for
//! configuration and tests. Arithmetic is checked — balance code decides what
//! an overflow or underflow means, this type never wraps or clamps silently.

use serde::{Deserialize, Serialize};

use crate::constants::TOKEN_DECIMALS;
use crate::error::TypeError;

/// One whole token in base units (10^18).
const ONE_TOKEN: u128 = 10u128.pow(TOKEN_DECIMALS);

/// A non-negative quantity of reward tokens, in base units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct TokenAmount(u128);

/// Serde helper representing a [`TokenAmount`] as its decimal base-units string.
///
/// 128-bit integers do not round-trip through serde's buffered content
/// representation (used by internally tagged enums), so amount fields carried
/// inside such enums must be (de)serialized as strings. Apply with
/// `#[serde(with = "crate::amount::token_str")]`.
pub mod token_str {
    use super::TokenAmount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &TokenAmount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.base_units().to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<TokenAmount, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<u128>()
            .map(TokenAmount::from_base_units)
            .map_err(serde::de::Error::custom)
    }
}

impl TokenAmount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Create from raw base units (wei-scale).
    pub const fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Create from a whole number of tokens.
    pub const fn from_tokens(tokens: u64) -> Self {
        Self(tokens as u128 * ONE_TOKEN)
    }

    /// Raw base units.
    pub const fn base_units(&self) -> u128 {
        self.0
    }

    /// Whole-token part, truncating any fractional remainder.
    pub const fn whole_tokens(&self) -> u128 {
        self.0 / ONE_TOKEN
    }

    /// True if this amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition.
    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction; `None` if the result would be negative.
    pub fn checked_sub(&self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Checked multiplication by a unitless count.
    pub fn checked_mul(&self, count: u64) -> Option<Self> {
        self.0.checked_mul(count as u128).map(Self)
    }

    /// Parse from a decimal base-unit string, as persisted in storage.
    pub fn from_base_units_str(s: &str) -> Result<Self, TypeError> {
        s.trim()
            .parse::<u128>()
            .map(Self)
            .map_err(|_| TypeError::InvalidAmount(s.to_string()))
    }

    /// Parse from a `0x`-prefixed hex quantity, as returned by chain RPC.
    pub fn from_hex_quantity(s: &str) -> Result<Self, TypeError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| TypeError::InvalidHexQuantity(s.to_string()))?;
        if digits.is_empty() || digits.len() > 32 {
            return Err(TypeError::InvalidHexQuantity(s.to_string()));
        }
        u128::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| TypeError::InvalidHexQuantity(s.to_string()))
    }
}

impl std::fmt::Display for TokenAmount {
    /// Render as a decimal token quantity with the fractional part trimmed,
    /// e.g. `100`, `4.5`, `0.000001`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / ONE_TOKEN;
        let frac = self.0 % ONE_TOKEN;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let frac_str = format!("{:018}", frac);
        write!(f, "{}.{}", whole, frac_str.trim_end_matches('0'))
    }
}

impl std::iter::Sum for TokenAmount {
    /// Saturating sum; callers that care about overflow use `checked_add`.
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.fold(0u128, |acc, a| acc.saturating_add(a.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tokens() {
        let amount = TokenAmount::from_tokens(100);
        assert_eq!(amount.base_units(), 100 * ONE_TOKEN);
        assert_eq!(amount.whole_tokens(), 100);
    }

    #[test]
    fn test_checked_sub_underflow() {
        let small = TokenAmount::from_tokens(1);
        let big = TokenAmount::from_tokens(2);
        assert_eq!(big.checked_sub(small), Some(TokenAmount::from_tokens(1)));
        assert_eq!(small.checked_sub(big), None);
    }

    #[test]
    fn test_checked_mul() {
        let per_correct = TokenAmount::from_tokens(2);
        assert_eq!(
            per_correct.checked_mul(10),
            Some(TokenAmount::from_tokens(20))
        );
        assert_eq!(TokenAmount::from_base_units(u128::MAX).checked_mul(2), None);
    }

    #[test]
    fn test_display_trims_fraction() {
        assert_eq!(TokenAmount::from_tokens(100).to_string(), "100");
        assert_eq!(
            TokenAmount::from_base_units(4 * ONE_TOKEN + ONE_TOKEN / 2).to_string(),
            "4.5"
        );
        assert_eq!(TokenAmount::ZERO.to_string(), "0");
    }

    #[test]
    fn test_base_units_string_roundtrip() {
        let amount = TokenAmount::from_base_units(123_456_789);
        let s = amount.base_units().to_string();
        assert_eq!(TokenAmount::from_base_units_str(&s).unwrap(), amount);

        assert!(TokenAmount::from_base_units_str("not a number").is_err());
        assert!(TokenAmount::from_base_units_str("-5").is_err());
    }

    #[test]
    fn test_from_hex_quantity() {
        assert_eq!(
            TokenAmount::from_hex_quantity("0xde0b6b3a7640000").unwrap(),
            TokenAmount::from_tokens(1)
        );
        assert_eq!(
            TokenAmount::from_hex_quantity("0x0").unwrap(),
            TokenAmount::ZERO
        );
        assert!(TokenAmount::from_hex_quantity("1234").is_err());
        assert!(TokenAmount::from_hex_quantity("0x").is_err());
        assert!(TokenAmount::from_hex_quantity("0xzz").is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(TokenAmount::from_tokens(100) < TokenAmount::from_tokens(500));
        assert!(TokenAmount::ZERO < TokenAmount::from_base_units(1));
    }

    #[test]
    fn test_sum() {
        let total: TokenAmount = [
            TokenAmount::from_tokens(4),
            TokenAmount::from_tokens(8),
            TokenAmount::from_tokens(12),
        ]
        .into_iter()
        .sum();
        assert_eq!(total, TokenAmount::from_tokens(24));
    }
}
