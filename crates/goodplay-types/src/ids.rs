//! Identifier newtypes.

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// An on-chain account address identifying a user's wallet.
///
/// Normalized to lowercase `0x` + 40 hex characters at construction, so that
/// equality and storage lookups never depend on checksum casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse and normalize an address.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| TypeError::InvalidAddress(s.to_string()))?;
        if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidAddress(s.to_string()));
        }
        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// The normalized `0x`-prefixed address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 40 hex characters without the `0x` prefix.
    pub fn hex_digits(&self) -> &str {
        &self.0[2..]
    }

    /// Abbreviated form for logs: `0x1234..abcd`.
    ///
    /// Full addresses never appear in log output.
    pub fn masked(&self) -> String {
        format!("{}..{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for WalletAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// An on-chain transaction hash.
///
/// The deduplication key for deposits: one [`crate::DepositRecord`] may ever
/// exist per hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(String);

impl TxHash {
    /// Parse and normalize a transaction hash.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| TypeError::InvalidTxHash(s.to_string()))?;
        if digits.len() != 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidTxHash(s.to_string()));
        }
        Ok(Self(format!("0x{}", digits.to_ascii_lowercase())))
    }

    /// The normalized `0x`-prefixed hash string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for logs: first 10 characters.
    pub fn short(&self) -> &str {
        &self.0[..10]
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TxHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Opaque identifier of a single game play session, e.g. `GAME-1A2B3C4D`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier attached to a disbursement attempt.
///
/// Recorded on-chain alongside the transfer so a reconciliation job can match
/// an attempt against chain history after the fact — the guard against a
/// literal double-send when a confirmation wait times out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&SessionId> for CorrelationId {
    /// Reward disbursements correlate by their session identifier.
    fn from(id: &SessionId) -> Self {
        Self(id.as_str().to_string())
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
