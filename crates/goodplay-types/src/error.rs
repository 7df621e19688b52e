//! Parse errors for core types.

use thiserror::Error;

/// Errors raised when parsing core identifiers and amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Not a valid 20-byte hex address.
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    /// Not a valid 32-byte hex transaction hash.
    #[error("invalid transaction hash: {0}")]
    InvalidTxHash(String),

    /// Not a parseable token amount.
    #[error("invalid token amount: {0}")]
    InvalidAmount(String),

    /// Not a valid hex quantity (e.g. from an RPC response).
    #[error("invalid hex quantity: {0}")]
    InvalidHexQuantity(String),

    /// Not a valid ISO calendar day.
    #[error("invalid day: {0}")]
    InvalidDay(String),

    /// Unknown game kind string.
    #[error("unknown game kind: {0}")]
    UnknownGameKind(String),

    /// Unknown session status string.
    #[error("unknown session status: {0}")]
    UnknownStatus(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TypeError::InvalidAddress("0xzz".to_string());
        assert_eq!(err.to_string(), "invalid wallet address: 0xzz");

        let err = TypeError::UnknownGameKind("roulette".to_string());
        assert!(err.to_string().contains("roulette"));
    }
}
