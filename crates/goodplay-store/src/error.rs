//! Error types for the storage layer.

use goodplay_types::{SessionId, TokenAmount, TxHash};
use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error while opening or preparing the database file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error (outcome payloads).
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A balance mutation would take the available balance below zero.
    /// The mutation is discarded wholesale, never clamped.
    #[error("balance mutation rejected: have {have}, need {need}")]
    NegativeBalance {
        /// Available balance after credits.
        have: TokenAmount,
        /// Requested debit.
        need: TokenAmount,
    },

    /// A deposit with this transaction hash is already recorded.
    #[error("deposit already recorded: {0}")]
    DuplicateDeposit(TxHash),

    /// No session exists under this identifier.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// Stored data failed to parse back into its domain type.
    #[error("invalid stored data: {0}")]
    InvalidData(String),

    /// Schema initialization error.
    #[error("schema error: {0}")]
    Schema(String),

    /// A connection lock was poisoned by a panicking thread.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StoreError {
    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        StoreError::InvalidData(msg.into())
    }

    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        StoreError::Schema(msg.into())
    }

    /// Create a lock poisoned error.
    pub fn lock_poisoned(msg: impl Into<String>) -> Self {
        StoreError::LockPoisoned(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goodplay_types::TokenAmount;

    #[test]
    fn test_negative_balance_display() {
        let err = StoreError::NegativeBalance {
            have: TokenAmount::from_tokens(100),
            need: TokenAmount::from_tokens(300),
        };
        assert_eq!(
            err.to_string(),
            "balance mutation rejected: have 100, need 300"
        );
    }

    #[test]
    fn test_duplicate_deposit_display() {
        let tx = TxHash::parse(&format!("0x{}", "ab".repeat(32))).unwrap();
        let err = StoreError::DuplicateDeposit(tx);
        assert!(err.to_string().contains("already recorded"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let store_err: StoreError = io_err.into();
        assert!(matches!(store_err, StoreError::Io(_)));
    }
}
