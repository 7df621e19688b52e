//! Error types for the settlement boundary.

use goodplay_types::TokenAmount;
use thiserror::Error;

/// Result type alias for settlement operations.
pub type SettleResult<T> = Result<T, SettleError>;

/// Errors that can occur at the chain boundary.
///
/// Retryability is explicit: only [`ChainUnavailable`](Self::ChainUnavailable)
/// and [`Timeout`](Self::Timeout) are safe for a caller to retry, and even
/// then a timed-out *disbursement* must never be re-sent blindly — the
/// transfer may have landed after the caller stopped waiting. Use the
/// correlation id to reconcile instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettleError {
    /// The chain endpoint cannot be reached. Retryable; never means
    /// "zero results".
    #[error("chain endpoint unavailable: {0}")]
    ChainUnavailable(String),

    /// Batch rejected before any chain interaction.
    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    /// The paying account cannot cover the requested amount.
    #[error("insufficient treasury funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Observed treasury balance.
        have: TokenAmount,
        /// Requested disbursement total.
        need: TokenAmount,
    },

    /// Confirmation wait expired. The transaction may still land on-chain.
    #[error("confirmation timed out: {0}")]
    Timeout(String),

    /// The transaction was included but reverted.
    #[error("transaction reverted: {0}")]
    Reverted(String),

    /// Failure that could not be classified.
    #[error("unclassified chain failure: {0}")]
    Unknown(String),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A recipient or contract address failed validation.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl SettleError {
    /// Create a new ChainUnavailable error.
    pub fn chain_unavailable(msg: impl Into<String>) -> Self {
        Self::ChainUnavailable(msg.into())
    }

    /// Create a new InvalidBatch error.
    pub fn invalid_batch(msg: impl Into<String>) -> Self {
        Self::InvalidBatch(msg.into())
    }

    /// Create a new Timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new Reverted error.
    pub fn reverted(msg: impl Into<String>) -> Self {
        Self::Reverted(msg.into())
    }

    /// Create a new Unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Create a new Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True if a caller may retry the same *read* operation.
    ///
    /// Submissions are excluded from blind retry even when retryable-looking:
    /// the same semantic transfer must go through correlation-id
    /// reconciliation instead.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ChainUnavailable(_) | Self::Timeout(_))
    }
}
