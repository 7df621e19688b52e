//! Error types for engine operations.

use goodplay_rewards::RewardError;
use goodplay_settle::SettleError;
use goodplay_store::StoreError;
use goodplay_types::{GameKind, SessionId, TokenAmount};
use thiserror::Error;

/// Result type alias for engine operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Errors returned by engine operations.
///
/// Every variant states (through [`balance_unchanged`](Self::balance_unchanged))
/// whether the caller's balance was affected, so a presentation layer can
/// always tell the user "funds are safe, retry" when that is true.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Chain boundary failure outside a disbursement (scans, balance reads).
    #[error(transparent)]
    Settle(#[from] SettleError),

    /// Reward computation or validation failure.
    #[error(transparent)]
    Reward(#[from] RewardError),

    /// No session exists under this identifier.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session was already completed; the duplicate request changed
    /// nothing.
    #[error("session already completed: {0}")]
    AlreadyCompleted(SessionId),

    /// The reported outcome belongs to a different game than the session.
    #[error("outcome is for {got}, session is {expected}")]
    OutcomeMismatch {
        /// Game kind the session was started for.
        expected: GameKind,
        /// Game kind the outcome claims.
        got: GameKind,
    },

    /// The per-day play cap for this game is already met.
    #[error("daily limit reached for {kind}: {plays} of {cap} plays used, come back tomorrow")]
    DailyLimitExceeded {
        /// Game kind being limited.
        kind: GameKind,
        /// Plays already counted today.
        plays: u32,
        /// Configured daily cap.
        cap: u32,
    },

    /// Available balance is under the withdrawal floor.
    #[error("balance {amount} is below the withdrawal minimum of {minimum}, keep playing")]
    BelowMinimum {
        /// Current available balance.
        amount: TokenAmount,
        /// Configured minimum.
        minimum: TokenAmount,
    },

    /// Available balance exceeds the withdrawal ceiling.
    #[error("balance {amount} exceeds the withdrawal maximum of {maximum}, contact support")]
    AboveMaximum {
        /// Current available balance.
        amount: TokenAmount,
        /// Configured maximum.
        maximum: TokenAmount,
    },

    /// The withdrawal disbursement did not confirm. The balance was not
    /// touched; retrying is safe.
    #[error("withdrawal failed, balance unchanged and safe to retry: {source}")]
    WithdrawalFailed {
        /// Underlying settlement failure.
        source: SettleError,
    },

    /// A direct reward payout did not confirm. The session stays completed;
    /// the correlation id is retained for reconciliation against the chain.
    #[error("reward disbursement failed for session {session_id}: {source}")]
    DisbursementFailed {
        /// Session whose reward did not pay out.
        session_id: SessionId,
        /// Underlying settlement failure.
        source: SettleError,
    },
}

impl OpsError {
    /// True if this failure is guaranteed to have left the internal balance
    /// untouched.
    pub fn balance_unchanged(&self) -> bool {
        match self {
            Self::Store(StoreError::NegativeBalance { .. }) => true,
            Self::Store(_) => false,
            Self::Settle(_) => true,
            Self::Reward(_) => true,
            Self::SessionNotFound(_) => true,
            Self::AlreadyCompleted(_) => true,
            Self::OutcomeMismatch { .. } => true,
            Self::DailyLimitExceeded { .. } => true,
            Self::BelowMinimum { .. } => true,
            Self::AboveMaximum { .. } => true,
            Self::WithdrawalFailed { .. } => true,
            Self::DisbursementFailed { .. } => true,
        }
    }

    /// True if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Settle(e) => e.is_retryable(),
            Self::WithdrawalFailed { source } => source.is_retryable(),
            _ => false,
        }
    }
}
