//! Error types for reward computation.

use goodplay_types::{GameKind, TokenAmount};
use thiserror::Error;

/// Result type alias for reward operations.
pub type RewardResult<T> = Result<T, RewardError>;

/// Errors that can occur while validating or computing rewards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    /// Stake outside the configured bet bounds for the game.
    #[error("stake {stake} outside allowed range [{min}, {max}] for {kind}")]
    StakeOutOfBounds {
        /// Game being staked on.
        kind: GameKind,
        /// Offered stake.
        stake: TokenAmount,
        /// Minimum allowed bet.
        min: TokenAmount,
        /// Maximum allowed bet.
        max: TokenAmount,
    },

    /// Game does not accept a stake at all.
    #[error("{0} does not accept a stake")]
    StakeNotAccepted(GameKind),

    /// Outcome counts exceed what a single round can produce.
    #[error("outcome reports {reported} {unit}, round maximum is {max}")]
    ImplausibleOutcome {
        /// Reported unit count.
        reported: u32,
        /// Maximum plausible count per round.
        max: u32,
        /// What is being counted.
        unit: &'static str,
    },

    /// Arithmetic overflow while computing a reward.
    #[error("reward computation overflowed")]
    Overflow,
}
