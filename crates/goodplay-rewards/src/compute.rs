//! Server-side reward derivation.

use goodplay_types::{DisbursementModel, GameKind, GameOutcome, TokenAmount};

use crate::config::{CrashConfig, RewardConfig};
use crate::error::{RewardError, RewardResult};

/// Which settlement path a game kind's rewards take.
pub fn disbursement_model(kind: GameKind) -> DisbursementModel {
    match kind {
        GameKind::CrashGame => DisbursementModel::LedgerCredit,
        GameKind::QuizTrivia
        | GameKind::CatchDollar
        | GameKind::MemoryCard
        | GameKind::SpinWheel => DisbursementModel::DirectPayout,
    }
}

/// The payout ceiling for an achieved crash multiplier.
///
/// Monotone step function over the tier table: the highest tier whose
/// threshold the multiplier reaches wins; below the lowest tier the ceiling
/// is zero (the round crashed before the minimum cash-out).
pub fn crash_tier_ceiling(multiplier_hundredths: u32, config: &CrashConfig) -> TokenAmount {
    config
        .tiers
        .iter()
        .find(|tier| multiplier_hundredths >= tier.min_multiplier_hundredths)
        .map(|tier| tier.payout)
        .unwrap_or(TokenAmount::ZERO)
}

/// Derive the reward for a raw outcome.
///
/// Client-reported magnitudes are claims: the crash payout is capped at the
/// tier ceiling for the achieved multiplier, the wheel prize at the wheel
/// maximum, and unit counts at the per-round maxima. A claim below the
/// ceiling is honored as-is (a player may cash out early).
pub fn compute_reward(outcome: &GameOutcome, config: &RewardConfig) -> RewardResult<TokenAmount> {
    match outcome {
        GameOutcome::Crash {
            multiplier_hundredths,
            claimed_payout,
        } => {
            let ceiling = crash_tier_ceiling(*multiplier_hundredths, &config.crash);
            Ok((*claimed_payout).min(ceiling))
        }
        GameOutcome::Quiz { correct_answers } => {
            if *correct_answers > config.quiz_questions_per_round {
                return Err(RewardError::ImplausibleOutcome {
                    reported: *correct_answers,
                    max: config.quiz_questions_per_round,
                    unit: "correct answers",
                });
            }
            config
                .quiz_reward_per_correct
                .checked_mul(*correct_answers as u64)
                .ok_or(RewardError::Overflow)
        }
        GameOutcome::Catch { caught } => {
            if *caught > config.catch_max_per_round {
                return Err(RewardError::ImplausibleOutcome {
                    reported: *caught,
                    max: config.catch_max_per_round,
                    unit: "caught tokens",
                });
            }
            config
                .catch_reward_per_unit
                .checked_mul(*caught as u64)
                .ok_or(RewardError::Overflow)
        }
        GameOutcome::Memory { matches } => {
            if *matches > config.memory_max_matches {
                return Err(RewardError::ImplausibleOutcome {
                    reported: *matches,
                    max: config.memory_max_matches,
                    unit: "matched pairs",
                });
            }
            config
                .memory_reward_per_match
                .checked_mul(*matches as u64)
                .ok_or(RewardError::Overflow)
        }
        GameOutcome::Spin { prize } => Ok((*prize).min(config.spin_max_prize)),
    }
}

/// Validate a stake for a session start.
///
/// Only the crash game accepts a stake; zero means a free play, otherwise
/// the stake must lie within the configured bet bounds.
pub fn validate_stake(
    kind: GameKind,
    stake: TokenAmount,
    config: &RewardConfig,
) -> RewardResult<()> {
    if stake.is_zero() {
        return Ok(());
    }
    match kind {
        GameKind::CrashGame => {
            if stake < config.crash.min_bet || stake > config.crash.max_bet {
                return Err(RewardError::StakeOutOfBounds {
                    kind,
                    stake,
                    min: config.crash.min_bet,
                    max: config.crash.max_bet,
                });
            }
            Ok(())
        }
        other => Err(RewardError::StakeNotAccepted(other)),
    }
}
