//! Reward computation and economic rules for the GoodPlay engine.
//!
//! Pure functions only — no I/O, no clocks, no randomness. The session state
//! machine feeds a raw [`GameOutcome`](goodplay_types::GameOutcome) through
//! [`compute_reward`] and persists whatever comes back; nothing else in the
//! system is allowed to decide a reward magnitude.
//!
//! # Clamping
//!
//! Client-reported quantities are treated as claims, not facts. The crash
//! game maps the achieved multiplier onto a fixed payout tier table and caps
//! the claimed payout at the tier ceiling, so an outcome reporting a 2.3x
//! multiplier can never earn more than the 2x-tier amount. The spin wheel
//! prize is capped at the configured wheel maximum. Count-based games (quiz,
//! catch, memory) multiply a server-side per-unit rate, bounded by the
//! per-round unit caps.
//!
//! # Disbursement models
//!
//! [`disbursement_model`] is the single place that decides whether a game
//! kind credits the internal ledger or pays out on-chain directly.

pub mod compute;
pub mod config;
pub mod error;

pub use compute::{compute_reward, crash_tier_ceiling, disbursement_model, validate_stake};
pub use config::{CrashConfig, DepositBounds, RewardConfig, RewardTier, WithdrawalBounds};
pub use error::{RewardError, RewardResult};

#[cfg(test)]
mod tests {
    use super::*;
    use goodplay_types::{DisbursementModel, GameKind, GameOutcome, TokenAmount};

    /// The full path a crash outcome takes: tier lookup, clamp, model select.
    #[test]
    fn test_crash_reward_flow() {
        let config = RewardConfig::default();

        // 2.3x claims the 3x payout; it gets the 2x ceiling instead.
        let outcome = GameOutcome::Crash {
            multiplier_hundredths: 230,
            claimed_payout: TokenAmount::from_tokens(12),
        };
        let reward = compute_reward(&outcome, &config).unwrap();
        assert_eq!(reward, TokenAmount::from_tokens(8));

        assert_eq!(
            disbursement_model(GameKind::CrashGame),
            DisbursementModel::LedgerCredit
        );
    }

    #[test]
    fn test_direct_payout_games_use_direct_model() {
        for kind in [
            GameKind::QuizTrivia,
            GameKind::CatchDollar,
            GameKind::MemoryCard,
            GameKind::SpinWheel,
        ] {
            assert_eq!(disbursement_model(kind), DisbursementModel::DirectPayout);
        }
    }
}
