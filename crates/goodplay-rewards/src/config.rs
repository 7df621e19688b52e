//! Economic configuration: payout tables, bet bounds, deposit and
//! withdrawal limits, daily play caps.
//!
//! Defaults reproduce the production values; deployments override them from
//! their config file.

use serde::{Deserialize, Serialize};

use goodplay_types::constants::{
    CRASH_PLAYS_PER_DAY, DEFAULT_PLAYS_PER_DAY, MAX_DEPOSIT_TOKENS, MAX_WITHDRAWAL_TOKENS,
    MIN_DEPOSIT_TOKENS, MIN_WITHDRAWAL_TOKENS,
};
use goodplay_types::{GameKind, TokenAmount};

/// One payout tier of the crash game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTier {
    /// Lowest multiplier (in hundredths) that reaches this tier.
    pub min_multiplier_hundredths: u32,
    /// Payout ceiling for the tier.
    pub payout: TokenAmount,
}

/// Crash game configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashConfig {
    /// Minimum bet when a stake is placed (zero stake plays are free).
    pub min_bet: TokenAmount,
    /// Maximum bet.
    pub max_bet: TokenAmount,
    /// Payout tiers, highest multiplier first.
    pub tiers: Vec<RewardTier>,
}

impl Default for CrashConfig {
    fn default() -> Self {
        Self {
            min_bet: TokenAmount::from_tokens(10),
            max_bet: TokenAmount::from_tokens(250),
            // 1.1x-1.9x -> 4, 2x-2.9x -> 8, 3x-3.9x -> 12, 4x-4.9x -> 16, >=5x -> 20
            tiers: vec![
                RewardTier {
                    min_multiplier_hundredths: 500,
                    payout: TokenAmount::from_tokens(20),
                },
                RewardTier {
                    min_multiplier_hundredths: 400,
                    payout: TokenAmount::from_tokens(16),
                },
                RewardTier {
                    min_multiplier_hundredths: 300,
                    payout: TokenAmount::from_tokens(12),
                },
                RewardTier {
                    min_multiplier_hundredths: 200,
                    payout: TokenAmount::from_tokens(8),
                },
                RewardTier {
                    min_multiplier_hundredths: 110,
                    payout: TokenAmount::from_tokens(4),
                },
            ],
        }
    }
}

/// Full reward configuration across game kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Crash game tiers and bet bounds.
    pub crash: CrashConfig,
    /// Reward per correct quiz answer.
    pub quiz_reward_per_correct: TokenAmount,
    /// Questions per quiz round; bounds the plausible correct count.
    pub quiz_questions_per_round: u32,
    /// Reward per token caught.
    pub catch_reward_per_unit: TokenAmount,
    /// Maximum catchable tokens per round.
    pub catch_max_per_round: u32,
    /// Reward per matched pair.
    pub memory_reward_per_match: TokenAmount,
    /// Pairs on the board; bounds the plausible match count.
    pub memory_max_matches: u32,
    /// Largest prize the wheel can land on.
    pub spin_max_prize: TokenAmount,
    /// Daily play cap for the crash game.
    pub crash_plays_per_day: u32,
    /// Daily play cap for every other game.
    pub default_plays_per_day: u32,
}

impl RewardConfig {
    /// Daily play cap for a game kind.
    pub fn plays_per_day(&self, kind: GameKind) -> u32 {
        match kind {
            GameKind::CrashGame => self.crash_plays_per_day,
            _ => self.default_plays_per_day,
        }
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            crash: CrashConfig::default(),
            quiz_reward_per_correct: TokenAmount::from_tokens(2),
            quiz_questions_per_round: 10,
            catch_reward_per_unit: TokenAmount::from_tokens(1),
            catch_max_per_round: 30,
            memory_reward_per_match: TokenAmount::from_tokens(1),
            memory_max_matches: 12,
            spin_max_prize: TokenAmount::from_tokens(20),
            crash_plays_per_day: CRASH_PLAYS_PER_DAY,
            default_plays_per_day: DEFAULT_PLAYS_PER_DAY,
        }
    }
}

/// Accepted range for a single verified deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositBounds {
    /// Smallest deposit that is credited.
    pub min: TokenAmount,
    /// Largest deposit that is credited.
    pub max: TokenAmount,
}

impl DepositBounds {
    /// True if the amount lies within `[min, max]`.
    pub fn contains(&self, amount: TokenAmount) -> bool {
        amount >= self.min && amount <= self.max
    }
}

impl Default for DepositBounds {
    fn default() -> Self {
        Self {
            min: TokenAmount::from_tokens(MIN_DEPOSIT_TOKENS),
            max: TokenAmount::from_tokens(MAX_DEPOSIT_TOKENS),
        }
    }
}

/// Accepted range for a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalBounds {
    /// Floor below which a withdrawal is refused.
    pub min: TokenAmount,
    /// Ceiling above which a withdrawal is routed to manual handling.
    pub max: TokenAmount,
}

impl Default for WithdrawalBounds {
    fn default() -> Self {
        Self {
            min: TokenAmount::from_tokens(MIN_WITHDRAWAL_TOKENS),
            max: TokenAmount::from_tokens(MAX_WITHDRAWAL_TOKENS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers_are_descending() {
        let config = CrashConfig::default();
        for pair in config.tiers.windows(2) {
            assert!(pair[0].min_multiplier_hundredths > pair[1].min_multiplier_hundredths);
            assert!(pair[0].payout > pair[1].payout);
        }
    }

    #[test]
    fn test_deposit_bounds_contains() {
        let bounds = DepositBounds::default();
        assert!(bounds.contains(TokenAmount::from_tokens(100)));
        assert!(bounds.contains(TokenAmount::from_tokens(500)));
        assert!(!bounds.contains(TokenAmount::from_tokens(99)));
        assert!(!bounds.contains(TokenAmount::from_tokens(501)));
    }

    #[test]
    fn test_plays_per_day_by_kind() {
        let config = RewardConfig::default();
        assert_eq!(config.plays_per_day(GameKind::CrashGame), 20);
        assert_eq!(config.plays_per_day(GameKind::QuizTrivia), 10);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = RewardConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: RewardConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
