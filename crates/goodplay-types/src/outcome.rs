//! Raw game outcomes as reported by clients.
//!
//! One tagged variant per game kind. The engine never trusts a reported
//! reward magnitude: the server re-derives the reward from these fields and
//! clamps it, so a client can shrink its own payout but never inflate it.

use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::enums::GameKind;

/// The raw outcome payload of a finished play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameOutcome {
    /// Crash game: the multiplier the player cashed out at, in basis points
    /// (e.g. 2.30x = 230 bps-of-hundredths = `230`), plus the payout the
    /// client believes it earned.
    #[serde(rename = "crash_game")]
    Crash {
        /// Achieved multiplier in hundredths (169 = 1.69x).
        multiplier_hundredths: u32,
        /// Client-claimed payout; clamped server-side to the tier ceiling.
        #[serde(with = "crate::amount::token_str")]
        claimed_payout: TokenAmount,
    },
    /// Trivia quiz: number of correctly answered questions.
    #[serde(rename = "quiz_trivia")]
    Quiz {
        /// Correct answers out of the round's question set.
        correct_answers: u32,
    },
    /// Catch game: number of tokens caught.
    #[serde(rename = "catch_dollar")]
    Catch {
        /// Tokens caught during the round.
        caught: u32,
    },
    /// Memory game: number of matched pairs.
    #[serde(rename = "memory_card")]
    Memory {
        /// Matched pairs.
        matches: u32,
    },
    /// Spin wheel: the prize the wheel landed on.
    #[serde(rename = "spin_wheel")]
    Spin {
        /// Prize shown by the wheel; clamped server-side to the wheel maximum.
        #[serde(with = "crate::amount::token_str")]
        prize: TokenAmount,
    },
}

impl GameOutcome {
    /// The game kind this outcome belongs to.
    pub fn kind(&self) -> GameKind {
        match self {
            Self::Crash { .. } => GameKind::CrashGame,
            Self::Quiz { .. } => GameKind::QuizTrivia,
            Self::Catch { .. } => GameKind::CatchDollar,
            Self::Memory { .. } => GameKind::MemoryCard,
            Self::Spin { .. } => GameKind::SpinWheel,
        }
    }

    /// A scalar score for statistics, independent of reward computation.
    pub fn score(&self) -> u64 {
        match self {
            Self::Crash {
                multiplier_hundredths,
                ..
            } => *multiplier_hundredths as u64,
            Self::Quiz { correct_answers } => *correct_answers as u64,
            Self::Catch { caught } => *caught as u64,
            Self::Memory { matches } => *matches as u64,
            Self::Spin { prize } => prize.whole_tokens() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let outcome = GameOutcome::Crash {
            multiplier_hundredths: 230,
            claimed_payout: TokenAmount::from_tokens(8),
        };
        assert_eq!(outcome.kind(), GameKind::CrashGame);
        assert_eq!(outcome.score(), 230);

        let outcome = GameOutcome::Quiz { correct_answers: 7 };
        assert_eq!(outcome.kind(), GameKind::QuizTrivia);
        assert_eq!(outcome.score(), 7);
    }

    #[test]
    fn test_serde_tag_matches_game_kind() {
        let outcome = GameOutcome::Crash {
            multiplier_hundredths: 169,
            claimed_payout: TokenAmount::from_tokens(4),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"game\":\"crash_game\""));

        let back: GameOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outcome);
    }

    #[test]
    fn test_rejects_unknown_game_tag() {
        let json = r#"{"game":"roulette","bet":10}"#;
        assert!(serde_json::from_str::<GameOutcome>(json).is_err());
    }
}
