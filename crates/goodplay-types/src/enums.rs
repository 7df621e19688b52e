//! Game kinds, session states, and disbursement models.

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The games that can produce rewards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Multiplier crash game; winnings accrue to the internal balance.
    CrashGame,
    /// Multiple-choice trivia quiz; rewards pay out on-chain per play.
    QuizTrivia,
    /// Arcade catch game.
    CatchDollar,
    /// Card-matching memory game.
    MemoryCard,
    /// Prize wheel.
    SpinWheel,
}

impl GameKind {
    /// Stable string form used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrashGame => "crash_game",
            Self::QuizTrivia => "quiz_trivia",
            Self::CatchDollar => "catch_dollar",
            Self::MemoryCard => "memory_card",
            Self::SpinWheel => "spin_wheel",
        }
    }

    /// All known game kinds.
    pub const ALL: [GameKind; 5] = [
        Self::CrashGame,
        Self::QuizTrivia,
        Self::CatchDollar,
        Self::MemoryCard,
        Self::SpinWheel,
    ];
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for GameKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crash_game" => Ok(Self::CrashGame),
            "quiz_trivia" => Ok(Self::QuizTrivia),
            "catch_dollar" => Ok(Self::CatchDollar),
            "memory_card" => Ok(Self::MemoryCard),
            "spin_wheel" => Ok(Self::SpinWheel),
            other => Err(TypeError::UnknownGameKind(other.to_string())),
        }
    }
}

/// Lifecycle state of a game session.
///
/// The only transition is `InProgress -> Completed`; completion is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session started, outcome not yet reported.
    InProgress,
    /// Session finished and reward persisted.
    Completed,
}

impl SessionStatus {
    /// Stable string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// True if the session can still be completed.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(TypeError::UnknownStatus(other.to_string())),
        }
    }
}

/// How a game kind settles its rewards.
///
/// Two models coexist deliberately: frequent small crash-game payouts accrue
/// to the internal ledger and leave the chain alone until withdrawal, while
/// the arcade/quiz games pay out on-chain immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisbursementModel {
    /// Credit the internal balance ledger; paid out later via withdrawal.
    LedgerCredit,
    /// Transfer tokens on-chain as part of session completion.
    DirectPayout,
}
