//! Persisted entities of the balance ledger and game engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::TokenAmount;
use crate::enums::{GameKind, SessionStatus};
use crate::error::TypeError;
use crate::ids::{CorrelationId, SessionId, TxHash, WalletAddress};
use crate::outcome::GameOutcome;

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// A UTC calendar day, used to key daily play limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DayStamp(NaiveDate);

impl DayStamp {
    /// Today's UTC calendar day.
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }

    /// The UTC day containing the given millisecond timestamp.
    pub fn from_timestamp(ts: Timestamp) -> Self {
        let secs = (ts / 1000) as i64;
        let dt = DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default();
        Self(dt.date_naive())
    }

    /// Parse from an ISO `YYYY-MM-DD` string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| TypeError::InvalidDay(s.to_string()))
    }

    /// The day after this one.
    pub fn next(&self) -> Self {
        Self(self.0.succ_opt().unwrap_or(self.0))
    }
}

impl std::fmt::Display for DayStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// The authoritative balance record for one wallet.
///
/// Invariant: `available == total_earned - total_withdrawn` at every
/// externally observable instant. Only the ledger's apply-delta operation
/// writes this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBalance {
    /// Owning wallet.
    pub wallet: WalletAddress,
    /// Spendable balance.
    pub available: TokenAmount,
    /// Lifetime credits; monotonically non-decreasing.
    pub total_earned: TokenAmount,
    /// Lifetime withdrawals; monotonically non-decreasing.
    pub total_withdrawn: TokenAmount,
    /// Day of the most recent verified deposit, if any.
    pub last_deposit_day: Option<DayStamp>,
}

impl UserBalance {
    /// The zero balance a wallet has before its first credit.
    pub fn empty(wallet: WalletAddress) -> Self {
        Self {
            wallet,
            available: TokenAmount::ZERO,
            total_earned: TokenAmount::ZERO,
            total_withdrawn: TokenAmount::ZERO,
            last_deposit_day: None,
        }
    }

    /// Check the ledger invariant `available == earned - withdrawn`.
    pub fn invariant_holds(&self) -> bool {
        self.total_earned.checked_sub(self.total_withdrawn) == Some(self.available)
    }
}

/// One verified on-chain deposit. Immutable once created; the transaction
/// hash is the deduplication key preventing double-credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    /// Depositing wallet.
    pub wallet: WalletAddress,
    /// Verified transfer amount.
    pub amount: TokenAmount,
    /// On-chain transaction hash (unique).
    pub tx_hash: TxHash,
    /// Block the transfer was observed in.
    pub block_number: u64,
    /// When the reconciler verified the deposit.
    pub observed_at: Timestamp,
}

/// One play of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    /// Unique session identifier.
    pub id: SessionId,
    /// Playing wallet.
    pub wallet: WalletAddress,
    /// Which game is being played.
    pub kind: GameKind,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// Stake placed at start (zero for free games).
    pub stake: TokenAmount,
    /// Session start time.
    pub started_at: Timestamp,
    /// Completion time, once terminal.
    pub completed_at: Option<Timestamp>,
    /// Raw outcome reported at completion.
    pub outcome: Option<GameOutcome>,
    /// Server-computed reward, once terminal.
    pub reward: Option<TokenAmount>,
}

impl GameSession {
    /// Create a fresh in-progress session.
    pub fn started(
        id: SessionId,
        wallet: WalletAddress,
        kind: GameKind,
        stake: TokenAmount,
        started_at: Timestamp,
    ) -> Self {
        Self {
            id,
            wallet,
            kind,
            status: SessionStatus::InProgress,
            stake,
            started_at,
            completed_at: None,
            outcome: None,
            reward: None,
        }
    }
}

/// Play counter for one (wallet, game kind, day).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLimitCounter {
    /// Playing wallet.
    pub wallet: WalletAddress,
    /// Game being counted.
    pub kind: GameKind,
    /// UTC day the counter covers.
    pub day: DayStamp,
    /// Completed plays so far today.
    pub plays_today: u32,
    /// Rewards earned so far today.
    pub earned_today: TokenAmount,
}

impl DailyLimitCounter {
    /// The zero counter for a day with no plays yet.
    pub fn zero(wallet: WalletAddress, kind: GameKind, day: DayStamp) -> Self {
        Self {
            wallet,
            kind,
            day,
            plays_today: 0,
            earned_today: TokenAmount::ZERO,
        }
    }
}

/// One successful withdrawal. Created only after on-chain confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRecord {
    /// Withdrawing wallet.
    pub wallet: WalletAddress,
    /// Amount sent on-chain.
    pub amount: TokenAmount,
    /// Confirmed transaction hash.
    pub tx_hash: TxHash,
    /// Correlation id the disbursement was tagged with.
    pub correlation_id: CorrelationId,
    /// UTC day of the withdrawal.
    pub day: DayStamp,
    /// When the withdrawal completed.
    pub created_at: Timestamp,
}

/// Aggregate play statistics per (wallet, game kind).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    /// Playing wallet.
    pub wallet: WalletAddress,
    /// Game the statistics cover.
    pub kind: GameKind,
    /// Lifetime completed plays.
    pub total_plays: u64,
    /// Sum of per-session scores.
    pub total_score: u64,
    /// Best single-session score.
    pub highest_score: u64,
    /// Lifetime rewards from this game.
    pub total_earned: TokenAmount,
    /// Timestamp of the most recent completed play.
    pub last_played: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0xff00a683f7bd77665754a65f2b82fdefc4371a50").unwrap()
    }

    #[test]
    fn test_day_stamp_from_timestamp() {
        // 2024-01-15T12:00:00Z in milliseconds
        let ts = 1_705_320_000_000u64;
        let day = DayStamp::from_timestamp(ts);
        assert_eq!(day.to_string(), "2024-01-15");
    }

    #[test]
    fn test_day_stamp_parse_roundtrip() {
        let day = DayStamp::parse("2024-02-29").unwrap();
        assert_eq!(day.to_string(), "2024-02-29");
        assert_eq!(day.next().to_string(), "2024-03-01");
        assert!(DayStamp::parse("yesterday").is_err());
    }

    #[test]
    fn test_empty_balance_invariant() {
        let balance = UserBalance::empty(wallet());
        assert!(balance.invariant_holds());
        assert!(balance.available.is_zero());
    }

    #[test]
    fn test_invariant_detects_drift() {
        let mut balance = UserBalance::empty(wallet());
        balance.total_earned = TokenAmount::from_tokens(100);
        balance.available = TokenAmount::from_tokens(100);
        assert!(balance.invariant_holds());

        balance.available = TokenAmount::from_tokens(99);
        assert!(!balance.invariant_holds());
    }

    #[test]
    fn test_started_session_is_in_progress() {
        let session = GameSession::started(
            SessionId::new("GAME-00000001"),
            wallet(),
            GameKind::CrashGame,
            TokenAmount::ZERO,
            1_705_320_000_000,
        );
        assert!(session.status.is_in_progress());
        assert!(session.completed_at.is_none());
        assert!(session.reward.is_none());
    }
}
