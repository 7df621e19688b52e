//! Storage trait definitions.
//!
//! All storage components are defined as traits so the engine can be tested
//! against alternative implementations. The default implementations use
//! SQLite behind a shared connection.

use std::collections::HashSet;

use goodplay_types::{
    DailyLimitCounter, DayStamp, DepositRecord, GameKind, GameOutcome, GameSession, GameStats,
    SessionId, Timestamp, TokenAmount, TxHash, UserBalance, WalletAddress, WithdrawalRecord,
};

use crate::error::Result;

/// The authoritative balance record, and the only writer of it.
///
/// Every balance change in the system funnels through [`apply_delta`] (or
/// [`credit_deposit`], which composes it with deposit dedup in one
/// transaction); no component computes a new balance value independently.
///
/// [`apply_delta`]: BalanceStore::apply_delta
/// [`credit_deposit`]: BalanceStore::credit_deposit
pub trait BalanceStore {
    /// Read the balance for a wallet. Returns the zero balance for wallets
    /// that have never been credited.
    fn read(&self, wallet: &WalletAddress) -> Result<UserBalance>;

    /// Atomically apply earned/withdrawn deltas to a wallet's balance.
    ///
    /// Runs as a single read-modify-write transaction that enforces
    /// `available >= 0`; on violation the whole mutation is discarded and
    /// `NegativeBalance` is returned. Concurrent deltas for one wallet
    /// serialize on the transaction, so no update can be lost.
    fn apply_delta(
        &self,
        wallet: &WalletAddress,
        earned: TokenAmount,
        withdrawn: TokenAmount,
    ) -> Result<UserBalance>;

    /// Record a verified deposit and credit it, in one transaction.
    ///
    /// The insert into the deposit log is the deduplication gate: if the
    /// transaction hash is already recorded the whole transaction rolls
    /// back with `DuplicateDeposit` and the balance is untouched, regardless
    /// of how many reconcilers race on the same candidate.
    fn credit_deposit(&self, record: &DepositRecord) -> Result<UserBalance>;
}

/// Read access to verified deposit records.
pub trait DepositLog {
    /// All recorded transaction hashes for a wallet.
    fn recorded_tx_hashes(&self, wallet: &WalletAddress) -> Result<HashSet<TxHash>>;

    /// All deposit records for a wallet, newest block first.
    fn list(&self, wallet: &WalletAddress) -> Result<Vec<DepositRecord>>;
}

/// Game session persistence.
pub trait SessionStore {
    /// Persist a fresh in-progress session.
    fn insert(&self, session: &GameSession) -> Result<()>;

    /// Load a session by identifier.
    fn load(&self, id: &SessionId) -> Result<Option<GameSession>>;

    /// Transition a session to completed, persisting outcome and reward.
    ///
    /// The update is conditional on the session still being in progress;
    /// returns `false` if another completion won the race (or the session
    /// was already terminal), in which case nothing was written.
    fn complete(
        &self,
        id: &SessionId,
        outcome: &GameOutcome,
        reward: TokenAmount,
        completed_at: Timestamp,
    ) -> Result<bool>;
}

/// Daily play counters per (wallet, game kind, day).
pub trait DailyLimitStore {
    /// The counter for a day; zero if the wallet has not played yet.
    fn counter(
        &self,
        wallet: &WalletAddress,
        kind: GameKind,
        day: DayStamp,
    ) -> Result<DailyLimitCounter>;

    /// Count one completed play and its earnings against the day.
    fn record_play(
        &self,
        wallet: &WalletAddress,
        kind: GameKind,
        day: DayStamp,
        earned: TokenAmount,
    ) -> Result<DailyLimitCounter>;
}

/// Confirmed withdrawal records.
pub trait WithdrawalLog {
    /// Persist a confirmed withdrawal.
    fn insert(&self, record: &WithdrawalRecord) -> Result<()>;

    /// All withdrawals for a wallet, newest first.
    fn list(&self, wallet: &WalletAddress) -> Result<Vec<WithdrawalRecord>>;
}

/// Aggregate play statistics.
pub trait StatsStore {
    /// Fold one completed play into the wallet's statistics.
    fn record_result(
        &self,
        wallet: &WalletAddress,
        kind: GameKind,
        score: u64,
        earned: TokenAmount,
        played_at: Timestamp,
    ) -> Result<GameStats>;

    /// Statistics for one (wallet, game kind), if any plays exist.
    fn get(&self, wallet: &WalletAddress, kind: GameKind) -> Result<Option<GameStats>>;
}
