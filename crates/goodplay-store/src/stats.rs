//! SQLite play statistics store.

use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use goodplay_types::{GameKind, GameStats, Timestamp, TokenAmount, WalletAddress};

use crate::error::{Result, StoreError};
use crate::sql::amount_col;
use crate::traits::StatsStore;

/// SQLite-backed statistics store.
pub struct SqliteStatsStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStatsStore {
    /// Create a new statistics store over a shared connection.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_tx(
        tx: &Transaction<'_>,
        wallet: &WalletAddress,
        kind: GameKind,
    ) -> Result<Option<GameStats>> {
        let row = tx
            .query_row(
                "SELECT total_plays, total_score, highest_score, total_earned, last_played
                 FROM game_stats WHERE wallet = ?1 AND game_kind = ?2",
                params![wallet.as_str(), kind.as_str()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        amount_col(row, 3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(
            |(total_plays, total_score, highest_score, total_earned, last_played)| GameStats {
                wallet: wallet.clone(),
                kind,
                total_plays: total_plays as u64,
                total_score: total_score as u64,
                highest_score: highest_score as u64,
                total_earned,
                last_played: last_played as Timestamp,
            },
        ))
    }
}

impl StatsStore for SqliteStatsStore {
    fn record_result(
        &self,
        wallet: &WalletAddress,
        kind: GameKind,
        score: u64,
        earned: TokenAmount,
        played_at: Timestamp,
    ) -> Result<GameStats> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;
        let tx = conn.transaction()?;

        let stats = match Self::get_tx(&tx, wallet, kind)? {
            Some(old) => GameStats {
                wallet: wallet.clone(),
                kind,
                total_plays: old.total_plays + 1,
                total_score: old.total_score.saturating_add(score),
                highest_score: old.highest_score.max(score),
                total_earned: old
                    .total_earned
                    .checked_add(earned)
                    .ok_or_else(|| StoreError::invalid_data("total_earned overflow"))?,
                last_played: played_at,
            },
            None => GameStats {
                wallet: wallet.clone(),
                kind,
                total_plays: 1,
                total_score: score,
                highest_score: score,
                total_earned: earned,
                last_played: played_at,
            },
        };

        tx.execute(
            "INSERT INTO game_stats (wallet, game_kind, total_plays, total_score,
                                     highest_score, total_earned, last_played)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(wallet, game_kind) DO UPDATE SET
                total_plays = excluded.total_plays,
                total_score = excluded.total_score,
                highest_score = excluded.highest_score,
                total_earned = excluded.total_earned,
                last_played = excluded.last_played",
            params![
                wallet.as_str(),
                kind.as_str(),
                stats.total_plays as i64,
                stats.total_score as i64,
                stats.highest_score as i64,
                stats.total_earned.base_units().to_string(),
                stats.last_played as i64,
            ],
        )?;
        tx.commit()?;

        Ok(stats)
    }

    fn get(&self, wallet: &WalletAddress, kind: GameKind) -> Result<Option<GameStats>> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;
        let tx = conn.transaction()?;
        let stats = Self::get_tx(&tx, wallet, kind)?;
        tx.commit()?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::initialize_schema;

    fn setup() -> SqliteStatsStore {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        SqliteStatsStore::new(Arc::new(Mutex::new(conn)))
    }

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0xff00a683f7bd77665754a65f2b82fdefc4371a50").unwrap()
    }

    #[test]
    fn test_first_play_creates_stats() {
        let store = setup();
        let stats = store
            .record_result(&wallet(), GameKind::QuizTrivia, 7, TokenAmount::from_tokens(14), 1)
            .unwrap();
        assert_eq!(stats.total_plays, 1);
        assert_eq!(stats.highest_score, 7);
        assert_eq!(stats.total_earned, TokenAmount::from_tokens(14));
    }

    #[test]
    fn test_stats_accumulate() {
        let store = setup();
        let w = wallet();
        store
            .record_result(&w, GameKind::QuizTrivia, 7, TokenAmount::from_tokens(14), 1)
            .unwrap();
        let stats = store
            .record_result(&w, GameKind::QuizTrivia, 3, TokenAmount::from_tokens(6), 2)
            .unwrap();

        assert_eq!(stats.total_plays, 2);
        assert_eq!(stats.total_score, 10);
        assert_eq!(stats.highest_score, 7);
        assert_eq!(stats.total_earned, TokenAmount::from_tokens(20));
        assert_eq!(stats.last_played, 2);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = setup();
        assert!(store.get(&wallet(), GameKind::SpinWheel).unwrap().is_none());
    }
}
