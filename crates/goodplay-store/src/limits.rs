//! SQLite daily play limit counters.

use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use goodplay_types::{DailyLimitCounter, DayStamp, GameKind, TokenAmount, WalletAddress};

use crate::error::{Result, StoreError};
use crate::sql::amount_col;
use crate::traits::DailyLimitStore;

/// SQLite-backed daily limit store.
pub struct SqliteDailyLimitStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDailyLimitStore {
    /// Create a new daily limit store over a shared connection.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn counter_tx(
        tx: &Transaction<'_>,
        wallet: &WalletAddress,
        kind: GameKind,
        day: DayStamp,
    ) -> Result<DailyLimitCounter> {
        let row = tx
            .query_row(
                "SELECT plays_today, earned_today FROM daily_limits
                 WHERE wallet = ?1 AND game_kind = ?2 AND day = ?3",
                params![wallet.as_str(), kind.as_str(), day.to_string()],
                |row| Ok((row.get::<_, i64>(0)?, amount_col(row, 1)?)),
            )
            .optional()?;

        Ok(match row {
            Some((plays, earned)) => DailyLimitCounter {
                wallet: wallet.clone(),
                kind,
                day,
                plays_today: plays as u32,
                earned_today: earned,
            },
            None => DailyLimitCounter::zero(wallet.clone(), kind, day),
        })
    }
}

impl DailyLimitStore for SqliteDailyLimitStore {
    fn counter(
        &self,
        wallet: &WalletAddress,
        kind: GameKind,
        day: DayStamp,
    ) -> Result<DailyLimitCounter> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;
        let tx = conn.transaction()?;
        let counter = Self::counter_tx(&tx, wallet, kind, day)?;
        tx.commit()?;
        Ok(counter)
    }

    fn record_play(
        &self,
        wallet: &WalletAddress,
        kind: GameKind,
        day: DayStamp,
        earned: TokenAmount,
    ) -> Result<DailyLimitCounter> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;
        let tx = conn.transaction()?;

        let old = Self::counter_tx(&tx, wallet, kind, day)?;
        let plays_today = old.plays_today + 1;
        let earned_today = old
            .earned_today
            .checked_add(earned)
            .ok_or_else(|| StoreError::invalid_data("earned_today overflow"))?;

        tx.execute(
            "INSERT INTO daily_limits (wallet, game_kind, day, plays_today, earned_today)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(wallet, game_kind, day) DO UPDATE SET
                plays_today = excluded.plays_today,
                earned_today = excluded.earned_today",
            params![
                wallet.as_str(),
                kind.as_str(),
                day.to_string(),
                plays_today as i64,
                earned_today.base_units().to_string(),
            ],
        )?;
        tx.commit()?;

        Ok(DailyLimitCounter {
            wallet: wallet.clone(),
            kind,
            day,
            plays_today,
            earned_today,
        })
    }
}
