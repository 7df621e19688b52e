//! SQLite game session store.

use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension};

use goodplay_types::{
    GameOutcome, GameSession, SessionId, SessionStatus, Timestamp, TokenAmount,
};

use crate::error::{Result, StoreError};
use crate::sql::{amount_col, amount_col_opt, kind_col, status_col, wallet_col};
use crate::traits::SessionStore;

/// SQLite-backed session store.
pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    /// Create a new session store over a shared connection.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl SessionStore for SqliteSessionStore {
    fn insert(&self, session: &GameSession) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;
        conn.execute(
            "INSERT INTO sessions (session_id, wallet, game_kind, status, stake, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id.as_str(),
                session.wallet.as_str(),
                session.kind.as_str(),
                session.status.as_str(),
                session.stake.base_units().to_string(),
                session.started_at as i64,
            ],
        )?;
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<GameSession>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;
        let row = conn
            .query_row(
                "SELECT session_id, wallet, game_kind, status, stake, started_at,
                        completed_at, outcome, reward
                 FROM sessions WHERE session_id = ?1",
                [id.as_str()],
                |row| {
                    let outcome_json: Option<String> = row.get(7)?;
                    Ok((
                        row.get::<_, String>(0)?,
                        wallet_col(row, 1)?,
                        kind_col(row, 2)?,
                        status_col(row, 3)?,
                        amount_col(row, 4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, Option<i64>>(6)?,
                        outcome_json,
                        amount_col_opt(row, 8)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, wallet, kind, status, stake, started_at, completed_at, outcome_json, reward)) =
            row
        else {
            return Ok(None);
        };

        let outcome = outcome_json
            .map(|json| serde_json::from_str::<GameOutcome>(&json))
            .transpose()?;

        Ok(Some(GameSession {
            id: SessionId::new(id),
            wallet,
            kind,
            status,
            stake,
            started_at: started_at as Timestamp,
            completed_at: completed_at.map(|t| t as Timestamp),
            outcome,
            reward,
        }))
    }

    fn complete(
        &self,
        id: &SessionId,
        outcome: &GameOutcome,
        reward: TokenAmount,
        completed_at: Timestamp,
    ) -> Result<bool> {
        let outcome_json = serde_json::to_string(outcome)?;
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;

        // Conditional on the session still being in progress: whichever
        // completion request lands first wins, every later one sees zero
        // affected rows.
        let changed = conn.execute(
            "UPDATE sessions
             SET status = ?1, outcome = ?2, reward = ?3, completed_at = ?4
             WHERE session_id = ?5 AND status = ?6",
            params![
                SessionStatus::Completed.as_str(),
                outcome_json,
                reward.base_units().to_string(),
                completed_at as i64,
                id.as_str(),
                SessionStatus::InProgress.as_str(),
            ],
        )?;
        Ok(changed == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::initialize_schema;
    use goodplay_types::{GameKind, WalletAddress};

    fn setup() -> SqliteSessionStore {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        SqliteSessionStore::new(Arc::new(Mutex::new(conn)))
    }

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0xff00a683f7bd77665754a65f2b82fdefc4371a50").unwrap()
    }

    fn session(id: &str) -> GameSession {
        GameSession::started(
            SessionId::new(id),
            wallet(),
            GameKind::CrashGame,
            TokenAmount::ZERO,
            1_705_320_000_000,
        )
    }

    fn crash_outcome() -> GameOutcome {
        GameOutcome::Crash {
            multiplier_hundredths: 230,
            claimed_payout: TokenAmount::from_tokens(8),
        }
    }

    #[test]
    fn test_insert_and_load() {
        let store = setup();
        store.insert(&session("GAME-AAAA0001")).unwrap();

        let loaded = store.load(&SessionId::new("GAME-AAAA0001")).unwrap().unwrap();
        assert_eq!(loaded.kind, GameKind::CrashGame);
        assert!(loaded.status.is_in_progress());
        assert!(loaded.outcome.is_none());

        assert!(store.load(&SessionId::new("GAME-MISSING1")).unwrap().is_none());
    }

    #[test]
    fn test_complete_persists_outcome_and_reward() {
        let store = setup();
        store.insert(&session("GAME-AAAA0002")).unwrap();

        let id = SessionId::new("GAME-AAAA0002");
        let applied = store
            .complete(&id, &crash_outcome(), TokenAmount::from_tokens(8), 1_705_321_000_000)
            .unwrap();
        assert!(applied);

        let loaded = store.load(&id).unwrap().unwrap();
        assert_eq!(loaded.status, SessionStatus::Completed);
        assert_eq!(loaded.reward, Some(TokenAmount::from_tokens(8)));
        assert_eq!(loaded.outcome, Some(crash_outcome()));
        assert_eq!(loaded.completed_at, Some(1_705_321_000_000));
    }

    #[test]
    fn test_second_completion_loses() {
        let store = setup();
        store.insert(&session("GAME-AAAA0003")).unwrap();
        let id = SessionId::new("GAME-AAAA0003");

        assert!(store
            .complete(&id, &crash_outcome(), TokenAmount::from_tokens(8), 1)
            .unwrap());

        // Retried completion with a fatter claim changes nothing.
        let richer = GameOutcome::Crash {
            multiplier_hundredths: 500,
            claimed_payout: TokenAmount::from_tokens(20),
        };
        assert!(!store.complete(&id, &richer, TokenAmount::from_tokens(20), 2).unwrap());

        let loaded = store.load(&id).unwrap().unwrap();
        assert_eq!(loaded.reward, Some(TokenAmount::from_tokens(8)));
        assert_eq!(loaded.completed_at, Some(1));
    }

    #[test]
    fn test_complete_unknown_session() {
        let store = setup();
        let applied = store
            .complete(
                &SessionId::new("GAME-MISSING1"),
                &crash_outcome(),
                TokenAmount::ZERO,
                1,
            )
            .unwrap();
        assert!(!applied);
    }
}
