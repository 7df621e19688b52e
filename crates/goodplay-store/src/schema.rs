//! SQL schema initialization.
//!
//! Token amounts are persisted as decimal base-unit strings: 18-decimal
//! amounts exceed SQLite's 64-bit integer range, and TEXT keeps them exact.

use rusqlite::Connection;

use crate::error::Result;

/// Schema version for migration tracking.
pub const SCHEMA_VERSION: u32 = 1;

/// Initialize the database schema.
///
/// Creates all tables and indexes if they don't exist. Idempotent — calling
/// it multiple times is safe.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // WAL mode for better concurrent read/write behavior
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version: Option<u32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    match current_version {
        None => {
            create_tables(conn)?;
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
        }
        Some(version) if version < SCHEMA_VERSION => {
            // Future migrations are applied here, additively.
            conn.execute("UPDATE schema_version SET version = ?1", [SCHEMA_VERSION])?;
        }
        Some(_) => {}
    }

    Ok(())
}

/// Create all database tables.
fn create_tables(conn: &Connection) -> Result<()> {
    // One balance row per wallet, created lazily on first credit.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS balances (
            wallet TEXT PRIMARY KEY,
            available TEXT NOT NULL,
            total_earned TEXT NOT NULL,
            total_withdrawn TEXT NOT NULL,
            last_deposit_day TEXT,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    // Verified deposits; tx_hash uniqueness is the double-credit guard.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS deposits_log (
            tx_hash TEXT PRIMARY KEY,
            wallet TEXT NOT NULL,
            amount TEXT NOT NULL,
            block_number INTEGER NOT NULL,
            observed_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_deposits_wallet ON deposits_log(wallet)",
        [],
    )?;

    // Game sessions.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            session_id TEXT PRIMARY KEY,
            wallet TEXT NOT NULL,
            game_kind TEXT NOT NULL,
            status TEXT NOT NULL,
            stake TEXT NOT NULL,
            started_at INTEGER NOT NULL,
            completed_at INTEGER,
            outcome TEXT,
            reward TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_wallet ON sessions(wallet)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status)",
        [],
    )?;

    // Daily play counters.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS daily_limits (
            wallet TEXT NOT NULL,
            game_kind TEXT NOT NULL,
            day TEXT NOT NULL,
            plays_today INTEGER NOT NULL,
            earned_today TEXT NOT NULL,
            PRIMARY KEY (wallet, game_kind, day)
        )",
        [],
    )?;

    // Confirmed withdrawals.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS withdrawals_log (
            tx_hash TEXT PRIMARY KEY,
            wallet TEXT NOT NULL,
            amount TEXT NOT NULL,
            correlation_id TEXT NOT NULL,
            day TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_withdrawals_wallet ON withdrawals_log(wallet)",
        [],
    )?;

    // Aggregate play statistics.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS game_stats (
            wallet TEXT NOT NULL,
            game_kind TEXT NOT NULL,
            total_plays INTEGER NOT NULL,
            total_score INTEGER NOT NULL,
            highest_score INTEGER NOT NULL,
            total_earned TEXT NOT NULL,
            last_played INTEGER NOT NULL,
            PRIMARY KEY (wallet, game_kind)
        )",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_initialize_schema() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_initialize_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_wal_mode_enabled() {
        // WAL does not persist for in-memory databases, so use a file.
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let conn = Connection::open(&db_path).unwrap();
        initialize_schema(&conn).unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[test]
    fn test_tables_exist() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let tables = [
            "balances",
            "deposits_log",
            "sessions",
            "daily_limits",
            "withdrawals_log",
            "game_stats",
        ];

        for table in tables {
            let exists: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "table {} should exist", table);
        }
    }

    #[test]
    fn test_schema_version_recorded() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }
}
