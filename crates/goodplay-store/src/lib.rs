//! SQLite persistence layer for the GoodPlay reward engine.
//!
//! One logical record type per entity, all in a single database behind a
//! shared connection:
//!
//! - **Balances** — authoritative per-wallet balance, mutated only through
//!   the apply-delta transaction
//! - **Deposit log** — verified on-chain deposits, keyed by transaction hash
//! - **Sessions** — game play lifecycle records
//! - **Daily limits** — play counters per (wallet, game kind, day)
//! - **Withdrawal log** — confirmed withdrawals only
//! - **Game stats** — aggregate play statistics
//!
//! # Trait-Based Design
//!
//! Each store is defined as a trait in [`traits`], with SQLite
//! implementations as the default. The [`GameStore`] facade composes all of
//! them over one connection.
//!
//! # Example
//!
//! ```no_run
//! use goodplay_store::{GameStore, BalanceStore};
//! use goodplay_types::{TokenAmount, WalletAddress};
//!
//! let store = GameStore::open("/var/lib/goodplay/goodplay.db").expect("open store");
//! let wallet = WalletAddress::parse("0xff00a683f7bd77665754a65f2b82fdefc4371a50").unwrap();
//!
//! let balance = store
//!     .balances
//!     .apply_delta(&wallet, TokenAmount::from_tokens(8), TokenAmount::ZERO)
//!     .expect("credit reward");
//! assert!(balance.invariant_holds());
//! ```

pub mod balances;
pub mod deposits;
pub mod error;
pub mod limits;
pub mod schema;
pub mod sessions;
mod sql;
pub mod stats;
pub mod traits;
pub mod withdrawals;

// Re-export error types
pub use error::{Result, StoreError};

// Re-export traits
pub use traits::{
    BalanceStore, DailyLimitStore, DepositLog, SessionStore, StatsStore, WithdrawalLog,
};

// Re-export implementations
pub use balances::SqliteBalanceStore;
pub use deposits::SqliteDepositLog;
pub use limits::SqliteDailyLimitStore;
pub use sessions::SqliteSessionStore;
pub use stats::SqliteStatsStore;
pub use withdrawals::SqliteWithdrawalLog;

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

/// All storage components composed over one database.
pub struct GameStore {
    /// Balance store (the apply-delta funnel).
    pub balances: SqliteBalanceStore,
    /// Verified deposit log (read side).
    pub deposits: SqliteDepositLog,
    /// Game session store.
    pub sessions: SqliteSessionStore,
    /// Daily play counters.
    pub limits: SqliteDailyLimitStore,
    /// Confirmed withdrawal log.
    pub withdrawals: SqliteWithdrawalLog,
    /// Aggregate play statistics.
    pub stats: SqliteStatsStore,
    conn: Arc<Mutex<Connection>>,
}

impl GameStore {
    /// Open (or create) the store at the given database path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::info!(db_path = %path.display(), "opening game store");
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory store, for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        schema::initialize_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self {
            balances: SqliteBalanceStore::new(Arc::clone(&conn)),
            deposits: SqliteDepositLog::new(Arc::clone(&conn)),
            sessions: SqliteSessionStore::new(Arc::clone(&conn)),
            limits: SqliteDailyLimitStore::new(Arc::clone(&conn)),
            withdrawals: SqliteWithdrawalLog::new(Arc::clone(&conn)),
            stats: SqliteStatsStore::new(Arc::clone(&conn)),
            conn,
        })
    }

    /// A handle to the shared database connection.
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }
}
