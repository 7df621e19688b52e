//! SQLite deposit log — read side.
//!
//! Writes happen only through `SqliteBalanceStore::credit_deposit`, which
//! couples the log insert with the balance credit in one transaction.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use goodplay_types::{DepositRecord, TxHash, WalletAddress};

use crate::error::{Result, StoreError};
use crate::sql::{amount_col, tx_hash_col, wallet_col};
use crate::traits::DepositLog;

/// SQLite-backed deposit log.
pub struct SqliteDepositLog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDepositLog {
    /// Create a new deposit log over a shared connection.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl DepositLog for SqliteDepositLog {
    fn recorded_tx_hashes(&self, wallet: &WalletAddress) -> Result<HashSet<TxHash>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;
        let mut stmt = conn.prepare("SELECT tx_hash FROM deposits_log WHERE wallet = ?1")?;
        let hashes = stmt
            .query_map([wallet.as_str()], |row| tx_hash_col(row, 0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(hashes)
    }

    fn list(&self, wallet: &WalletAddress) -> Result<Vec<DepositRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;
        let mut stmt = conn.prepare(
            "SELECT tx_hash, wallet, amount, block_number, observed_at
             FROM deposits_log WHERE wallet = ?1 ORDER BY block_number DESC",
        )?;
        let records = stmt
            .query_map([wallet.as_str()], |row| {
                Ok(DepositRecord {
                    tx_hash: tx_hash_col(row, 0)?,
                    wallet: wallet_col(row, 1)?,
                    amount: amount_col(row, 2)?,
                    block_number: row.get::<_, i64>(3)? as u64,
                    observed_at: row.get::<_, i64>(4)? as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}
