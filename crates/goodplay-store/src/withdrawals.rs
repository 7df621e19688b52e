//! SQLite withdrawal log.
//!
//! Rows exist only for withdrawals the settlement client confirmed on-chain;
//! failed or unconfirmed attempts never reach this table.

use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};

use goodplay_types::{CorrelationId, WalletAddress, WithdrawalRecord};

use crate::error::{Result, StoreError};
use crate::sql::{amount_col, day_col, tx_hash_col, wallet_col};
use crate::traits::WithdrawalLog;

/// SQLite-backed withdrawal log.
pub struct SqliteWithdrawalLog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteWithdrawalLog {
    /// Create a new withdrawal log over a shared connection.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl WithdrawalLog for SqliteWithdrawalLog {
    fn insert(&self, record: &WithdrawalRecord) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;
        conn.execute(
            "INSERT INTO withdrawals_log (tx_hash, wallet, amount, correlation_id, day, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.tx_hash.as_str(),
                record.wallet.as_str(),
                record.amount.base_units().to_string(),
                record.correlation_id.as_str(),
                record.day.to_string(),
                record.created_at as i64,
            ],
        )?;
        Ok(())
    }

    fn list(&self, wallet: &WalletAddress) -> Result<Vec<WithdrawalRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;
        let mut stmt = conn.prepare(
            "SELECT tx_hash, wallet, amount, correlation_id, day, created_at
             FROM withdrawals_log WHERE wallet = ?1 ORDER BY created_at DESC",
        )?;
        let records = stmt
            .query_map([wallet.as_str()], |row| {
                Ok(WithdrawalRecord {
                    tx_hash: tx_hash_col(row, 0)?,
                    wallet: wallet_col(row, 1)?,
                    amount: amount_col(row, 2)?,
                    correlation_id: CorrelationId::new(row.get::<_, String>(3)?),
                    day: day_col(row, 4)?,
                    created_at: row.get::<_, i64>(5)? as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::initialize_schema;
    use goodplay_types::{DayStamp, TokenAmount, TxHash};

    fn setup() -> SqliteWithdrawalLog {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        SqliteWithdrawalLog::new(Arc::new(Mutex::new(conn)))
    }

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0xff00a683f7bd77665754a65f2b82fdefc4371a50").unwrap()
    }

    #[test]
    fn test_insert_and_list() {
        let log = setup();
        let record = WithdrawalRecord {
            wallet: wallet(),
            amount: TokenAmount::from_tokens(300),
            tx_hash: TxHash::parse(&format!("0x{}", "ef".repeat(32))).unwrap(),
            correlation_id: CorrelationId::new("WITHDRAW-1A2B3C4D"),
            day: DayStamp::parse("2024-01-15").unwrap(),
            created_at: 1_705_320_000_000,
        };
        log.insert(&record).unwrap();

        let listed = log.list(&wallet()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], record);
    }

    #[test]
    fn test_list_other_wallet_empty() {
        let log = setup();
        let other = WalletAddress::parse("0x0000000000000000000000000000000000000001").unwrap();
        assert!(log.list(&other).unwrap().is_empty());
    }
}
