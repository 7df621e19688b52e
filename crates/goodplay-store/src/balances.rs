//! SQLite balance store — the single authorized writer of user balances.

use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension, Transaction};

use goodplay_types::{DayStamp, DepositRecord, TokenAmount, UserBalance, WalletAddress};

use crate::error::{Result, StoreError};
use crate::sql::{amount_col, day_col_opt, is_constraint_violation};
use crate::traits::BalanceStore;

/// SQLite-backed balance store.
pub struct SqliteBalanceStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBalanceStore {
    /// Create a new balance store over a shared connection.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn read_tx(tx: &Transaction<'_>, wallet: &WalletAddress) -> Result<UserBalance> {
        let row = tx
            .query_row(
                "SELECT available, total_earned, total_withdrawn, last_deposit_day
                 FROM balances WHERE wallet = ?1",
                [wallet.as_str()],
                |row| {
                    Ok((
                        amount_col(row, 0)?,
                        amount_col(row, 1)?,
                        amount_col(row, 2)?,
                        day_col_opt(row, 3)?,
                    ))
                },
            )
            .optional()?;

        Ok(match row {
            Some((available, total_earned, total_withdrawn, last_deposit_day)) => UserBalance {
                wallet: wallet.clone(),
                available,
                total_earned,
                total_withdrawn,
                last_deposit_day,
            },
            None => UserBalance::empty(wallet.clone()),
        })
    }

    /// Apply a delta inside an open transaction.
    ///
    /// The caller decides when to commit; `credit_deposit` uses this to make
    /// the deposit-log insert and the credit one atomic unit.
    fn apply_delta_tx(
        tx: &Transaction<'_>,
        wallet: &WalletAddress,
        earned: TokenAmount,
        withdrawn: TokenAmount,
        deposit_day: Option<DayStamp>,
    ) -> Result<UserBalance> {
        let old = Self::read_tx(tx, wallet)?;

        let credited = old
            .available
            .checked_add(earned)
            .ok_or_else(|| StoreError::invalid_data("available balance overflow"))?;
        let available = credited
            .checked_sub(withdrawn)
            .ok_or(StoreError::NegativeBalance {
                have: credited,
                need: withdrawn,
            })?;
        let total_earned = old
            .total_earned
            .checked_add(earned)
            .ok_or_else(|| StoreError::invalid_data("total_earned overflow"))?;
        let total_withdrawn = old
            .total_withdrawn
            .checked_add(withdrawn)
            .ok_or_else(|| StoreError::invalid_data("total_withdrawn overflow"))?;
        let last_deposit_day = deposit_day.or(old.last_deposit_day);

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        tx.execute(
            "INSERT INTO balances (wallet, available, total_earned, total_withdrawn, last_deposit_day, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(wallet) DO UPDATE SET
                available = excluded.available,
                total_earned = excluded.total_earned,
                total_withdrawn = excluded.total_withdrawn,
                last_deposit_day = excluded.last_deposit_day,
                updated_at = excluded.updated_at",
            params![
                wallet.as_str(),
                available.base_units().to_string(),
                total_earned.base_units().to_string(),
                total_withdrawn.base_units().to_string(),
                last_deposit_day.map(|d| d.to_string()),
                now,
            ],
        )?;

        Ok(UserBalance {
            wallet: wallet.clone(),
            available,
            total_earned,
            total_withdrawn,
            last_deposit_day,
        })
    }
}

impl BalanceStore for SqliteBalanceStore {
    fn read(&self, wallet: &WalletAddress) -> Result<UserBalance> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;
        let tx = conn.transaction()?;
        let balance = Self::read_tx(&tx, wallet)?;
        tx.commit()?;
        Ok(balance)
    }

    fn apply_delta(
        &self,
        wallet: &WalletAddress,
        earned: TokenAmount,
        withdrawn: TokenAmount,
    ) -> Result<UserBalance> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;
        let tx = conn.transaction()?;
        let balance = Self::apply_delta_tx(&tx, wallet, earned, withdrawn, None)?;
        tx.commit()?;

        tracing::debug!(
            wallet = %wallet.masked(),
            earned = %earned,
            withdrawn = %withdrawn,
            available = %balance.available,
            "balance delta applied"
        );
        Ok(balance)
    }

    fn credit_deposit(&self, record: &DepositRecord) -> Result<UserBalance> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))?;
        let tx = conn.transaction()?;

        // The PRIMARY KEY on tx_hash is the double-credit guard; a duplicate
        // rolls the whole transaction back before any balance change.
        if let Err(e) = tx.execute(
            "INSERT INTO deposits_log (tx_hash, wallet, amount, block_number, observed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.tx_hash.as_str(),
                record.wallet.as_str(),
                record.amount.base_units().to_string(),
                record.block_number as i64,
                record.observed_at as i64,
            ],
        ) {
            if is_constraint_violation(&e) {
                return Err(StoreError::DuplicateDeposit(record.tx_hash.clone()));
            }
            return Err(e.into());
        }

        let day = DayStamp::from_timestamp(record.observed_at);
        let balance = Self::apply_delta_tx(
            &tx,
            &record.wallet,
            record.amount,
            TokenAmount::ZERO,
            Some(day),
        )?;
        tx.commit()?;

        tracing::info!(
            wallet = %record.wallet.masked(),
            tx_hash = %record.tx_hash.short(),
            amount = %record.amount,
            "deposit credited"
        );
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::initialize_schema;
    use crate::traits::DepositLog;
    use crate::SqliteDepositLog;

    fn setup() -> (SqliteBalanceStore, SqliteDepositLog) {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (
            SqliteBalanceStore::new(Arc::clone(&conn)),
            SqliteDepositLog::new(conn),
        )
    }

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0xff00a683f7bd77665754a65f2b82fdefc4371a50").unwrap()
    }

    fn deposit(amount: u64, salt: u8) -> DepositRecord {
        DepositRecord {
            wallet: wallet(),
            amount: TokenAmount::from_tokens(amount),
            tx_hash: goodplay_types::TxHash::parse(&format!("0x{:02x}{}", salt, "ab".repeat(31)))
                .unwrap(),
            block_number: 1_000 + salt as u64,
            observed_at: 1_705_320_000_000,
        }
    }

    #[test]
    fn test_read_missing_wallet_is_zero() {
        let (store, _) = setup();
        let balance = store.read(&wallet()).unwrap();
        assert!(balance.available.is_zero());
        assert!(balance.invariant_holds());
    }

    #[test]
    fn test_apply_delta_maintains_invariant() {
        let (store, _) = setup();
        let w = wallet();

        let balance = store
            .apply_delta(&w, TokenAmount::from_tokens(300), TokenAmount::ZERO)
            .unwrap();
        assert_eq!(balance.available, TokenAmount::from_tokens(300));
        assert!(balance.invariant_holds());

        let balance = store
            .apply_delta(&w, TokenAmount::from_tokens(8), TokenAmount::ZERO)
            .unwrap();
        assert_eq!(balance.available, TokenAmount::from_tokens(308));
        assert!(balance.invariant_holds());

        let balance = store
            .apply_delta(&w, TokenAmount::ZERO, TokenAmount::from_tokens(308))
            .unwrap();
        assert!(balance.available.is_zero());
        assert_eq!(balance.total_earned, TokenAmount::from_tokens(308));
        assert_eq!(balance.total_withdrawn, TokenAmount::from_tokens(308));
        assert!(balance.invariant_holds());
    }

    #[test]
    fn test_apply_delta_rejects_negative_balance() {
        let (store, _) = setup();
        let w = wallet();

        store
            .apply_delta(&w, TokenAmount::from_tokens(100), TokenAmount::ZERO)
            .unwrap();

        let err = store
            .apply_delta(&w, TokenAmount::ZERO, TokenAmount::from_tokens(150))
            .unwrap_err();
        assert!(matches!(err, StoreError::NegativeBalance { .. }));

        // Mutation discarded wholesale, nothing partial persisted.
        let balance = store.read(&w).unwrap();
        assert_eq!(balance.available, TokenAmount::from_tokens(100));
        assert!(balance.total_withdrawn.is_zero());
        assert!(balance.invariant_holds());
    }

    #[test]
    fn test_credit_deposit_dedup() {
        let (store, log) = setup();
        let record = deposit(200, 1);

        let balance = store.credit_deposit(&record).unwrap();
        assert_eq!(balance.available, TokenAmount::from_tokens(200));
        assert!(balance.last_deposit_day.is_some());

        // Same tx hash again: rejected, balance untouched.
        let err = store.credit_deposit(&record).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateDeposit(_)));

        let balance = store.read(&wallet()).unwrap();
        assert_eq!(balance.available, TokenAmount::from_tokens(200));

        // Exactly one log row.
        assert_eq!(log.list(&wallet()).unwrap().len(), 1);
    }

    #[test]
    fn test_credit_distinct_deposits_accumulate() {
        let (store, _) = setup();

        store.credit_deposit(&deposit(100, 1)).unwrap();
        let balance = store.credit_deposit(&deposit(250, 2)).unwrap();
        assert_eq!(balance.available, TokenAmount::from_tokens(350));
        assert_eq!(balance.total_earned, TokenAmount::from_tokens(350));
        assert!(balance.invariant_holds());
    }
}
