//! Row-to-domain conversion helpers.
//!
//! Conversion failures surface as `rusqlite::Error::FromSqlConversionFailure`
//! so they flow through the normal query error path with the offending
//! column index attached.

use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::Row;

use goodplay_types::{DayStamp, GameKind, SessionStatus, TokenAmount, TxHash, WalletAddress};

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Read a token amount column (decimal base-unit TEXT).
pub(crate) fn amount_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<TokenAmount> {
    let raw: String = row.get(idx)?;
    TokenAmount::from_base_units_str(&raw).map_err(|e| conversion_error(idx, e))
}

/// Read an optional token amount column.
pub(crate) fn amount_col_opt(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<TokenAmount>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| TokenAmount::from_base_units_str(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

/// Read a wallet address column.
pub(crate) fn wallet_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<WalletAddress> {
    let raw: String = row.get(idx)?;
    WalletAddress::parse(&raw).map_err(|e| conversion_error(idx, e))
}

/// Read a transaction hash column.
pub(crate) fn tx_hash_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<TxHash> {
    let raw: String = row.get(idx)?;
    TxHash::parse(&raw).map_err(|e| conversion_error(idx, e))
}

/// Read a game kind column.
pub(crate) fn kind_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<GameKind> {
    let raw: String = row.get(idx)?;
    GameKind::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

/// Read a session status column.
pub(crate) fn status_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<SessionStatus> {
    let raw: String = row.get(idx)?;
    SessionStatus::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

/// Read a calendar day column.
pub(crate) fn day_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DayStamp> {
    let raw: String = row.get(idx)?;
    DayStamp::parse(&raw).map_err(|e| conversion_error(idx, e))
}

/// Read an optional calendar day column.
pub(crate) fn day_col_opt(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DayStamp>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| DayStamp::parse(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

/// True if the error is a uniqueness/constraint violation.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
