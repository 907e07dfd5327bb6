pub mod db;

pub mod orders;
pub mod users;
pub mod withdrawals;

use std::{str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use crate::db::traits::LedgerError;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 25;

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, LedgerError> {
    info!("🗃️ Connecting to {url} with up to {max_connections} connections");
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// SQLite's `SUM` aborts with "integer overflow" rather than wrapping.
pub(crate) fn sum_error(user_id: i64, e: sqlx::Error) -> LedgerError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.message().contains("integer overflow") => {
            LedgerError::TotalOutOfRange(user_id)
        },
        _ => LedgerError::DriverError(e),
    }
}
