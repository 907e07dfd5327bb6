use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::traits::LedgerError,
    db_types::{NewWithdrawal, Points, Withdrawal},
};

pub async fn insert_withdrawal(
    withdrawal: NewWithdrawal,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, LedgerError> {
    let record = sqlx::query_as::<_, Withdrawal>(
        r#"
            INSERT INTO withdrawals (user_id, order_number, amount, processed_at) VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, order_number, amount, processed_at;
        "#,
    )
    .bind(withdrawal.user_id)
    .bind(&withdrawal.order_number)
    .bind(withdrawal.amount)
    .bind(withdrawal.processed_at)
    .fetch_one(conn)
    .await?;
    debug!(
        "🗃️ Withdrawal #{} of {} against order {} saved for user #{}",
        record.id, record.amount, record.order_number, record.user_id
    );
    Ok(record)
}

pub async fn fetch_withdrawals_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, LedgerError> {
    let withdrawals = sqlx::query_as::<_, Withdrawal>(
        r#"
            SELECT id, user_id, order_number, amount, processed_at
            FROM withdrawals
            WHERE user_id = $1
            ORDER BY processed_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(withdrawals)
}

pub async fn sum_withdrawals_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Points, LedgerError> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(amount), 0) FROM withdrawals WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(conn)
        .await
        .map_err(|e| super::sum_error(user_id, e))?;
    Ok(Points::from_units(total))
}
