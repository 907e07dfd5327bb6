use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::traits::LedgerError,
    db_types::{Order, OrderStatusType, Points},
};

const ORDER_COLUMNS: &str = "id, number, user_id, status, accrual, uploaded_at";

/// Inserts a new order with status `NEW`. The `number` column is unique, so the loser of two concurrent inserts for
/// the same number gets `OrderAlreadyExists` rather than a second row.
pub async fn insert_order(number: &str, user_id: i64, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    let sql = format!("INSERT INTO orders (number, user_id, uploaded_at) VALUES ($1, $2, $3) RETURNING {ORDER_COLUMNS}");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(number)
        .bind(user_id)
        .bind(chrono::Utc::now())
        .fetch_one(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                LedgerError::OrderAlreadyExists(number.to_string())
            },
            e => LedgerError::from(e),
        })?;
    debug!("🗃️ Order {number} has been saved for user #{user_id} with id {}", order.id);
    Ok(order)
}

pub async fn fetch_order_by_number(number: &str, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE number = $1");
    sqlx::query_as::<_, Order>(&sql)
        .bind(number)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| LedgerError::OrderNotFound(number.to_string()))
}

pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, LedgerError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY uploaded_at DESC, id DESC");
    let orders = sqlx::query_as::<_, Order>(&sql).bind(user_id).fetch_all(conn).await?;
    trace!("🗃️ Fetched {} orders for user #{user_id}", orders.len());
    Ok(orders)
}

pub async fn fetch_unprocessed_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, LedgerError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE status IN ('NEW', 'PROCESSING')");
    let orders = sqlx::query_as::<_, Order>(&sql).fetch_all(conn).await?;
    Ok(orders)
}

pub async fn update_order_status(
    order_id: i64,
    status: OrderStatusType,
    accrual: Points,
    conn: &mut SqliteConnection,
) -> Result<(), LedgerError> {
    let accrual = if status == OrderStatusType::Processed { accrual } else { Points::default() };
    let result = sqlx::query("UPDATE orders SET status = $1, accrual = $2 WHERE id = $3")
        .bind(status)
        .bind(accrual)
        .bind(order_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(LedgerError::OrderNotFound(order_id.to_string()));
    }
    debug!("🗃️ Order #{order_id} is now {status} ({accrual})");
    Ok(())
}

pub async fn sum_accruals_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Points, LedgerError> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(accrual), 0) FROM orders WHERE user_id = $1 AND status = 'PROCESSED'",
    )
    .bind(user_id)
    .fetch_one(conn)
    .await
    .map_err(|e| super::sum_error(user_id, e))?;
    Ok(Points::from_units(total))
}
