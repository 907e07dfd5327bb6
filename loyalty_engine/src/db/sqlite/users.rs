use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::traits::LedgerError,
    db_types::{Points, User},
};

pub async fn insert_user(login: &str, password: &str, conn: &mut SqliteConnection) -> Result<User, LedgerError> {
    let user = sqlx::query_as::<_, User>(
        r#"
            INSERT INTO users (login, password) VALUES ($1, $2)
            RETURNING id, login, password, accrued_total, withdrawn_total;
        "#,
    )
    .bind(login)
    .bind(password)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => LedgerError::LoginAlreadyExists,
        e => LedgerError::from(e),
    })?;
    debug!("🗃️ User '{login}' has been created with id {}", user.id);
    Ok(user)
}

pub async fn fetch_user_by_login(login: &str, conn: &mut SqliteConnection) -> Result<User, LedgerError> {
    sqlx::query_as::<_, User>(
        "SELECT id, login, password, accrued_total, withdrawn_total FROM users WHERE login = $1",
    )
    .bind(login)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| LedgerError::UserLoginNotFound(login.to_string()))
}

pub async fn fetch_user_by_id(user_id: i64, conn: &mut SqliteConnection) -> Result<User, LedgerError> {
    sqlx::query_as::<_, User>("SELECT id, login, password, accrued_total, withdrawn_total FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .ok_or(LedgerError::UserNotFound(user_id))
}

pub async fn update_accrued_total(
    user_id: i64,
    total: Points,
    conn: &mut SqliteConnection,
) -> Result<(), LedgerError> {
    let result =
        sqlx::query("UPDATE users SET accrued_total = $1 WHERE id = $2").bind(total).bind(user_id).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(LedgerError::UserNotFound(user_id));
    }
    debug!("🗃️ Accrued total for user #{user_id} is now {total}");
    Ok(())
}

pub async fn update_withdrawn_total(
    user_id: i64,
    total: Points,
    conn: &mut SqliteConnection,
) -> Result<(), LedgerError> {
    let result = sqlx::query("UPDATE users SET withdrawn_total = $1 WHERE id = $2")
        .bind(total)
        .bind(user_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(LedgerError::UserNotFound(user_id));
    }
    debug!("🗃️ Withdrawn total for user #{user_id} is now {total}");
    Ok(())
}
