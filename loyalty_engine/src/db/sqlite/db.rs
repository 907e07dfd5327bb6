use std::fmt::Debug;

use async_trait::async_trait;
use log::*;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::{new_pool, orders, users, withdrawals, DEFAULT_MAX_CONNECTIONS};
use crate::{
    db::traits::{LedgerError, LedgerRepository, LedgerTransaction, UnitOfWork},
    db_types::{NewWithdrawal, Order, OrderStatusType, Points, User, Withdrawal},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str) -> Result<Self, LedgerError> {
        Self::new_with_url_and_connections(url, DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn new_with_url_and_connections(url: &str, max_connections: u32) -> Result<Self, LedgerError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies any outstanding schema migrations. Migrations are embedded in the binary.
    pub async fn run_migrations(&self) -> Result<(), LedgerError> {
        sqlx::migrate!("./src/db/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LedgerError::DriverError(sqlx::Error::Migrate(Box::new(e))))?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl UnitOfWork for SqliteDatabase {
    type Tx = SqliteTransaction;

    async fn begin(&self) -> Result<Self::Tx, LedgerError> {
        let tx = self.pool.begin().await?;
        Ok(SqliteTransaction { tx })
    }
}

#[async_trait]
impl LedgerRepository for SqliteDatabase {
    async fn add_user(&self, login: &str, password: &str) -> Result<User, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(login, password, &mut conn).await
    }

    async fn find_user_by_login(&self, login: &str) -> Result<User, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_login(login, &mut conn).await
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<User, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_id(user_id, &mut conn).await
    }

    async fn add_order(&self, number: &str, user_id: i64) -> Result<Order, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(number, user_id, &mut conn).await
    }

    async fn find_order_by_number(&self, number: &str) -> Result<Order, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_number(number, &mut conn).await
    }

    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders_for_user(user_id, &mut conn).await
    }

    async fn unprocessed_orders(&self) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_unprocessed_orders(&mut conn).await
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatusType,
        accrual: Points,
    ) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(order_id, status, accrual, &mut conn).await
    }

    async fn update_user_accrued_total(&self, user_id: i64, total: Points) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::update_accrued_total(user_id, total, &mut conn).await
    }

    async fn update_user_withdrawn_total(&self, user_id: i64, total: Points) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        users::update_withdrawn_total(user_id, total, &mut conn).await
    }

    async fn add_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::insert_withdrawal(withdrawal, &mut conn).await
    }

    async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await
    }

    async fn sum_withdrawals_for_user(&self, user_id: i64) -> Result<Points, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        withdrawals::sum_withdrawals_for_user(user_id, &mut conn).await
    }

    async fn sum_accruals_for_user(&self, user_id: i64) -> Result<Points, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        orders::sum_accruals_for_user(user_id, &mut conn).await
    }
}

/// A unit of work backed by a native SQLite transaction. Dropping it without a commit rolls it back.
pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl LedgerTransaction for SqliteTransaction {
    async fn add_user(&mut self, login: &str, password: &str) -> Result<User, LedgerError> {
        users::insert_user(login, password, &mut self.tx).await
    }

    async fn find_user_by_login(&mut self, login: &str) -> Result<User, LedgerError> {
        users::fetch_user_by_login(login, &mut self.tx).await
    }

    async fn find_user_by_id(&mut self, user_id: i64) -> Result<User, LedgerError> {
        users::fetch_user_by_id(user_id, &mut self.tx).await
    }

    async fn add_order(&mut self, number: &str, user_id: i64) -> Result<Order, LedgerError> {
        orders::insert_order(number, user_id, &mut self.tx).await
    }

    async fn find_order_by_number(&mut self, number: &str) -> Result<Order, LedgerError> {
        orders::fetch_order_by_number(number, &mut self.tx).await
    }

    async fn orders_for_user(&mut self, user_id: i64) -> Result<Vec<Order>, LedgerError> {
        orders::fetch_orders_for_user(user_id, &mut self.tx).await
    }

    async fn unprocessed_orders(&mut self) -> Result<Vec<Order>, LedgerError> {
        orders::fetch_unprocessed_orders(&mut self.tx).await
    }

    async fn update_order_status(
        &mut self,
        order_id: i64,
        status: OrderStatusType,
        accrual: Points,
    ) -> Result<(), LedgerError> {
        orders::update_order_status(order_id, status, accrual, &mut self.tx).await
    }

    async fn update_user_accrued_total(&mut self, user_id: i64, total: Points) -> Result<(), LedgerError> {
        users::update_accrued_total(user_id, total, &mut self.tx).await
    }

    async fn update_user_withdrawn_total(&mut self, user_id: i64, total: Points) -> Result<(), LedgerError> {
        users::update_withdrawn_total(user_id, total, &mut self.tx).await
    }

    async fn add_withdrawal(&mut self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        withdrawals::insert_withdrawal(withdrawal, &mut self.tx).await
    }

    async fn withdrawals_for_user(&mut self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        withdrawals::fetch_withdrawals_for_user(user_id, &mut self.tx).await
    }

    async fn sum_withdrawals_for_user(&mut self, user_id: i64) -> Result<Points, LedgerError> {
        withdrawals::sum_withdrawals_for_user(user_id, &mut self.tx).await
    }

    async fn sum_accruals_for_user(&mut self, user_id: i64) -> Result<Points, LedgerError> {
        orders::sum_accruals_for_user(user_id, &mut self.tx).await
    }

    async fn commit(self) -> Result<(), LedgerError> {
        self.tx.commit().await.map_err(LedgerError::CommitFailed)
    }

    async fn rollback(self) -> Result<(), LedgerError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
