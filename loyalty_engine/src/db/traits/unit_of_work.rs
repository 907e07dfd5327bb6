use async_trait::async_trait;
use log::warn;

use super::LedgerError;
use crate::db_types::{NewWithdrawal, Order, OrderStatusType, Points, User, Withdrawal};

/// Opens units of work against a ledger store.
#[async_trait]
pub trait UnitOfWork {
    type Tx: LedgerTransaction + 'static;

    /// Starts a new unit of work. Nothing written through the returned transaction is visible to anyone else until
    /// [`LedgerTransaction::commit`] succeeds. Dropping the transaction without committing it rolls it back.
    async fn begin(&self) -> Result<Self::Tx, LedgerError>;
}

/// An open unit of work. It exposes the same operations as
/// [`LedgerRepository`](super::LedgerRepository), all applied atomically on commit.
#[async_trait]
pub trait LedgerTransaction: Send + Sized {
    async fn add_user(&mut self, login: &str, password: &str) -> Result<User, LedgerError>;
    async fn find_user_by_login(&mut self, login: &str) -> Result<User, LedgerError>;
    async fn find_user_by_id(&mut self, user_id: i64) -> Result<User, LedgerError>;
    async fn add_order(&mut self, number: &str, user_id: i64) -> Result<Order, LedgerError>;
    async fn find_order_by_number(&mut self, number: &str) -> Result<Order, LedgerError>;
    async fn orders_for_user(&mut self, user_id: i64) -> Result<Vec<Order>, LedgerError>;
    async fn unprocessed_orders(&mut self) -> Result<Vec<Order>, LedgerError>;
    async fn update_order_status(
        &mut self,
        order_id: i64,
        status: OrderStatusType,
        accrual: Points,
    ) -> Result<(), LedgerError>;
    async fn update_user_accrued_total(&mut self, user_id: i64, total: Points) -> Result<(), LedgerError>;
    async fn update_user_withdrawn_total(&mut self, user_id: i64, total: Points) -> Result<(), LedgerError>;
    async fn add_withdrawal(&mut self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError>;
    async fn withdrawals_for_user(&mut self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError>;
    async fn sum_withdrawals_for_user(&mut self, user_id: i64) -> Result<Points, LedgerError>;
    async fn sum_accruals_for_user(&mut self, user_id: i64) -> Result<Points, LedgerError>;

    /// Makes every write in this unit of work visible. Fails with `CommitFailed`.
    async fn commit(self) -> Result<(), LedgerError>;
    /// Discards every write in this unit of work.
    async fn rollback(self) -> Result<(), LedgerError>;
}

/// Closes a unit of work according to the outcome of the work done inside it.
///
/// On `Ok` the transaction is committed and the value is returned, unless the commit fails. On `Err` the transaction
/// is rolled back and the original error is returned. A failed rollback is logged, but does not mask the original
/// error.
pub async fn commit_or_rollback<Tx, T, E>(tx: Tx, result: Result<T, E>) -> Result<T, E>
where
    Tx: LedgerTransaction,
    E: From<LedgerError> + std::fmt::Display,
{
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        },
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("🗃️ Could not roll back the unit of work after '{e}'. {rollback_err}");
            }
            Err(e)
        },
    }
}
