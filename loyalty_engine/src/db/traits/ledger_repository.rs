use async_trait::async_trait;

use super::{LedgerError, UnitOfWork};
use crate::db_types::{NewWithdrawal, Order, OrderStatusType, Points, User, Withdrawal};

/// The ledger operations, run in autocommit mode.
///
/// Every call is atomic on its own. To bracket several calls into a single atomic step, open a unit of work with
/// [`UnitOfWork::begin`] and use the same operations on the [`LedgerTransaction`](super::LedgerTransaction) it
/// returns.
///
/// Backends classify their failures (see [`Retryable`](crate::retry::Retryable)) but never retry on their own.
/// Handles are cheap to clone and share a single underlying store.
#[async_trait]
pub trait LedgerRepository: UnitOfWork + Clone + Send + Sync + 'static {
    /// Creates a user with zero totals. Fails with `LoginAlreadyExists` if the login is taken.
    async fn add_user(&self, login: &str, password: &str) -> Result<User, LedgerError>;
    async fn find_user_by_login(&self, login: &str) -> Result<User, LedgerError>;
    async fn find_user_by_id(&self, user_id: i64) -> Result<User, LedgerError>;
    /// Creates an order in the `New` state. Fails with `OrderAlreadyExists` if the number has been used by anyone.
    async fn add_order(&self, number: &str, user_id: i64) -> Result<Order, LedgerError>;
    async fn find_order_by_number(&self, number: &str) -> Result<Order, LedgerError>;
    /// The user's orders, most recently uploaded first.
    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LedgerError>;
    /// All orders in the `New` or `Processing` states, in no particular order.
    async fn unprocessed_orders(&self) -> Result<Vec<Order>, LedgerError>;
    /// Sets the order status. The accrual is only stored for `Processed` orders and is zeroed otherwise.
    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatusType,
        accrual: Points,
    ) -> Result<(), LedgerError>;
    async fn update_user_accrued_total(&self, user_id: i64, total: Points) -> Result<(), LedgerError>;
    async fn update_user_withdrawn_total(&self, user_id: i64, total: Points) -> Result<(), LedgerError>;
    async fn add_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError>;
    /// The user's withdrawals, most recent first.
    async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError>;
    async fn sum_withdrawals_for_user(&self, user_id: i64) -> Result<Points, LedgerError>;
    /// The total accrual over the user's `Processed` orders.
    async fn sum_accruals_for_user(&self, user_id: i64) -> Result<Points, LedgerError>;
}
