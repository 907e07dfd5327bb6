use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    db::traits::{commit_or_rollback, LedgerError, LedgerRepository, LedgerTransaction, UnitOfWork},
    db_types::Order,
    helpers::is_valid_order_number,
    lps_api::errors::OrderApiError,
    retry::RetryPolicy,
};

/// The outcome of uploading an order number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSubmission {
    /// A new order was created.
    Accepted,
    /// The caller uploaded this number before. Nothing changed.
    SubmittedByThisUser,
    /// Somebody else owns this number. Nothing changed.
    SubmittedByAnotherUser,
    /// The number failed the format check.
    InvalidFormat,
    /// Storage failed. The details have been logged.
    InternalError,
}

impl OrderSubmission {
    fn for_existing(order: &Order, user_id: i64) -> Self {
        if order.user_id == user_id {
            Self::SubmittedByThisUser
        } else {
            Self::SubmittedByAnotherUser
        }
    }
}

/// `OrderApi` accepts order numbers from users and lists their orders.
pub struct OrderApi<B> {
    db: B,
    retry: RetryPolicy,
    shutdown: CancellationToken,
}

impl<B> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi")
    }
}

impl<B> OrderApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, retry: RetryPolicy::default(), shutdown: CancellationToken::new() }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

impl<B> OrderApi<B>
where B: LedgerRepository
{
    /// Records `number` against the user, unless somebody has already uploaded it.
    ///
    /// If two users upload the same new number at the same time, the unique constraint on order numbers picks a
    /// winner, and the loser is told that the order belongs to someone else.
    pub async fn register_order_number(&self, user_id: i64, number: &str) -> OrderSubmission {
        if !is_valid_order_number(number) {
            debug!("🔄️📦️ User #{user_id} uploaded an invalid order number: '{number}'");
            return OrderSubmission::InvalidFormat;
        }
        match self.retry.run(&self.shutdown, move || self.submit_order(user_id, number)).await {
            Ok(outcome) => {
                debug!("🔄️📦️ Order {number} from user #{user_id}: {outcome:?}");
                outcome
            },
            Err(e) => {
                error!("🔄️📦️ Could not register order {number} for user #{user_id}. {e}");
                OrderSubmission::InternalError
            },
        }
    }

    /// The user's orders, most recently uploaded first.
    pub async fn order_list(&self, user_id: i64) -> Result<Vec<Order>, OrderApiError> {
        let orders = self.retry.run(&self.shutdown, move || self.db.orders_for_user(user_id)).await?;
        trace!("🔄️📦️ User #{user_id} has {} orders", orders.len());
        Ok(orders)
    }

    async fn submit_order(&self, user_id: i64, number: &str) -> Result<OrderSubmission, LedgerError> {
        let mut tx = self.db.begin().await?;
        let result = Self::submit_order_in_tx(&mut tx, user_id, number).await;
        match commit_or_rollback(tx, result).await {
            Err(LedgerError::OrderAlreadyExists(_)) => {
                info!("🔄️📦️ Lost the race to insert order {number}. Checking who owns it.");
                let winner = self.db.find_order_by_number(number).await?;
                Ok(OrderSubmission::for_existing(&winner, user_id))
            },
            result => result,
        }
    }

    async fn submit_order_in_tx(
        tx: &mut <B as UnitOfWork>::Tx,
        user_id: i64,
        number: &str,
    ) -> Result<OrderSubmission, LedgerError> {
        match tx.find_order_by_number(number).await {
            Ok(order) => Ok(OrderSubmission::for_existing(&order, user_id)),
            Err(LedgerError::OrderNotFound(_)) => {
                let order = tx.add_order(number, user_id).await?;
                info!("🔄️📦️ Order {number} accepted for user #{user_id} as #{}", order.id);
                Ok(OrderSubmission::Accepted)
            },
            Err(e) => Err(e),
        }
    }
}
