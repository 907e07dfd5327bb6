use std::fmt::Debug;

use chrono::{DateTime, Utc};
use loyalty_engine::db_types::{Order, OrderStatusType, Points, Withdrawal};
use serde::{Deserialize, Serialize};

/// The body of the register and login requests.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credentials({}, ****)", self.login)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub number: String,
    pub status: OrderStatusType,
    /// Only present once the order has been processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderResult {
    fn from(order: Order) -> Self {
        let accrual = (order.status == OrderStatusType::Processed).then_some(order.accrual);
        Self { number: order.number, status: order.status, accrual, uploaded_at: order.uploaded_at }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub order: String,
    pub sum: Points,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalResult {
    pub order: String,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalResult {
    fn from(w: Withdrawal) -> Self {
        Self { order: w.order_number, sum: w.amount, processed_at: w.processed_at }
    }
}
