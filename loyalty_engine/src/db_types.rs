use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use lps_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------        User           ---------------------------------------------------------
/// A registered user and their running ledger totals.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
    /// The password credential. This is an opaque hash string as far as the ledger is concerned.
    pub password: String,
    /// The sum of points ever awarded to this user.
    pub accrued_total: Points,
    /// The sum of points ever withdrawn by this user.
    pub withdrawn_total: Points,
}

impl User {
    /// The points available for withdrawal.
    pub fn current_balance(&self) -> Points {
        self.accrued_total - self.withdrawn_total
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been uploaded, but the accrual system has not looked at it yet.
    New,
    /// The accrual system is calculating the reward for the order.
    Processing,
    /// The accrual system refused to calculate a reward. Terminal.
    Invalid,
    /// The reward has been calculated. Terminal.
    Processed,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "NEW"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Invalid => write!(f, "INVALID"),
            OrderStatusType::Processed => write!(f, "PROCESSED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Order {
    pub id: i64,
    /// The externally visible order number. Unique across all users.
    pub number: String,
    pub user_id: i64,
    pub status: OrderStatusType,
    /// The points awarded for this order. Only meaningful once the order is `Processed`.
    pub accrual: Points,
    pub uploaded_at: DateTime<Utc>,
}

//--------------------------------------     Withdrawal        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    /// The (hypothetical) order number the points are spent against. It need not be an order known to the system.
    pub order_number: String,
    pub amount: Points,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawal {
    pub user_id: i64,
    pub order_number: String,
    pub amount: Points,
    pub processed_at: DateTime<Utc>,
}

impl NewWithdrawal {
    pub fn new(user_id: i64, order_number: String, amount: Points) -> Self {
        Self { user_id, order_number, amount, processed_at: Utc::now() }
    }
}

//--------------------------------------       Balance         ---------------------------------------------------------
/// The derived ledger view for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub current: Points,
    pub withdrawn: Points,
}

impl From<&User> for Balance {
    fn from(user: &User) -> Self {
        Self { current: user.current_balance(), withdrawn: user.withdrawn_total }
    }
}
