use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{OrderStatusType, Points};

/// The largest reward accepted for a single order: one billion points.
pub const MAX_ORDER_ACCRUAL: Points = Points::from_units(100_000_000_000);

/// A reward the ledger refuses to record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidAccrual {
    #[error("The accrual {0} is negative")]
    Negative(Points),
    #[error("The accrual {0} is more than the one billion points allowed for one order")]
    TooLarge(Points),
}

/// The states the accrual system reports for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    /// The accrual system knows about the order, but has not started calculating the reward.
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl From<AccrualStatus> for OrderStatusType {
    fn from(status: AccrualStatus) -> Self {
        match status {
            AccrualStatus::Registered | AccrualStatus::Processing => OrderStatusType::Processing,
            AccrualStatus::Invalid => OrderStatusType::Invalid,
            AccrualStatus::Processed => OrderStatusType::Processed,
        }
    }
}

/// A definitive answer from the accrual system about a single order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualReport {
    pub order: String,
    pub status: AccrualStatus,
    /// Only present once the order is `PROCESSED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
}

impl AccrualReport {
    pub fn order_status(&self) -> OrderStatusType {
        self.status.into()
    }

    /// The reward to record against the order. Zero unless the order has been processed.
    ///
    /// Rewards outside `0..=MAX_ORDER_ACCRUAL` are rejected, since recording them would break the ledger totals.
    pub fn accrual_amount(&self) -> Result<Points, InvalidAccrual> {
        let amount = match self.status {
            AccrualStatus::Processed => self.accrual.unwrap_or_default(),
            _ => return Ok(Points::default()),
        };
        if amount.is_negative() {
            return Err(InvalidAccrual::Negative(amount));
        }
        if amount > MAX_ORDER_ACCRUAL {
            return Err(InvalidAccrual::TooLarge(amount));
        }
        Ok(amount)
    }
}
