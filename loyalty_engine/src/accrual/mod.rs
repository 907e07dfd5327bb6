//! # Accrual system client
//!
//! The accrual system is an external service that decides how many points an order is worth. It is polled, one
//! order at a time, by the reconciliation loop. An order the accrual system has not heard of yet is reported as
//! `Ok(None)`, which is not an error.
mod client;
mod objects;

use async_trait::async_trait;
pub use client::{AccrualClient, DEFAULT_ORACLE_TIMEOUT};
pub use objects::{AccrualReport, AccrualStatus, InvalidAccrual, MAX_ORDER_ACCRUAL};
use thiserror::Error;

use crate::retry::Retryable;

#[derive(Debug, Error)]
pub enum AccrualClientError {
    #[error("Accrual system request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Accrual system returned an unexpected status code: {0}")]
    UnexpectedStatus(u16),
}

impl Retryable for AccrualClientError {
    fn is_retryable(&self) -> bool {
        match self {
            AccrualClientError::Request(e) => e.is_retryable(),
            AccrualClientError::UnexpectedStatus(_) => false,
        }
    }
}

/// The source of truth for order rewards.
#[async_trait]
pub trait AccrualOracle: Send + Sync + 'static {
    /// Asks for the current status of the order. `None` means the order is not registered yet.
    async fn fetch_accrual(&self, number: &str) -> Result<Option<AccrualReport>, AccrualClientError>;
}
