//! # Balances, withdrawals and reconciliation
//!
//! [`BalanceApi`] owns the two ways that a user's totals change:
//!
//! * Withdrawals, requested by the user, raise `withdrawn_total`.
//! * Reconciliation, run in the background, walks every unfinished order through the accrual system and raises
//!   `accrued_total` when an order is processed.
//!
//! In both cases the total is recomputed from scratch as a sum over the user's rows inside the same unit of work
//! that changed those rows. Re-running either step can therefore never count the same points twice.
//!
//! Order states only move forward: `NEW -> PROCESSING -> {PROCESSED, INVALID}`. Terminal orders are never touched
//! again, even if the accrual system later changes its mind.
use std::{fmt::Debug, time::Duration};

use log::*;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{
    accrual::AccrualOracle,
    db::traits::{commit_or_rollback, LedgerError, LedgerRepository, LedgerTransaction, UnitOfWork},
    db_types::{Balance, NewWithdrawal, OrderStatusType, Points, Withdrawal},
    helpers::is_valid_order_number,
    lps_api::errors::BalanceApiError,
    retry::{RetryError, RetryPolicy, Retryable},
};

pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(3);

/// What happened during one pass over the unfinished orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationSummary {
    /// Orders whose status changed.
    pub updated: usize,
    /// Orders the accrual system does not know about yet, or whose status did not change.
    pub skipped: usize,
    /// Orders that could not be checked or updated this time around.
    pub failed: usize,
}

/// A failed withdrawal, as seen from inside the unit of work.
#[derive(Debug, Error)]
enum WithdrawalFailure {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("Insufficient balance")]
    InsufficientBalance,
}

impl Retryable for WithdrawalFailure {
    fn is_retryable(&self) -> bool {
        match self {
            WithdrawalFailure::Ledger(e) => e.is_retryable(),
            WithdrawalFailure::InsufficientBalance => false,
        }
    }
}

impl From<RetryError<WithdrawalFailure>> for BalanceApiError {
    fn from(e: RetryError<WithdrawalFailure>) -> Self {
        match e {
            RetryError::Cancelled => Self::Cancelled,
            RetryError::Failed(WithdrawalFailure::InsufficientBalance) => Self::InsufficientBalance,
            RetryError::Failed(WithdrawalFailure::Ledger(e)) => e.into(),
        }
    }
}

pub struct BalanceApi<B, O> {
    db: B,
    oracle: O,
    retry: RetryPolicy,
    shutdown: CancellationToken,
}

impl<B, O> Debug for BalanceApi<B, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BalanceApi ({:?})", self.retry)
    }
}

impl<B, O> BalanceApi<B, O> {
    pub fn new(db: B, oracle: O) -> Self {
        Self { db, oracle, retry: RetryPolicy::default(), shutdown: CancellationToken::new() }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Every retry wait and the reconciliation loop stop when this token is cancelled.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

impl<B, O> BalanceApi<B, O>
where
    B: LedgerRepository,
    O: AccrualOracle,
{
    pub async fn balance(&self, user_id: i64) -> Result<Balance, BalanceApiError> {
        let user = self.retry.run(&self.shutdown, move || self.db.find_user_by_id(user_id)).await?;
        Ok(Balance::from(&user))
    }

    /// The user's withdrawals, most recent first.
    pub async fn withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, BalanceApiError> {
        let withdrawals = self.retry.run(&self.shutdown, move || self.db.withdrawals_for_user(user_id)).await?;
        Ok(withdrawals)
    }

    /// Spends `amount` points from the user's balance against `order_number`.
    ///
    /// The order number must pass the format check, but it does not need to belong to an uploaded order.
    pub async fn withdraw(
        &self,
        user_id: i64,
        order_number: &str,
        amount: Points,
    ) -> Result<Withdrawal, BalanceApiError> {
        if !is_valid_order_number(order_number) {
            return Err(BalanceApiError::InvalidOrderFormat);
        }
        if !amount.is_positive() {
            return Err(BalanceApiError::InvalidAmount);
        }
        let withdrawal =
            self.retry.run(&self.shutdown, move || self.withdraw_once(user_id, order_number, amount)).await?;
        info!("💸️ User #{user_id} withdrew {amount} against order {order_number}");
        Ok(withdrawal)
    }

    async fn withdraw_once(
        &self,
        user_id: i64,
        order_number: &str,
        amount: Points,
    ) -> Result<Withdrawal, WithdrawalFailure> {
        let mut tx = self.db.begin().await?;
        let result = Self::withdraw_in_tx(&mut tx, user_id, order_number, amount).await;
        commit_or_rollback(tx, result).await
    }

    async fn withdraw_in_tx(
        tx: &mut <B as UnitOfWork>::Tx,
        user_id: i64,
        order_number: &str,
        amount: Points,
    ) -> Result<Withdrawal, WithdrawalFailure> {
        let user = tx.find_user_by_id(user_id).await?;
        if (user.current_balance() - amount).is_negative() {
            debug!("💸️ User #{user_id} has {} and cannot withdraw {amount}", user.current_balance());
            return Err(WithdrawalFailure::InsufficientBalance);
        }
        let withdrawal = tx.add_withdrawal(NewWithdrawal::new(user_id, order_number.to_string(), amount)).await?;
        let withdrawn = tx.sum_withdrawals_for_user(user_id).await?;
        tx.update_user_withdrawn_total(user_id, withdrawn).await?;
        Ok(withdrawal)
    }

    /// Runs [`Self::reconcile_pending_orders`] every `period` until the shutdown token is cancelled.
    ///
    /// Failures are logged and the loop carries on. Only cancellation stops it.
    pub async fn run_reconciliation_loop(&self, period: Duration) {
        info!("🕰️ Reconciliation loop started. Checking unfinished orders every {period:?}");
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = interval.tick() => {
                    match self.reconcile_pending_orders().await {
                        Ok(summary) if summary == ReconciliationSummary::default() => {
                            trace!("🕰️ Nothing to reconcile");
                        },
                        Ok(summary) => {
                            info!(
                                "🕰️ Reconciliation pass complete. {} updated, {} skipped, {} failed",
                                summary.updated, summary.skipped, summary.failed
                            );
                        },
                        Err(BalanceApiError::Cancelled) => break,
                        Err(e) => warn!("🕰️ Reconciliation pass failed. {e}"),
                    }
                }
            }
        }
        info!("🕰️ Reconciliation loop stopped");
    }

    /// Makes a single pass over every order that is not in a terminal state.
    pub async fn reconcile_pending_orders(&self) -> Result<ReconciliationSummary, BalanceApiError> {
        let orders = self.retry.run(&self.shutdown, move || self.db.unprocessed_orders()).await?;
        let mut summary = ReconciliationSummary::default();
        for order in orders {
            let number = order.number.as_str();
            let report = match self.retry.run(&self.shutdown, move || self.oracle.fetch_accrual(number)).await {
                Ok(Some(report)) => report,
                Ok(None) => {
                    summary.skipped += 1;
                    continue;
                },
                Err(RetryError::Cancelled) => return Err(BalanceApiError::Cancelled),
                Err(RetryError::Failed(e)) => {
                    warn!("🕰️ Could not fetch accrual for order {number}. {e}");
                    summary.failed += 1;
                    continue;
                },
            };
            let status = report.order_status();
            let accrual = match report.accrual_amount() {
                Ok(accrual) => accrual,
                Err(e) => {
                    warn!("🕰️ Ignoring the accrual system's report for order {number}. {e}");
                    summary.failed += 1;
                    continue;
                },
            };
            match self.retry.run(&self.shutdown, move || self.apply_report(number, status, accrual)).await {
                Ok(true) => summary.updated += 1,
                Ok(false) => summary.skipped += 1,
                Err(RetryError::Cancelled) => return Err(BalanceApiError::Cancelled),
                Err(RetryError::Failed(e)) => {
                    warn!("🕰️ Could not update order {number}. {e}");
                    summary.failed += 1;
                },
            }
        }
        Ok(summary)
    }

    /// Applies the accrual system's verdict to the order. Returns whether anything changed.
    async fn apply_report(&self, number: &str, status: OrderStatusType, accrual: Points) -> Result<bool, LedgerError> {
        let mut tx = self.db.begin().await?;
        let result = Self::apply_report_in_tx(&mut tx, number, status, accrual).await;
        commit_or_rollback(tx, result).await
    }

    async fn apply_report_in_tx(
        tx: &mut <B as UnitOfWork>::Tx,
        number: &str,
        status: OrderStatusType,
        accrual: Points,
    ) -> Result<bool, LedgerError> {
        // Re-read inside the unit of work. Another pass may have finished this order since the work queue was built.
        let order = tx.find_order_by_number(number).await?;
        if order.status.is_terminal() || order.status == status {
            trace!("🕰️ Order {number} stays {}", order.status);
            return Ok(false);
        }
        tx.update_order_status(order.id, status, accrual).await?;
        let accrued = tx.sum_accruals_for_user(order.user_id).await?;
        tx.update_user_accrued_total(order.user_id, accrued).await?;
        debug!("🕰️ Order {number} moved from {} to {status}. User #{} has accrued {accrued}", order.status, order.user_id);
        Ok(true)
    }
}
