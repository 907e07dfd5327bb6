//! An in-process ledger backend.
//!
//! The whole ledger lives in a set of maps behind a mutex. Units of work are emulated by snapshotting the maps when
//! the unit of work begins and putting the snapshot back if it is rolled back. Only one unit of work can be open on a
//! store at a time; `begin` fails with [`LedgerError::AlreadyInTransaction`] while another is open. Autocommit calls
//! wait for the open unit of work to finish, so they never see its partial writes.
mod store;

use std::{
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use log::*;
use store::Collections;
use tokio::sync::OwnedMutexGuard;

use crate::{
    db::traits::{LedgerError, LedgerRepository, LedgerTransaction, UnitOfWork},
    db_types::{NewWithdrawal, Order, OrderStatusType, Points, User, Withdrawal},
};

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    store: Arc<Mutex<Collections>>,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl Debug for MemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryDatabase")
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    async fn autocommit<T, F>(&self, op: F) -> Result<T, LedgerError>
    where F: FnOnce(&mut Collections) -> Result<T, LedgerError> {
        let _gate = self.gate.lock().await;
        with_store(&self.store, op)
    }
}

fn with_store<T, F>(store: &Mutex<Collections>, op: F) -> Result<T, LedgerError>
where F: FnOnce(&mut Collections) -> Result<T, LedgerError> {
    let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
    op(&mut store)
}

#[async_trait]
impl UnitOfWork for MemoryDatabase {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx, LedgerError> {
        let gate = self.gate.clone().try_lock_owned().map_err(|_| LedgerError::AlreadyInTransaction)?;
        let snapshot = with_store(&self.store, |s| Ok(s.clone()))?;
        trace!("🗃️ Memory unit of work opened");
        Ok(MemoryTransaction { store: Arc::clone(&self.store), snapshot: Some(snapshot), _gate: gate })
    }
}

#[async_trait]
impl LedgerRepository for MemoryDatabase {
    async fn add_user(&self, login: &str, password: &str) -> Result<User, LedgerError> {
        self.autocommit(|s| s.add_user(login, password)).await
    }

    async fn find_user_by_login(&self, login: &str) -> Result<User, LedgerError> {
        self.autocommit(|s| s.find_user_by_login(login)).await
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<User, LedgerError> {
        self.autocommit(|s| s.find_user_by_id(user_id)).await
    }

    async fn add_order(&self, number: &str, user_id: i64) -> Result<Order, LedgerError> {
        self.autocommit(|s| s.add_order(number, user_id)).await
    }

    async fn find_order_by_number(&self, number: &str) -> Result<Order, LedgerError> {
        self.autocommit(|s| s.find_order_by_number(number)).await
    }

    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LedgerError> {
        self.autocommit(|s| Ok(s.orders_for_user(user_id))).await
    }

    async fn unprocessed_orders(&self) -> Result<Vec<Order>, LedgerError> {
        self.autocommit(|s| Ok(s.unprocessed_orders())).await
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatusType,
        accrual: Points,
    ) -> Result<(), LedgerError> {
        self.autocommit(|s| s.update_order_status(order_id, status, accrual)).await
    }

    async fn update_user_accrued_total(&self, user_id: i64, total: Points) -> Result<(), LedgerError> {
        self.autocommit(|s| s.update_user_accrued_total(user_id, total)).await
    }

    async fn update_user_withdrawn_total(&self, user_id: i64, total: Points) -> Result<(), LedgerError> {
        self.autocommit(|s| s.update_user_withdrawn_total(user_id, total)).await
    }

    async fn add_withdrawal(&self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        self.autocommit(|s| s.add_withdrawal(withdrawal)).await
    }

    async fn withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        self.autocommit(|s| Ok(s.withdrawals_for_user(user_id))).await
    }

    async fn sum_withdrawals_for_user(&self, user_id: i64) -> Result<Points, LedgerError> {
        self.autocommit(|s| s.sum_withdrawals_for_user(user_id)).await
    }

    async fn sum_accruals_for_user(&self, user_id: i64) -> Result<Points, LedgerError> {
        self.autocommit(|s| s.sum_accruals_for_user(user_id)).await
    }
}

/// A unit of work on a [`MemoryDatabase`].
///
/// Writes are applied to the live collections straight away. The gate it holds keeps every other caller out until
/// the transaction is committed, rolled back or dropped. Dropping it without committing restores the snapshot.
pub struct MemoryTransaction {
    store: Arc<Mutex<Collections>>,
    snapshot: Option<Collections>,
    _gate: OwnedMutexGuard<()>,
}

impl MemoryTransaction {
    fn apply<T, F>(&mut self, op: F) -> Result<T, LedgerError>
    where F: FnOnce(&mut Collections) -> Result<T, LedgerError> {
        with_store(&self.store, op)
    }

    fn restore_snapshot(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
            *store = snapshot;
        }
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.snapshot.is_some() {
            debug!("🗃️ Memory unit of work dropped without a commit. Rolling back.");
            self.restore_snapshot();
        }
    }
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn add_user(&mut self, login: &str, password: &str) -> Result<User, LedgerError> {
        self.apply(|s| s.add_user(login, password))
    }

    async fn find_user_by_login(&mut self, login: &str) -> Result<User, LedgerError> {
        self.apply(|s| s.find_user_by_login(login))
    }

    async fn find_user_by_id(&mut self, user_id: i64) -> Result<User, LedgerError> {
        self.apply(|s| s.find_user_by_id(user_id))
    }

    async fn add_order(&mut self, number: &str, user_id: i64) -> Result<Order, LedgerError> {
        self.apply(|s| s.add_order(number, user_id))
    }

    async fn find_order_by_number(&mut self, number: &str) -> Result<Order, LedgerError> {
        self.apply(|s| s.find_order_by_number(number))
    }

    async fn orders_for_user(&mut self, user_id: i64) -> Result<Vec<Order>, LedgerError> {
        self.apply(|s| Ok(s.orders_for_user(user_id)))
    }

    async fn unprocessed_orders(&mut self) -> Result<Vec<Order>, LedgerError> {
        self.apply(|s| Ok(s.unprocessed_orders()))
    }

    async fn update_order_status(
        &mut self,
        order_id: i64,
        status: OrderStatusType,
        accrual: Points,
    ) -> Result<(), LedgerError> {
        self.apply(|s| s.update_order_status(order_id, status, accrual))
    }

    async fn update_user_accrued_total(&mut self, user_id: i64, total: Points) -> Result<(), LedgerError> {
        self.apply(|s| s.update_user_accrued_total(user_id, total))
    }

    async fn update_user_withdrawn_total(&mut self, user_id: i64, total: Points) -> Result<(), LedgerError> {
        self.apply(|s| s.update_user_withdrawn_total(user_id, total))
    }

    async fn add_withdrawal(&mut self, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        self.apply(|s| s.add_withdrawal(withdrawal))
    }

    async fn withdrawals_for_user(&mut self, user_id: i64) -> Result<Vec<Withdrawal>, LedgerError> {
        self.apply(|s| Ok(s.withdrawals_for_user(user_id)))
    }

    async fn sum_withdrawals_for_user(&mut self, user_id: i64) -> Result<Points, LedgerError> {
        self.apply(|s| s.sum_withdrawals_for_user(user_id))
    }

    async fn sum_accruals_for_user(&mut self, user_id: i64) -> Result<Points, LedgerError> {
        self.apply(|s| s.sum_accruals_for_user(user_id))
    }

    async fn commit(mut self) -> Result<(), LedgerError> {
        self.snapshot = None;
        trace!("🗃️ Memory unit of work committed");
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), LedgerError> {
        self.restore_snapshot();
        trace!("🗃️ Memory unit of work rolled back");
        Ok(())
    }
}
