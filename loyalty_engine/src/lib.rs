//! Loyalty Engine
//!
//! The loyalty engine keeps track of the points users earn on their orders, and the points they spend. Users upload
//! order numbers; an external accrual system decides, in its own time, how many points each order is worth; users
//! withdraw points against future orders.
//!
//! The library is divided into these main sections:
//! 1. Ledger storage ([`mod@db`]). The [`LedgerRepository`] and [`UnitOfWork`] traits define what a backend must
//!    provide. SQLite and in-memory backends are included. The data types stored in the ledger are defined in
//!    [`db_types`].
//! 2. The accrual system client ([`accrual`]).
//! 3. The public API ([`lps_api`]), which the HTTP server is built on.
//! 4. The [`retry`] policy that all of the above share.
pub mod accrual;
pub mod db;
pub mod db_types;
pub mod helpers;
pub mod lps_api;
pub mod retry;

pub use accrual::{AccrualClient, AccrualClientError, AccrualOracle, AccrualReport, AccrualStatus, InvalidAccrual};
pub use db::memory::MemoryDatabase;
#[cfg(feature = "sqlite")]
pub use db::sqlite::db::{SqliteDatabase, SqliteTransaction};
pub use db::traits::{commit_or_rollback, LedgerError, LedgerRepository, LedgerTransaction, UnitOfWork};
pub use lps_api::{
    auth_api::AuthApi,
    balance_api::{BalanceApi, ReconciliationSummary, DEFAULT_RECONCILE_INTERVAL},
    errors::{AuthApiError, BalanceApiError, OrderApiError},
    order_api::{OrderApi, OrderSubmission},
};
pub use retry::{RetryError, RetryPolicy, Retryable};
