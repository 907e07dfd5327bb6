//! # Loyalty engine public API
//!
//! The services in this module are what the HTTP layer talks to. Each is created by supplying a ledger backend that
//! implements [`LedgerRepository`](crate::LedgerRepository):
//!
//! * [`auth_api`] registers users and checks passwords.
//! * [`order_api`] accepts order uploads and lists a user's orders.
//! * [`balance_api`] reports balances, processes withdrawals and runs the reconciliation loop that settles orders
//!   with the accrual system.
//!
//! ```rust,ignore
//! use loyalty_engine::{BalanceApi, AccrualClient, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/lps.db").await?;
//! let oracle = AccrualClient::new("http://localhost:8080", timeout)?;
//! let api = BalanceApi::new(db, oracle).with_shutdown(token);
//! let balance = api.balance(user_id).await?;
//! ```
//!
//! Every service retries transient storage failures with a [`RetryPolicy`](crate::retry::RetryPolicy), one whole
//! unit of work at a time, and stops retrying as soon as its shutdown token is cancelled.
pub mod auth_api;
pub mod balance_api;
pub mod errors;
pub mod order_api;
