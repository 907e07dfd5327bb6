//! # Loyalty points server
//! This crate hosts the HTTP server for the loyalty points system. It is responsible for:
//! * Registering users and issuing access tokens.
//! * Accepting order numbers from users and listing them back.
//! * Serving balances and processing withdrawals.
//! * Running the accrual worker, which asks the accrual system about unfinished orders and credits users for them.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/user/register`, `/api/user/login`: Account creation and login.
//! * `/api/user/orders`: Upload (POST) and list (GET) order numbers.
//! * `/api/user/balance`, `/api/user/balance/withdraw`, `/api/user/withdrawals`: The points ledger.
pub mod accrual_worker;
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
