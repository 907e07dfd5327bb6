//! # Ledger storage contracts
//!
//! Any backend that wants to hold the loyalty ledger implements two traits:
//!
//! * [`LedgerRepository`] exposes the ledger operations in autocommit mode.
//! * [`UnitOfWork`] opens a [`LedgerTransaction`], which exposes the same operations inside a single atomic step.
//!
//! The services never touch a backend directly. They open a unit of work, do their work through it, and hand the
//! transaction and the result to [`commit_or_rollback`].
mod errors;
mod ledger_repository;
mod unit_of_work;

pub use errors::LedgerError;
pub use ledger_repository::LedgerRepository;
pub use unit_of_work::{commit_or_rollback, LedgerTransaction, UnitOfWork};
