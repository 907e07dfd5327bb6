use thiserror::Error;

use crate::retry::Retryable;

/// The storage vocabulary shared by every ledger backend.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database driver error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("User not found: {0}")]
    UserNotFound(i64),
    #[error("No user with login {0}")]
    UserLoginNotFound(String),
    #[error("Order not found: {0}")]
    OrderNotFound(String),
    #[error("This login is already taken")]
    LoginAlreadyExists,
    #[error("Order {0} has already been uploaded")]
    OrderAlreadyExists(String),
    #[error("Another unit of work is already open on this store")]
    AlreadyInTransaction,
    #[error("The point total for user #{0} is out of range")]
    TotalOutOfRange(i64),
    #[error("Could not commit the unit of work: {0}")]
    CommitFailed(#[source] sqlx::Error),
}

impl LedgerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound(_) | Self::UserLoginNotFound(_) | Self::OrderNotFound(_))
    }
}

impl Retryable for LedgerError {
    fn is_retryable(&self) -> bool {
        match self {
            LedgerError::DriverError(e) | LedgerError::CommitFailed(e) => e.is_retryable(),
            // Contention on the in-memory store. It clears as soon as the open unit of work finishes.
            LedgerError::AlreadyInTransaction => true,
            _ => false,
        }
    }
}
