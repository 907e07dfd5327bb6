use thiserror::Error;

use crate::{db::traits::LedgerError, retry::RetryError};

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The request was cancelled")]
    Cancelled,
}

impl From<RetryError<LedgerError>> for OrderApiError {
    fn from(e: RetryError<LedgerError>) -> Self {
        match e {
            RetryError::Cancelled => Self::Cancelled,
            RetryError::Failed(e) => Self::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum BalanceApiError {
    #[error("Order number is not valid")]
    InvalidOrderFormat,
    #[error("There are not enough points in the account")]
    InsufficientBalance,
    #[error("Withdrawal amounts must be positive")]
    InvalidAmount,
    #[error("User not found: {0}")]
    UserNotFound(i64),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The request was cancelled")]
    Cancelled,
}

impl From<LedgerError> for BalanceApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::UserNotFound(id) => Self::UserNotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<RetryError<LedgerError>> for BalanceApiError {
    fn from(e: RetryError<LedgerError>) -> Self {
        match e {
            RetryError::Cancelled => Self::Cancelled,
            RetryError::Failed(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Login must not be empty")]
    InvalidLogin,
    #[error("Password must not be empty")]
    InvalidPassword,
    #[error("This login is already taken")]
    LoginAlreadyExists,
    #[error("Invalid login or password")]
    InvalidCredentials,
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Could not hash password: {0}")]
    HashingError(String),
}

impl From<RetryError<LedgerError>> for AuthApiError {
    fn from(e: RetryError<LedgerError>) -> Self {
        match e {
            RetryError::Cancelled => Self::DatabaseError("The request was cancelled".to_string()),
            RetryError::Failed(LedgerError::LoginAlreadyExists) => Self::LoginAlreadyExists,
            RetryError::Failed(LedgerError::UserLoginNotFound(_)) => Self::InvalidCredentials,
            RetryError::Failed(e) => Self::DatabaseError(e.to_string()),
        }
    }
}
