use std::fmt::Debug;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::*;
use tokio_util::sync::CancellationToken;

use crate::{
    db::traits::{commit_or_rollback, LedgerError, LedgerRepository, LedgerTransaction, UnitOfWork},
    db_types::User,
    lps_api::errors::AuthApiError,
    retry::RetryPolicy,
};

/// `AuthApi` registers users and checks their credentials. Passwords are stored as Argon2 PHC strings.
pub struct AuthApi<B> {
    db: B,
    retry: RetryPolicy,
    shutdown: CancellationToken,
}

impl<B> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi")
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, retry: RetryPolicy::default(), shutdown: CancellationToken::new() }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

impl<B> AuthApi<B>
where B: LedgerRepository
{
    /// Creates a new user. Logins are unique.
    pub async fn register(&self, login: &str, password: &str) -> Result<User, AuthApiError> {
        if login.trim().is_empty() {
            return Err(AuthApiError::InvalidLogin);
        }
        if password.is_empty() {
            return Err(AuthApiError::InvalidPassword);
        }
        let hash = hash_password(password)?;
        let hash = hash.as_str();
        let user = self.retry.run(&self.shutdown, move || self.insert_user(login, hash)).await?;
        info!("🔑️ New user '{login}' registered as #{}", user.id);
        Ok(user)
    }

    /// Returns the user if `password` matches the stored credential. Unknown logins and wrong passwords are not
    /// distinguished.
    pub async fn login(&self, login: &str, password: &str) -> Result<User, AuthApiError> {
        let user = self.retry.run(&self.shutdown, move || self.db.find_user_by_login(login)).await?;
        if !verify_password(password, &user.password)? {
            debug!("🔑️ Wrong password for '{login}'");
            return Err(AuthApiError::InvalidCredentials);
        }
        trace!("🔑️ User '{login}' logged in");
        Ok(user)
    }

    async fn insert_user(&self, login: &str, hash: &str) -> Result<User, LedgerError> {
        let mut tx = self.db.begin().await?;
        let result = Self::insert_user_in_tx(&mut tx, login, hash).await;
        commit_or_rollback(tx, result).await
    }

    async fn insert_user_in_tx(
        tx: &mut <B as UnitOfWork>::Tx,
        login: &str,
        hash: &str,
    ) -> Result<User, LedgerError> {
        tx.add_user(login, hash).await
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthApiError::HashingError(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthApiError> {
    let parsed = PasswordHash::new(hash).map_err(|e| AuthApiError::HashingError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}
