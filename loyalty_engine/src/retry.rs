//! # Retry policy
//!
//! Storage and the accrual oracle both fail transiently from time to time. [`RetryPolicy`] re-runs an operation
//! when its error is classified as transient by [`Retryable`], waiting a little longer before each new attempt.
//!
//! The backoff for attempt `i` (counting from zero) is `base_delay + i * step`. [`RetryPolicy`] is a `backon`
//! [`BackoffBuilder`], so the schedule plugs straight into `backon`'s retry combinators. The retries race a
//! [`CancellationToken`], so a shutdown never has to sit out a backoff.
//!
//! Operations that mutate the ledger must be retried as a whole unit of work: the closure handed to
//! [`RetryPolicy::run`] begins, performs and commits its own transaction on every attempt.
use std::{future::Future, time::Duration};

use backon::{BackoffBuilder, Retryable as _};
use log::{debug, warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_STEP: Duration = Duration::from_secs(2);

/// Classifies an error as transient (worth another attempt) or terminal.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for sqlx::Error {
    fn is_retryable(&self) -> bool {
        match self {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
            sqlx::Error::Database(db_err) => db_err.code().map(|code| is_transient_db_code(&code)).unwrap_or(false),
            _ => false,
        }
    }
}

impl Retryable for reqwest::Error {
    fn is_retryable(&self) -> bool {
        self.is_connect() || self.is_timeout()
    }
}

/// SQLSTATE class `08` is "connection exception". SQLite reports BUSY (5), LOCKED (6) and their extended codes
/// when another connection holds the write lock.
fn is_transient_db_code(code: &str) -> bool {
    code.starts_with("08") || matches!(code, "5" | "6" | "261" | "262" | "517")
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("The operation was cancelled")]
    Cancelled,
    #[error("{0}")]
    Failed(E),
}

impl<E> RetryError<E> {
    /// Converts the wrapped error, leaving `Cancelled` alone.
    pub fn map_err<F, O: FnOnce(E) -> F>(self, op: O) -> RetryError<F> {
        match self {
            RetryError::Cancelled => RetryError::Cancelled,
            RetryError::Failed(e) => RetryError::Failed(op(e)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// The number of retries after the first attempt. `max_retries = 3` means at most 4 attempts.
    pub max_retries: usize,
    pub base_delay: Duration,
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: DEFAULT_MAX_RETRIES, base_delay: DEFAULT_BASE_DELAY, step: DEFAULT_STEP }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, base_delay: Duration, step: Duration) -> Self {
        Self { max_retries, base_delay, step }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Default::default() }
    }

    pub fn backoff(&self, attempt: usize) -> Duration {
        let multiple = u32::try_from(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_add(self.step.saturating_mul(multiple))
    }

    /// Runs `op` until it succeeds, fails with a terminal error, or the retries are used up.
    ///
    /// If `cancel` fires first, `RetryError::Cancelled` is returned immediately. An attempt that is in flight at that
    /// moment is dropped, which rolls back any unit of work it had open.
    pub async fn run<T, E, F, Fut>(&self, cancel: &CancellationToken, op: F) -> Result<T, RetryError<E>>
    where
        E: Retryable + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }
        let attempts = op
            .retry(*self)
            .when(|e: &E| e.is_retryable())
            .notify(|e: &E, delay: Duration| warn!("🔁️ Transient error ({e}). Retrying in {delay:?}"));
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("🔁️ Cancelled while retrying");
                Err(RetryError::Cancelled)
            },
            result = attempts => result.map_err(|e| {
                if e.is_retryable() {
                    warn!("🔁️ Giving up after {} attempts. Last error: {e}", self.max_retries + 1);
                } else {
                    debug!("🔁️ Terminal error, not retrying: {e}");
                }
                RetryError::Failed(e)
            }),
        }
    }
}

impl BackoffBuilder for RetryPolicy {
    type Backoff = LinearBackoff;

    fn build(self) -> Self::Backoff {
        LinearBackoff { policy: self, attempt: 0 }
    }
}

/// The delays between attempts: `base_delay + i * step` for `i` in `0..max_retries`.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    policy: RetryPolicy,
    attempt: usize,
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.attempt >= self.policy.max_retries {
            return None;
        }
        let delay = self.policy.backoff(self.attempt);
        self.attempt += 1;
        Some(delay)
    }
}
