//! Retry policy for remote submissions
//!
//! A [`RetryPolicy`] bundles the three decisions of a retry loop: how many
//! attempts in total, how long to wait between them ([`Backoff`]), and which
//! errors are worth another attempt (the retryable predicate). Adapters wrap
//! individual remote calls with [`RetryPolicy::run`].
//!
//! ```rust,ignore
//! let policy = RetryPolicy::new(3, Backoff::exponential(
//!     Duration::from_millis(200),
//!     Duration::from_secs(5),
//! ));
//!
//! let info = policy
//!     .run(&cancel, "change_resource_record_sets", |_attempt| submit())
//!     .await?;
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cancel;
use crate::config::RetryConfig;
use crate::error::{Error, Result};

/// Decides whether an error is worth retrying
pub type RetryPredicate = fn(&Error) -> bool;

/// Delay between consecutive attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately
    None,
    /// Same delay before every retry
    Fixed(Duration),
    /// `initial * 2^(retry - 1)`, capped at `max`
    Exponential {
        /// Delay before the first retry
        initial: Duration,
        /// Upper bound for any delay
        max: Duration,
    },
}

impl Backoff {
    /// Capped exponential backoff
    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Backoff::Exponential { initial, max }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay(&self, retry: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(retry.saturating_sub(1));
                initial.saturating_mul(factor).min(*max)
            }
        }
    }
}

/// Explicit retry policy
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
    retryable: RetryPredicate,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Create a policy retrying [`Error::is_retryable`] errors
    ///
    /// `max_attempts` counts every attempt including the first; zero is
    /// treated as one.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            retryable: Error::is_retryable,
        }
    }

    /// A policy that makes exactly one attempt
    pub fn single_attempt() -> Self {
        Self::new(1, Backoff::None)
    }

    /// Build the policy described by `config`
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Backoff::exponential(
                Duration::from_millis(config.initial_backoff_ms),
                Duration::from_millis(config.max_backoff_ms),
            ),
        )
    }

    /// Replace the retryable-error predicate
    pub fn with_predicate(mut self, retryable: RetryPredicate) -> Self {
        self.retryable = retryable;
        self
    }

    /// Maximum number of attempts
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff between attempts
    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Whether `error` would be retried by this policy
    pub fn is_retryable(&self, error: &Error) -> bool {
        !error.is_cancelled() && (self.retryable)(error)
    }

    /// Run `call` until it succeeds, fails for good, or attempts run out
    ///
    /// `call` receives the 1-based attempt number. Cancellation is checked
    /// before every attempt and during backoff sleeps. When attempts are
    /// exhausted the last error is returned unchanged.
    pub async fn run<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        operation: &str,
        call: F,
    ) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_observed(cancel, operation, |_, _| {}, call).await
    }

    /// Like [`RetryPolicy::run`], calling `on_retry(next_attempt, error)`
    /// before each backoff sleep
    pub async fn run_observed<T, F, Fut, O>(
        &self,
        cancel: &CancellationToken,
        operation: &str,
        mut on_retry: O,
        mut call: F,
    ) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
        O: FnMut(u32, &Error),
    {
        let mut attempt = 1;
        loop {
            cancel::check(cancel)?;

            let error = match call(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !self.is_retryable(&error) {
                return Err(error);
            }

            if attempt >= self.max_attempts {
                warn!(
                    operation,
                    attempts = attempt,
                    error = %error,
                    "retry attempts exhausted"
                );
                return Err(error);
            }

            let delay = self.backoff.delay(attempt);
            warn!(
                operation,
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "transient failure, retrying"
            );
            on_retry(attempt + 1, &error);
            cancel::sleep(cancel, delay).await?;
            attempt += 1;
        }
    }
}
