//! Backoff helpers for store calls that may fail transiently.
//!
//! Reconcile cycles never loop internally: they hand a delay back to the
//! controller through [`jittered`]. Startup work that must eventually succeed
//! before the controller runs (installing the CRD) loops with
//! [`retry_with_backoff`] instead, and waits that observe convergence use
//! [`poll_until`] rather than a fixed sleep.

use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{error, trace, warn};

use crate::Error;

/// Backoff settings for [`retry_with_backoff`]
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of attempts (0 = retry forever)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failure
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a config with a maximum number of attempts
    pub fn with_max_attempts(attempts: u32) -> Self {
        Self {
            max_attempts: attempts,
            ..Default::default()
        }
    }
}

/// Spread a delay uniformly over 0.5x..1.5x so that many objects failing
/// together do not retry in lockstep.
pub fn jittered(delay: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(0.5..1.5);
    Duration::from_secs_f64(delay.as_secs_f64() * factor)
}

/// Run an async operation until it succeeds, backing off between attempts.
///
/// Only errors for which [`Error::is_retryable`] holds are retried; anything
/// else is returned immediately, as is the last error once `max_attempts` is
/// exhausted.
pub async fn retry_with_backoff<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 0u32;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        let err = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if !err.is_retryable() {
            error!(operation = %operation_name, error = %err, "operation failed permanently");
            return Err(err);
        }
        if config.max_attempts > 0 && attempt >= config.max_attempts {
            error!(
                operation = %operation_name,
                attempt,
                error = %err,
                "operation failed after max retries"
            );
            return Err(err);
        }

        let wait = jittered(delay);
        warn!(
            operation = %operation_name,
            attempt,
            error = %err,
            delay_ms = wait.as_millis() as u64,
            "operation failed, retrying"
        );
        tokio::time::sleep(wait).await;

        delay = Duration::from_secs_f64(
            (delay.as_secs_f64() * config.backoff_multiplier).min(config.max_delay.as_secs_f64()),
        );
    }
}

/// Poll until `check_fn` reports `Ok(true)` or `timeout` elapses
///
/// Errors from `check_fn` are treated as "not yet" and polling continues.
pub async fn poll_until<F, Fut>(
    timeout: Duration,
    poll_interval: Duration,
    timeout_msg: impl Into<String>,
    mut check_fn: F,
) -> Result<(), Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, Error>>,
{
    let start = Instant::now();
    let timeout_msg = timeout_msg.into();

    loop {
        match check_fn().await {
            Ok(true) => return Ok(()),
            Ok(false) => trace!("polling condition not yet met"),
            Err(e) => trace!(error = %e, "polling check failed, retrying"),
        }

        if start.elapsed() >= timeout {
            return Err(Error::internal_with_context("poll_until", timeout_msg));
        }
        tokio::time::sleep(poll_interval).await;
    }
}
