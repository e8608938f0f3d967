// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retry logic with exponential backoff for Kubernetes API calls.
//!
//! Two policies live here:
//!
//! - [`retry_api_call`] retries transient API errors (429, 5xx, transport failures)
//!   with a long time budget. It is used for read calls made during startup.
//! - [`retry_on_conflict`] retries only optimistic-concurrency write conflicts, a small
//!   fixed number of times. It is used for record deletion.
//!
//! The error classifiers at the bottom of the module are shared with the reconciler,
//! which treats `AlreadyExists` on create and `NotFound` on delete as success.

use crate::constants::{
    CONFLICT_RETRY_INITIAL_INTERVAL_MILLIS, CONFLICT_RETRY_MAX_ATTEMPTS,
    CONFLICT_RETRY_MAX_INTERVAL_MILLIS, HTTP_CONFLICT, HTTP_NOT_FOUND, REASON_ALREADY_EXISTS,
    REASON_CONFLICT,
};
use anyhow::Result;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Maximum total time to spend retrying (5 minutes)
const MAX_ELAPSED_TIME_SECS: u64 = 300;

/// Initial retry interval (100ms)
const INITIAL_INTERVAL_MILLIS: u64 = 100;

/// Maximum interval between retries (30 seconds)
const MAX_INTERVAL_SECS: u64 = 30;

/// Backoff multiplier (exponential growth factor)
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Randomization factor to prevent thundering herd (±10%)
const RANDOMIZATION_FACTOR: f64 = 0.1;

/// Simple exponential backoff implementation.
///
/// Provides exponential backoff with randomization (jitter) to prevent thundering herd.
/// A backoff is exhausted when either its attempt budget or its time budget runs out.
#[derive(Debug)]
pub struct ExponentialBackoff {
    /// Current interval duration
    pub current_interval: Duration,
    /// Initial interval duration
    pub initial_interval: Duration,
    /// Maximum interval duration
    pub max_interval: Duration,
    /// Maximum total elapsed time
    pub max_elapsed_time: Option<Duration>,
    /// Maximum number of attempts (first call included)
    pub max_attempts: Option<u32>,
    /// Backoff multiplier (typically 2.0 for doubling)
    pub multiplier: f64,
    /// Randomization factor (e.g., 0.1 for ±10%)
    pub randomization_factor: f64,
    /// Number of intervals handed out so far
    retries: u32,
    /// Start time for tracking total elapsed time
    start_time: Instant,
}

impl ExponentialBackoff {
    /// Create a new exponential backoff with specified parameters.
    #[must_use]
    pub fn new(
        initial_interval: Duration,
        max_interval: Duration,
        max_elapsed_time: Option<Duration>,
        max_attempts: Option<u32>,
        multiplier: f64,
        randomization_factor: f64,
    ) -> Self {
        Self {
            current_interval: initial_interval,
            initial_interval,
            max_interval,
            max_elapsed_time,
            max_attempts,
            multiplier,
            randomization_factor,
            retries: 0,
            start_time: Instant::now(),
        }
    }

    /// Get the next backoff interval, or None if the attempt or time budget is spent.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if let Some(max_elapsed) = self.max_elapsed_time {
            if self.start_time.elapsed() >= max_elapsed {
                return None;
            }
        }

        // The first attempt is not preceded by a backoff, hence the +1
        if let Some(max_attempts) = self.max_attempts {
            if self.retries + 1 >= max_attempts {
                return None;
            }
        }
        self.retries += 1;

        let interval = self.current_interval;
        let jittered = self.apply_jitter(interval);

        let next = interval.as_secs_f64() * self.multiplier;
        self.current_interval = Duration::from_secs_f64(next).min(self.max_interval);

        Some(jittered)
    }

    /// Apply randomization (jitter) to an interval.
    fn apply_jitter(&self, interval: Duration) -> Duration {
        if self.randomization_factor == 0.0 {
            return interval;
        }

        let secs = interval.as_secs_f64();
        let delta = secs * self.randomization_factor;
        let min = secs - delta;
        let max = secs + delta;

        let mut rng = rand::thread_rng();
        let jittered = rng.gen_range(min..=max);

        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Create default exponential backoff configuration for Kubernetes API retries.
///
/// # Configuration
///
/// - **Initial interval**: 100ms
/// - **Max interval**: 30 seconds
/// - **Max elapsed time**: 5 minutes total
/// - **Multiplier**: 2.0 (exponential growth)
/// - **Randomization**: ±10% (prevents thundering herd)
#[must_use]
pub fn default_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(
        Duration::from_millis(INITIAL_INTERVAL_MILLIS),
        Duration::from_secs(MAX_INTERVAL_SECS),
        Some(Duration::from_secs(MAX_ELAPSED_TIME_SECS)),
        None,
        BACKOFF_MULTIPLIER,
        RANDOMIZATION_FACTOR,
    )
}

/// Create the backoff used when retrying write conflicts.
///
/// # Configuration
///
/// - **Attempts**: 5 (first call included)
/// - **Initial interval**: 10ms
/// - **Max interval**: 1 second
/// - **Multiplier**: 2.0
/// - **Randomization**: ±10%
///
/// # Retry Schedule
///
/// 1. 10ms
/// 2. 20ms
/// 3. 40ms
/// 4. 80ms
#[must_use]
pub fn conflict_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(
        Duration::from_millis(CONFLICT_RETRY_INITIAL_INTERVAL_MILLIS),
        Duration::from_millis(CONFLICT_RETRY_MAX_INTERVAL_MILLIS),
        None,
        Some(CONFLICT_RETRY_MAX_ATTEMPTS),
        BACKOFF_MULTIPLIER,
        RANDOMIZATION_FACTOR,
    )
}

/// Retry a Kubernetes API call with exponential backoff.
///
/// Automatically retries on transient errors (HTTP 429, 5xx) and fails immediately
/// on permanent errors (4xx client errors except 429).
///
/// # Arguments
///
/// * `operation` - Async function that performs the API call
/// * `operation_name` - Human-readable name for logging (e.g., "list services")
///
/// # Errors
///
/// Returns error if:
/// - Non-retryable error encountered (4xx client error)
/// - Max elapsed time exceeded (5 minutes)
pub async fn retry_api_call<T, F, Fut>(mut operation: F, operation_name: &str) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, kube::Error>>,
{
    let mut backoff = default_backoff();
    let start_time = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?start_time.elapsed(),
                        "Kubernetes API call succeeded after retries"
                    );
                } else {
                    debug!(operation = operation_name, "Kubernetes API call succeeded");
                }
                return Ok(value);
            }
            Err(e) => {
                if !is_retryable_error(&e) {
                    error!(
                        operation = operation_name,
                        error = %e,
                        "Non-retryable Kubernetes API error, failing immediately"
                    );
                    return Err(e.into());
                }

                if let Some(duration) = backoff.next_backoff() {
                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        retry_after = ?duration,
                        error = %e,
                        "Retryable Kubernetes API error, will retry"
                    );
                    tokio::time::sleep(duration).await;
                } else {
                    error!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?start_time.elapsed(),
                        error = %e,
                        "Backoff exhausted, giving up"
                    );
                    return Err(anyhow::anyhow!(
                        "Backoff exhausted after {attempt} attempts: {e}"
                    ));
                }
            }
        }
    }
}

/// A conflict-retried call that did not succeed.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed after {attempts} attempt(s): {source}")]
pub struct RetryError {
    /// Human-readable operation name
    pub operation: String,
    /// Number of calls issued
    pub attempts: u32,
    /// The last error returned by the call
    #[source]
    pub source: kube::Error,
}

/// Retry a write call while the API server reports a conflict, using [`conflict_backoff`].
///
/// # Errors
///
/// Returns [`RetryError`] carrying the last API error when a non-conflict error is
/// returned or the attempt budget is spent.
pub async fn retry_on_conflict<T, F, Fut>(
    operation: F,
    operation_name: &str,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, kube::Error>>,
{
    retry_on_conflict_with(conflict_backoff(), operation, operation_name).await
}

/// Same as [`retry_on_conflict`] with an explicit backoff.
///
/// # Errors
///
/// See [`retry_on_conflict`].
pub async fn retry_on_conflict_with<T, F, Fut>(
    mut backoff: ExponentialBackoff,
    mut operation: F,
    operation_name: &str,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, kube::Error>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        "Call succeeded after conflict retries"
                    );
                }
                return Ok(value);
            }
            Err(e) if is_conflict(&e) => match backoff.next_backoff() {
                Some(duration) => {
                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        retry_after = ?duration,
                        error = %e,
                        "Write conflict, will retry"
                    );
                    crate::metrics::record_conflict_retry();
                    tokio::time::sleep(duration).await;
                }
                None => {
                    return Err(RetryError {
                        operation: operation_name.to_string(),
                        attempts: attempt,
                        source: e,
                    });
                }
            },
            Err(e) => {
                return Err(RetryError {
                    operation: operation_name.to_string(),
                    attempts: attempt,
                    source: e,
                });
            }
        }
    }
}

/// Determine if a Kubernetes error is retryable.
///
/// # Retryable Errors
///
/// - **HTTP 429** (Too Many Requests) - Rate limiting
/// - **HTTP 5xx** (Server Errors) - Temporary API server issues
/// - **Service Errors** - Network/connection issues
///
/// Everything else (4xx client errors, malformed data) fails immediately.
#[must_use]
pub fn is_retryable_error(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(api_err) => {
            api_err.code == 429 || (api_err.code >= 500 && api_err.code < 600)
        }
        kube::Error::Service(_) => true,
        _ => false,
    }
}

/// `true` when a create call failed because the object already exists.
#[must_use]
pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(api_err)
        if api_err.code == HTTP_CONFLICT && api_err.reason == REASON_ALREADY_EXISTS)
}

/// `true` when a write failed on an optimistic-concurrency conflict.
#[must_use]
pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(api_err)
        if api_err.code == HTTP_CONFLICT && api_err.reason == REASON_CONFLICT)
}

/// `true` when the addressed object does not exist.
#[must_use]
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(api_err) if api_err.code == HTTP_NOT_FOUND)
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
