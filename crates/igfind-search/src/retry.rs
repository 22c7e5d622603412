//! Retry with exponential back-off and jitter for outbound search calls.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (network failures, 5xx). Rate limits are NOT retried
//! here: they are surfaced to the caller so the shared cooldown can pause
//! every worker instead of one call hammering the service again.

use std::future::Future;
use std::time::Duration;

use crate::error::SearchError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** network timeouts, connect failures, and HTTP 5xx.
///
/// **Not retriable:** [`SearchError::RateLimited`], 4xx statuses, parse
/// failures, missing configuration, and unusable LLM answers.
pub(crate) fn is_retriable(err: &SearchError) -> bool {
    match err {
        SearchError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SearchError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        SearchError::RateLimited { .. }
        | SearchError::Deserialize { .. }
        | SearchError::NotConfigured(_)
        | SearchError::Llm(_)
        | SearchError::Timeout { .. } => false,
    }
}

/// Back-off policy shared by every client in this crate.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }
}

/// Runs `operation` with up to `policy.max_retries` additional attempts on transient errors.
///
/// The n-th retry sleeps `backoff_base_ms × 2ⁿ⁻¹ ± 25 %`, capped at 60 s.
/// Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    service: &str,
    mut operation: F,
) -> Result<T, SearchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SearchError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let max_retries = policy.max_retries;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = policy
                    .backoff_base_ms
                    .saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    service,
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
