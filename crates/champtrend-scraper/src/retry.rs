//! Retry with exponential back-off and jitter for source-level requests.
//!
//! Used for the single-document fetches a collector cannot proceed without
//! (e.g. the reference version list). Per-entity requests are not retried;
//! a failed entity is skipped instead.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Upper bound on one back-off sleep, before jitter.
const MAX_BACKOFF_MS: u64 = 20_000;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable:
/// - [`ScraperError::Http`] timeouts and connection failures.
/// - [`ScraperError::UnexpectedStatus`] 429 and 5xx.
///
/// Everything else is returned immediately: auth failures, 404s, API error
/// codes and malformed payloads will not change on a second attempt.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::Http(e) => e.is_timeout() || e.is_connect(),
        ScraperError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        ScraperError::Deserialize { .. }
        | ScraperError::Api { .. }
        | ScraperError::Malformed { .. }
        | ScraperError::InvalidBaseUrl { .. }
        | ScraperError::SourceUnavailable { .. } => false,
    }
}

/// Runs `operation`, repeating it up to `max_retries` more times while it
/// fails with a retriable error.
///
/// The n-th retry sleeps `backoff_base_ms * 2^(n-1)`, capped at 20 s, then
/// scaled by a random factor in `[0.75, 1.25)`. With the default base of
/// 1 000 ms that is roughly 1 s, 2 s, 4 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut retries_used = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retriable(&err) && retries_used < max_retries => err,
            Err(err) => return Err(err),
        };

        retries_used += 1;
        let delay = backoff_delay(backoff_base_ms, retries_used, rand::random::<f64>());
        tracing::warn!(
            retry = retries_used,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "source request failed, backing off before the next attempt"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Sleep before retry number `retry` (1-based). `unit` is a sample from
/// `[0, 1)` that picks the jitter.
fn backoff_delay(backoff_base_ms: u64, retry: u32, unit: f64) -> Duration {
    let doubled = backoff_base_ms.saturating_mul(1u64 << retry.saturating_sub(1).min(10));
    let base = Duration::from_millis(doubled.min(MAX_BACKOFF_MS));
    base.mul_f64(0.75 + unit * 0.5)
}
