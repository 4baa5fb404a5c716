//! Exponential backoff for calls to the hosted database.
//!
//! Retried: timeouts, connection failures, 5xx, 408 and 429.
//! Not retried: every other 4xx (bad filter, bad key, row-level security).

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 200;
pub const DEFAULT_MAX_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry (doubles each attempt)
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::new(0, 0, 0)
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.max_delay.as_millis() as u64))
    }
}

/// Whether a transport error is worth another attempt
pub fn is_retryable_error(error: &reqwest::Error) -> bool {
    if error.is_timeout() || error.is_connect() {
        return true;
    }
    if error.is_request() || error.is_body() || error.is_decode() {
        return false;
    }
    error.status().map(is_retryable_status).unwrap_or(false)
}

/// Whether a response status is worth another attempt
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

/// Run `operation` until it yields a non-retryable result or retries run out.
///
/// A retryable status on the last attempt is returned as a response, so the
/// caller still sees the server's error body.
pub async fn with_retry<F, Fut>(config: &RetryConfig, operation: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        let last_attempt = attempt >= config.max_retries;

        match operation().await {
            Ok(response) if !last_attempt && is_retryable_status(response.status()) => {
                tracing::warn!(
                    "Database returned {}, attempt {} of {}",
                    response.status(),
                    attempt + 1,
                    config.max_retries + 1
                );
            }
            Ok(response) => {
                if attempt > 0 {
                    tracing::info!("Request succeeded after {} retries", attempt);
                }
                return Ok(response);
            }
            Err(e) if !last_attempt && is_retryable_error(&e) => {
                tracing::warn!(
                    "Retryable error on attempt {} of {}: {}",
                    attempt + 1,
                    config.max_retries + 1,
                    e
                );
            }
            Err(e) => {
                tracing::debug!("Giving up after {} attempts: {}", attempt + 1, e);
                return Err(e);
            }
        }

        let delay = config.delay_for_attempt(attempt);
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
