//! HTTP fetching with a bounded timeout and exponential backoff retries.
//!
//! # Architecture
//!
//! - [`FetchAsync`]: core trait, "GET this URL and give me the body"
//! - [`HttpFetcher`]: `reqwest` implementation with timeout and user agent
//! - [`RetryFetch`]: decorator adding backoff retries to any `FetchAsync`
//!
//! # Retry Strategy
//!
//! Only transient failures are retried: transport errors, timeouts, HTTP 429
//! and 5xx. Any other non-success status fails immediately.
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=max_jitter)
//! ```

use crate::config::HttpConfig;
use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// A failed GET.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchError {
    pub url: String,
    pub status: Option<u16>,
    pub message: String,
    /// Whether trying again could plausibly succeed.
    pub retryable: bool,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "GET {} returned HTTP {}: {}", self.url, status, self.message),
            None => write!(f, "GET {} failed: {}", self.url, self.message),
        }
    }
}

impl std::error::Error for FetchError {}

/// Trait for async text fetching.
pub trait FetchAsync {
    /// GET `url` and return the response body, failing on non-success status.
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Plain `reqwest` fetcher. One instance is shared by every source adapter.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

impl FetchAsync for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let resp = self.client.get(url).send().await.map_err(|e| FetchError {
            url: url.to_string(),
            status: None,
            message: e.to_string(),
            retryable: true,
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| FetchError {
            url: url.to_string(),
            status: Some(status.as_u16()),
            message: format!("reading body: {e}"),
            retryable: true,
        })?;
        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "GET complete"
        );

        if !status.is_success() {
            return Err(FetchError {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: truncate_for_log(body.trim(), 200),
                retryable: status.is_server_error() || status.as_u16() == 429,
            });
        }
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`FetchAsync`].
pub struct RetryFetch<T> {
    inner: T,
    /// Total attempts including the first one.
    max_attempts: usize,
    base_delay: Duration,
    max_delay: Duration,
    max_jitter: Duration,
}

impl<T> RetryFetch<T>
where
    T: FetchAsync,
{
    /// Wrap `inner` with retry behavior.
    ///
    /// # Arguments
    ///
    /// * `inner` - The fetcher to retry
    /// * `max_attempts` - Total attempts including the first; `0` is treated as `1`
    /// * `base_delay` - Delay before the second attempt, doubled after each failure
    ///
    /// The delay is capped at 10 seconds and up to 250 ms of jitter is added;
    /// see [`RetryFetch::with_jitter`].
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let http = RetryFetch::new(HttpFetcher::new(&config)?, 3, Duration::from_millis(500));
    /// let body = http.get_text("https://api.worldbank.org/v2/country").await?;
    /// ```
    pub fn new(inner: T, max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(10),
            max_jitter: Duration::from_millis(250),
        }
    }

    pub fn from_config(inner: T, config: &HttpConfig) -> Self {
        Self::new(inner, config.max_attempts, config.base_delay())
    }

    pub fn with_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            delay
        } else {
            delay + Duration::from_millis(rng().random_range(0..=jitter_ms))
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> FetchAsync for RetryFetch<T>
where
    T: FetchAsync,
{
    #[instrument(level = "info", skip(self))]
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            match self.inner.get_text(url).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.retryable => {
                    error!(attempt, error = %e, "GET failed; not retryable");
                    return Err(e);
                }
                Err(e) if attempt >= self.max_attempts => {
                    error!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        error = %e,
                        "GET exhausted retries"
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        ?delay,
                        error = %e,
                        "GET attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
