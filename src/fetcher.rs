//! Retrieval of raw product pages

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ExtractError;

/// Browser-like identity sent with every request to reduce anti-bot blocking.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Source of raw page markup for a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page at `url`.
    ///
    /// # Returns
    /// * `Result<String, ExtractError>` - The page body, or
    ///   [`ExtractError::Network`] carrying the transport error detail
    async fn fetch(&self, url: &str) -> Result<String, ExtractError>;
}

/// Longest wait between two attempts, jitter included.
const RETRY_DELAY_CAP: Duration = Duration::from_secs(60);

/// Timeouts, refused connections, 429 and 5xx are worth another attempt.
fn is_transient(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_connect() {
        return true;
    }
    err.status()
        .is_some_and(|status| status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error())
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
///
/// Transient failures are retried up to `max_retries` times; the wait
/// before retry `n` is `backoff_base_ms * 2^(n-1)`, scaled by a random
/// factor in `[0.75, 1.25]` and capped at one minute.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl HttpFetcher {
    /// Create a fetcher with the given identity, timeout and retry policy.
    ///
    /// `max_retries` is the number of extra attempts on transient errors;
    /// `0` disables retrying.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be built.
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Create a fetcher from application configuration.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be built.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Self::new(
            &config.user_agent,
            config.fetch_timeout,
            config.max_retries,
            config.retry_backoff_ms,
        )
    }

    async fn fetch_once(&self, url: &str) -> reqwest::Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        response.text().await
    }

    /// Un-jittered wait before retry `retry` (1-based).
    fn base_delay(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(10);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor)).min(RETRY_DELAY_CAP)
    }

    fn jittered_delay(&self, retry: u32) -> Duration {
        let scale = rand::rng().random_range(0.75..=1.25);
        self.base_delay(retry).mul_f64(scale).min(RETRY_DELAY_CAP)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ExtractError> {
        let mut retry = 0;
        loop {
            debug!("Fetching {} (attempt {})", url, retry + 1);

            let err = match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };
            if retry >= self.max_retries || !is_transient(&err) {
                return Err(ExtractError::Network(err.to_string()));
            }

            retry += 1;
            let delay = self.jittered_delay(retry);
            warn!(
                "Fetching {} failed ({}), retry {}/{} in {:?}",
                url, err, retry, self.max_retries, delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}
