//! Page fetching
//!
//! The engine only needs "give me the HTML at this URL". `HttpFetcher` is the
//! production implementation: a shared reqwest client behind a governor rate
//! limiter, so many characters can be tracked at once without hammering the
//! forum.

use governor::{Quota, RateLimiter as GovRateLimiter};
use reqwest::Client;
use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::HttpConfig;
use crate::error::FetchError;

/// Source of raw page HTML
pub trait HtmlFetcher {
    /// Fetch the page body. No retries are attempted.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Rate-limited HTTP fetcher
pub struct HttpFetcher {
    client: Client,
    rate_limiter: GovRateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        let per_second = NonZeroU32::new(config.rate_limit_per_second)
            .ok_or_else(|| anyhow::anyhow!("rate_limit_per_second must be at least 1"))?;
        let rate_limiter = GovRateLimiter::direct(Quota::per_second(per_second));

        Ok(Self { client, rate_limiter })
    }
}

impl HtmlFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = validate_url(url)?;

        // Rate limit before fetching
        self.rate_limiter.until_ready().await;

        debug!("Fetching page: {}", parsed);
        let response = self.client.get(parsed).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Only absolute http(s) URLs are fetched
pub fn validate_url(url: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(invalid(format!("unsupported scheme {}", scheme))),
    }
}
