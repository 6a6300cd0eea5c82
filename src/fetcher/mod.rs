//! Single-shot HTTP page fetcher
//!
//! Issues one GET per candidate URL with features including:
//! - Redirect following and gzip decompression
//! - User-Agent rotation with an optional fixed override
//! - An HTML content-type gate on the response
//!
//! Every failure mode (transport error, non-success status, missing or
//! non-HTML content type) collapses into the same "not fetchable"
//! outcome: the worker drops the edge and never retries. Pacing belongs
//! to the surrounding system, so there is no retry or rate limiting here.

use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::FetchError;
use crate::models::RawPage;

/// Pool of realistic User-Agent strings for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// HTTP fetcher with an HTML content-type gate
pub struct PageFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Fixed User-Agent override; rotates through the pool when unset
    user_agent: Option<String>,

    /// Optional base URL override for testing with mock servers
    base_url: Option<String>,
}

impl PageFetcher {
    /// Create a new fetcher with the given request timeout
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(timeout: Duration, user_agent: Option<String>) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;

        Ok(Self {
            client,
            user_agent,
            base_url: None,
        })
    }

    /// Create a fetcher pointed at a mock server base URL, for tests
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let mut fetcher = Self::new(timeout, None)?;
        fetcher.base_url = Some(base_url.to_string());
        Ok(fetcher)
    }

    /// Fetch one page, gating on an HTML content type
    ///
    /// Returns `None` for every rejection: transport error, non-success
    /// status, missing content-type, or a content-type without an `html`
    /// marker. Callers cannot (and need not) distinguish these.
    pub async fn fetch(&self, url: &str) -> Option<RawPage> {
        match self.try_fetch(url).await {
            Ok(page) => Some(page),
            Err(e) => {
                debug!(url = %url, error = %e, "Page not fetchable");
                None
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<RawPage, FetchError> {
        let full_url = if let Some(base) = &self.base_url {
            format!("{base}{url}")
        } else {
            url.to_string()
        };

        let response = self
            .client
            .get(&full_url)
            .headers(self.build_headers())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        match content_type {
            Some(ct) if ct.contains("html") => {
                let html = response.text().await?;
                Ok(RawPage {
                    html,
                    content_type: ct,
                })
            }
            other => Err(FetchError::NotHtml(other)),
        }
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        match &self.user_agent {
            Some(ua) => {
                if let Ok(value) = HeaderValue::from_str(ua) {
                    headers.insert(USER_AGENT, value);
                }
            }
            None => {
                headers.insert(USER_AGENT, HeaderValue::from_static(Self::random_user_agent()));
            }
        }

        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        headers
    }

    /// Get a random user agent from the pool
    fn random_user_agent() -> &'static str {
        let mut rng = rand::thread_rng();
        USER_AGENTS.choose(&mut rng).unwrap_or(&USER_AGENTS[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_rotation() {
        let mut agents = std::collections::HashSet::new();
        for _ in 0..100 {
            let agent = PageFetcher::random_user_agent();
            assert!(USER_AGENTS.contains(&agent));
            agents.insert(agent);
        }
        assert!(agents.len() > 1, "User agents should rotate");
    }

    #[test]
    fn test_fixed_user_agent_override() {
        let fetcher =
            PageFetcher::new(Duration::from_secs(5), Some("onehop/0.1".to_string())).unwrap();
        let headers = fetcher.build_headers();
        assert_eq!(headers.get(USER_AGENT).unwrap().to_str().unwrap(), "onehop/0.1");
    }

    #[test]
    fn test_fetcher_creation() {
        assert!(PageFetcher::new(Duration::from_secs(10), None).is_ok());
        assert!(PageFetcher::with_base_url("http://localhost:8080", Duration::from_secs(10)).is_ok());
    }
}
