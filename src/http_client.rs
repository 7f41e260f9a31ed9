use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{CrawlError, Result};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

pub fn random_user_agent() -> &'static str {
    let idx = rand::thread_rng().gen_range(0..USER_AGENTS.len());
    USER_AGENTS[idx]
}

pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(CrawlError::from)
}

/// Source of raw page bodies. The only network-facing seam of the crawler.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_body(&self, url: &str) -> Result<String>;
}

/// Fetches one page at a time and pauses after each request.
pub struct HttpFetcher {
    client: Client,
    throttle: Option<Duration>,
}

impl HttpFetcher {
    pub fn new(client: Client, throttle: Option<Duration>) -> Self {
        Self { client, throttle }
    }

    async fn pause(&self) {
        if let Some(delay) = self.throttle {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_body(&self, url: &str) -> Result<String> {
        debug!(url, throttle = self.throttle.is_some(), "fetching page");

        let result = self
            .client
            .get(url)
            .header("User-Agent", random_user_agent())
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "ko-KR,ko;q=0.9,en-US;q=0.5")
            .send()
            .await;

        // the delay applies to failed requests too
        self.pause().await;

        let response = result.inspect_err(|e| {
            if e.is_timeout() {
                warn!(url, "timed out fetching page");
            } else {
                warn!(url, error = %e, "error fetching page");
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "non-success status");
            return Err(CrawlError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(body)
    }
}
