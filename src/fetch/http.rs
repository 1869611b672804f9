// src/fetch/http.rs
// =============================================================================
// The network-backed fetcher.
//
// For every URL the crawler hands us we:
// 1. Validate it with the `url` crate
// 2. GET it with a shared reqwest Client (connection pooling across tasks)
// 3. Treat any non-2xx status as a failure
// 4. Extract the page's links with scraper (see html.rs)
//
// The client carries a request timeout, which is the only timeout anywhere
// in a crawl. A timed-out request surfaces as an ordinary FetchError.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use super::html::extract_links;
use super::{FetchError, FetchFailure, FetchedPage, Fetcher};

/// Knobs for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcherOptions {
    /// Per-request timeout
    pub timeout: Duration,
    /// When set, only links on this host are returned
    pub same_host: Option<String>,
    /// Sent as the User-Agent header
    pub user_agent: String,
}

impl Default for HttpFetcherOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            same_host: None,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

pub struct HttpFetcher {
    client: Client,
    same_host: Option<String>,
}

impl HttpFetcher {
    // Builds the fetcher and its HTTP client
    //
    // Fails only if reqwest cannot construct a client (e.g. TLS backend
    // initialisation problems).
    pub fn new(options: HttpFetcherOptions) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            same_host: options.same_host,
        })
    }

    async fn fetch_body(&self, url: &str) -> Result<String, FetchFailure> {
        let parsed = Url::parse(url)?;
        let response = self.client.get(parsed).send().await?;

        let status = response.status();
        if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) {
            return Err(FetchFailure::NotFound);
        }
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let body = self
            .fetch_body(url)
            .await
            .map_err(|cause| FetchError::new(url, cause))?;

        let links = extract_links(&body, url, self.same_host.as_deref());
        tracing::debug!(url, links = links.len(), "fetched page");

        Ok(FetchedPage { body, links })
    }
}
