// src/fetch/mod.rs
// =============================================================================
// This module defines the fetch capability the crawler depends on.
//
// The crawl engine never talks to the network directly. It only knows the
// `Fetcher` trait: give it a URL, get back the page body and the links found
// on that page (or an error). Two implementations live here:
// - http: a real network fetcher built on reqwest + scraper
// - canned: an in-memory map of pages, used by tests and the `demo` command
//
// Rust concepts:
// - Traits: the engine is generic over "anything that can fetch"
// - async-trait: lets us put async methods on a trait object (dyn Fetcher)
// - thiserror: derives std::error::Error for our error types
// =============================================================================

mod canned;
mod html;
mod http;

pub use canned::{CannedFetcher, CannedPage};
pub use html::extract_links;
pub use http::{HttpFetcher, HttpFetcherOptions};

use async_trait::async_trait;
use thiserror::Error;

/// A successfully fetched page: its body plus every link it references.
///
/// `links` may be empty, may repeat, and may point back at pages that were
/// already crawled. The engine copes with all three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub body: String,
    pub links: Vec<String>,
}

impl FetchedPage {
    pub fn new(body: impl Into<String>, links: Vec<String>) -> Self {
        Self {
            body: body.into(),
            links,
        }
    }
}

// Why a fetch failed
#[derive(Debug, Error)]
pub enum FetchFailure {
    /// No page exists under this identifier
    #[error("not found")]
    NotFound,
    /// The server answered with a non-success status code
    #[error("HTTP {0}")]
    Status(u16),
    /// The identifier is not a URL we can request
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Transport-level failure (timeout, DNS, TLS, connection reset...)
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// The single error kind the crawl engine ever sees.
///
/// It names the URL that failed and carries the underlying cause. The engine
/// logs it and stops that one task; it is never propagated to the caller.
#[derive(Debug, Error)]
#[error("failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    #[source]
    pub cause: FetchFailure,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: impl Into<FetchFailure>) -> Self {
        Self {
            url: url.into(),
            cause: cause.into(),
        }
    }
}

/// Anything that can turn a URL into a page body and its outbound links.
///
/// Implementations are called from many tasks at once with no ordering
/// between calls, so they must be `Send + Sync` and must not assume calls
/// are serialized.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}
