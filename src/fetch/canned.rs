// src/fetch/canned.rs
// =============================================================================
// A fetcher that answers from an in-memory map instead of the network.
//
// Used by the test suite and by the `demo` subcommand, which crawls the
// small golang.org graph below. Unknown URLs fail with NotFound, just like a
// 404 from the HTTP fetcher.
// =============================================================================

use std::collections::HashMap;

use async_trait::async_trait;

use super::{FetchError, FetchFailure, FetchedPage, Fetcher};

/// One canned page: a body and the links it points at.
#[derive(Debug, Clone)]
pub struct CannedPage {
    pub body: String,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CannedFetcher {
    pages: HashMap<String, CannedPage>,
}

impl CannedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    // Adds (or replaces) a page; builder style so graphs read top to bottom
    pub fn with_page(mut self, url: &str, body: &str, links: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            CannedPage {
                body: body.to_string(),
                links: links.iter().map(|l| l.to_string()).collect(),
            },
        );
        self
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// The golang.org tour graph: four pages that link back to each other,
    /// plus `/cmd/`, which is linked but missing and always fails.
    pub fn golang_tour() -> Self {
        Self::new()
            .with_page(
                "https://golang.org/",
                "The Go Programming Language",
                &["https://golang.org/pkg/", "https://golang.org/cmd/"],
            )
            .with_page(
                "https://golang.org/pkg/",
                "Packages",
                &[
                    "https://golang.org/",
                    "https://golang.org/cmd/",
                    "https://golang.org/pkg/fmt/",
                    "https://golang.org/pkg/os/",
                ],
            )
            .with_page(
                "https://golang.org/pkg/fmt/",
                "Package fmt",
                &["https://golang.org/", "https://golang.org/pkg/"],
            )
            .with_page(
                "https://golang.org/pkg/os/",
                "Package os",
                &["https://golang.org/", "https://golang.org/pkg/"],
            )
    }
}

#[async_trait]
impl Fetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        match self.pages.get(url) {
            Some(page) => Ok(FetchedPage::new(page.body.clone(), page.links.clone())),
            None => Err(FetchError::new(url, FetchFailure::NotFound)),
        }
    }
}
