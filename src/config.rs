// src/config.rs
// =============================================================================
// Settings for one crawl run.
//
// The command line (see cli.rs) is folded into a `CrawlSettings` value. It
// is validated once, logged at debug level, and then used to build the
// fetcher and the crawler.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::crawl::DedupPolicy;
use crate::fetch::{CannedFetcher, Fetcher, HttpFetcher, HttpFetcherOptions};

/// Where pages come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    /// Real HTTP requests
    Http {
        timeout_secs: u64,
        /// Only follow links on the root URL's host
        same_host: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        user_agent: Option<String>,
    },
    /// The canned golang.org graph, no network access
    Demo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSettings {
    pub root: String,
    pub depth: u32,
    pub policy: DedupPolicy,
    pub json: bool,
    pub source: Source,
}

impl CrawlSettings {
    // Checks the settings before any work starts
    //
    // HTTP crawls need an absolute http(s) root URL; the demo graph accepts
    // any root (unknown roots simply fail to fetch).
    pub fn validate(&self) -> Result<()> {
        if let Source::Http { timeout_secs, .. } = &self.source {
            let url = Url::parse(&self.root)
                .map_err(|e| anyhow!("Invalid URL '{}': {}", self.root, e))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                bail!("Unsupported URL scheme '{}' in {}", url.scheme(), self.root);
            }
            if *timeout_secs == 0 {
                bail!("Request timeout must be at least one second");
            }
        }
        Ok(())
    }

    /// Builds the fetcher described by `source`.
    pub fn build_fetcher(&self) -> Result<Arc<dyn Fetcher>> {
        match &self.source {
            Source::Demo => Ok(Arc::new(CannedFetcher::golang_tour())),
            Source::Http {
                timeout_secs,
                same_host,
                user_agent,
            } => {
                let mut options = HttpFetcherOptions {
                    timeout: Duration::from_secs(*timeout_secs),
                    ..HttpFetcherOptions::default()
                };
                if let Some(agent) = user_agent {
                    options.user_agent = agent.clone();
                }
                if *same_host {
                    let root = Url::parse(&self.root)
                        .with_context(|| format!("Invalid URL '{}'", self.root))?;
                    let host = root
                        .host_str()
                        .ok_or_else(|| anyhow!("URL has no host: {}", self.root))?;
                    options.same_host = Some(host.to_string());
                }

                let fetcher = HttpFetcher::new(options).context("Failed to create HTTP client")?;
                Ok(Arc::new(fetcher))
            }
        }
    }
}
