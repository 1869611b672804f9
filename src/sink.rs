// src/sink.rs
// =============================================================================
// Where crawl results go.
//
// The engine hands every fetched page to a `ResultSink` as soon as it has
// it, and every fetch failure too. The engine does not wait on the sink and
// gets nothing back from it.
//
// Two sinks ship with the crate:
// - PrintSink: streams `found: <url> "<body>"` lines to stdout as they happen
// - CollectingSink: keeps everything in memory (for --json output and tests)
// =============================================================================

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::fetch::FetchError;

/// Observer for crawl results. Called concurrently from many tasks.
pub trait ResultSink: Send + Sync {
    fn emit(&self, url: &str, body: &str);

    fn report_failure(&self, _error: &FetchError) {}
}

/// One crawled page, as printed in JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub body: String,
}

/// Prints results the moment they are produced.
#[derive(Debug, Default)]
pub struct PrintSink;

impl ResultSink for PrintSink {
    fn emit(&self, url: &str, body: &str) {
        println!("found: {} {:?}", url, body);
    }

    fn report_failure(&self, error: &FetchError) {
        println!("{}", error);
    }
}

/// Gathers pages and failures in memory, in the order they arrived.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pages: Mutex<Vec<Page>>,
    failures: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> Vec<Page> {
        self.pages.lock().clone()
    }

    /// URLs whose fetch failed, in the order the failures were reported.
    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().clone()
    }

    /// How many times `url` was emitted.
    pub fn count(&self, url: &str) -> usize {
        self.pages.lock().iter().filter(|p| p.url == url).count()
    }
}

impl ResultSink for CollectingSink {
    fn emit(&self, url: &str, body: &str) {
        self.pages.lock().push(Page {
            url: url.to_string(),
            body: body.to_string(),
        });
    }

    fn report_failure(&self, error: &FetchError) {
        self.failures.lock().push(error.url.clone());
    }
}
