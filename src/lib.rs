// src/lib.rs
// =============================================================================
// link-crawler: a depth-bounded, concurrent link-graph crawler.
//
// Modules:
// - crawl: the engine (visited registry, completion barrier, crawl tasks)
// - fetch: the Fetcher trait plus HTTP and canned implementations
// - sink: where crawl results are delivered
// - config / cli / telemetry: settings, argument parsing and logging for
//   the binary
// =============================================================================

pub mod cli;
pub mod config;
pub mod crawl;
pub mod fetch;
pub mod sink;
pub mod telemetry;
