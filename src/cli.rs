// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl: crawl a real website over HTTP
// - demo:  crawl the built-in golang.org graph, no network needed
//
// Both end up as a `CrawlSettings` value (see config.rs).
// =============================================================================

use clap::{Args, Parser, Subcommand};

use crate::config::{CrawlSettings, Source};
use crate::crawl::DedupPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "link-crawler",
    version,
    about = "Crawl a link graph concurrently, up to a fixed depth",
    long_about = "link-crawler starts at one URL, fetches it, and follows every link it finds \
                  in parallel until the depth budget runs out. Each page is reported as soon \
                  as it is fetched."
)]
pub struct Cli {
    /// Log every crawl decision (or set RUST_LOG for finer control)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct CrawlArgs {
    /// Output the crawled pages as JSON once the crawl is finished
    #[arg(long)]
    pub json: bool,

    /// Fetch every URL at most once (atomic claim before fetching)
    ///
    /// Without this flag a URL reached by two paths at the same time may be
    /// fetched twice.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website over HTTP
    ///
    /// Example: link-crawler crawl https://example.com --depth 2
    Crawl {
        /// URL to start from (e.g., https://example.com)
        url: String,

        /// Maximum crawl depth; 1 = just the starting page
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
        depth: u32,

        /// Only follow links on the starting URL's host
        #[arg(long)]
        same_host: bool,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,

        /// Override the User-Agent header
        #[arg(long)]
        user_agent: Option<String>,

        #[command(flatten)]
        args: CrawlArgs,
    },

    /// Crawl the built-in golang.org example graph
    Demo {
        /// Maximum crawl depth
        #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..))]
        depth: u32,

        #[command(flatten)]
        args: CrawlArgs,
    },
}

impl Commands {
    pub fn into_settings(self) -> CrawlSettings {
        match self {
            Commands::Crawl {
                url,
                depth,
                same_host,
                timeout_secs,
                user_agent,
                args,
            } => CrawlSettings {
                root: url,
                depth,
                policy: policy(&args),
                json: args.json,
                source: Source::Http {
                    timeout_secs,
                    same_host,
                    user_agent,
                },
            },
            Commands::Demo { depth, args } => CrawlSettings {
                root: "https://golang.org/".to_string(),
                depth,
                policy: policy(&args),
                json: args.json,
                source: Source::Demo,
            },
        }
    }
}

fn policy(args: &CrawlArgs) -> DedupPolicy {
    if args.strict {
        DedupPolicy::Strict
    } else {
        DedupPolicy::BestEffort
    }
}
