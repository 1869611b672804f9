// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr)
// 3. Build the fetcher and run the crawl
// 4. Print results: streamed as they are found, or as JSON at the end
// 5. Exit with proper code (0 = crawl finished, 2 = error)
//
// A crawl where some pages failed to fetch still exits with 0: failures are
// printed alongside the results, not treated as a run failure.
// =============================================================================

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tracing::debug;

use link_crawler::cli::Cli;
use link_crawler::config::CrawlSettings;
use link_crawler::crawl::{Crawler, DedupPolicy, VisitedRegistry};
use link_crawler::sink::{CollectingSink, Page, PrintSink};
use link_crawler::telemetry;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    telemetry::init_logging(cli.verbose);

    let settings = cli.command.into_settings();
    settings.validate()?;
    debug!(settings = %serde_json::to_string(&settings)?, "loaded settings");

    let fetcher = settings.build_fetcher()?;

    if settings.json {
        let sink = Arc::new(CollectingSink::new());
        let crawler = Crawler::new(fetcher, sink.clone()).with_policy(settings.policy);
        crawler.crawl(&settings.root, settings.depth).await;
        print_json(&settings, &sink)?;
    } else {
        println!("🔍 Crawling: {}", settings.root);
        println!("📊 Max crawl depth: {}", settings.depth);

        let registry = Arc::new(VisitedRegistry::new());
        let crawler = Crawler::new(fetcher, Arc::new(PrintSink)).with_policy(settings.policy);
        crawler
            .crawl_into(&settings.root, settings.depth, registry.clone())
            .await;

        print_summary(crawler.policy(), &registry);
    }

    Ok(0)
}

#[derive(Serialize)]
struct CrawlReport<'a> {
    root: &'a str,
    depth: u32,
    policy: DedupPolicy,
    pages: Vec<Page>,
    failures: Vec<String>,
}

fn print_json(settings: &CrawlSettings, sink: &CollectingSink) -> Result<()> {
    let report = CrawlReport {
        root: &settings.root,
        depth: settings.depth,
        policy: settings.policy,
        pages: sink.pages(),
        failures: sink.failures(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_summary(policy: DedupPolicy, registry: &VisitedRegistry) {
    println!();
    println!("📄 Visited {} page(s) ({:?} dedup)", registry.len(), policy);
    for url in registry.ids() {
        println!("   {}", url);
    }
}
