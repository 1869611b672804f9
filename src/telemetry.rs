// src/telemetry.rs
// =============================================================================
// Logging setup.
//
// Logs go to stderr so stdout only carries crawl results (and stays valid
// JSON with --json). RUST_LOG overrides the default filter.
// =============================================================================

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "info,link_crawler=debug"
    } else {
        "warn,link_crawler=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
