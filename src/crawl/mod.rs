// src/crawl/mod.rs
// =============================================================================
// This module is the crawl engine.
//
// Submodules:
// - registry: the visited set shared by all crawl tasks
// - barrier: counts tasks in and out so the caller knows when all are done
// - engine: the recursive task that fetches a page and spawns its links
// =============================================================================

mod barrier;
mod engine;
mod registry;

pub use barrier::{CompletionBarrier, PendingGuard};
pub use engine::{Crawler, DedupPolicy};
pub use registry::{VisitRecord, VisitedRegistry};
