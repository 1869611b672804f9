// src/crawl/engine.rs
// =============================================================================
// The concurrent, depth-bounded crawl.
//
// How it works:
// 1. The caller's root URL becomes the first task, counted in on a fresh
//    CompletionBarrier before it is spawned
// 2. Each task: stop if its depth budget is used up, stop if the URL was
//    already visited, otherwise fetch, record, emit
// 3. Every link on the fetched page becomes a new task with depth - 1,
//    counted in on the barrier and spawned without waiting for it
// 4. The caller waits on the barrier until every task has counted out
//
// Termination comes from the depth budget, not from the visited registry:
// depth drops by one per hop and nothing is fetched at depth 0, so even a
// graph full of cycles runs out of work.
//
// A fetch failure ends that one task. It is logged and reported to the sink,
// and never reaches the parent task or the caller.
// =============================================================================

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::barrier::{CompletionBarrier, PendingGuard};
use super::registry::{VisitRecord, VisitedRegistry};
use crate::fetch::Fetcher;
use crate::sink::ResultSink;

/// How a task decides whether a URL still needs fetching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Look the URL up, and record it only after a successful fetch.
    ///
    /// Two tasks that reach the same URL before either has finished fetching
    /// will both fetch it, so a page may be emitted more than once.
    #[default]
    BestEffort,
    /// Claim the URL with an atomic insert-if-absent before fetching.
    ///
    /// Exactly one task fetches each URL. A URL whose fetch failed stays
    /// claimed and is not retried by later tasks.
    Strict,
}

// State shared by every task of one crawl
struct Shared {
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn ResultSink>,
    policy: DedupPolicy,
    registry: Arc<VisitedRegistry>,
    barrier: CompletionBarrier,
}

impl Shared {
    // Returns true if this task should go on to fetch `url`
    fn claim(&self, url: &str) -> bool {
        match self.policy {
            DedupPolicy::BestEffort => !self.registry.contains(url),
            DedupPolicy::Strict => self.registry.insert_if_absent(url, VisitRecord::Reserved),
        }
    }
}

/// Crawls a link graph through an injected [`Fetcher`], reporting every
/// fetched page to a [`ResultSink`].
#[derive(Clone)]
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn ResultSink>,
    policy: DedupPolicy,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetcher>, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            fetcher,
            sink,
            policy: DedupPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DedupPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    /// Crawls from `root`, following links up to `depth` hops away.
    ///
    /// Returns once every task spawned by this crawl has finished. Results
    /// are delivered to the sink while the crawl runs; nothing is returned.
    /// A depth of 0 fetches nothing.
    pub async fn crawl(&self, root: &str, depth: u32) {
        self.crawl_into(root, depth, Arc::new(VisitedRegistry::new()))
            .await;
    }

    /// Same as [`Crawler::crawl`], but records visits in `registry` so the
    /// caller can inspect it afterwards.
    pub async fn crawl_into(&self, root: &str, depth: u32, registry: Arc<VisitedRegistry>) {
        let barrier = CompletionBarrier::new();
        let shared = Arc::new(Shared {
            fetcher: Arc::clone(&self.fetcher),
            sink: Arc::clone(&self.sink),
            policy: self.policy,
            registry: Arc::clone(&registry),
            barrier: barrier.clone(),
        });

        info!(root, depth, policy = ?self.policy, "starting crawl");

        let guard = barrier.register();
        tokio::spawn(visit(shared, root.to_string(), depth, guard));
        barrier.wait().await;

        info!(root, visited = registry.len(), "crawl finished");
    }
}

// One crawl task
//
// Boxed because it spawns itself: a plain async fn cannot name its own
// future type.
fn visit(
    shared: Arc<Shared>,
    url: String,
    depth: u32,
    guard: PendingGuard,
) -> BoxFuture<'static, ()> {
    async move {
        // Counts this task out on every return path, panics included
        let _guard = guard;

        if depth == 0 {
            debug!(%url, "depth budget exhausted");
            return;
        }

        if !shared.claim(&url) {
            debug!(%url, depth, "already visited");
            return;
        }

        let page = match shared.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(err) => {
                warn!(url = %err.url, error = %err.cause, "fetch failed");
                shared.sink.report_failure(&err);
                return;
            }
        };

        shared.registry.set(
            &url,
            VisitRecord::Fetched {
                content: page.body.clone(),
            },
        );
        shared.sink.emit(&url, &page.body);

        debug!(%url, depth, links = page.links.len(), "spawning link tasks");
        for link in page.links {
            let guard = shared.barrier.register();
            tokio::spawn(visit(Arc::clone(&shared), link, depth - 1, guard));
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{CannedFetcher, FetchError, FetchedPage};
    use crate::sink::CollectingSink;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::time::Duration;

    const POLICIES: [DedupPolicy; 2] = [DedupPolicy::BestEffort, DedupPolicy::Strict];

    // Wraps a canned graph and counts how often each URL is fetched
    struct CountingFetcher {
        inner: CannedFetcher,
        delay: Option<Duration>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl CountingFetcher {
        fn new(inner: CannedFetcher) -> Self {
            Self {
                inner,
                delay: None,
                calls: Mutex::new(HashMap::new()),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn calls(&self, url: &str) -> usize {
            self.calls.lock().get(url).copied().unwrap_or(0)
        }

        fn total_calls(&self) -> usize {
            self.calls.lock().values().sum()
        }
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            *self.calls.lock().entry(url.to_string()).or_default() += 1;
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.inner.fetch(url).await
        }
    }

    // Panics on one URL, answers normally otherwise
    struct PanickyFetcher {
        inner: CannedFetcher,
        poison: &'static str,
    }

    #[async_trait]
    impl Fetcher for PanickyFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            if url == self.poison {
                panic!("fetcher exploded on {url}");
            }
            self.inner.fetch(url).await
        }
    }

    fn build_crawler(
        fetcher: Arc<dyn Fetcher>,
        policy: DedupPolicy,
    ) -> (Crawler, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::new());
        let crawler = Crawler::new(fetcher, sink.clone()).with_policy(policy);
        (crawler, sink)
    }

    async fn crawl_with_deadline(crawler: &Crawler, root: &str, depth: u32) {
        tokio::time::timeout(Duration::from_secs(10), crawler.crawl(root, depth))
            .await
            .expect("crawl did not finish");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_small_graph_depth_two() {
        // A -> [B, C], B -> [A], C -> []
        for policy in POLICIES {
            let graph = CannedFetcher::new()
                .with_page("A", "page A", &["B", "C"])
                .with_page("B", "page B", &["A"])
                .with_page("C", "page C", &[]);
            let fetcher = Arc::new(CountingFetcher::new(graph));
            let (crawler, sink) = build_crawler(fetcher.clone(), policy);

            crawl_with_deadline(&crawler, "A", 2).await;

            // B's link back to A arrives with depth 0, so A is not refetched
            assert_eq!(fetcher.calls("A"), 1, "{policy:?}");
            assert_eq!(fetcher.calls("B"), 1, "{policy:?}");
            assert_eq!(fetcher.calls("C"), 1, "{policy:?}");
            assert_eq!(sink.pages().len(), 3, "{policy:?}");
            assert!(sink.failures().is_empty());
        }
    }

    #[tokio::test]
    async fn test_zero_depth_fetches_nothing() {
        for policy in POLICIES {
            let fetcher = Arc::new(CountingFetcher::new(
                CannedFetcher::new().with_page("X", "page X", &["Y"]),
            ));
            let (crawler, sink) = build_crawler(fetcher.clone(), policy);
            let registry = Arc::new(VisitedRegistry::new());

            crawler.crawl_into("X", 0, registry.clone()).await;

            assert_eq!(fetcher.total_calls(), 0);
            assert!(sink.pages().is_empty());
            assert!(registry.is_empty());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_depth_bounds_the_chain() {
        // a -> b -> c -> d -> e
        for policy in POLICIES {
            let chain = CannedFetcher::new()
                .with_page("a", "A", &["b"])
                .with_page("b", "B", &["c"])
                .with_page("c", "C", &["d"])
                .with_page("d", "D", &["e"])
                .with_page("e", "E", &[]);
            let fetcher = Arc::new(CountingFetcher::new(chain));
            let (crawler, sink) = build_crawler(fetcher.clone(), policy);

            crawl_with_deadline(&crawler, "a", 3).await;

            assert_eq!(fetcher.calls("a"), 1);
            assert_eq!(fetcher.calls("b"), 1);
            assert_eq!(fetcher.calls("c"), 1);
            assert_eq!(fetcher.calls("d"), 0, "fetched past the depth budget");
            assert_eq!(sink.pages().len(), 3);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cycles_terminate() {
        for policy in POLICIES {
            let cycle = CannedFetcher::new()
                .with_page("a", "A", &["b", "a"])
                .with_page("b", "B", &["a", "b"]);
            let fetcher = Arc::new(CountingFetcher::new(cycle));
            let (crawler, sink) = build_crawler(fetcher.clone(), policy);

            crawl_with_deadline(&crawler, "a", 12).await;

            assert!(sink.count("a") >= 1);
            assert!(sink.count("b") >= 1);
            // Tasks per level at most double, so fetches are bounded by 2^depth
            assert!(fetcher.total_calls() < 1 << 12);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failure_is_isolated() {
        for policy in POLICIES {
            let graph = CannedFetcher::new()
                .with_page("root", "Root", &["missing", "ok"])
                .with_page("ok", "Ok", &["leaf"])
                .with_page("leaf", "Leaf", &[]);
            let (crawler, sink) = build_crawler(Arc::new(graph), policy);

            crawl_with_deadline(&crawler, "root", 3).await;

            assert_eq!(sink.failures(), vec!["missing"]);
            assert_eq!(sink.count("root"), 1);
            assert_eq!(sink.count("ok"), 1);
            assert_eq!(sink.count("leaf"), 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_root_failure_ends_crawl() {
        let (crawler, sink) = build_crawler(Arc::new(CannedFetcher::new()), DedupPolicy::BestEffort);

        crawl_with_deadline(&crawler, "nowhere", 5).await;

        assert!(sink.pages().is_empty());
        assert_eq!(sink.failures(), vec!["nowhere"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_strict_fetches_each_url_once() {
        let links: Vec<&str> = std::iter::repeat("hub").take(50).collect();
        let graph = CannedFetcher::new()
            .with_page("root", "Root", &links)
            .with_page("hub", "Hub", &["root"]);
        let fetcher =
            Arc::new(CountingFetcher::new(graph).with_delay(Duration::from_millis(20)));
        let (crawler, sink) = build_crawler(fetcher.clone(), DedupPolicy::Strict);

        crawl_with_deadline(&crawler, "root", 4).await;

        assert_eq!(fetcher.calls("root"), 1);
        assert_eq!(fetcher.calls("hub"), 1);
        assert_eq!(sink.count("hub"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_best_effort_tolerates_duplicate_fetches() {
        let links: Vec<&str> = std::iter::repeat("hub").take(50).collect();
        let graph = CannedFetcher::new()
            .with_page("root", "Root", &links)
            .with_page("hub", "Hub", &[]);
        let fetcher =
            Arc::new(CountingFetcher::new(graph).with_delay(Duration::from_millis(50)));
        let (crawler, sink) = build_crawler(fetcher.clone(), DedupPolicy::BestEffort);

        crawl_with_deadline(&crawler, "root", 2).await;

        // Every sibling looks "hub" up before the first fetch of it returns
        assert!(fetcher.calls("hub") > 1);
        assert_eq!(sink.count("hub"), fetcher.calls("hub"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_registry_records_fetched_pages() {
        for policy in POLICIES {
            let graph = CannedFetcher::new()
                .with_page("a", "A", &["b", "gone"])
                .with_page("b", "B", &[]);
            let (crawler, _sink) = build_crawler(Arc::new(graph), policy);
            let registry = Arc::new(VisitedRegistry::new());

            crawler.crawl_into("a", 3, registry.clone()).await;

            assert_eq!(
                registry.get("a"),
                Some(VisitRecord::Fetched {
                    content: "A".to_string()
                })
            );
            assert!(registry.contains("b"));
            match policy {
                // Claimed before the fetch, and never released
                DedupPolicy::Strict => assert_eq!(registry.get("gone"), Some(VisitRecord::Reserved)),
                DedupPolicy::BestEffort => assert!(!registry.contains("gone")),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_golang_tour() {
        for policy in POLICIES {
            let (crawler, sink) = build_crawler(Arc::new(CannedFetcher::golang_tour()), policy);

            crawl_with_deadline(&crawler, "https://golang.org/", 4).await;

            for url in [
                "https://golang.org/",
                "https://golang.org/pkg/",
                "https://golang.org/pkg/fmt/",
                "https://golang.org/pkg/os/",
            ] {
                assert!(sink.count(url) >= 1, "{url} missing under {policy:?}");
                if policy == DedupPolicy::Strict {
                    assert_eq!(sink.count(url), 1);
                }
            }
            assert!(sink
                .failures()
                .iter()
                .all(|url| url == "https://golang.org/cmd/"));
            assert!(!sink.failures().is_empty());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_panicking_fetch_does_not_hang_crawl() {
        let graph = CannedFetcher::new()
            .with_page("root", "Root", &["boom", "fine"])
            .with_page("fine", "Fine", &[]);
        let fetcher = Arc::new(PanickyFetcher {
            inner: graph,
            poison: "boom",
        });
        let (crawler, sink) = build_crawler(fetcher, DedupPolicy::Strict);

        crawl_with_deadline(&crawler, "root", 2).await;

        assert_eq!(sink.count("root"), 1);
        assert_eq!(sink.count("fine"), 1);
    }
}
