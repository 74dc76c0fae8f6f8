//! Crawl engine: worker pool, session bookkeeping, completion detection

use crate::config::CrawlerConfig;
use crate::crawler::{
    build_http_client, fetch_html, parse_page, CrawlEvent, EventSink, Frontier,
};
use crate::robots::RobotsPolicy;
use crate::storage::{NewPage, SessionStatus, Store, StoreError};
use crate::url::{admissible, canonicalize, resolve, same_origin};
use crate::{Result, SearchlightError};
use reqwest::Client;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;

/// How long an idle worker waits on the frontier before checking whether
/// the crawl has drained
const IDLE_TICK: Duration = Duration::from_millis(100);

/// Final accounting of one crawl invocation
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub session_id: i64,
    pub pages_crawled: usize,
    pub status: SessionStatus,
}

/// Concurrent crawl engine
///
/// One engine serves one crawl at a time; a second `crawl` call while one
/// is running fails with `AlreadyRunning`. The engine may be reused for
/// subsequent sessions.
pub struct CrawlEngine {
    store: Arc<Store>,
    config: CrawlerConfig,
    client: Client,
    robots: Arc<RobotsPolicy>,
    frontier: Arc<Frontier>,
    running: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
    crawled: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    events: EventSink,
}

/// Everything a worker task needs, cloned per worker
#[derive(Clone)]
struct WorkerContext {
    store: Arc<Store>,
    client: Client,
    robots: Arc<RobotsPolicy>,
    frontier: Arc<Frontier>,
    running: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
    crawled: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    events: EventSink,
    seed: String,
    max_depth: u32,
    max_pages: usize,
    same_origin_only: bool,
    politeness_delay: Duration,
}

impl CrawlEngine {
    /// Creates an engine over a store with the given configuration
    ///
    /// The HTTP client and robots policy are built once and shared by all
    /// workers across sessions.
    pub fn new(
        store: Arc<Store>,
        config: CrawlerConfig,
        listener: Option<UnboundedSender<CrawlEvent>>,
    ) -> Result<Self> {
        let client = build_http_client(&config.user_agent, config.request_timeout_ms)?;
        let robots = Arc::new(RobotsPolicy::new(
            client.clone(),
            config.user_agent.clone(),
            config.respect_robots,
        ));

        Ok(Self {
            store,
            config,
            client,
            robots,
            frontier: Arc::new(Frontier::new()),
            running: Arc::new(AtomicBool::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
            crawled: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            events: EventSink::new(listener),
        })
    }

    /// Crawls from a seed URL down to `max_depth` (config default when
    /// omitted)
    ///
    /// Returns when the frontier drains, the page cap is reached, or
    /// `stop` is called. The session row records the outcome either way.
    pub async fn crawl(&self, seed: &str, max_depth: Option<u32>) -> Result<CrawlOutcome> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SearchlightError::AlreadyRunning);
        }

        let max_depth = max_depth.unwrap_or(self.config.default_depth);

        let seed_url = match canonicalize(seed) {
            Ok(url) => url,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(SearchlightError::InvalidSeed(format!("{seed}: {e}")));
            }
        };

        let session_id = match self.store.create_session(&seed_url, max_depth) {
            Ok(id) => id,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e.into());
            }
        };

        tracing::info!(
            "Starting crawl from {} (max depth {}, {} workers, limit {} pages)",
            seed_url,
            max_depth,
            self.config.thread_pool_size,
            self.config.max_pages
        );

        self.crawled.store(0, Ordering::SeqCst);
        self.in_flight.store(0, Ordering::SeqCst);
        self.stop_requested.store(false, Ordering::SeqCst);
        self.frontier.clear();
        self.frontier.reset_cancellation();
        self.frontier.offer(&seed_url, 0);

        self.events.emit(CrawlEvent::Started {
            seed: seed_url.clone(),
            max_depth,
        });

        let mut workers = JoinSet::new();
        for worker_id in 0..self.config.thread_pool_size {
            let ctx = WorkerContext {
                store: Arc::clone(&self.store),
                client: self.client.clone(),
                robots: Arc::clone(&self.robots),
                frontier: Arc::clone(&self.frontier),
                running: Arc::clone(&self.running),
                stop_requested: Arc::clone(&self.stop_requested),
                crawled: Arc::clone(&self.crawled),
                in_flight: Arc::clone(&self.in_flight),
                events: self.events.clone(),
                seed: seed_url.clone(),
                max_depth,
                max_pages: self.config.max_pages,
                same_origin_only: self.config.same_origin_only,
                politeness_delay: Duration::from_millis(self.config.politeness_delay_ms),
            };
            workers.spawn(worker_loop(worker_id, ctx));
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Crawl worker panicked: {e}");
            }
        }

        let total = self.crawled.load(Ordering::SeqCst);
        let status = if self.stop_requested.load(Ordering::SeqCst) {
            // Whatever is still queued is abandoned unprocessed
            self.frontier.clear();
            SessionStatus::Stopped
        } else {
            SessionStatus::Completed
        };
        self.running.store(false, Ordering::SeqCst);

        if let Err(e) = self.store.update_session(session_id, total as u32, status, true) {
            tracing::error!("Failed to finalize session {}: {}", session_id, e);
        }

        match status {
            SessionStatus::Stopped => self.events.emit(CrawlEvent::Stopped { total_pages: total }),
            _ => self.events.emit(CrawlEvent::Completed { total_pages: total }),
        }

        tracing::info!(
            "Crawl {} with {} pages",
            status.to_db_string(),
            total
        );

        Ok(CrawlOutcome {
            session_id,
            pages_crawled: total,
            status,
        })
    }

    /// Stops the running crawl
    ///
    /// Workers observe the flag between steps and exit promptly; takes
    /// blocked on the frontier are released immediately. A no-op when no
    /// crawl is running.
    pub fn stop(&self) {
        if self.running.load(Ordering::SeqCst) {
            tracing::info!("Stopping crawl");
            self.stop_requested.store(true, Ordering::SeqCst);
            self.running.store(false, Ordering::SeqCst);
            self.frontier.cancel();
        }
    }

    /// True while a crawl is in progress
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Pages persisted by the current or last session
    pub fn pages_crawled(&self) -> usize {
        self.crawled.load(Ordering::SeqCst)
    }

    /// Current frontier queue size
    pub fn queue_size(&self) -> usize {
        self.frontier.size()
    }
}

async fn worker_loop(worker_id: usize, ctx: WorkerContext) {
    tracing::debug!("Crawl worker {} started", worker_id);

    loop {
        if !ctx.running.load(Ordering::SeqCst)
            || ctx.crawled.load(Ordering::SeqCst) >= ctx.max_pages
        {
            break;
        }

        match tokio::time::timeout(IDLE_TICK, ctx.frontier.take()).await {
            Ok(Some((url, depth))) => {
                // The in-flight window spans processing AND link enqueue,
                // so an idle sibling cannot declare completion while this
                // worker is about to offer new URLs
                ctx.in_flight.fetch_add(1, Ordering::SeqCst);
                let fetched = process_url(&ctx, &url, depth).await;
                ctx.in_flight.fetch_sub(1, Ordering::SeqCst);

                if fetched && ctx.politeness_delay > Duration::ZERO {
                    tokio::time::sleep(ctx.politeness_delay).await;
                }
            }
            Ok(None) => break, // cancelled
            Err(_) => {
                // Transient emptiness is not completion; only an empty
                // queue with zero in-flight workers is
                if ctx.frontier.is_empty() && ctx.in_flight.load(Ordering::SeqCst) == 0 {
                    break;
                }
            }
        }
    }

    tracing::debug!("Crawl worker {} finished", worker_id);
}

/// Processes one frontier entry; returns true when an HTTP fetch happened
async fn process_url(ctx: &WorkerContext, url: &str, depth: u32) -> bool {
    ctx.events.emit(CrawlEvent::PageStart {
        url: url.to_string(),
        depth,
    });

    if !ctx.robots.allowed(url).await {
        tracing::info!("Skipping {} (disallowed by robots.txt)", url);
        ctx.events.emit(CrawlEvent::PageSkipped {
            url: url.to_string(),
            reason: "disallowed by robots.txt".to_string(),
        });
        return false;
    }

    let fetched = match fetch_html(&ctx.client, url).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", url, e);
            ctx.events.emit(CrawlEvent::PageError {
                url: url.to_string(),
                depth,
                error: e.to_string(),
            });
            return true;
        }
    };

    let parsed = parse_page(&fetched.body);

    match ctx.store.insert_page(&NewPage {
        url,
        title: &parsed.title,
        body: &parsed.body,
        depth,
    }) {
        Ok(page_id) => {
            let crawled = ctx.crawled.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::info!("Crawled {}/{}: {}", crawled, ctx.max_pages, url);
            ctx.events.emit(CrawlEvent::PageSuccess {
                url: url.to_string(),
                depth,
                page_id,
                crawled,
            });

            if crawled >= ctx.max_pages {
                tracing::info!("Reached page limit ({}), stopping crawl", ctx.max_pages);
                ctx.stop_requested.store(true, Ordering::SeqCst);
                ctx.running.store(false, Ordering::SeqCst);
                ctx.frontier.cancel();
            }
        }
        Err(StoreError::UrlExists(_)) => {
            // Another worker won the race for this URL
            tracing::debug!("Page already stored: {}", url);
        }
        Err(e) => {
            tracing::error!("Failed to store {}: {}", url, e);
            ctx.events.emit(CrawlEvent::PageError {
                url: url.to_string(),
                depth,
                error: e.to_string(),
            });
        }
    }

    if depth < ctx.max_depth && ctx.running.load(Ordering::SeqCst) {
        enqueue_links(ctx, url, depth, &parsed.links);
    }

    true
}

/// Resolves, filters and offers a page's outbound links
fn enqueue_links(ctx: &WorkerContext, page_url: &str, depth: u32, hrefs: &[String]) {
    let mut queued = 0;

    for href in hrefs {
        let Ok(link) = resolve(page_url, href) else {
            continue;
        };
        if !admissible(&link) {
            continue;
        }
        if ctx.same_origin_only && !same_origin(&ctx.seed, &link) {
            continue;
        }
        if ctx.frontier.offer(&link, depth + 1) {
            queued += 1;
        }
    }

    tracing::debug!(
        "Found {} links on {}, queued {}",
        hrefs.len(),
        page_url,
        queued
    );
}
