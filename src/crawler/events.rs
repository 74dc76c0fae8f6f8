//! Typed crawl progress events
//!
//! Events are delivered best-effort: with no listener registered they are
//! dropped, and a closed receiver never disturbs the crawl.

use tokio::sync::mpsc::UnboundedSender;

/// Progress events emitted by the crawl engine
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    /// A session opened with the given seed and depth limit
    Started { seed: String, max_depth: u32 },

    /// A worker began processing a URL
    PageStart { url: String, depth: u32 },

    /// A page was fetched and persisted
    PageSuccess {
        url: String,
        depth: u32,
        page_id: i64,
        crawled: usize,
    },

    /// Fetching or parsing a page failed
    PageError {
        url: String,
        depth: u32,
        error: String,
    },

    /// A URL was skipped without fetching
    PageSkipped { url: String, reason: String },

    /// The frontier drained naturally
    Completed { total_pages: usize },

    /// The session was stopped explicitly or hit its page cap
    Stopped { total_pages: usize },
}

/// Best-effort sender for crawl events
#[derive(Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<CrawlEvent>>,
}

impl EventSink {
    /// Creates a sink; `None` means events are discarded
    pub fn new(tx: Option<UnboundedSender<CrawlEvent>>) -> Self {
        Self { tx }
    }

    /// Emits an event, ignoring send failures
    pub fn emit(&self, event: CrawlEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
