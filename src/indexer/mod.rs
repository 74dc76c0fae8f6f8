//! Indexing pipeline: stored pages -> analyzer -> index (memory + store)
//!
//! The indexer is the only writer of the index's two representations.
//! For each page it analyzes `title + " " + body`, feeds every surviving
//! token's stem into the in-memory index, mirrors the grouped postings
//! into the store, and records the page's indexed word count.

use crate::analysis::Analyzer;
use crate::config::IndexerConfig;
use crate::index::InvertedIndex;
use crate::storage::{PageRecord, Store, StoreError};
use crate::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Callback invoked after each page is indexed: (page id, url, word count)
pub type ProgressListener = Box<dyn Fn(i64, &str, u32) + Send + Sync>;

/// Counters describing indexing work done so far
#[derive(Debug, Clone, Copy)]
pub struct IndexingStats {
    pub pages_indexed: usize,
    pub words_indexed: usize,
    pub unique_terms: usize,
    pub total_occurrences: u64,
}

/// Builds and maintains the inverted index over stored pages
pub struct Indexer {
    store: Arc<Store>,
    index: Arc<InvertedIndex>,
    analyzer: Analyzer,
    pages_indexed: AtomicUsize,
    words_indexed: AtomicUsize,
    progress: Option<ProgressListener>,
}

impl Indexer {
    pub fn new(store: Arc<Store>, index: Arc<InvertedIndex>, config: &IndexerConfig) -> Self {
        Self {
            store,
            index,
            analyzer: Analyzer::new(config),
            pages_indexed: AtomicUsize::new(0),
            words_indexed: AtomicUsize::new(0),
            progress: None,
        }
    }

    /// Registers a progress callback
    pub fn set_progress_listener(&mut self, listener: ProgressListener) {
        self.progress = Some(listener);
    }

    /// Indexes one page, returning its indexed word count
    ///
    /// Title tokens precede body tokens in the analysis stream, so they
    /// take the lowest positions.
    pub fn index_page(&self, page: &PageRecord) -> Result<u32> {
        let stream = format!("{} {}", page.title, page.body);
        let tokens = self.analyzer.analyze(&stream);
        let word_count = tokens.len() as u32;

        // Memory side first: queries see the page as soon as possible
        for token in &tokens {
            self.index.add(&token.text, page.id, token.position as u32);
        }

        // Group positions per stem for the durable mirror
        let mut grouped: HashMap<&str, Vec<u32>> = HashMap::new();
        for token in &tokens {
            grouped
                .entry(token.text.as_str())
                .or_default()
                .push(token.position as u32);
        }

        for (stem, positions) in &grouped {
            self.store.upsert_posting(stem, page.id, positions)?;
        }

        self.store.update_page_word_count(page.id, word_count)?;

        self.pages_indexed.fetch_add(1, Ordering::Relaxed);
        self.words_indexed
            .fetch_add(word_count as usize, Ordering::Relaxed);

        if let Some(listener) = &self.progress {
            listener(page.id, &page.url, word_count);
        }

        tracing::debug!("Indexed page {} ({} words)", page.url, word_count);
        Ok(word_count)
    }

    /// Indexes a page by id
    pub fn index_page_by_id(&self, page_id: i64) -> Result<u32> {
        let page = self
            .store
            .get_page_by_id(page_id)?
            .ok_or(StoreError::PageNotFound(page_id))?;
        self.index_page(&page)
    }

    /// Re-indexes a page: its old postings are deleted from both
    /// representations, then the page is indexed afresh
    ///
    /// Running this twice leaves the store exactly as one run does.
    pub fn reindex_page(&self, page_id: i64) -> Result<u32> {
        self.store.delete_postings_for_page(page_id)?;
        self.index.remove_page(page_id);
        self.index_page_by_id(page_id)
    }

    /// Indexes every stored page, returning the success count
    ///
    /// Per-page failures are logged and skipped.
    pub fn index_all_pages(&self) -> Result<usize> {
        let pages = self.store.list_pages()?;
        tracing::info!("Indexing {} pages", pages.len());

        let mut indexed = 0;
        for page in &pages {
            match self.index_page(page) {
                Ok(_) => indexed += 1,
                Err(e) => tracing::error!("Failed to index page {}: {}", page.url, e),
            }
        }

        tracing::info!("Indexing complete: {}/{} pages", indexed, pages.len());
        Ok(indexed)
    }

    /// Rebuilds the in-memory index from the store's postings
    ///
    /// Rows whose positions cannot be parsed are skipped with a warning;
    /// one corrupt row must not poison startup.
    pub fn rebuild_memory_index(&self) -> Result<usize> {
        self.index.clear();

        let rows = self.store.all_postings()?;
        let mut restored = 0;

        for row in &rows {
            match crate::storage::positions_from_csv(&row.positions_csv) {
                Some(positions) => {
                    for position in positions {
                        self.index.add(&row.term, row.page_id, position);
                    }
                    restored += 1;
                }
                None => {
                    tracing::warn!(
                        "Skipping corrupt posting for term '{}' on page {}",
                        row.term,
                        row.page_id
                    );
                }
            }
        }

        tracing::info!("Restored {} postings into the in-memory index", restored);
        Ok(restored)
    }

    /// Indexing counters plus index summary figures
    pub fn stats(&self) -> IndexingStats {
        IndexingStats {
            pages_indexed: self.pages_indexed.load(Ordering::Relaxed),
            words_indexed: self.words_indexed.load(Ordering::Relaxed),
            unique_terms: self.index.unique_terms(),
            total_occurrences: self.index.total_occurrences(),
        }
    }

    /// The in-memory index this indexer maintains
    pub fn index(&self) -> &Arc<InvertedIndex> {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NewPage;

    fn setup() -> (Arc<Store>, Arc<InvertedIndex>, Indexer) {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let index = Arc::new(InvertedIndex::new());
        let indexer = Indexer::new(
            Arc::clone(&store),
            Arc::clone(&index),
            &IndexerConfig::default(),
        );
        (store, index, indexer)
    }

    fn insert_page(store: &Store, url: &str, title: &str, body: &str) -> PageRecord {
        let id = store
            .insert_page(&NewPage {
                url,
                title,
                body,
                depth: 0,
            })
            .unwrap();
        store.get_page_by_id(id).unwrap().unwrap()
    }

    #[test]
    fn test_index_page_populates_both_sides() {
        let (store, index, indexer) = setup();
        let page = insert_page(
            &store,
            "https://a/",
            "Rust Guide",
            "Learning Rust programming",
        );

        let word_count = indexer.index_page(&page).unwrap();
        // rust, guide, learn, rust, program
        assert_eq!(word_count, 5);

        // Memory side
        assert_eq!(index.term_frequency("rust", page.id), 2);
        assert_eq!(index.term_frequency("guid", page.id), 1);

        // Durable side
        let rows = store.postings_for_page(page.id).unwrap();
        assert!(!rows.is_empty());
        let rust_row = rows.iter().find(|r| r.term == "rust").unwrap();
        assert_eq!(rust_row.frequency, 2);

        // Word count persisted
        let stored = store.get_page_by_id(page.id).unwrap().unwrap();
        assert_eq!(stored.word_count, 5);
    }

    #[test]
    fn test_title_tokens_take_lowest_positions() {
        let (store, index, indexer) = setup();
        let page = insert_page(&store, "https://a/", "alpha", "beta gamma");
        indexer.index_page(&page).unwrap();

        let postings = index.postings("alpha");
        assert_eq!(postings[0].positions, vec![0]);
        let postings = index.postings("beta");
        assert_eq!(postings[0].positions, vec![1]);
    }

    #[test]
    fn test_stored_positions_match_frequency() {
        let (store, _, indexer) = setup();
        let page = insert_page(&store, "https://a/", "echo", "echo echo delta");
        indexer.index_page(&page).unwrap();

        for row in store.postings_for_page(page.id).unwrap() {
            let positions = crate::storage::positions_from_csv(&row.positions_csv).unwrap();
            assert_eq!(row.frequency as usize, positions.len());
            let mut sorted = positions.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, positions, "positions not ascending");
        }
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let (store, index, indexer) = setup();
        let page = insert_page(&store, "https://a/", "Topic", "repeated words repeated");
        indexer.index_page(&page).unwrap();

        indexer.reindex_page(page.id).unwrap();
        let first: Vec<_> = store
            .postings_for_page(page.id)
            .unwrap()
            .iter()
            .map(|r| (r.term.clone(), r.frequency, r.positions_csv.clone()))
            .collect();
        let mem_first = index.term_frequency("repeat", page.id);

        indexer.reindex_page(page.id).unwrap();
        let second: Vec<_> = store
            .postings_for_page(page.id)
            .unwrap()
            .iter()
            .map(|r| (r.term.clone(), r.frequency, r.positions_csv.clone()))
            .collect();

        assert_eq!(first, second);
        assert_eq!(mem_first, index.term_frequency("repeat", page.id));
    }

    #[test]
    fn test_index_all_pages() {
        let (store, _, indexer) = setup();
        insert_page(&store, "https://a/", "One", "first page body");
        insert_page(&store, "https://b/", "Two", "second page body");

        let indexed = indexer.index_all_pages().unwrap();
        assert_eq!(indexed, 2);

        let stats = indexer.stats();
        assert_eq!(stats.pages_indexed, 2);
        assert!(stats.unique_terms > 0);
    }

    #[test]
    fn test_rebuild_memory_index() {
        let (store, index, indexer) = setup();
        let page = insert_page(&store, "https://a/", "Alpha Beta", "gamma alpha");
        indexer.index_page(&page).unwrap();

        let df_before = index.document_frequency("alpha");
        let freq_before = index.term_frequency("alpha", page.id);
        let occurrences_before = index.total_occurrences();

        index.clear();
        assert_eq!(index.unique_terms(), 0);

        let restored = indexer.rebuild_memory_index().unwrap();
        assert!(restored > 0);
        assert_eq!(index.document_frequency("alpha"), df_before);
        assert_eq!(index.term_frequency("alpha", page.id), freq_before);
        assert_eq!(index.total_occurrences(), occurrences_before);
    }

    #[test]
    fn test_index_missing_page_fails() {
        let (_, _, indexer) = setup();
        assert!(indexer.index_page_by_id(12345).is_err());
    }

    #[test]
    fn test_progress_listener_fires() {
        let (store, _index, mut indexer) = setup();

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        indexer.set_progress_listener(Box::new(move |_, _, _| {
            seen_clone.fetch_add(1, Ordering::Relaxed);
        }));

        let page = insert_page(&store, "https://a/", "T", "body words here");
        indexer.index_page(&page).unwrap();
        assert_eq!(seen.load(Ordering::Relaxed), 1);
    }
}
