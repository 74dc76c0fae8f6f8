//! Ranked retrieval over the inverted index
//!
//! Queries run through the same analysis pipeline as pages, candidates
//! come from conjunctive retrieval (every stemmed term must match), and
//! ranking is TF-IDF with a deterministic page-id tie-break. Store
//! failures surface as an empty result list with a logged cause.

mod snippet;

pub use snippet::SnippetGenerator;

use crate::analysis::Analyzer;
use crate::config::{IndexerConfig, SearchConfig};
use crate::index::InvertedIndex;
use crate::storage::{PageRecord, Store};
use std::cmp::Ordering;
use std::sync::Arc;

/// One ranked search hit
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub page_id: i64,
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub score: f64,
    /// 1-based rank within the full ranked list
    pub rank: usize,
}

/// Corpus-level figures for status output
#[derive(Debug, Clone, Copy)]
pub struct SearchStatistics {
    pub unique_terms: usize,
    pub total_occurrences: u64,
    pub total_pages: u64,
}

/// Query execution over the index and store
pub struct SearchEngine {
    store: Arc<Store>,
    index: Arc<InvertedIndex>,
    analyzer: Analyzer,
    snippets: SnippetGenerator,
    max_results: usize,
}

impl SearchEngine {
    pub fn new(
        store: Arc<Store>,
        index: Arc<InvertedIndex>,
        indexer_config: &IndexerConfig,
        search_config: &SearchConfig,
    ) -> Self {
        Self {
            store,
            index,
            analyzer: Analyzer::new(indexer_config),
            snippets: SnippetGenerator::new(search_config.snippet_length),
            max_results: search_config.max_results,
        }
    }

    /// Searches with the configured result cap
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        self.search_with_limit(query, self.max_results)
    }

    /// Searches for pages matching every query term
    ///
    /// An empty or all-stop-word query returns no results without
    /// touching the store.
    pub fn search_with_limit(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let terms = self.analyzer.analyze_query(query);
        if terms.stemmed.is_empty() {
            tracing::debug!("No searchable terms in query: {:?}", query);
            return Vec::new();
        }

        tracing::info!("Searching for {:?} -> {:?}", query, terms.stemmed);

        let candidates = self.index.pages_containing_all(&terms.stemmed);
        if candidates.is_empty() {
            return Vec::new();
        }

        let total_pages = match self.store.count_pages() {
            Ok(count) => count.max(1),
            Err(e) => {
                tracing::error!("Search failed reading page count: {}", e);
                return Vec::new();
            }
        };

        let mut results = Vec::with_capacity(candidates.len());
        for page_id in candidates {
            let page = match self.store.get_page_by_id(page_id) {
                Ok(Some(page)) => page,
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!("Search failed loading page {}: {}", page_id, e);
                    continue;
                }
            };

            let score = self.score_page(&page, &terms.stemmed, total_pages);
            let snippet = self.snippets.generate(&page.body, &terms.original);

            results.push(SearchResult {
                page_id,
                url: page.url,
                title: page.title,
                snippet,
                score,
                rank: 0,
            });
        }

        // Score descending; equal scores order by ascending page id
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.page_id.cmp(&b.page_id))
        });
        for (i, result) in results.iter_mut().enumerate() {
            result.rank = i + 1;
        }
        results.truncate(limit);

        tracing::info!("Found {} results for {:?}", results.len(), query);
        results
    }

    /// Returns one page of the ranked list; `page` is 1-based
    ///
    /// Ranks are global, so page 2 of size 10 carries ranks 11..=20.
    pub fn search_paginated(
        &self,
        query: &str,
        page: usize,
        page_size: usize,
    ) -> Vec<SearchResult> {
        if page == 0 || page_size == 0 {
            return Vec::new();
        }

        let ranked = self.search_with_limit(query, page * page_size);
        let start = (page - 1) * page_size;
        if start >= ranked.len() {
            return Vec::new();
        }

        ranked.into_iter().skip(start).take(page_size).collect()
    }

    /// Sum over query terms of tf(page, term) * idf(term)
    ///
    /// tf is the term's share of the page's indexed tokens (0 for an
    /// unindexed page), idf is ln(N / df).
    fn score_page(&self, page: &PageRecord, terms: &[String], total_pages: u64) -> f64 {
        if page.word_count == 0 {
            return 0.0;
        }

        let mut score = 0.0;
        for term in terms {
            let frequency = self.index.term_frequency(term, page.id);
            if frequency == 0 {
                continue;
            }
            let df = self.index.document_frequency(term);
            if df == 0 {
                continue;
            }

            let tf = frequency as f64 / page.word_count as f64;
            let idf = (total_pages as f64 / df as f64).ln();
            score += tf * idf;
        }
        score
    }

    /// Corpus statistics for status output
    pub fn statistics(&self) -> SearchStatistics {
        SearchStatistics {
            unique_terms: self.index.unique_terms(),
            total_occurrences: self.index.total_occurrences(),
            total_pages: self.store.count_pages().unwrap_or(0),
        }
    }
}
