//! In-memory positional inverted index
//!
//! Maps each term to its posting list: one entry per page holding the
//! term frequency and the ordered token positions. The map is sharded
//! (`DashMap`), so concurrent `add` calls serialize per shard and readers
//! always observe a complete posting list. Readers receive cloned
//! snapshots; the index is mutated only through `add` and `clear`.
//!
//! The durable mirror of this structure lives in the store's `words` and
//! `postings` tables and is written by the indexer; the in-memory side can
//! be rebuilt from it at any time.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// One page's occurrences of one term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    /// The page containing the term
    pub page_id: i64,

    /// Number of occurrences; always equals `positions.len()`
    pub frequency: u32,

    /// Zero-based token positions, ascending when fed in scan order
    pub positions: Vec<u32>,
}

impl Posting {
    fn new(page_id: i64) -> Self {
        Self {
            page_id,
            frequency: 0,
            positions: Vec::new(),
        }
    }

    fn add_position(&mut self, position: u32) {
        self.positions.push(position);
        self.frequency += 1;
    }
}

/// Summary statistics over the index
#[derive(Debug, Clone, Copy)]
pub struct IndexStats {
    pub unique_terms: usize,
    pub total_occurrences: u64,
    pub avg_posting_list_len: f64,
}

/// Concurrent term -> posting-list map
#[derive(Default)]
pub struct InvertedIndex {
    terms: DashMap<String, Vec<Posting>>,
    total_occurrences: AtomicU64,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of a term on a page
    ///
    /// The term is expected to be lower-cased and stemmed already. The
    /// posting for `(term, page_id)` is created on first sight; its
    /// positions list is append-only.
    pub fn add(&self, term: &str, page_id: i64, position: u32) {
        if term.is_empty() {
            return;
        }

        let mut postings = self.terms.entry(term.to_string()).or_default();
        match postings.iter_mut().find(|p| p.page_id == page_id) {
            Some(posting) => posting.add_position(position),
            None => {
                let mut posting = Posting::new(page_id);
                posting.add_position(position);
                postings.push(posting);
            }
        }

        self.total_occurrences.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of the posting list for a term
    ///
    /// Lookup is case-insensitive; a miss yields an empty list.
    pub fn postings(&self, term: &str) -> Vec<Posting> {
        let needle = term.to_lowercase();
        self.terms
            .get(&needle)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Frequency of a term on one page, 0 when absent
    pub fn term_frequency(&self, term: &str, page_id: i64) -> u32 {
        let needle = term.to_lowercase();
        self.terms
            .get(&needle)
            .and_then(|entry| {
                entry
                    .value()
                    .iter()
                    .find(|p| p.page_id == page_id)
                    .map(|p| p.frequency)
            })
            .unwrap_or(0)
    }

    /// Pages containing every given term (conjunctive retrieval)
    ///
    /// Short-circuits on the first term with an empty posting list.
    /// The result is sorted by page id for deterministic downstream
    /// ordering.
    pub fn pages_containing_all(&self, terms: &[String]) -> Vec<i64> {
        let mut iter = terms.iter();
        let first = match iter.next() {
            Some(t) => t,
            None => return Vec::new(),
        };

        let mut result: Vec<i64> = self.postings(first).iter().map(|p| p.page_id).collect();
        if result.is_empty() {
            return Vec::new();
        }

        for term in iter {
            let pages: Vec<i64> = self.postings(term).iter().map(|p| p.page_id).collect();
            result.retain(|id| pages.contains(id));
            if result.is_empty() {
                return Vec::new();
            }
        }

        result.sort_unstable();
        result.dedup();
        result
    }

    /// Pages containing at least one of the given terms
    pub fn pages_containing_any(&self, terms: &[String]) -> Vec<i64> {
        let mut result: Vec<i64> = terms
            .iter()
            .flat_map(|t| self.postings(t).into_iter().map(|p| p.page_id))
            .collect();
        result.sort_unstable();
        result.dedup();
        result
    }

    /// Number of pages containing the term
    pub fn document_frequency(&self, term: &str) -> usize {
        let needle = term.to_lowercase();
        self.terms.get(&needle).map(|e| e.value().len()).unwrap_or(0)
    }

    /// Number of distinct terms in the index
    pub fn unique_terms(&self) -> usize {
        self.terms.len()
    }

    /// Total occurrences recorded since the last clear
    pub fn total_occurrences(&self) -> u64 {
        self.total_occurrences.load(Ordering::Relaxed)
    }

    /// Removes every posting for a page
    ///
    /// Re-indexing a page deletes its durable postings first; this keeps
    /// the in-memory side in step.
    pub fn remove_page(&self, page_id: i64) {
        let mut removed: u64 = 0;

        for mut entry in self.terms.iter_mut() {
            let dropped: u64 = entry
                .value()
                .iter()
                .filter(|p| p.page_id == page_id)
                .map(|p| p.frequency as u64)
                .sum();
            if dropped > 0 {
                entry.value_mut().retain(|p| p.page_id != page_id);
                removed += dropped;
            }
        }

        self.terms.retain(|_, postings| !postings.is_empty());
        self.total_occurrences.fetch_sub(removed, Ordering::Relaxed);
    }

    /// Removes everything from the index
    pub fn clear(&self) {
        self.terms.clear();
        self.total_occurrences.store(0, Ordering::Relaxed);
    }

    /// Summary statistics for status output
    pub fn stats(&self) -> IndexStats {
        let unique = self.terms.len();
        let total_postings: usize = self.terms.iter().map(|e| e.value().len()).sum();
        IndexStats {
            unique_terms: unique,
            total_occurrences: self.total_occurrences(),
            avg_posting_list_len: if unique == 0 {
                0.0
            } else {
                total_postings as f64 / unique as f64
            },
        }
    }
}
