//! Text analysis pipeline: tokenizer, stop-word filter, stemmer
//!
//! Pages and queries run through the same three stages. For pages the
//! pipeline preserves token positions (title tokens come first in the
//! stream, which biases snippet and ranking heuristics toward titles);
//! for queries positions are irrelevant and the pre-stem terms are kept
//! for snippet highlighting.
//!
//! Every stage is a pure function over its input: analyzing the same text
//! with the same stop-word set always yields the same tokens.

mod stemmer;
mod stopwords;
mod tokenizer;

pub use stemmer::Stemmer;
pub use stopwords::StopWordFilter;
pub use tokenizer::{Token, Tokenizer};

use crate::config::IndexerConfig;

/// Analyzed terms of a query: stemmed terms drive retrieval, original
/// terms drive highlighting
#[derive(Debug, Clone, Default)]
pub struct QueryTerms {
    /// Lower-cased, stop-filtered, stemmed terms
    pub stemmed: Vec<String>,

    /// Lower-cased, stop-filtered terms before stemming
    pub original: Vec<String>,
}

/// The full analysis pipeline
pub struct Analyzer {
    tokenizer: Tokenizer,
    stop_words: StopWordFilter,
}

impl Analyzer {
    /// Creates an analyzer with the configured token length bounds
    pub fn new(config: &IndexerConfig) -> Self {
        Self {
            tokenizer: Tokenizer::new(config.min_word_length, config.max_word_length),
            stop_words: StopWordFilter::new(),
        }
    }

    /// Analyzes document text into stemmed tokens with positions
    ///
    /// Positions are assigned by the tokenizer before stop-word filtering
    /// and are not renumbered afterwards, so gaps mark dropped stop words.
    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut stemmer = Stemmer::new();
        self.tokenizer
            .tokenize_with_positions(text)
            .into_iter()
            .filter(|t| !self.stop_words.is_stop_word(&t.text))
            .map(|t| Token {
                text: stemmer.stem(&t.text),
                position: t.position,
                offset: t.offset,
            })
            .collect()
    }

    /// Analyzes a query into stemmed and original term lists
    pub fn analyze_query(&self, query: &str) -> QueryTerms {
        let mut stemmer = Stemmer::new();
        let mut terms = QueryTerms::default();

        for token in self.tokenizer.tokenize(query) {
            if self.stop_words.is_stop_word(&token) {
                continue;
            }
            terms.stemmed.push(stemmer.stem(&token));
            terms.original.push(token);
        }

        terms
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(&IndexerConfig::default())
    }
}
