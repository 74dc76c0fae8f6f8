use std::collections::HashSet;

/// Embedded stop-word list, one word per line with `#` comments
const STOPWORDS_RESOURCE: &str = include_str!("stopwords.txt");

/// Minimal fallback list used if the resource parses to nothing
const BUILT_IN: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with",
];

/// Drops common English words that carry no retrieval value
pub struct StopWordFilter {
    words: HashSet<String>,
}

impl StopWordFilter {
    /// Creates a filter from the embedded word list
    pub fn new() -> Self {
        let words = Self::parse(STOPWORDS_RESOURCE);
        if words.is_empty() {
            tracing::warn!("Stop-word resource is empty, using built-in list");
            return Self::built_in();
        }
        Self { words }
    }

    /// Creates a filter from the built-in fallback list
    pub fn built_in() -> Self {
        Self {
            words: BUILT_IN.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Parses a word-per-line resource, skipping blanks and `#` comments
    fn parse(text: &str) -> HashSet<String> {
        text.lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    /// Checks whether a word is a stop word (case-insensitive)
    pub fn is_stop_word(&self, word: &str) -> bool {
        if word.chars().any(|c| c.is_uppercase()) {
            return self.words.contains(&word.to_lowercase());
        }
        self.words.contains(word)
    }

    /// Returns the number of loaded stop words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true when no stop words are loaded
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopWordFilter {
    fn default() -> Self {
        Self::new()
    }
}
