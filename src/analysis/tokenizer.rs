use regex::Regex;
use std::sync::OnceLock;

/// A token with its sequential position and character offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The lower-cased token text
    pub text: String,

    /// Sequential position among emitted tokens (0, 1, 2, ...)
    pub position: usize,

    /// Byte offset of the token in the lower-cased source text
    pub offset: usize,
}

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("[a-z0-9]+").expect("literal pattern compiles"))
}

/// Splits text into lower-cased alphanumeric tokens
///
/// Tokens are maximal `[a-z0-9]+` runs of the lower-cased input. Tokens
/// outside the configured length bounds and tokens consisting purely of
/// digits are dropped. Positions increase by one per emitted token, so a
/// dropped token leaves no gap.
pub struct Tokenizer {
    min_len: usize,
    max_len: usize,
}

impl Tokenizer {
    /// Creates a tokenizer with the given token length bounds (inclusive)
    pub fn new(min_len: usize, max_len: usize) -> Self {
        Self { min_len, max_len }
    }

    /// Tokenizes text into a list of lower-cased words
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenize_with_positions(text)
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    /// Tokenizes text, keeping each token's position and character offset
    pub fn tokenize_with_positions(&self, text: &str) -> Vec<Token> {
        if text.is_empty() {
            return Vec::new();
        }

        let lower = text.to_lowercase();
        let mut tokens = Vec::new();
        let mut position = 0;

        for found in word_pattern().find_iter(&lower) {
            let word = found.as_str();

            if word.len() < self.min_len || word.len() > self.max_len {
                continue;
            }

            // Pure numbers carry no retrieval value
            if word.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }

            tokens.push(Token {
                text: word.to_string(),
                position,
                offset: found.start(),
            });
            position += 1;
        }

        tokens
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(2, 50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokenization() {
        let tokenizer = Tokenizer::default();
        let tokens = tokenizer.tokenize("Hello, World! Rust-lang rocks.");
        assert_eq!(tokens, vec!["hello", "world", "rust", "lang", "rocks"]);
    }

    #[test]
    fn test_lowercasing() {
        let tokenizer = Tokenizer::default();
        assert_eq!(tokenizer.tokenize("JAVA Java jAvA"), vec!["java", "java", "java"]);
    }

    #[test]
    fn test_single_characters_dropped() {
        let tokenizer = Tokenizer::default();
        assert_eq!(tokenizer.tokenize("a b c ab"), vec!["ab"]);
    }

    #[test]
    fn test_pure_digits_dropped() {
        let tokenizer = Tokenizer::default();
        assert_eq!(tokenizer.tokenize("2024 was the year of http2"), vec!["was", "the", "year", "of", "http2"]);
    }

    #[test]
    fn test_overlong_tokens_dropped() {
        let tokenizer = Tokenizer::default();
        let long_word = "x".repeat(51);
        let text = format!("short {} tail", long_word);
        assert_eq!(tokenizer.tokenize(&text), vec!["short", "tail"]);
    }

    #[test]
    fn test_positions_are_sequential() {
        let tokenizer = Tokenizer::default();
        let tokens = tokenizer.tokenize_with_positions("one 1 two three");

        // "1" is dropped, but positions stay consecutive over emitted tokens
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_offsets_point_into_text() {
        let tokenizer = Tokenizer::default();
        let text = "alpha beta";
        let tokens = tokenizer.tokenize_with_positions(text);
        assert_eq!(tokens[0].offset, 0);
        assert_eq!(tokens[1].offset, 6);
    }

    #[test]
    fn test_empty_text() {
        let tokenizer = Tokenizer::default();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("!!! ---").is_empty());
    }
}
