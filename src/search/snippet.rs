//! Snippet extraction and term highlighting

use regex::RegexBuilder;

/// Builds highlighted context snippets from page bodies
pub struct SnippetGenerator {
    snippet_length: usize,
    context: usize,
}

impl SnippetGenerator {
    /// Creates a generator; the context window is half the snippet length
    /// on each side of the first match
    pub fn new(snippet_length: usize) -> Self {
        Self {
            snippet_length,
            context: snippet_length / 2,
        }
    }

    /// Generates a snippet of `body` around the earliest occurrence of
    /// any query term, with every term occurrence wrapped in `**`
    ///
    /// Terms are matched case-insensitively against the body. When no
    /// term occurs, the snippet is the body's prefix backed off to a
    /// nearby whitespace boundary.
    pub fn generate(&self, body: &str, terms: &[String]) -> String {
        if body.is_empty() {
            return String::new();
        }
        if terms.is_empty() {
            return self.truncate(body);
        }

        let lower = body.to_lowercase();
        let mut earliest: Option<(usize, usize)> = None;

        for term in terms {
            let needle = term.to_lowercase();
            if needle.is_empty() {
                continue;
            }
            if let Some(pos) = lower.find(&needle) {
                let better = earliest.map_or(true, |(best, _)| pos < best);
                if better {
                    earliest = Some((pos, needle.len()));
                }
            }
        }

        let snippet = match earliest {
            Some((pos, match_len)) => self.window(body, pos, match_len),
            None => self.truncate(body),
        };

        highlight(&snippet, terms)
    }

    /// Extracts the context window around a match
    fn window(&self, body: &str, pos: usize, match_len: usize) -> String {
        let start = floor_char_boundary(body, pos.saturating_sub(self.context));
        let end = ceil_char_boundary(body, (pos + match_len + self.context).min(body.len()));

        let mut snippet = String::new();
        if start > 0 {
            snippet.push_str("...");
        }
        snippet.push_str(body[start..end].trim());
        if end < body.len() {
            snippet.push_str("...");
        }
        snippet
    }

    /// Prefix fallback when no term occurs in the body
    fn truncate(&self, body: &str) -> String {
        if body.len() <= self.snippet_length {
            return body.to_string();
        }

        let bytes = body.as_bytes();
        let floor = self.snippet_length.saturating_sub(20);
        let mut end = floor_char_boundary(body, self.snippet_length);

        // Back off to whitespace within 20 characters of the target
        while end > floor && end > 0 && !bytes[end].is_ascii_whitespace() {
            end -= 1;
        }
        if end <= floor || end == 0 {
            end = floor_char_boundary(body, self.snippet_length);
        }
        end = floor_char_boundary(body, end);

        format!("{}...", body[..end].trim_end())
    }
}

/// Wraps every case-insensitive occurrence of each term in `**` markers
///
/// Replacement is non-overlapping per term.
fn highlight(text: &str, terms: &[String]) -> String {
    let mut result = text.to_string();

    for term in terms {
        if term.is_empty() {
            continue;
        }
        let pattern = match RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
        {
            Ok(p) => p,
            Err(_) => continue,
        };
        result = pattern.replace_all(&result, "**${0}**").into_owned();
    }

    result
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    i = i.min(s.len());
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    i = i.min(s.len());
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
