use serde::Deserialize;

/// Main configuration structure for Searchlight
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub indexer: IndexerConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent crawl workers
    #[serde(rename = "thread-pool-size", default = "default_thread_pool_size")]
    pub thread_pool_size: usize,

    /// Maximum number of pages to persist per crawl session
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Depth used when a crawl is started without an explicit depth
    #[serde(rename = "default-depth", default = "default_depth")]
    pub default_depth: u32,

    /// Per-request HTTP timeout in milliseconds
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Delay each worker sleeps after a fetch, in milliseconds
    #[serde(rename = "politeness-delay-ms", default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,

    /// User agent sent with every request and matched against robots.txt
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whether robots.txt directives are honored
    #[serde(rename = "respect-robots-txt", default = "default_true")]
    pub respect_robots: bool,

    /// Restrict link following to the seed's origin
    #[serde(rename = "same-origin-only", default)]
    pub same_origin_only: bool,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Number of pooled connections
    #[serde(rename = "connection-pool-size", default = "default_pool_size")]
    pub connection_pool_size: usize,
}

/// Text analysis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    /// Minimum token length retained by the tokenizer
    #[serde(rename = "min-word-length", default = "default_min_word_length")]
    pub min_word_length: usize,

    /// Maximum token length retained by the tokenizer
    #[serde(rename = "max-word-length", default = "default_max_word_length")]
    pub max_word_length: usize,
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Default cap on returned results
    #[serde(rename = "max-results", default = "default_max_results")]
    pub max_results: usize,

    /// Target snippet length in characters
    #[serde(rename = "snippet-length", default = "default_snippet_length")]
    pub snippet_length: usize,
}

fn default_thread_pool_size() -> usize {
    10
}

fn default_max_pages() -> usize {
    500
}

fn default_depth() -> u32 {
    3
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_politeness_delay_ms() -> u64 {
    1_000
}

fn default_user_agent() -> String {
    "SearchlightBot/1.0".to_string()
}

fn default_true() -> bool {
    true
}

fn default_database_path() -> String {
    "data/searchlight.db".to_string()
}

fn default_pool_size() -> usize {
    5
}

fn default_min_word_length() -> usize {
    2
}

fn default_max_word_length() -> usize {
    50
}

fn default_max_results() -> usize {
    50
}

fn default_snippet_length() -> usize {
    200
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            thread_pool_size: default_thread_pool_size(),
            max_pages: default_max_pages(),
            default_depth: default_depth(),
            request_timeout_ms: default_request_timeout_ms(),
            politeness_delay_ms: default_politeness_delay_ms(),
            user_agent: default_user_agent(),
            respect_robots: true,
            same_origin_only: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            connection_pool_size: default_pool_size(),
        }
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            min_word_length: default_min_word_length(),
            max_word_length: default_max_word_length(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            snippet_length: default_snippet_length(),
        }
    }
}
