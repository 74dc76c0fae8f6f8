//! Configuration module for Searchlight
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every key has a default, so a missing file or a sparse file still
//! yields a usable configuration.
//!
//! # Example
//!
//! ```no_run
//! use searchlight::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.thread_pool_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, DatabaseConfig, IndexerConfig, SearchConfig};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default};
