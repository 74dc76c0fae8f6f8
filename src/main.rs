//! Searchlight command-line interface
//!
//! Subcommands cover the full pipeline: crawl a site into the store,
//! build the index over stored pages, and run ranked queries against it.

use clap::{Parser, Subcommand};
use searchlight::config::{load_config_or_default, Config};
use searchlight::crawler::{CrawlEngine, CrawlEvent};
use searchlight::index::InvertedIndex;
use searchlight::indexer::Indexer;
use searchlight::search::SearchEngine;
use searchlight::storage::Store;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Searchlight: a desktop web search engine
#[derive(Parser, Debug)]
#[command(name = "searchlight")]
#[command(version)]
#[command(about = "Crawl, index and search a slice of the web", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the web starting from a seed URL
    Crawl {
        /// Seed URL to start from
        seed: String,

        /// Link depth to follow (config default when omitted)
        #[arg(long)]
        depth: Option<u32>,
    },

    /// Build the index over all stored pages
    Index,

    /// Search indexed pages
    Search {
        /// Query terms
        #[arg(required = true)]
        query: Vec<String>,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,

        /// Result page number (1-based); enables pagination
        #[arg(long)]
        page: Option<usize>,

        /// Results per page
        #[arg(long, default_value_t = 10)]
        page_size: usize,
    },

    /// Show corpus and index statistics
    Stats,

    /// Delete all stored pages, postings and sessions
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_config_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Crawl { seed, depth } => handle_crawl(&config, &seed, depth).await?,
        Command::Index => handle_index(&config)?,
        Command::Search {
            query,
            limit,
            page,
            page_size,
        } => handle_search(&config, &query.join(" "), limit, page, page_size)?,
        Command::Stats => handle_stats(&config)?,
        Command::Clear => handle_clear(&config)?,
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("searchlight=info,warn"),
            1 => EnvFilter::new("searchlight=debug,info"),
            2 => EnvFilter::new("searchlight=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_store(config: &Config) -> Result<Arc<Store>, Box<dyn std::error::Error>> {
    let store = Store::open(
        Path::new(&config.database.path),
        config.database.connection_pool_size,
    )?;
    Ok(Arc::new(store))
}

/// Handles the crawl subcommand, printing progress from the event channel
async fn handle_crawl(
    config: &Config,
    seed: &str,
    depth: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                CrawlEvent::Started { seed, max_depth } => {
                    println!("Crawling from {} (depth {})", seed, max_depth);
                }
                CrawlEvent::PageSuccess { url, crawled, .. } => {
                    println!("  [{}] {}", crawled, url);
                }
                CrawlEvent::PageSkipped { url, reason } => {
                    println!("  skipped {} ({})", url, reason);
                }
                CrawlEvent::PageError { url, error, .. } => {
                    eprintln!("  error {} ({})", url, error);
                }
                _ => {}
            }
        }
    });

    let engine = CrawlEngine::new(Arc::clone(&store), config.crawler.clone(), Some(tx))?;
    let outcome = engine.crawl(seed, depth).await?;
    drop(engine);
    printer.await?;

    println!(
        "\nSession {} {}: {} pages stored",
        outcome.session_id,
        outcome.status.to_db_string(),
        outcome.pages_crawled
    );

    Ok(())
}

/// Handles the index subcommand
fn handle_index(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let index = Arc::new(InvertedIndex::new());

    let mut indexer = Indexer::new(Arc::clone(&store), Arc::clone(&index), &config.indexer);
    indexer.set_progress_listener(Box::new(|_, url, word_count| {
        println!("  indexed {} ({} words)", url, word_count);
    }));

    let indexed = indexer.index_all_pages()?;
    let stats = indexer.stats();

    println!(
        "\nIndexed {} pages: {} unique terms, {} occurrences",
        indexed, stats.unique_terms, stats.total_occurrences
    );

    Ok(())
}

/// Handles the search subcommand
fn handle_search(
    config: &Config,
    query: &str,
    limit: Option<usize>,
    page: Option<usize>,
    page_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let index = Arc::new(InvertedIndex::new());

    // Restore the in-memory index from the durable mirror
    let indexer = Indexer::new(Arc::clone(&store), Arc::clone(&index), &config.indexer);
    indexer.rebuild_memory_index()?;

    let engine = SearchEngine::new(
        Arc::clone(&store),
        Arc::clone(&index),
        &config.indexer,
        &config.search,
    );

    let results = match page {
        Some(page) => engine.search_paginated(query, page, page_size),
        None => engine.search_with_limit(query, limit.unwrap_or(config.search.max_results)),
    };

    if results.is_empty() {
        println!("No results for: {}", query);
        return Ok(());
    }

    for result in &results {
        println!("{:>3}. {} (score {:.4})", result.rank, result.url, result.score);
        if !result.title.is_empty() {
            println!("     {}", result.title);
        }
        if !result.snippet.is_empty() {
            println!("     {}", result.snippet);
        }
        println!();
    }

    Ok(())
}

/// Handles the stats subcommand
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    let index = Arc::new(InvertedIndex::new());

    let indexer = Indexer::new(Arc::clone(&store), Arc::clone(&index), &config.indexer);
    indexer.rebuild_memory_index()?;

    println!("Database: {}", config.database.path);
    println!("  pages:           {}", store.count_pages()?);
    println!("  terms:           {}", store.count_words()?);
    println!("  postings:        {}", store.count_postings()?);

    let stats = index.stats();
    println!("  avg posting len: {:.2}", stats.avg_posting_list_len);

    Ok(())
}

/// Handles the clear subcommand
fn handle_clear(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;
    store.clear_all()?;
    println!("All stored data cleared");
    Ok(())
}
