//! Durable page and index store
//!
//! SQLite-backed storage for pages, terms, postings and crawl sessions.
//! A `Store` owns a bounded connection pool; every operation acquires one
//! handle, executes, and releases it on return. Handles are never held
//! across I/O to other subsystems.

mod pool;
mod schema;

pub use pool::{ConnectionPool, PooledConnection};
pub use schema::{initialize_schema, SCHEMA_SQL};

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Page URL already stored: {0}")]
    UrlExists(String),

    #[error("Page not found: {0}")]
    PageNotFound(i64),

    #[error("Session not found: {0}")]
    SessionNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A stored page
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub body: String,
    pub crawled_at: String,
    pub word_count: u32,
    pub depth: u32,
}

/// Fields of a page about to be inserted
#[derive(Debug, Clone)]
pub struct NewPage<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub depth: u32,
}

/// A stored posting row, as mirrored from the in-memory index
#[derive(Debug, Clone)]
pub struct PostingRecord {
    pub term: String,
    pub page_id: i64,
    pub frequency: u32,
    pub positions_csv: String,
}

/// Lifecycle of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
    Stopped,
    Error,
}

impl SessionStatus {
    pub fn to_db_string(self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Stopped => "stopped",
            SessionStatus::Error => "error",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(SessionStatus::Running),
            "completed" => Some(SessionStatus::Completed),
            "stopped" => Some(SessionStatus::Stopped),
            "error" => Some(SessionStatus::Error),
            _ => None,
        }
    }
}

/// A stored crawl session
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: i64,
    pub seed: String,
    pub max_depth: u32,
    pub pages_crawled: u32,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub status: SessionStatus,
}

/// SQLite store with a bounded connection pool
pub struct Store {
    pool: ConnectionPool,
}

impl Store {
    /// Opens (or creates) the database at `path` with `pool_size` handles
    pub fn open(path: &Path, pool_size: usize) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pool = ConnectionPool::open(path, pool_size)?;
        initialize_schema(&pool.acquire())?;
        Ok(Self { pool })
    }

    /// Creates an in-memory store (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        initialize_schema(&pool.acquire())?;
        Ok(Self { pool })
    }

    // ===== Pages =====

    /// Inserts a page, returning its id
    ///
    /// A unique-constraint violation on the URL maps to
    /// `StoreError::UrlExists` so callers can treat the race of two
    /// workers reaching the same page as a silent skip.
    pub fn insert_page(&self, page: &NewPage) -> StoreResult<i64> {
        let conn = self.pool.acquire();
        let now = Utc::now().to_rfc3339();

        let result = conn.execute(
            "INSERT INTO pages (url, title, body, crawled_at, word_count, depth)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![page.url, page.title, page.body, now, page.depth],
        );

        match result {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(rusqlite::Error::SqliteFailure(e, Some(ref msg)))
                if e.code == ErrorCode::ConstraintViolation && msg.contains("pages.url") =>
            {
                Err(StoreError::UrlExists(page.url.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Gets a page by id
    pub fn get_page_by_id(&self, id: i64) -> StoreResult<Option<PageRecord>> {
        let conn = self.pool.acquire();
        let page = conn
            .query_row(
                "SELECT id, url, title, body, crawled_at, word_count, depth
                 FROM pages WHERE id = ?1",
                params![id],
                Self::page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    /// Gets a page by its canonical URL
    pub fn get_page_by_url(&self, url: &str) -> StoreResult<Option<PageRecord>> {
        let conn = self.pool.acquire();
        let page = conn
            .query_row(
                "SELECT id, url, title, body, crawled_at, word_count, depth
                 FROM pages WHERE url = ?1",
                params![url],
                Self::page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    /// Lists all stored pages ordered by id
    pub fn list_pages(&self) -> StoreResult<Vec<PageRecord>> {
        let conn = self.pool.acquire();
        let mut stmt = conn.prepare(
            "SELECT id, url, title, body, crawled_at, word_count, depth
             FROM pages ORDER BY id",
        )?;
        let pages = stmt
            .query_map([], Self::page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    /// Counts stored pages
    pub fn count_pages(&self) -> StoreResult<u64> {
        let conn = self.pool.acquire();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |r| r.get(0))?;
        Ok(count as u64)
    }

    /// Sets a page's indexed word count
    pub fn update_page_word_count(&self, id: i64, word_count: u32) -> StoreResult<()> {
        let conn = self.pool.acquire();
        let changed = conn.execute(
            "UPDATE pages SET word_count = ?1 WHERE id = ?2",
            params![word_count, id],
        )?;
        if changed == 0 {
            return Err(StoreError::PageNotFound(id));
        }
        Ok(())
    }

    /// Deletes a page; its postings go with it via the FK cascade
    pub fn delete_page(&self, id: i64) -> StoreResult<()> {
        let conn = self.pool.acquire();
        conn.execute("DELETE FROM pages WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn page_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PageRecord> {
        Ok(PageRecord {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            body: row.get(3)?,
            crawled_at: row.get(4)?,
            word_count: row.get(5)?,
            depth: row.get(6)?,
        })
    }

    // ===== Words and postings =====

    /// Inserts a term if new and returns its id
    pub fn upsert_word(&self, term: &str) -> StoreResult<i64> {
        let conn = self.pool.acquire();
        Ok(Self::upsert_word_in(&conn, term)?)
    }

    fn upsert_word_in(conn: &Connection, term: &str) -> rusqlite::Result<i64> {
        if let Some(id) = conn
            .query_row("SELECT id FROM words WHERE term = ?1", params![term], |r| {
                r.get(0)
            })
            .optional()?
        {
            return Ok(id);
        }
        conn.execute("INSERT INTO words (term) VALUES (?1)", params![term])?;
        Ok(conn.last_insert_rowid())
    }

    /// Writes one posting row, creating the term row as needed
    ///
    /// The word upsert and the posting replace run in one transaction, so
    /// a posting can never reference a half-written term.
    pub fn upsert_posting(&self, term: &str, page_id: i64, positions: &[u32]) -> StoreResult<i64> {
        let mut conn = self.pool.acquire();
        let tx = conn.transaction()?;

        let word_id = Self::upsert_word_in(&tx, term)?;
        tx.execute(
            "INSERT OR REPLACE INTO postings (word_id, page_id, frequency, positions_csv)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                word_id,
                page_id,
                positions.len() as i64,
                positions_to_csv(positions)
            ],
        )?;

        tx.commit()?;
        Ok(word_id)
    }

    /// Removes every posting for a page (the re-index precondition)
    pub fn delete_postings_for_page(&self, page_id: i64) -> StoreResult<usize> {
        let conn = self.pool.acquire();
        let deleted = conn.execute(
            "DELETE FROM postings WHERE page_id = ?1",
            params![page_id],
        )?;
        Ok(deleted)
    }

    /// Pages containing a stored term, most frequent first
    pub fn pages_for_term(&self, term: &str) -> StoreResult<Vec<i64>> {
        let conn = self.pool.acquire();
        let mut stmt = conn.prepare(
            "SELECT p.page_id
             FROM words w JOIN postings p ON w.id = p.word_id
             WHERE w.term = ?1
             ORDER BY p.frequency DESC, p.page_id",
        )?;
        let pages = stmt
            .query_map(params![term], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    /// All posting rows for a page, with their terms
    pub fn postings_for_page(&self, page_id: i64) -> StoreResult<Vec<PostingRecord>> {
        let conn = self.pool.acquire();
        let mut stmt = conn.prepare(
            "SELECT w.term, p.page_id, p.frequency, p.positions_csv
             FROM postings p JOIN words w ON w.id = p.word_id
             WHERE p.page_id = ?1
             ORDER BY w.term",
        )?;
        let rows = stmt
            .query_map(params![page_id], Self::posting_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Every stored posting row (used to rebuild the in-memory index)
    pub fn all_postings(&self) -> StoreResult<Vec<PostingRecord>> {
        let conn = self.pool.acquire();
        let mut stmt = conn.prepare(
            "SELECT w.term, p.page_id, p.frequency, p.positions_csv
             FROM postings p JOIN words w ON w.id = p.word_id
             ORDER BY w.term, p.page_id",
        )?;
        let rows = stmt
            .query_map([], Self::posting_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn posting_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostingRecord> {
        Ok(PostingRecord {
            term: row.get(0)?,
            page_id: row.get(1)?,
            frequency: row.get(2)?,
            positions_csv: row.get(3)?,
        })
    }

    /// Counts unique stored terms
    pub fn count_words(&self) -> StoreResult<u64> {
        let conn = self.pool.acquire();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM words", [], |r| r.get(0))?;
        Ok(count as u64)
    }

    /// Counts stored posting rows
    pub fn count_postings(&self) -> StoreResult<u64> {
        let conn = self.pool.acquire();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM postings", [], |r| r.get(0))?;
        Ok(count as u64)
    }

    // ===== Sessions =====

    /// Opens a new crawl session in the running state
    pub fn create_session(&self, seed: &str, max_depth: u32) -> StoreResult<i64> {
        let conn = self.pool.acquire();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO sessions (seed, max_depth, pages_crawled, started_at, status)
             VALUES (?1, ?2, 0, ?3, ?4)",
            params![seed, max_depth, now, SessionStatus::Running.to_db_string()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Updates a session's progress and status
    ///
    /// When `finished` is set the end timestamp is recorded.
    pub fn update_session(
        &self,
        id: i64,
        pages_crawled: u32,
        status: SessionStatus,
        finished: bool,
    ) -> StoreResult<()> {
        let conn = self.pool.acquire();
        let changed = if finished {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "UPDATE sessions SET pages_crawled = ?1, status = ?2, ended_at = ?3 WHERE id = ?4",
                params![pages_crawled, status.to_db_string(), now, id],
            )?
        } else {
            conn.execute(
                "UPDATE sessions SET pages_crawled = ?1, status = ?2 WHERE id = ?3",
                params![pages_crawled, status.to_db_string(), id],
            )?
        };
        if changed == 0 {
            return Err(StoreError::SessionNotFound(id));
        }
        Ok(())
    }

    /// Gets a session by id
    pub fn get_session(&self, id: i64) -> StoreResult<Option<SessionRecord>> {
        let conn = self.pool.acquire();
        let session = conn
            .query_row(
                "SELECT id, seed, max_depth, pages_crawled, started_at, ended_at, status
                 FROM sessions WHERE id = ?1",
                params![id],
                |row| {
                    Ok(SessionRecord {
                        id: row.get(0)?,
                        seed: row.get(1)?,
                        max_depth: row.get(2)?,
                        pages_crawled: row.get(3)?,
                        started_at: row.get(4)?,
                        ended_at: row.get(5)?,
                        status: SessionStatus::from_db_string(&row.get::<_, String>(6)?)
                            .unwrap_or(SessionStatus::Error),
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    // ===== Maintenance =====

    /// Deletes everything from every table
    pub fn clear_all(&self) -> StoreResult<()> {
        let conn = self.pool.acquire();
        conn.execute_batch(
            "DELETE FROM postings;
             DELETE FROM words;
             DELETE FROM pages;
             DELETE FROM sessions;",
        )?;
        Ok(())
    }
}

/// Serializes positions as an ASCII comma-separated ascending list
pub fn positions_to_csv(positions: &[u32]) -> String {
    positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses a positions CSV; `None` when any field is not a number
///
/// Corrupt rows are treated as absent rather than failing the caller.
pub fn positions_from_csv(csv: &str) -> Option<Vec<u32>> {
    if csv.is_empty() {
        return Some(Vec::new());
    }
    csv.split(',').map(|p| p.trim().parse::<u32>().ok()).collect()
}
