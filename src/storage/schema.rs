//! Database schema definitions
//!
//! All SQL schema for the Searchlight database lives here.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Crawled pages
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL DEFAULT '',
    body TEXT NOT NULL DEFAULT '',
    crawled_at TEXT NOT NULL,
    word_count INTEGER NOT NULL DEFAULT 0,
    depth INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_pages_url ON pages(url);

-- Unique stemmed terms
CREATE TABLE IF NOT EXISTS words (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    term TEXT NOT NULL UNIQUE
);

CREATE INDEX IF NOT EXISTS idx_words_term ON words(term);

-- Durable mirror of the inverted index
CREATE TABLE IF NOT EXISTS postings (
    word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
    page_id INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
    frequency INTEGER NOT NULL DEFAULT 1,
    positions_csv TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (word_id, page_id)
);

CREATE INDEX IF NOT EXISTS idx_postings_word ON postings(word_id);
CREATE INDEX IF NOT EXISTS idx_postings_page ON postings(page_id);

-- Crawl sessions
CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    seed TEXT NOT NULL,
    max_depth INTEGER NOT NULL,
    pages_crawled INTEGER NOT NULL DEFAULT 0,
    started_at TEXT NOT NULL,
    ended_at TEXT,
    status TEXT NOT NULL DEFAULT 'running'
);
"#;

/// Initializes the database schema
///
/// Safe to run repeatedly; everything is `IF NOT EXISTS`.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["pages", "words", "postings", "sessions"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_cascade_from_pages_to_postings() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        initialize_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO pages (url, crawled_at) VALUES ('https://a/', '2024-01-01')",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO words (term) VALUES ('x')", []).unwrap();
        conn.execute(
            "INSERT INTO postings (word_id, page_id, frequency, positions_csv) VALUES (1, 1, 1, '0')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM pages WHERE id = 1", []).unwrap();
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM postings", [], |r| r.get(0))
            .unwrap();
        assert_eq!(left, 0);
    }
}
