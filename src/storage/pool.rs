//! Bounded SQLite connection pool
//!
//! A fixed number of connections is opened up front and handed out with
//! blocking acquisition. Callers hold a handle only for the duration of
//! one store operation; the RAII guard returns it on drop.

use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::{Condvar, Mutex};

/// Pool of SQLite connections against a single database
pub struct ConnectionPool {
    connections: Mutex<Vec<Connection>>,
    available: Condvar,
}

impl ConnectionPool {
    /// Opens `size` connections against the database at `path`
    ///
    /// Each connection gets WAL journaling and foreign keys enabled.
    pub fn open(path: &Path, size: usize) -> Result<Self, rusqlite::Error> {
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size.max(1) {
            let conn = Connection::open(path)?;
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA foreign_keys = ON;
                PRAGMA busy_timeout = 5000;
            ",
            )?;
            connections.push(conn);
        }

        Ok(Self {
            connections: Mutex::new(connections),
            available: Condvar::new(),
        })
    }

    /// Opens a single-connection in-memory pool (for testing)
    ///
    /// In-memory databases are private to their connection, so the pool
    /// size is pinned to one.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            connections: Mutex::new(vec![conn]),
            available: Condvar::new(),
        })
    }

    /// Takes a connection, blocking until one is available
    pub fn acquire(&self) -> PooledConnection<'_> {
        let mut connections = self
            .connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        loop {
            if let Some(conn) = connections.pop() {
                return PooledConnection {
                    pool: self,
                    conn: Some(conn),
                };
            }
            connections = self
                .available
                .wait(connections)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    fn release(&self, conn: Connection) {
        let mut connections = self
            .connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        connections.push(conn);
        self.available.notify_one();
    }
}

/// RAII guard over a pooled connection
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
