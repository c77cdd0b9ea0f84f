pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::from_conn(conn)?;
        info!("Board database opened at {}", path.display());
        Ok(db)
    }

    /// Transient store. An in-memory SQLite database lives and dies with its
    /// connection, so the single handle below holds the whole store.
    pub fn open_in_memory() -> Result<Self> {
        let db = Self::from_conn(Connection::open_in_memory()?)?;
        info!("Board database opened in memory");
        Ok(db)
    }

    fn from_conn(conn: Connection) -> Result<Self> {
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("database lock poisoned: {}", e))?;
        f(&conn)
    }
}
