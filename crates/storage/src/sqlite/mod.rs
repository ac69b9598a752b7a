use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use crate::repository::{KeyValueStore, StorageError};

mod migrate;

/// Key/value store backed by a single `SQLite` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
}

impl SqliteStore {
    /// Open (or create) the database file at `path` and run migrations.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the parent directory cannot be created, the
    /// file cannot be opened, or migrations fail.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteInitError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migrations fail.
    pub fn open_in_memory() -> Result<Self, SqliteInitError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, SqliteInitError> {
        migrate::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        conn.query_row(
            "SELECT value FROM kv_entries WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|err| StorageError::Connection(err.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        conn.execute(
            r"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
            params![key, value],
        )
        .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
