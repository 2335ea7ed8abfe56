//! Database connection management
//!
//! This module provides the connection wrapper used by the provisioner and by
//! the migration and seeding layers.

use crate::database::error::{DatabaseError, DbResult};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::debug;

/// Core database connection wrapper
///
/// `DatabaseConn` owns a single SQLite connection, file-backed or in-memory,
/// with write-ahead logging and foreign key enforcement applied before any
/// other statement runs. Both settings are connection-scoped in SQLite, so
/// they are reapplied on every open.
pub struct DatabaseConn {
    pub conn: Connection,
}

impl DatabaseConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created. Missing parent
    /// directories of a file path are created.
    pub fn open(path: Option<&Path>) -> DbResult<Self> {
        let conn = match path {
            Some(p) => {
                let display = p.display().to_string();
                if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| DatabaseError::unavailable(&display, e))?;
                }
                Connection::open(p).map_err(|e| DatabaseError::unavailable(&display, e))?
            }
            None => Connection::open_in_memory()
                .map_err(|e| DatabaseError::unavailable(":memory:", e))?,
        };

        let db = DatabaseConn { conn };
        db.configure()
            .map_err(|e| DatabaseError::unavailable(&db.location(), e))?;
        Ok(db)
    }

    /// Open a database file at the specified path (convenience method)
    pub fn open_path(path: &Path) -> DbResult<Self> {
        Self::open(Some(path))
    }

    /// Create an in-memory database
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open(None)
    }

    /// Open an existing database file without writing to it
    ///
    /// The file is never created and no pragmas are changed, so the journal
    /// mode stays whatever the file already uses.
    pub fn open_read_only(path: &Path) -> DbResult<Self> {
        let display = path.display().to_string();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| DatabaseError::unavailable(&display, e))?;
        Ok(DatabaseConn { conn })
    }

    fn configure(&self) -> rusqlite::Result<()> {
        // journal_mode reports the resulting mode as a row; in-memory stays "memory"
        let mode: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        debug!("journal mode set to {}", mode);

        self.conn.execute_batch("PRAGMA synchronous=NORMAL;")?;
        self.conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(())
    }

    fn location(&self) -> String {
        match self.conn.path() {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => ":memory:".to_string(),
        }
    }

    /// Current journal mode as reported by the engine (e.g. `wal`)
    pub fn journal_mode(&self) -> DbResult<String> {
        self.conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .map_err(DatabaseError::storage)
    }

    /// Whether foreign key enforcement is on for this connection
    pub fn foreign_keys_enabled(&self) -> DbResult<bool> {
        let enabled: i64 = self
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .map_err(DatabaseError::storage)?;
        Ok(enabled == 1)
    }

    /// Check if a table exists in the database
    pub fn table_exists(&self, table_name: &str) -> DbResult<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table_name],
                |row| row.get(0),
            )
            .map_err(DatabaseError::storage)?;
        Ok(count > 0)
    }

    /// Get the row count for a table
    pub fn table_count(&self, table_name: &str) -> DbResult<u64> {
        let query = format!("SELECT COUNT(*) FROM \"{}\"", table_name.replace('"', "\"\""));
        self.conn
            .query_row(&query, [], |row| row.get(0))
            .map_err(DatabaseError::storage)
    }
}
