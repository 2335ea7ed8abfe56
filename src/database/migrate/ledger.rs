//! Migration ledger
//!
//! The ledger is a reserved table recording which migration units have been
//! applied to a database file. Rows are inserted once and never updated or
//! deleted.

use crate::database::error::{DatabaseError, DbResult};
use chrono::NaiveDateTime;
use rusqlite::{Connection, ErrorCode};
use std::collections::BTreeSet;

/// Name of the internal ledger table
pub const LEDGER_TABLE: &str = "_migrations";

const LEDGER_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        applied_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
"#;

const APPLIED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A persisted record of one applied migration unit
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub name: String,
    pub applied_at: NaiveDateTime,
}

/// Ledger operations against a caller-supplied connection
///
/// The ledger never opens or owns a connection. Passing a transaction (which
/// derefs to `Connection`) makes `record` part of that transaction.
pub struct MigrationLedger<'a> {
    conn: &'a Connection,
}

impl<'a> MigrationLedger<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create the ledger table if it is missing; safe to call on every start
    pub fn ensure_exists(&self) -> DbResult<()> {
        self.conn
            .execute_batch(LEDGER_TABLE_SQL)
            .map_err(DatabaseError::storage)
    }

    /// Whether the ledger table has been created yet
    pub fn exists(&self) -> DbResult<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [LEDGER_TABLE],
                |row| row.get(0),
            )
            .map_err(DatabaseError::storage)?;
        Ok(count > 0)
    }

    pub fn is_applied(&self, name: &str) -> DbResult<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .map_err(DatabaseError::storage)?;
        Ok(count > 0)
    }

    /// Record a unit as applied
    ///
    /// Uniqueness is enforced by the table's constraint rather than a prior
    /// lookup; a violation surfaces as [`DatabaseError::DuplicateEntry`].
    pub fn record(&self, name: &str) -> DbResult<()> {
        match self
            .conn
            .execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
        {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(DatabaseError::DuplicateEntry {
                    name: name.to_string(),
                })
            }
            Err(e) => Err(DatabaseError::storage(e)),
        }
    }

    /// Names of every recorded unit
    pub fn list_applied(&self) -> DbResult<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM _migrations")
            .map_err(DatabaseError::storage)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(DatabaseError::storage)?
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(DatabaseError::storage)?;
        Ok(names)
    }

    /// All ledger entries in the order they were applied
    pub fn entries(&self) -> DbResult<Vec<LedgerEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, applied_at FROM _migrations ORDER BY id")
            .map_err(DatabaseError::storage)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(DatabaseError::storage)?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, name, applied_at) = row.map_err(DatabaseError::storage)?;
            let applied_at = NaiveDateTime::parse_from_str(&applied_at, APPLIED_AT_FORMAT)
                .map_err(|e| DatabaseError::Storage {
                    cause: format!("invalid applied_at '{}' for '{}': {}", applied_at, name, e),
                })?;
            entries.push(LedgerEntry {
                id,
                name,
                applied_at,
            });
        }
        Ok(entries)
    }

    pub fn count(&self) -> DbResult<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .map_err(DatabaseError::storage)
    }
}
