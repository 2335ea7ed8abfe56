//! Migration lens
//!
//! Combines the ledger with the migrations directory to report which units
//! are applied and which are still pending.

use crate::database::{discover_migrations, DatabaseConn, MigrationLedger, MigrationRunner};
use crate::lens::utils::{render, OutputFormat};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tabled::Tabled;

/// Display status of one migration unit
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct MigrationStatusEntry {
    pub name: String,
    pub state: String,
    pub applied_at: String,
}

pub struct MigrationLens<'a> {
    conn: &'a Connection,
}

impl<'a> MigrationLens<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Every unit known to either the ledger or the directory, sorted by name
    ///
    /// Ledger entries whose file has since disappeared are reported as
    /// `applied (missing file)`.
    pub fn status(&self, migrations_dir: &Path) -> Result<Vec<MigrationStatusEntry>> {
        let ledger = MigrationLedger::new(self.conn);
        let entries = if ledger.exists()? {
            ledger.entries()?
        } else {
            Vec::new()
        };
        let on_disk = discover_migrations(migrations_dir)?;

        let mut status: BTreeMap<String, MigrationStatusEntry> = BTreeMap::new();
        for unit in on_disk {
            status.insert(
                unit.name.clone(),
                MigrationStatusEntry {
                    name: unit.name,
                    state: "pending".to_string(),
                    applied_at: String::new(),
                },
            );
        }
        for entry in entries {
            let state = if status.contains_key(&entry.name) {
                "applied"
            } else {
                "applied (missing file)"
            };
            status.insert(
                entry.name.clone(),
                MigrationStatusEntry {
                    name: entry.name,
                    state: state.to_string(),
                    applied_at: entry.applied_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                },
            );
        }

        Ok(status.into_values().collect())
    }

    /// Names of pending units, in the order they would be applied
    pub fn pending(&self, migrations_dir: &Path) -> Result<Vec<String>> {
        Ok(MigrationRunner::new(self.conn)
            .pending(migrations_dir)?
            .into_iter()
            .map(|u| u.name)
            .collect())
    }

    /// Pending unit names for the database file at `db_path`, read-only
    ///
    /// A missing file has nothing applied, so every unit in the directory is
    /// pending. The file is not created.
    pub fn pending_for_file(db_path: &Path, migrations_dir: &Path) -> Result<Vec<String>> {
        if !db_path.exists() {
            return Ok(discover_migrations(migrations_dir)?
                .into_iter()
                .map(|u| u.name)
                .collect());
        }
        let db = DatabaseConn::open_read_only(db_path)?;
        MigrationLens::new(&db.conn).pending(migrations_dir)
    }

    pub fn format(&self, entries: &[MigrationStatusEntry], format: OutputFormat) -> Result<String> {
        render(entries, format, "name|state|applied_at", |e| {
            format!("{}|{}|{}", e.name, e.state, e.applied_at)
        })
    }
}
