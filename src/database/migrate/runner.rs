//! Migration runner
//!
//! Discovers migration units in a directory and applies the ones the ledger
//! has not seen yet, one transaction per unit, strictly in name order.
//!
//! Unit names are the file stem of each `*.sql` file (`001_create_books.sql`
//! becomes `001_create_books`). Ordering is plain byte-wise comparison of the
//! names, so numeric prefixes must be zero-padded to the same width.

use super::ledger::MigrationLedger;
use crate::database::error::{DatabaseError, DbResult};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File extension of migration units, compared case-insensitively
pub const MIGRATION_EXTENSION: &str = "sql";

/// One schema-change script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    pub name: String,
    pub body: String,
    pub path: Option<PathBuf>,
}

impl MigrationUnit {
    /// Build a unit that does not come from a file
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            path: None,
        }
    }

    /// Whitespace-only bodies are recorded without being executed
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Outcome of a successful [`MigrationRunner::apply_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Units applied by this call, in application order
    pub applied: Vec<String>,
    /// Units skipped because the ledger already recorded them
    pub already_applied: usize,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Load every migration unit in `dir`, sorted by name
///
/// A missing directory yields no units. Subdirectories and files without the
/// `.sql` extension are ignored. Two files mapping to the same name (for
/// example `001_a.sql` and `001_a.SQL`) are rejected.
pub fn discover_migrations(dir: &Path) -> DbResult<Vec<MigrationUnit>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("migrations directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(DatabaseError::source_error(dir, e)),
    };

    let mut units: BTreeMap<String, MigrationUnit> = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| DatabaseError::source_error(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_migration = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(MIGRATION_EXTENSION))
            .unwrap_or(false);
        if !is_migration {
            continue;
        }

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| DatabaseError::source_error(&path, "file name is not valid UTF-8"))?
            .to_string();
        let body =
            std::fs::read_to_string(&path).map_err(|e| DatabaseError::source_error(&path, e))?;

        if units.contains_key(&name) {
            return Err(DatabaseError::DuplicateMigration { name });
        }
        units.insert(
            name.clone(),
            MigrationUnit {
                name,
                body,
                path: Some(path),
            },
        );
    }

    Ok(units.into_values().collect())
}

/// Applies migration units against a caller-supplied connection
pub struct MigrationRunner<'a> {
    conn: &'a Connection,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Apply every pending unit found in `dir`
    ///
    /// Stops at the first failing unit. Units committed before it stay applied.
    pub fn apply_all(&self, dir: &Path) -> DbResult<MigrationReport> {
        let units = discover_migrations(dir)?;
        self.apply_units(units)
    }

    /// Apply the given units in name order, skipping the ones already recorded
    ///
    /// Two units sharing a name are rejected before anything runs.
    pub fn apply_units(&self, mut units: Vec<MigrationUnit>) -> DbResult<MigrationReport> {
        units.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = units.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(DatabaseError::DuplicateMigration {
                name: pair[0].name.clone(),
            });
        }

        let ledger = MigrationLedger::new(self.conn);
        ledger.ensure_exists()?;
        let applied = ledger.list_applied()?;

        let mut report = MigrationReport::default();
        for unit in &units {
            if applied.contains(&unit.name) {
                debug!("migration {} already applied, skipping", unit.name);
                report.already_applied += 1;
                continue;
            }
            self.apply_unit(unit)?;
            report.applied.push(unit.name.clone());
        }

        if !report.applied.is_empty() {
            info!(
                "applied {} migration(s): {}",
                report.applied.len(),
                report.applied.join(", ")
            );
        }
        Ok(report)
    }

    /// Units in `dir` the ledger has not recorded yet, without applying them
    pub fn pending(&self, dir: &Path) -> DbResult<Vec<MigrationUnit>> {
        let units = discover_migrations(dir)?;
        let ledger = MigrationLedger::new(self.conn);
        if !ledger.exists()? {
            return Ok(units);
        }
        let applied = ledger.list_applied()?;
        Ok(units
            .into_iter()
            .filter(|unit| !applied.contains(&unit.name))
            .collect())
    }

    fn apply_unit(&self, unit: &MigrationUnit) -> DbResult<()> {
        // Rolls back on drop, so any early return leaves neither schema changes nor a ledger row
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| DatabaseError::migration_failed(&unit.name, e))?;

        if unit.is_empty() {
            debug!("migration {} has an empty body, recording only", unit.name);
        } else {
            tx.execute_batch(&unit.body)
                .map_err(|e| DatabaseError::migration_failed(&unit.name, e))?;
        }

        MigrationLedger::new(&tx).record(&unit.name)?;

        tx.commit()
            .map_err(|e| DatabaseError::migration_failed(&unit.name, e))?;
        debug!("migration {} applied", unit.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_unit(dir: &Path, file_name: &str, body: &str) {
        fs::write(dir.join(file_name), body).unwrap();
    }

    fn ledger_names(conn: &Connection) -> Vec<String> {
        MigrationLedger::new(conn)
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect()
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let units = discover_migrations(&dir.path().join("nope")).unwrap();
        assert!(units.is_empty());
    }

    #[test]
    fn test_discovery_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        write_unit(dir.path(), "010_c.sql", "SELECT 1;");
        write_unit(dir.path(), "001_a.sql", "SELECT 1;");
        write_unit(dir.path(), "002_b.SQL", "SELECT 1;");
        write_unit(dir.path(), "README.md", "not a migration");
        fs::create_dir(dir.path().join("003_dir.sql")).unwrap();

        let names: Vec<String> = discover_migrations(dir.path())
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["001_a", "002_b", "010_c"]);
    }

    #[test]
    fn test_discovery_rejects_duplicate_names() {
        let dir = tempfile::tempdir().unwrap();
        write_unit(dir.path(), "001_a.sql", "SELECT 1;");
        write_unit(dir.path(), "001_a.Sql", "SELECT 2;");

        let err = discover_migrations(dir.path()).unwrap_err();
        assert_eq!(
            err,
            DatabaseError::DuplicateMigration {
                name: "001_a".to_string()
            }
        );
    }

    #[test]
    fn test_discovery_on_a_file_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        write_unit(dir.path(), "not_a_dir", "");

        let err = discover_migrations(&dir.path().join("not_a_dir")).unwrap_err();
        assert!(matches!(err, DatabaseError::MigrationSource { .. }));
    }

    #[test]
    fn test_units_apply_in_name_order() {
        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new(&conn);

        // 010 depends on 002, which depends on 001
        let units = vec![
            MigrationUnit::new("010_c", "ALTER TABLE t ADD COLUMN c TEXT;"),
            MigrationUnit::new("001_a", "CREATE TABLE t (id INTEGER PRIMARY KEY);"),
            MigrationUnit::new("002_b", "ALTER TABLE t ADD COLUMN b TEXT;"),
        ];
        let report = runner.apply_units(units).unwrap();

        assert_eq!(report.applied, vec!["001_a", "002_b", "010_c"]);
        assert_eq!(ledger_names(&conn), vec!["001_a", "002_b", "010_c"]);
        conn.execute("INSERT INTO t (id, b, c) VALUES (1, 'b', 'c')", [])
            .unwrap();
    }

    #[test]
    fn test_duplicate_names_rejected_before_any_unit_runs() {
        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new(&conn);

        let units = vec![
            MigrationUnit::new("000_first", "CREATE TABLE first (id INTEGER);"),
            MigrationUnit::new("001_a", "CREATE TABLE IF NOT EXISTS a (id INTEGER);"),
            MigrationUnit::new("001_a", "CREATE TABLE IF NOT EXISTS a (id INTEGER);"),
        ];
        let err = runner.apply_units(units).unwrap_err();

        assert_eq!(
            err,
            DatabaseError::DuplicateMigration {
                name: "001_a".to_string()
            }
        );
        assert!(!MigrationLedger::new(&conn).exists().unwrap());
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('first', 'a')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 0);
    }

    #[test]
    fn test_second_run_is_noop() {
        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new(&conn);
        let units = vec![MigrationUnit::new(
            "001_a",
            "CREATE TABLE t (id INTEGER PRIMARY KEY);",
        )];

        let first = runner.apply_units(units.clone()).unwrap();
        let second = runner.apply_units(units).unwrap();

        assert_eq!(first.applied, vec!["001_a"]);
        assert!(second.is_noop());
        assert_eq!(second.already_applied, 1);
        assert_eq!(MigrationLedger::new(&conn).count().unwrap(), 1);
    }

    #[test]
    fn test_empty_body_is_recorded() {
        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new(&conn);

        let report = runner
            .apply_units(vec![MigrationUnit::new("001_blank", "  \n\t ")])
            .unwrap();

        assert_eq!(report.applied, vec!["001_blank"]);
        assert!(MigrationLedger::new(&conn).is_applied("001_blank").unwrap());
    }

    #[test]
    fn test_failure_halts_and_rolls_back_unit() {
        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new(&conn);

        let units = vec![
            MigrationUnit::new("001_ok", "CREATE TABLE a (id INTEGER);"),
            // first statement succeeds, second fails; both must roll back
            MigrationUnit::new(
                "002_bad",
                "CREATE TABLE b (id INTEGER); CREAT TABLE oops (id INTEGER);",
            ),
            MigrationUnit::new("003_after", "CREATE TABLE c (id INTEGER);"),
        ];
        let err = runner.apply_units(units).unwrap_err();

        assert_eq!(err.migration_name(), Some("002_bad"));
        assert!(matches!(err, DatabaseError::MigrationFailed { .. }));
        assert_eq!(ledger_names(&conn), vec!["001_ok"]);

        let b_exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('b', 'c')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(b_exists, 0);
    }

    #[test]
    fn test_fixed_unit_is_retried_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new(&conn);

        let broken = vec![MigrationUnit::new(
            "001_a",
            "CREATE TABLE a (id INTEGER); INSERT INTO missing VALUES (1);",
        )];
        assert!(runner.apply_units(broken).is_err());

        let fixed = vec![MigrationUnit::new("001_a", "CREATE TABLE a (id INTEGER);")];
        let report = runner.apply_units(fixed).unwrap();
        assert_eq!(report.applied, vec!["001_a"]);
    }

    #[test]
    fn test_pending_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        write_unit(dir.path(), "001_a.sql", "CREATE TABLE a (id INTEGER);");
        write_unit(dir.path(), "002_b.sql", "CREATE TABLE b (id INTEGER);");

        let conn = Connection::open_in_memory().unwrap();
        let runner = MigrationRunner::new(&conn);

        assert_eq!(runner.pending(dir.path()).unwrap().len(), 2);
        assert!(!MigrationLedger::new(&conn).exists().unwrap());

        runner
            .apply_units(vec![MigrationUnit::new(
                "001_a",
                "CREATE TABLE a (id INTEGER);",
            )])
            .unwrap();
        let pending: Vec<String> = runner
            .pending(dir.path())
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(pending, vec!["002_b"]);
    }
}
