//! Clible database
//!
//! This module provides the application database: a single SQLite file holding
//! the migration ledger, the application schema and the seeded book reference
//! table.
//!
//! Opening it goes through [`DatabaseProvisioner`], which configures the
//! connection, applies pending migrations, seeds the reference table if it is
//! empty, and only then hands the connection out. Any failure aborts the open.

mod assets;
mod books;

pub use assets::{install_bundled_assets, BUNDLED_MIGRATIONS};
pub use books::{
    Book, BookDataset, BookRepository, BookSeeder, SeedOutcome, Testament, BOOKS_TABLE,
    BUNDLED_BOOKS_JSON,
};

use crate::database::core::DatabaseConn;
use crate::database::error::DbResult;
use crate::database::migrate::{MigrationLedger, MigrationReport, MigrationRunner};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::info;

/// Locations the provisioner works with, resolved once at process entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOptions {
    /// Default database file, used when `open` is not given a path
    pub db_path: PathBuf,
    /// Directory scanned for `*.sql` migration units
    pub migrations_dir: PathBuf,
    /// Reference dataset file, read only when the books table is empty
    pub books_path: PathBuf,
}

impl ProvisionOptions {
    /// Standard layout inside a data directory
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            db_path: data_dir.join("clible.db"),
            migrations_dir: data_dir.join("migrations"),
            books_path: data_dir.join("bible_structure.json"),
        }
    }
}

/// Opens ready-to-use database connections
pub struct DatabaseProvisioner {
    options: ProvisionOptions,
}

impl DatabaseProvisioner {
    pub fn new(options: ProvisionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProvisionOptions {
        &self.options
    }

    /// Open the database at `path`, or at the configured default
    ///
    /// The file is created if absent. Write-ahead logging and foreign keys are
    /// enabled, pending migrations are applied and the book table is seeded
    /// before the connection is returned.
    pub fn open(&self, path: Option<&Path>) -> DbResult<ClibleDatabase> {
        let path = path.unwrap_or(self.options.db_path.as_path());
        let db = DatabaseConn::open_path(path)?;
        self.bootstrap(db)
    }

    /// Same pipeline on an in-memory database (for testing)
    pub fn open_in_memory(&self) -> DbResult<ClibleDatabase> {
        let db = DatabaseConn::open_in_memory()?;
        self.bootstrap(db)
    }

    fn bootstrap(&self, db: DatabaseConn) -> DbResult<ClibleDatabase> {
        let migrations =
            MigrationRunner::new(&db.conn).apply_all(&self.options.migrations_dir)?;
        let seed = BookSeeder::new(&db.conn).seed_from_file_if_empty(&self.options.books_path)?;

        info!(
            "clible database ready ({} migration(s) applied, books: {:?})",
            migrations.applied.len(),
            seed
        );
        Ok(ClibleDatabase {
            db,
            migrations,
            seed,
        })
    }
}

/// A provisioned database connection
pub struct ClibleDatabase {
    db: DatabaseConn,
    migrations: MigrationReport,
    seed: SeedOutcome,
}

impl ClibleDatabase {
    /// Open the default database described by `options`
    pub fn open(options: &ProvisionOptions) -> DbResult<Self> {
        DatabaseProvisioner::new(options.clone()).open(None)
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.db.conn
    }

    /// Get the connection wrapper (pragma and table introspection)
    pub fn conn(&self) -> &DatabaseConn {
        &self.db
    }

    /// Migrations applied while this connection was provisioned
    pub fn migration_report(&self) -> &MigrationReport {
        &self.migrations
    }

    /// What the seeder did while this connection was provisioned
    pub fn seed_outcome(&self) -> SeedOutcome {
        self.seed
    }

    pub fn books(&self) -> BookRepository<'_> {
        BookRepository::new(&self.db.conn)
    }

    pub fn ledger(&self) -> MigrationLedger<'_> {
        MigrationLedger::new(&self.db.conn)
    }

    /// Consume the wrapper and return the raw connection
    pub fn into_connection(self) -> Connection {
        self.db.conn
    }
}
