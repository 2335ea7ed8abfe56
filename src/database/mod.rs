//! Database module
//!
//! This module provides all database functionality for clible, organized into:
//!
//! - **core**: SQLite connection wrapper and engine settings
//! - **migrate**: migration ledger and runner
//! - **clible**: the provisioned application database and its book reference data
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   └── connection  # DatabaseConn (WAL + foreign keys)
//! │
//! ├── migrate/        # Schema changes
//! │   ├── ledger      # _migrations table
//! │   └── runner      # *.sql discovery and ordered application
//! │
//! └── clible/         # Application database
//!     ├── books       # Book records, dataset, seeder, repository
//!     └── assets      # Bundled migrations and dataset
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use clible::database::{DatabaseProvisioner, ProvisionOptions, Testament};
//!
//! let options = ProvisionOptions::in_dir(Path::new("~/.clible"));
//! let db = DatabaseProvisioner::new(options).open(None)?;
//!
//! for book in db.books().by_testament(Testament::New)? {
//!     println!("{} ({} chapters)", book.name, book.chapters);
//! }
//! ```

pub mod clible;
pub mod core;
pub mod error;
pub mod migrate;

pub use self::core::DatabaseConn;
pub use clible::{
    install_bundled_assets, Book, BookDataset, BookRepository, BookSeeder, ClibleDatabase,
    DatabaseProvisioner, ProvisionOptions, SeedOutcome, Testament, BOOKS_TABLE,
    BUNDLED_BOOKS_JSON, BUNDLED_MIGRATIONS,
};
pub use error::{DatabaseError, DbResult};
pub use migrate::{
    discover_migrations, LedgerEntry, MigrationLedger, MigrationReport, MigrationRunner,
    MigrationUnit, LEDGER_TABLE, MIGRATION_EXTENSION,
};

/// Ensure the data directory exists
pub fn ensure_data_dir(data_dir: &std::path::Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create data directory '{}': {}",
            data_dir.display(),
            e
        )
    })
}
