#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Clible - a commandline scripture reader backed by SQLite
//!
//! Clible keeps its data in a single local SQLite file. The library's main job
//! is bringing that file from "nonexistent" to "fully initialized" on every
//! start, idempotently:
//!
//! 1. open the file and enable write-ahead logging and foreign keys,
//! 2. apply pending `*.sql` migration units in name order, recording each in
//!    the `_migrations` ledger in the same transaction as its statements,
//! 3. seed the `books` reference table from a bundled dataset if it is empty.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | `database` | Migrations, seeding and provisioning (always on) | `rusqlite` |
//! | `display` | Lenses with table formatting | `tabled` |
//! | `cli` | The `clible` binary | `clap`, `tracing-subscriber` |
//!
//! # Architecture
//!
//! - **[`database`]**: connection wrapper, migration ledger and runner, book
//!   seeder and repository, and the provisioner tying them together
//! - **[`lens`]**: query + formatting helpers used by the CLI (feature `display`)
//! - **[`config`]**: configuration from TOML file and `CLIBLE_*` environment
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use clible::{ClibleConfig, ClibleDatabase};
//!
//! let config = ClibleConfig::new(&None)?;
//! let db = ClibleDatabase::open(&config.provision_options())?;
//!
//! let genesis = db.books().find_by_name("genesis")?;
//! ```

pub mod config;
pub mod database;

#[cfg(feature = "display")]
pub mod lens;

// =============================================================================
// Configuration
// =============================================================================

pub use config::ClibleConfig;

// =============================================================================
// Database Module - Re-export commonly used types
// =============================================================================

pub use database::{
    ClibleDatabase, DatabaseConn, DatabaseError, DatabaseProvisioner, DbResult, ProvisionOptions,
};

pub use database::{
    discover_migrations, LedgerEntry, MigrationLedger, MigrationReport, MigrationRunner,
    MigrationUnit,
};

pub use database::{Book, BookDataset, BookRepository, BookSeeder, SeedOutcome, Testament};

// =============================================================================
// Lens Module - Feature-gated exports
// =============================================================================

#[cfg(feature = "display")]
pub use lens::utils::OutputFormat;
