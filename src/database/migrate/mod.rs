//! Schema migrations
//!
//! - `ledger`: the `_migrations` table recording applied units
//! - `runner`: discovery of `*.sql` units and ordered, per-unit transactional application

mod ledger;
mod runner;

pub use ledger::{LedgerEntry, MigrationLedger, LEDGER_TABLE};
pub use runner::{
    discover_migrations, MigrationReport, MigrationRunner, MigrationUnit, MIGRATION_EXTENSION,
};
