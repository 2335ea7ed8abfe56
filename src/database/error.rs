//! Database errors
//!
//! Every failure raised while opening, migrating or seeding the database is one
//! of the variants below. Causes are carried as strings so callers can match and
//! compare errors without holding on to engine-specific types.

use std::path::Path;

/// Result alias used throughout the database layer
pub type DbResult<T> = Result<T, DatabaseError>;

/// Errors that can occur while provisioning the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    /// The database file could not be opened, created or configured
    StorageUnavailable { path: String, cause: String },

    /// The migrations directory or one of its files could not be read
    MigrationSource { path: String, cause: String },

    /// Two migration files resolve to the same unit name
    DuplicateMigration { name: String },

    /// A migration unit's statements failed to execute or commit
    MigrationFailed { name: String, cause: String },

    /// The ledger already holds an entry with this name
    DuplicateEntry { name: String },

    /// The reference dataset is malformed or could not be inserted
    SeedFailed { cause: String },

    /// Any other engine error raised by a query
    Storage { cause: String },
}

impl DatabaseError {
    pub(crate) fn storage(e: rusqlite::Error) -> Self {
        DatabaseError::Storage {
            cause: e.to_string(),
        }
    }

    pub(crate) fn unavailable(path: &str, cause: impl std::fmt::Display) -> Self {
        DatabaseError::StorageUnavailable {
            path: path.to_string(),
            cause: cause.to_string(),
        }
    }

    pub(crate) fn source_error(path: &Path, cause: impl std::fmt::Display) -> Self {
        DatabaseError::MigrationSource {
            path: path.display().to_string(),
            cause: cause.to_string(),
        }
    }

    pub(crate) fn migration_failed(name: &str, cause: impl std::fmt::Display) -> Self {
        DatabaseError::MigrationFailed {
            name: name.to_string(),
            cause: cause.to_string(),
        }
    }

    pub(crate) fn seed_failed(cause: impl std::fmt::Display) -> Self {
        DatabaseError::SeedFailed {
            cause: cause.to_string(),
        }
    }

    /// Name of the migration unit involved, if any
    pub fn migration_name(&self) -> Option<&str> {
        match self {
            DatabaseError::DuplicateMigration { name }
            | DatabaseError::MigrationFailed { name, .. }
            | DatabaseError::DuplicateEntry { name } => Some(name.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseError::StorageUnavailable { path, cause } => {
                write!(f, "Database at '{}' is unavailable: {}", path, cause)
            }
            DatabaseError::MigrationSource { path, cause } => {
                write!(f, "Failed to read migrations from '{}': {}", path, cause)
            }
            DatabaseError::DuplicateMigration { name } => {
                write!(f, "Migration '{}' is defined more than once", name)
            }
            DatabaseError::MigrationFailed { name, cause } => {
                write!(f, "Migration '{}' failed: {}", name, cause)
            }
            DatabaseError::DuplicateEntry { name } => {
                write!(f, "Migration '{}' is already recorded as applied", name)
            }
            DatabaseError::SeedFailed { cause } => {
                write!(f, "Failed to seed reference data: {}", cause)
            }
            DatabaseError::Storage { cause } => write!(f, "Database error: {}", cause),
        }
    }
}

impl std::error::Error for DatabaseError {}
