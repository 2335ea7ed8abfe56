//! Bundled migrations and reference data
//!
//! The application's schema and book dataset are compiled into the library.
//! `install_bundled_assets` copies them into the configured locations so a
//! fresh data directory can be bootstrapped; files already present are kept
//! as they are.

use super::books::BUNDLED_BOOKS_JSON;
use super::ProvisionOptions;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Bundled migration units as `(file name, body)`
pub const BUNDLED_MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_create_books.sql",
        include_str!("../../../migrations/001_create_books.sql"),
    ),
    (
        "002_create_verses.sql",
        include_str!("../../../migrations/002_create_verses.sql"),
    ),
];

/// Write bundled files that are missing and return the paths written
pub fn install_bundled_assets(options: &ProvisionOptions) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    std::fs::create_dir_all(&options.migrations_dir).map_err(|e| {
        anyhow!(
            "Unable to create migrations directory {}: {}",
            options.migrations_dir.display(),
            e
        )
    })?;
    for (file_name, body) in BUNDLED_MIGRATIONS {
        let path = options.migrations_dir.join(file_name);
        if write_if_missing(&path, body)? {
            written.push(path);
        }
    }

    if let Some(parent) = options.books_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow!("Unable to create data directory {}: {}", parent.display(), e))?;
    }
    if write_if_missing(&options.books_path, BUNDLED_BOOKS_JSON)? {
        written.push(options.books_path.clone());
    }

    if !written.is_empty() {
        info!("installed {} bundled file(s)", written.len());
    }
    Ok(written)
}

fn write_if_missing(path: &Path, contents: &str) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    std::fs::write(path, contents)
        .map_err(|e| anyhow!("Unable to write {}: {}", path.display(), e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_in(dir: &Path) -> ProvisionOptions {
        ProvisionOptions {
            db_path: dir.join("clible.db"),
            migrations_dir: dir.join("migrations"),
            books_path: dir.join("bible_structure.json"),
        }
    }

    #[test]
    fn test_install_writes_missing_files_once() {
        let dir = tempfile::tempdir().unwrap();
        let options = options_in(dir.path());

        let first = install_bundled_assets(&options).unwrap();
        assert_eq!(first.len(), BUNDLED_MIGRATIONS.len() + 1);
        assert!(options.migrations_dir.join("001_create_books.sql").exists());

        let second = install_bundled_assets(&options).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_install_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let options = options_in(dir.path());
        std::fs::write(&options.books_path, "{\"books\": []}").unwrap();

        install_bundled_assets(&options).unwrap();
        let kept = std::fs::read_to_string(&options.books_path).unwrap();
        assert_eq!(kept, "{\"books\": []}");
    }
}
