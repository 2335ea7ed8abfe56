//! Book reference data
//!
//! The `books` table holds the canonical list of scripture books. It is filled
//! once, from a bundled JSON dataset, the first time a connection is
//! provisioned against an empty table, and never modified afterwards.

use crate::database::error::{DatabaseError, DbResult};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Bundled canonical dataset (66 books)
pub const BUNDLED_BOOKS_JSON: &str = include_str!("../../../data/bible_structure.json");

/// Name of the reference table
pub const BOOKS_TABLE: &str = "books";

/// Which testament a book belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Testament {
    #[serde(alias = "OT", alias = "Old")]
    Old,
    #[serde(alias = "NT", alias = "New")]
    New,
}

impl Testament {
    pub fn as_str(&self) -> &'static str {
        match self {
            Testament::Old => "old",
            Testament::New => "new",
        }
    }
}

impl fmt::Display for Testament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Testament {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "old" | "ot" => Ok(Testament::Old),
            "new" | "nt" => Ok(Testament::New),
            _ => Err(format!(
                "Unknown testament '{}'. Valid values: old, new",
                s
            )),
        }
    }
}

/// One canonical book, as stored in the `books` table and in the dataset file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: u32,
    pub name: String,
    pub testament: Testament,
    /// 1-based ordinal within the testament
    pub position: u32,
    #[serde(alias = "chapter_count")]
    pub chapters: u32,
}

impl Book {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let testament: String = row.get(2)?;
        let testament = testament.parse::<Testament>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::from(e))
        })?;
        Ok(Book {
            id: row.get(0)?,
            name: row.get(1)?,
            testament,
            position: row.get(3)?,
            chapters: row.get(4)?,
        })
    }
}

/// The reference dataset document: `{ "books": [ ... ] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDataset {
    pub books: Vec<Book>,
}

impl BookDataset {
    /// Parse a dataset document; missing fields or bad values are `SeedFailed`
    pub fn from_json(json: &str) -> DbResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| DatabaseError::seed_failed(format!("malformed book dataset: {}", e)))
    }

    /// Read and parse a dataset file
    pub fn load(path: &Path) -> DbResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DatabaseError::seed_failed(format!(
                "unable to read book dataset '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    /// The dataset compiled into the library
    pub fn bundled() -> DbResult<Self> {
        Self::from_json(BUNDLED_BOOKS_JSON)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Check the dataset before anything is written
    ///
    /// Positions must count 1, 2, 3, ... within each testament in the order
    /// the books are listed.
    pub fn validate(&self) -> DbResult<()> {
        if self.books.is_empty() {
            return Err(DatabaseError::seed_failed("book dataset contains no books"));
        }

        let mut ids = HashSet::new();
        let mut old_count = 0u32;
        let mut new_count = 0u32;
        for book in &self.books {
            if !ids.insert(book.id) {
                return Err(DatabaseError::seed_failed(format!(
                    "duplicate book id {}",
                    book.id
                )));
            }
            if book.name.trim().is_empty() {
                return Err(DatabaseError::seed_failed(format!(
                    "book {} has an empty name",
                    book.id
                )));
            }
            if book.chapters == 0 {
                return Err(DatabaseError::seed_failed(format!(
                    "book '{}' has no chapters",
                    book.name
                )));
            }

            let expected = match book.testament {
                Testament::Old => {
                    old_count += 1;
                    old_count
                }
                Testament::New => {
                    new_count += 1;
                    new_count
                }
            };
            if book.position != expected {
                return Err(DatabaseError::seed_failed(format!(
                    "book '{}' has position {} but is number {} in the {} testament",
                    book.name, book.position, expected, book.testament
                )));
            }
        }
        Ok(())
    }
}

/// Result of a seeding attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedOutcome {
    /// The table already had rows; nothing was written
    AlreadySeeded { existing: u64 },
    /// The table was empty and is now fully populated
    Seeded { inserted: usize },
}

/// Populates the `books` table from a dataset when it is empty
pub struct BookSeeder<'a> {
    conn: &'a Connection,
}

impl<'a> BookSeeder<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn existing_rows(&self) -> DbResult<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .map_err(|e| {
                DatabaseError::seed_failed(format!("unable to count rows in books: {}", e))
            })
    }

    /// Insert every book in `dataset` if, and only if, the table is empty
    ///
    /// All rows go in under one transaction: the table ends up either empty or
    /// fully populated.
    pub fn seed_if_empty(&self, dataset: &BookDataset) -> DbResult<SeedOutcome> {
        let existing = self.existing_rows()?;
        if existing > 0 {
            debug!("books table already has {} rows, skipping seed", existing);
            return Ok(SeedOutcome::AlreadySeeded { existing });
        }

        dataset.validate()?;

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(DatabaseError::seed_failed)?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO books (id, name, testament, position, chapters) VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(DatabaseError::seed_failed)?;
            for book in &dataset.books {
                stmt.execute((
                    book.id,
                    book.name.as_str(),
                    book.testament.as_str(),
                    book.position,
                    book.chapters,
                ))
                .map_err(|e| {
                    DatabaseError::seed_failed(format!(
                        "failed to insert book '{}': {}",
                        book.name, e
                    ))
                })?;
            }
        }
        tx.commit().map_err(DatabaseError::seed_failed)?;

        info!("seeded {} books", dataset.len());
        Ok(SeedOutcome::Seeded {
            inserted: dataset.len(),
        })
    }

    /// Like [`seed_if_empty`](Self::seed_if_empty), reading the dataset file
    /// only when the table is empty
    pub fn seed_from_file_if_empty(&self, path: &Path) -> DbResult<SeedOutcome> {
        let existing = self.existing_rows()?;
        if existing > 0 {
            debug!("books table already has {} rows, skipping seed", existing);
            return Ok(SeedOutcome::AlreadySeeded { existing });
        }
        let dataset = BookDataset::load(path)?;
        self.seed_if_empty(&dataset)
    }
}

/// Read access to seeded book data
pub struct BookRepository<'a> {
    conn: &'a Connection,
}

impl<'a> BookRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn count(&self) -> DbResult<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .map_err(DatabaseError::storage)
    }

    /// All books in canonical order
    pub fn all(&self) -> DbResult<Vec<Book>> {
        self.query(
            "SELECT id, name, testament, position, chapters FROM books ORDER BY id",
            [],
        )
    }

    /// Books of one testament ordered by position
    pub fn by_testament(&self, testament: Testament) -> DbResult<Vec<Book>> {
        self.query(
            "SELECT id, name, testament, position, chapters FROM books WHERE testament = ?1 ORDER BY position",
            [testament.as_str()],
        )
    }

    pub fn get(&self, id: u32) -> DbResult<Option<Book>> {
        Ok(self
            .query(
                "SELECT id, name, testament, position, chapters FROM books WHERE id = ?1",
                [id],
            )?
            .into_iter()
            .next())
    }

    /// Case-insensitive exact name lookup
    pub fn find_by_name(&self, name: &str) -> DbResult<Option<Book>> {
        Ok(self
            .query(
                "SELECT id, name, testament, position, chapters FROM books WHERE name = ?1 COLLATE NOCASE",
                [name.trim()],
            )?
            .into_iter()
            .next())
    }

    fn query<P: rusqlite::Params>(&self, sql: &str, params: P) -> DbResult<Vec<Book>> {
        let mut stmt = self.conn.prepare(sql).map_err(DatabaseError::storage)?;
        let books = stmt
            .query_map(params, Book::from_row)
            .map_err(DatabaseError::storage)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DatabaseError::storage)?;
        Ok(books)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOKS_SQL: &str = include_str!("../../../migrations/001_create_books.sql");

    fn create_test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(BOOKS_SQL).unwrap();
        conn
    }

    fn book(id: u32, name: &str, testament: Testament, position: u32) -> Book {
        Book {
            id,
            name: name.to_string(),
            testament,
            position,
            chapters: 1,
        }
    }

    #[test]
    fn test_bundled_dataset_is_valid() {
        let dataset = BookDataset::bundled().unwrap();
        assert_eq!(dataset.len(), 66);
        dataset.validate().unwrap();

        let old = dataset
            .books
            .iter()
            .filter(|b| b.testament == Testament::Old)
            .count();
        assert_eq!(old, 39);
    }

    #[test]
    fn test_dataset_field_aliases() {
        let dataset = BookDataset::from_json(
            r#"{"books": [{"id": 1, "name": "Genesis", "testament": "OT", "position": 1, "chapter_count": 50}]}"#,
        )
        .unwrap();
        assert_eq!(dataset.books[0].testament, Testament::Old);
        assert_eq!(dataset.books[0].chapters, 50);
    }

    #[test]
    fn test_dataset_missing_field_is_seed_failed() {
        let err = BookDataset::from_json(
            r#"{"books": [{"id": 1, "name": "Genesis", "testament": "old", "position": 1}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::SeedFailed { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_positions() {
        let dataset = BookDataset {
            books: vec![
                book(1, "Genesis", Testament::Old, 1),
                book(2, "Matthew", Testament::New, 1),
                book(3, "Exodus", Testament::Old, 3),
            ],
        };
        let err = dataset.validate().unwrap_err();
        assert!(err.to_string().contains("Exodus"));
    }

    #[test]
    fn test_seed_then_noop() {
        let conn = create_test_db();
        let seeder = BookSeeder::new(&conn);
        let dataset = BookDataset::bundled().unwrap();

        assert_eq!(
            seeder.seed_if_empty(&dataset).unwrap(),
            SeedOutcome::Seeded { inserted: 66 }
        );
        assert_eq!(
            seeder.seed_if_empty(&dataset).unwrap(),
            SeedOutcome::AlreadySeeded { existing: 66 }
        );
        assert_eq!(BookRepository::new(&conn).count().unwrap(), 66);
    }

    #[test]
    fn test_duplicate_id_leaves_table_empty() {
        let conn = create_test_db();
        let dataset = BookDataset {
            books: vec![
                book(1, "Genesis", Testament::Old, 1),
                book(1, "Exodus", Testament::Old, 2),
            ],
        };

        let err = BookSeeder::new(&conn).seed_if_empty(&dataset).unwrap_err();
        assert!(matches!(err, DatabaseError::SeedFailed { .. }));
        assert_eq!(BookRepository::new(&conn).count().unwrap(), 0);
    }

    #[test]
    fn test_constraint_failure_rolls_back_everything() {
        let conn = create_test_db();
        // passes dataset validation but violates the UNIQUE name constraint
        let dataset = BookDataset {
            books: vec![
                book(1, "Genesis", Testament::Old, 1),
                book(2, "Genesis", Testament::Old, 2),
            ],
        };

        let err = BookSeeder::new(&conn).seed_if_empty(&dataset).unwrap_err();
        assert!(matches!(err, DatabaseError::SeedFailed { .. }));
        assert_eq!(BookRepository::new(&conn).count().unwrap(), 0);
    }

    #[test]
    fn test_seed_without_schema_fails() {
        let conn = Connection::open_in_memory().unwrap();
        let dataset = BookDataset::bundled().unwrap();
        let err = BookSeeder::new(&conn).seed_if_empty(&dataset).unwrap_err();
        assert!(matches!(err, DatabaseError::SeedFailed { .. }));
    }

    #[test]
    fn test_file_not_read_when_seeded() {
        let conn = create_test_db();
        let seeder = BookSeeder::new(&conn);
        seeder
            .seed_if_empty(&BookDataset::bundled().unwrap())
            .unwrap();

        // the path does not exist; it must not be touched
        let outcome = seeder
            .seed_from_file_if_empty(Path::new("/nonexistent/books.json"))
            .unwrap();
        assert_eq!(outcome, SeedOutcome::AlreadySeeded { existing: 66 });
    }

    #[test]
    fn test_repository_queries() {
        let conn = create_test_db();
        BookSeeder::new(&conn)
            .seed_if_empty(&BookDataset::bundled().unwrap())
            .unwrap();
        let repo = BookRepository::new(&conn);

        let new = repo.by_testament(Testament::New).unwrap();
        assert_eq!(new.len(), 27);
        assert_eq!(new[0].name, "Matthew");
        assert_eq!(new[0].position, 1);

        let psalms = repo.find_by_name("psalms").unwrap().unwrap();
        assert_eq!(psalms.chapters, 150);
        assert_eq!(repo.get(psalms.id).unwrap(), Some(psalms));

        assert!(repo.find_by_name("Maccabees").unwrap().is_none());
    }

    #[test]
    fn test_testament_from_str() {
        assert_eq!("OLD".parse::<Testament>(), Ok(Testament::Old));
        assert_eq!("nt".parse::<Testament>(), Ok(Testament::New));
        assert!("apocrypha".parse::<Testament>().is_err());
    }
}
