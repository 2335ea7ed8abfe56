//! Book lens
//!
//! Lookup of the seeded book reference table by testament and name.

use crate::database::{Book, ClibleDatabase, Testament};
use crate::lens::utils::{render, OutputFormat};
use anyhow::{anyhow, Result};
use serde::Serialize;
use tabled::Tabled;

/// Arguments for a book search
#[derive(Debug, Clone, Default)]
pub struct BookSearchArgs {
    /// Restrict to one testament
    pub testament: Option<Testament>,
    /// Exact book names (case-insensitive); empty means all books
    pub names: Vec<String>,
}

/// A book formatted for display
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct BookEntry {
    pub id: u32,
    pub name: String,
    pub testament: Testament,
    pub position: u32,
    pub chapters: u32,
}

impl From<Book> for BookEntry {
    fn from(book: Book) -> Self {
        BookEntry {
            id: book.id,
            name: book.name,
            testament: book.testament,
            position: book.position,
            chapters: book.chapters,
        }
    }
}

pub struct BookLens<'a> {
    db: &'a ClibleDatabase,
}

impl<'a> BookLens<'a> {
    pub fn new(db: &'a ClibleDatabase) -> Self {
        Self { db }
    }

    /// Books matching `args`, in canonical order
    ///
    /// Fails if a requested name is not a known book.
    pub fn search(&self, args: &BookSearchArgs) -> Result<Vec<BookEntry>> {
        let repo = self.db.books();

        let mut books = if args.names.is_empty() {
            match args.testament {
                Some(t) => repo.by_testament(t)?,
                None => repo.all()?,
            }
        } else {
            let mut found = Vec::with_capacity(args.names.len());
            for name in &args.names {
                let book = repo
                    .find_by_name(name)?
                    .ok_or_else(|| anyhow!("Unknown book '{}'", name))?;
                found.push(book);
            }
            if let Some(t) = args.testament {
                found.retain(|b| b.testament == t);
            }
            found
        };

        books.sort_by_key(|b| b.id);
        books.dedup_by_key(|b| b.id);
        Ok(books.into_iter().map(BookEntry::from).collect())
    }

    /// Total chapter count across the given books
    pub fn chapter_total(&self, books: &[BookEntry]) -> u32 {
        books.iter().map(|b| b.chapters).sum()
    }

    pub fn format(&self, books: &[BookEntry], format: OutputFormat) -> Result<String> {
        render(books, format, "id|name|testament|position|chapters", |b| {
            format!(
                "{}|{}|{}|{}|{}",
                b.id, b.name, b.testament, b.position, b.chapters
            )
        })
    }
}
