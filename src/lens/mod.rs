//! Lens module
//!
//! High-level "lens" abstractions combining database queries with output
//! formatting, shared by the CLI commands.
//!
//! | Lens | Purpose |
//! |------|---------|
//! | `BookLens` | Query the seeded book reference table |
//! | `MigrationLens` | Report applied and pending migration units |
//!
//! ```rust,ignore
//! use clible::lens::books::{BookLens, BookSearchArgs};
//!
//! let lens = BookLens::new(&db);
//! let books = lens.search(&BookSearchArgs::default())?;
//! println!("{}", lens.format(&books, OutputFormat::Table)?);
//! ```

pub mod books;
pub mod migrations;
pub mod utils;
