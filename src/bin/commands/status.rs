use anyhow::Result;
use clible::database::{DatabaseConn, BOOKS_TABLE};
use clible::lens::migrations::MigrationLens;
use clible::{ClibleConfig, OutputFormat};

/// Show the ledger and pending units without changing the database
pub fn run(config: &ClibleConfig, output_format: OutputFormat) -> Result<()> {
    if !config.db_path.exists() {
        println!(
            "database {} does not exist yet; run `clible init`",
            config.db_path.display()
        );
        return Ok(());
    }

    let db = DatabaseConn::open_read_only(&config.db_path)?;
    let lens = MigrationLens::new(&db.conn);
    let entries = lens.status(&config.migrations_dir)?;
    println!("{}", lens.format(&entries, output_format)?);

    if !output_format.is_json() {
        let books = if db.table_exists(BOOKS_TABLE)? {
            db.table_count(BOOKS_TABLE)?.to_string()
        } else {
            "not created".to_string()
        };
        println!("journal mode: {}", db.journal_mode()?);
        println!("books: {}", books);
    }
    Ok(())
}
