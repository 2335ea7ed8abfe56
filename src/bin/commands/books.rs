use anyhow::Result;
use clap::Args;
use clible::lens::books::{BookLens, BookSearchArgs};
use clible::{ClibleConfig, OutputFormat, Testament};

/// Arguments for the Books command
#[derive(Args)]
pub struct BooksArgs {
    /// Book names to look up (case-insensitive); all books when omitted
    #[clap()]
    pub names: Vec<String>,

    /// Only list books of one testament: old or new
    #[clap(short, long)]
    pub testament: Option<Testament>,
}

pub fn run(config: &ClibleConfig, args: BooksArgs, output_format: OutputFormat) -> Result<()> {
    let BooksArgs { names, testament } = args;

    let db = super::open_database(config)?;
    let lens = BookLens::new(&db);
    let books = lens.search(&BookSearchArgs { testament, names })?;

    println!("{}", lens.format(&books, output_format)?);
    if output_format == OutputFormat::Table {
        println!(
            "{} book(s), {} chapter(s)",
            books.len(),
            lens.chapter_total(&books)
        );
    }
    Ok(())
}
