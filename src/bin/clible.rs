use clap::{Parser, Subcommand};
use clible::{ClibleConfig, OutputFormat};
use tracing::Level;

mod commands;

use commands::books::BooksArgs;
use commands::init::InitArgs;
use commands::migrate::MigrateArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.clible/clible.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Output format: table, markdown, json, json-pretty, json-line, psv
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory, apply migrations and seed reference data.
    Init(InitArgs),

    /// Apply pending schema migrations.
    Migrate(MigrateArgs),

    /// Show applied and pending migrations.
    Status,

    /// List or look up books of the canonical book list.
    Books(BooksArgs),

    /// Show the resolved configuration.
    Config,
}

fn main() {
    // A .env file in the working directory may carry CLIBLE_* settings
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.debug { Level::INFO } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = match ClibleConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::run(&config, args),
        Commands::Migrate(args) => commands::migrate::run(&config, args),
        Commands::Status => commands::status::run(&config, cli.format),
        Commands::Books(args) => commands::books::run(&config, args, cli.format),
        Commands::Config => commands::config::run(&config, cli.config.as_deref(), cli.format),
    };

    if let Err(e) = result {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }
}
