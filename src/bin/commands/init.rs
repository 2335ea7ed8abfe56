use anyhow::Result;
use clap::Args;
use clible::database::{ensure_data_dir, install_bundled_assets, DatabaseProvisioner};
use clible::{ClibleConfig, SeedOutcome};
use std::path::PathBuf;

/// Arguments for the Init command
#[derive(Args)]
pub struct InitArgs {
    /// Database file to initialize instead of the configured one
    #[clap(long)]
    pub db_path: Option<PathBuf>,
}

pub fn run(config: &ClibleConfig, args: InitArgs) -> Result<()> {
    let InitArgs { db_path } = args;

    ensure_data_dir(&config.data_dir)?;
    let options = config.provision_options();
    for path in install_bundled_assets(&options)? {
        println!("installed {}", path.display());
    }

    let db = DatabaseProvisioner::new(options).open(db_path.as_deref())?;

    let report = db.migration_report();
    if report.is_noop() {
        println!("schema up to date ({} migration(s) already applied)", report.already_applied);
    } else {
        for name in &report.applied {
            println!("applied {}", name);
        }
    }

    match db.seed_outcome() {
        SeedOutcome::Seeded { inserted } => println!("seeded {} books", inserted),
        SeedOutcome::AlreadySeeded { existing } => {
            println!("books already seeded ({} rows)", existing)
        }
    }
    Ok(())
}
