use anyhow::Result;
use clap::Args;
use clible::database::install_bundled_assets;
use clible::lens::migrations::MigrationLens;
use clible::ClibleConfig;

/// Arguments for the Migrate command
#[derive(Args)]
pub struct MigrateArgs {
    /// Only list pending migrations, do not apply them
    #[clap(long)]
    pub dry_run: bool,
}

pub fn run(config: &ClibleConfig, args: MigrateArgs) -> Result<()> {
    let MigrateArgs { dry_run } = args;

    if dry_run {
        // the real run installs the bundled units first; list against the same set
        install_bundled_assets(&config.provision_options())?;
        if !config.db_path.exists() {
            println!(
                "database {} does not exist yet; all units are pending",
                config.db_path.display()
            );
        }
        let pending = MigrationLens::pending_for_file(&config.db_path, &config.migrations_dir)?;
        if pending.is_empty() {
            println!("no pending migrations");
        }
        for name in pending {
            println!("pending {}", name);
        }
        return Ok(());
    }

    let db = super::open_database(config)?;
    let report = db.migration_report();
    if report.is_noop() {
        println!("no pending migrations");
    }
    for name in &report.applied {
        println!("applied {}", name);
    }
    Ok(())
}
