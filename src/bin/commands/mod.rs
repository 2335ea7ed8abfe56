pub mod books;
pub mod config;
pub mod init;
pub mod migrate;
pub mod status;

use anyhow::Result;
use clible::database::{install_bundled_assets, ClibleDatabase, DatabaseProvisioner};
use clible::ClibleConfig;
use tracing::info;

/// Install any missing bundled files, then provision the configured database
pub(crate) fn open_database(config: &ClibleConfig) -> Result<ClibleDatabase> {
    let options = config.provision_options();
    let written = install_bundled_assets(&options)?;
    for path in &written {
        info!("wrote {}", path.display());
    }
    Ok(DatabaseProvisioner::new(options).open(None)?)
}
