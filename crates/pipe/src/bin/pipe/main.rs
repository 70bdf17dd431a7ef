#![deny(rust_2018_idioms)]

use std::num::NonZeroU32;

use anyhow::Context;
use pipe_common::consts::VERSION;
use pipe_lib::upgrade::{Upgrade, UpgradeOutcome};
use pipe_storage::StorageBuilder;
use tracing::info;

mod config;

/// Name of the database file within the data directory.
const DATABASE_FILE: &str = "pipe.sqlite";

fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }

    setup_tracing();

    let config = config::Config::parse();

    info!(version = VERSION, "🏁 Starting pipe.");

    permission_check(&config.data_directory)?;

    let database_path = config.data_directory.join(DATABASE_FILE);
    let storage = StorageBuilder::file(database_path)
        .journal_mode(config.sqlite_wal)
        .migrate()
        .context("Migrating database")?
        .create_pool(NonZeroU32::MIN)
        .context("Creating database connection pool")?;
    info!(location=?storage.path(), "Database migrated.");

    if config.initialize {
        pipe_lib::init::initialize(&storage).context("Initializing platform")?;
    }

    match Upgrade::new(storage)
        .perform()
        .context("Upgrading installation")?
    {
        UpgradeOutcome::NotInitialized => {
            info!("Platform is not initialized yet, start with --initialize to install it.")
        }
        UpgradeOutcome::UpToDate => info!(version = VERSION, "Installation is up to date."),
        UpgradeOutcome::Upgraded(report) => {
            if !report.defaults_failed.is_empty() {
                tracing::warn!(
                    blogs=?report.defaults_failed,
                    "Some blogs are missing the Google AdSense article embed setting"
                );
            }
        }
    }

    Ok(())
}

fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}

fn permission_check(base: &std::path::Path) -> Result<(), anyhow::Error> {
    tempfile::tempfile_in(base)
        .with_context(|| format!("Failed to create a file in {}. Make sure the directory is writable by the user running pipe.", base.display()))?;

    Ok(())
}
