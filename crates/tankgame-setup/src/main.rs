use anyhow::Context;
use tracing::info;

use tankgame_db::{Database, DbConfig};

/// Opens (and migrates) the game database, then checks that every named
/// query can be loaded from the configured source.
fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tankgame_setup=debug,tankgame_db=debug".into()),
        )
        .init();

    let config = DbConfig::from_env();
    match &config.sql_dir {
        Some(dir) => info!("Loading queries from {}", dir.display()),
        None => info!("Using embedded queries"),
    }

    let db = Database::open_with_config(&config)?;

    let count = config
        .query_store()
        .verify()
        .context("query store is incomplete")?;
    info!("{} queries available", count);

    let system = db
        .get_system_account()?
        .context("system account is missing")?;
    info!("System account {} has id {}", system.email, system.id);

    Ok(())
}
