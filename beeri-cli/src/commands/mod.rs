//! Command implementations for the beeri CLI

pub mod backfill;
pub mod backup;
pub mod migrate;
pub mod seed;
pub mod serve;

use std::path::Path;

use anyhow::{Context, Result};
use beeri_core::BeeriConfig;
use beeri_server::db::create_pool_with_options;
use sqlx::PgPool;

pub use backfill::run_backfill;
pub use backup::{run_backup, run_verify_backup};
pub use migrate::run_migrate;
pub use seed::run_seed;
pub use serve::run_serve;

/// Config file (if any) plus environment, with an optional URL override.
pub(crate) fn load_config(path: Option<&Path>, database_url: Option<String>) -> Result<BeeriConfig> {
    let mut config = BeeriConfig::load(path).context("Failed to load configuration")?;
    if let Some(url) = database_url {
        config.database.url = Some(url);
    }
    Ok(config)
}

pub(crate) async fn connect(config: &BeeriConfig) -> Result<PgPool> {
    let url = config
        .database_url()
        .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, .env or the config file")?;
    create_pool_with_options(url, config.database.max_connections)
        .await
        .context("Failed to connect to the database")
}
