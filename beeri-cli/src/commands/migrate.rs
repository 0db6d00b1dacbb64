//! `beeri migrate` - create or update the schema

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use beeri_server::migrations;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

pub async fn run_migrate(config_path: Option<&Path>, args: MigrateArgs) -> Result<()> {
    let config = super::load_config(config_path, args.database_url)?;
    let pool = super::connect(&config).await?;

    migrations::run(&pool).await.context("Migration failed")?;

    println!("Schema is up to date ({} tables)", migrations::TABLES.len());
    Ok(())
}
