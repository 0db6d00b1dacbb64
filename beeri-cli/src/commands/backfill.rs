//! `beeri backfill-tokens` - events without an edit token and grocery
//! lists without a share token get a fresh one. Safe to re-run: rows that
//! gained a token in the meantime are left alone.

use std::path::Path;

use anyhow::{Context, Result};
use beeri_core::token::generate_share_token;
use beeri_server::db::MaintenanceRepo;
use clap::Parser;

#[derive(Parser, Debug)]
pub struct BackfillArgs {
    /// Only report how many rows are missing tokens
    #[arg(long)]
    pub dry_run: bool,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

pub async fn run_backfill(config_path: Option<&Path>, args: BackfillArgs) -> Result<()> {
    let config = super::load_config(config_path, args.database_url)?;
    let pool = super::connect(&config).await?;
    let repo = MaintenanceRepo::new(&pool);

    let events = repo
        .events_without_edit_token()
        .await
        .context("Failed to list events")?;
    let lists = repo
        .grocery_lists_without_share_token()
        .await
        .context("Failed to list grocery lists")?;

    if args.dry_run {
        println!(
            "{} event(s) missing edit tokens, {} grocery list(s) missing share tokens",
            events.len(),
            lists.len()
        );
        return Ok(());
    }

    let mut filled_events = 0;
    for id in events {
        if repo.set_edit_token(id, &generate_share_token()).await? {
            filled_events += 1;
        }
    }

    let mut filled_lists = 0;
    for id in lists {
        if repo.set_share_token(id, &generate_share_token()).await? {
            filled_lists += 1;
        }
    }

    tracing::info!(filled_events, filled_lists, "token backfill complete");
    println!("Generated {filled_events} edit token(s) and {filled_lists} share token(s)");
    Ok(())
}
