//! beeri - BeeriManager server and maintenance CLI
//!
//! - `serve`: run the HTTP API
//! - `migrate`: create or update the schema
//! - `backup` / `verify-backup`: JSON export of every table and a row-count check
//! - `backfill-tokens`: generate missing event edit tokens and grocery share tokens
//! - `seed`: import events from a calendar or spreadsheet export

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "beeri",
    author,
    version,
    about = "BeeriManager parent committee backend",
    long_about = "Runs the BeeriManager HTTP API and the maintenance tasks around its \
                  Postgres database: migrations, JSON backups and token backfills."
)]
struct Cli {
    /// Debug logging (RUST_LOG still wins when set)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (needs the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    /// TOML config file; environment variables override its values
    #[arg(long, short = 'c', global = true, env = "BEERI_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create or update the database schema
    Migrate(commands::migrate::MigrateArgs),
    /// Export every table to a JSON file
    Backup(commands::backup::BackupArgs),
    /// Compare a backup's row counts with the live database
    VerifyBackup(commands::backup::VerifyBackupArgs),
    /// Generate missing edit and share tokens
    BackfillTokens(commands::backfill::BackfillArgs),
    /// Import events from a calendar/spreadsheet export (.csv or .json)
    Seed(commands::seed::SeedArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })
    .ok();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Serve(args) => commands::run_serve(config, args).await,
        Commands::Migrate(args) => commands::run_migrate(config, args).await,
        Commands::Backup(args) => commands::run_backup(config, args).await,
        Commands::VerifyBackup(args) => commands::run_verify_backup(config, args).await,
        Commands::BackfillTokens(args) => commands::run_backfill(config, args).await,
        Commands::Seed(args) => commands::run_seed(config, args).await,
    };

    tracing_setup::shutdown_otel();
    result
}
