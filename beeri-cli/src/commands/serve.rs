//! `beeri serve` - run the HTTP API

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use beeri_server::http::{run_server, AppState, ServerConfig};

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: BEERI_BIND or 127.0.0.1:3030)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

pub async fn run_serve(config_path: Option<&Path>, args: ServeArgs) -> Result<()> {
    let mut config = super::load_config(config_path, args.database_url)?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if args.cors_permissive {
        config.server.cors_permissive = true;
    }

    // Fail on missing secrets before opening any connection
    config.auth_secrets().context("Admin authentication is not configured")?;

    let pool = super::connect(&config).await?;
    let state = AppState::from_config(pool, &config).context("Failed to build server state")?;
    let server = ServerConfig::from(&config);

    if server.cors_permissive {
        tracing::warn!("CORS is permissive: any origin may call the API");
    }
    tracing::info!(bind = %server.bind_addr, "Starting beeri server");

    run_server(state, server).await.context("Server error")?;
    Ok(())
}
