#![forbid(unsafe_code)]
//! REST API server for the operations table

use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

use optable::api::{run_api_server, ApiState};
use optable::cli::{init_logging, open_source};
use optable::config::load_config_from;

#[derive(Parser)]
#[command(name = "optable-server", about = "Serve ledger operations over HTTP")]
struct Args {
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Listen port, overrides `api.port` and `PORT`
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config_from(&args.config)?;
    config.validate()?;
    init_logging(&config.logging.level);

    let port = args
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
        .unwrap_or(config.api.port);

    let source = open_source(&config)?;
    tracing::info!(source = source.kind(), port, "starting optable server");
    println!(
        "{}",
        format!("🚀 API listening on http://0.0.0.0:{}/api", port).bright_cyan()
    );

    let state = Arc::new(ApiState::new(source, config.fetch.clone()));
    run_api_server(state, port).await
}
