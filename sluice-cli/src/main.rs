//! Sluice CLI
//!
//! Command-line interface for checking ingestion jobs by hand.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sluice")]
#[command(about = "Sluice ingestion job status CLI", long_about = None)]
struct Cli {
    /// Ingestion service base URL
    #[arg(long, env = "SLUICE_API_BASE_URL")]
    api_base_url: String,

    /// API key sent as x-api-key
    #[arg(long, env = "SLUICE_API_KEY", hide_env_values = true)]
    api_key: String,

    /// PEM certificate to trust for the ingestion service
    #[arg(long, env = "SLUICE_CERT_PATH")]
    cert_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        api_base_url: cli.api_base_url,
        api_key: cli.api_key,
        cert_path: cli.cert_path,
    };

    handle_command(cli.command, &config).await
}
