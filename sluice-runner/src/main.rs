//! Sluice Runner
//!
//! Checks on the ingestion jobs started by the extraction step and records
//! how they went.
//!
//! Architecture:
//! - Configuration: JSON file (`SLUICE_CONFIG`) or environment variables
//! - Repositories: ingestion service status API, Postgres status database
//! - Scheduler: per-job status polling with a completion policy
//! - Services: the batch over every table's latest job
//!
//! One run processes one batch, sequentially, and exits.

mod config;
mod db;
mod repository;
mod scheduler;
mod service;

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::repository::{
    HttpStatusRepository, LedgerRepository, PgLedgerRepository, StatusRepository,
};
use crate::scheduler::StatusPoller;
use crate::service::{BatchReport, BatchService};
use sluice_client::IngestionClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sluice_runner=info,sluice_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Sluice Runner");

    let config = load_config()?;
    info!(
        "Loaded configuration: api_base_url={}, poll_timeout={:?}, poll_interval={:?}",
        config.api_base_url, config.poll_timeout, config.poll_interval
    );

    let client = Arc::new(build_client(&config)?);
    info!("Ingestion client initialized");

    info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    // The pool is closed on every path out of the batch
    let result = run_batch(&config, client, pool.clone()).await;
    pool.close().await;
    info!("Database connection closed");

    let report = result?;
    if !report.all_succeeded() {
        for pair in &report.failed {
            warn!("Not recorded: table {} (job {})", pair.table_name, pair.job_id);
        }
    }

    Ok(())
}

async fn run_batch(
    config: &Config,
    client: Arc<IngestionClient>,
    pool: PgPool,
) -> Result<BatchReport> {
    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let status_repository: Arc<dyn StatusRepository> = Arc::new(HttpStatusRepository::new(client));
    let ledger: Arc<dyn LedgerRepository> = Arc::new(PgLedgerRepository::new(pool));

    let poller = StatusPoller::new(status_repository, config.poll_settings());
    let batch = BatchService::new(poller, ledger);

    batch.run().await
}

/// Loads configuration from `SLUICE_CONFIG` if set, otherwise the environment
fn load_config() -> Result<Config> {
    let config = match std::env::var("SLUICE_CONFIG") {
        Ok(path) => {
            info!("Loading configuration from {}", path);
            Config::from_file(&path)?
        }
        Err(_) => Config::from_env()?,
    };

    config.validate()?;
    Ok(config)
}

fn build_client(config: &Config) -> Result<IngestionClient> {
    let mut builder = IngestionClient::builder(&config.api_base_url, &config.api_key)
        .request_timeout(config.request_timeout);

    if let Some(path) = &config.cert_path {
        builder = builder.cert_path(path.clone());
    }

    builder.build().context("Failed to build ingestion client")
}
