//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod status;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show the current status of an ingestion job
    Status {
        /// Remote job ID
        job_id: String,

        /// Print the raw sub-tasks and summary as JSON
        #[arg(long)]
        json: bool,

        /// Sub-tasks a fully registered job reports
        #[arg(long, default_value_t = sluice_core::policy::DEFAULT_MIN_TASK_COUNT)]
        min_tasks: usize,
    },
}

/// Handle a CLI command
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Status {
            job_id,
            json,
            min_tasks,
        } => status::show_status(config, &job_id, json, min_tasks).await,
    }
}
