//! Configuration module
//!
//! Connection settings for the ingestion service.

use anyhow::{Context, Result};
use sluice_client::IngestionClient;
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the ingestion service
    pub api_base_url: String,
    /// Key sent as x-api-key
    pub api_key: String,
    /// Certificate bundle to trust, if the service uses a private CA
    pub cert_path: Option<PathBuf>,
}

impl Config {
    pub fn client(&self) -> Result<IngestionClient> {
        let mut builder = IngestionClient::builder(&self.api_base_url, &self.api_key);
        if let Some(path) = &self.cert_path {
            builder = builder.cert_path(path.clone());
        }
        builder.build().context("Failed to build ingestion client")
    }
}
