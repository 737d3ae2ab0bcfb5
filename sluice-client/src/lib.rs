//! Sluice HTTP Client
//!
//! A small, type-safe client for the remote ingestion service's job status
//! API.
//!
//! # Example
//!
//! ```no_run
//! use sluice_client::IngestionClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = IngestionClient::builder("https://ingest.example.com", "secret")
//!         .cert_path("/etc/sluice/ingest.pem")
//!         .build()?;
//!
//!     let tasks = client.get_job_status("job-1234").await?;
//!     println!("{} sub-task(s) reported", tasks.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use sluice_core::domain::task::SubTaskRecord;

use reqwest::{Certificate, Client};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Header carrying the API key on every request
const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for the ingestion service API
#[derive(Debug, Clone)]
pub struct IngestionClient {
    /// Base URL of the service (e.g., "https://ingest.example.com/api")
    base_url: String,
    /// Key sent in the `x-api-key` header
    api_key: String,
    /// HTTP client instance
    client: Client,
}

impl IngestionClient {
    /// Create a new client with default TLS settings
    ///
    /// # Example
    /// ```
    /// use sluice_client::IngestionClient;
    ///
    /// let client = IngestionClient::new("https://ingest.example.com", "secret");
    /// ```
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_client(base_url, api_key, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Start building a client with a certificate bundle and/or timeout
    pub fn builder(base_url: impl Into<String>, api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            base_url: base_url.into(),
            api_key: api_key.into(),
            cert_path: None,
            request_timeout: None,
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Builder for an [`IngestionClient`] with custom TLS trust and timeouts
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    base_url: String,
    api_key: String,
    cert_path: Option<PathBuf>,
    request_timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Trust every certificate in the PEM bundle at `path` in addition to the
    /// system roots
    pub fn cert_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cert_path = Some(path.into());
        self
    }

    /// Per-request timeout (connect + response)
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<IngestionClient> {
        let mut builder = Client::builder();

        if let Some(path) = self.cert_path {
            let certificates = load_certificates(&path)?;
            tracing::debug!(
                "Trusting {} certificate(s) from {}",
                certificates.len(),
                path.display()
            );
            for certificate in certificates {
                builder = builder.add_root_certificate(certificate);
            }
        }

        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(IngestionClient::with_client(
            self.base_url,
            self.api_key,
            builder.build()?,
        ))
    }
}

/// Read every certificate of a PEM bundle; an empty bundle is an error
fn load_certificates(path: &Path) -> Result<Vec<Certificate>> {
    let invalid = |message: String| ClientError::Certificate {
        path: path.to_path_buf(),
        message,
    };

    let pem = std::fs::read(path).map_err(|e| invalid(e.to_string()))?;
    let certificates = Certificate::from_pem_bundle(&pem).map_err(|e| invalid(e.to_string()))?;
    if certificates.is_empty() {
        return Err(invalid("no certificates found".to_string()));
    }

    Ok(certificates)
}
