//! Status repository
//!
//! Fetches the sub-task list of a job from the ingestion service and sorts
//! failures into the ones worth retrying and the ones that never recover.

use async_trait::async_trait;
use sluice_client::{ClientError, IngestionClient};
use sluice_core::domain::task::SubTaskRecord;
use std::sync::Arc;
use thiserror::Error;

/// A failed status fetch, classified for the poller
#[derive(Debug, Error)]
pub enum FetchError {
    /// Worth trying again on the next poll (network trouble, 5xx, garbled body)
    #[error("transient status fetch failure: {0}")]
    Transient(#[source] ClientError),

    /// Will not get better by waiting (unknown job, rejected key, bad base URL)
    #[error("fatal status fetch failure: {0}")]
    Fatal(#[source] ClientError),
}

impl From<ClientError> for FetchError {
    fn from(err: ClientError) -> Self {
        if err.is_not_found() || err.is_unauthorized() || err.is_invalid_url() {
            FetchError::Fatal(err)
        } else {
            FetchError::Transient(err)
        }
    }
}

/// Repository trait for job status lookups
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Fetches the current sub-task list of a job (one round trip)
    ///
    /// # Arguments
    /// * `job_id` - The remote job identifier
    async fn fetch_status(&self, job_id: &str) -> Result<Vec<SubTaskRecord>, FetchError>;
}

/// HTTP implementation of StatusRepository
pub struct HttpStatusRepository {
    client: Arc<IngestionClient>,
}

impl HttpStatusRepository {
    pub fn new(client: Arc<IngestionClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusRepository for HttpStatusRepository {
    async fn fetch_status(&self, job_id: &str) -> Result<Vec<SubTaskRecord>, FetchError> {
        Ok(self.client.get_job_status(job_id).await?)
    }
}
