//! Job status endpoint

use reqwest::Url;
use sluice_core::domain::task::SubTaskRecord;

use crate::error::{ClientError, Result};
use crate::{API_KEY_HEADER, IngestionClient};

/// Longest body excerpt quoted in a parse error
const BODY_EXCERPT_LEN: usize = 200;

impl IngestionClient {
    /// Fetch the current sub-task list of a job
    ///
    /// Exactly one `GET {base_url}/jobs/{job_id}/status` round trip; no
    /// retries. A non-2xx response yields [`ClientError::ApiError`] carrying
    /// the status and body, a failed connection yields
    /// [`ClientError::RequestFailed`].
    ///
    /// # Arguments
    /// * `job_id` - The remote job identifier
    pub async fn get_job_status(&self, job_id: &str) -> Result<Vec<SubTaskRecord>> {
        let url = self.status_url(job_id)?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::api_error(status.as_u16(), body));
        }

        parse_status_body(&body)
    }

    /// `{base_url}/jobs/{job_id}/status` with `job_id` as one encoded segment
    fn status_url(&self, job_id: &str) -> Result<Url> {
        let invalid = |message: String| ClientError::InvalidUrl {
            url: self.base_url.clone(),
            message,
        };

        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["jobs", job_id, "status"]);

        Ok(url)
    }
}

/// Decode a status response body into sub-task records
pub(crate) fn parse_status_body(body: &str) -> Result<Vec<SubTaskRecord>> {
    serde_json::from_str(body).map_err(|e| {
        let excerpt: String = body.chars().take(BODY_EXCERPT_LEN).collect();
        ClientError::ParseError(format!("{} (body: {})", e, excerpt))
    })
}
