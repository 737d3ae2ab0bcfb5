//! Job status poller
//!
//! Polls the ingestion service for one job until the completion policy says
//! stop, a fatal fetch error occurs, or the wall-clock budget runs out.
//!
//! ```text
//! WarmingUp -> Polling -> Polling ...
//!                      -> StoppedSuccess | StoppedFailed | TimedOut | FatalError
//! ```

use sluice_client::ClientError;
use sluice_core::domain::task::SubTaskRecord;
use sluice_core::policy::{CompletionDecision, CompletionPolicy};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::repository::{FetchError, StatusRepository};

/// Polling budget and cadence for one job
#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Wall-clock budget, measured from the end of the warm-up
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Delay before the first fetch; jobs take a moment to register remotely
    pub warm_up: Duration,
    pub policy: CompletionPolicy,
    /// Transient failures in a row before giving up on the job
    pub max_consecutive_failures: u32,
    /// Not enforced yet: meant to fail tasks stuck in progress for longer
    pub stuck_task_timeout: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30 * 60),
            poll_interval: Duration::from_secs(30),
            warm_up: Duration::from_secs(10),
            policy: CompletionPolicy::default(),
            max_consecutive_failures: 10,
            stuck_task_timeout: None,
        }
    }
}

/// Snapshot the poller stopped on
#[derive(Debug, Clone)]
pub struct PollOutcome {
    /// `StopSuccessLike` or `StopFailed`, never `Continue`
    pub decision: CompletionDecision,
    pub tasks: Vec<SubTaskRecord>,
    /// Fetches performed, failed ones included
    pub attempts: u32,
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("job did not complete within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("status fetch failed permanently: {0}")]
    Fatal(#[source] ClientError),

    #[error("giving up after {failures} consecutive status fetch failures: {source}")]
    RetriesExhausted {
        failures: u32,
        #[source]
        source: ClientError,
    },
}

/// Drives repeated status fetches for a job
pub struct StatusPoller {
    repository: Arc<dyn StatusRepository>,
    settings: PollSettings,
}

impl StatusPoller {
    pub fn new(repository: Arc<dyn StatusRepository>, settings: PollSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Polls `job_id` until a stop decision, a fatal error or the timeout
    ///
    /// Transient fetch failures count as "no data yet". Blocks the calling
    /// task for the warm-up and between fetches.
    pub async fn poll(&self, job_id: &str) -> Result<PollOutcome, PollError> {
        let settings = &self.settings;

        if let Some(stuck) = settings.stuck_task_timeout {
            debug!(
                "Stuck-task timeout of {:?} is configured but not enforced",
                stuck
            );
        }

        debug!("Waiting {:?} before polling job {}", settings.warm_up, job_id);
        time::sleep(settings.warm_up).await;

        let started = Instant::now();
        let mut attempts = 0;
        let mut consecutive_failures = 0;

        loop {
            if started.elapsed() > settings.timeout {
                warn!(
                    "Job {} still incomplete after {:?} ({} attempt(s))",
                    job_id, settings.timeout, attempts
                );
                return Err(PollError::Timeout {
                    timeout: settings.timeout,
                });
            }

            attempts += 1;

            match self.repository.fetch_status(job_id).await {
                Ok(tasks) => {
                    consecutive_failures = 0;
                    let decision = settings.policy.evaluate(&tasks);

                    debug!(
                        "Job {} attempt {}: {} sub-task(s), decision {:?}",
                        job_id,
                        attempts,
                        tasks.len(),
                        decision
                    );

                    if decision.is_stop() {
                        info!(
                            "Job {} stopped polling with {:?} after {} attempt(s)",
                            job_id, decision, attempts
                        );
                        return Ok(PollOutcome {
                            decision,
                            tasks,
                            attempts,
                        });
                    }
                }
                Err(FetchError::Fatal(e)) => {
                    return Err(PollError::Fatal(e));
                }
                Err(FetchError::Transient(e)) => {
                    consecutive_failures += 1;
                    if consecutive_failures >= settings.max_consecutive_failures {
                        return Err(PollError::RetriesExhausted {
                            failures: consecutive_failures,
                            source: e,
                        });
                    }
                    warn!(
                        "Status fetch for job {} failed ({}/{}), will retry: {}",
                        job_id, consecutive_failures, settings.max_consecutive_failures, e
                    );
                }
            }

            time::sleep(settings.poll_interval).await;
        }
    }
}
