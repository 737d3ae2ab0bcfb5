//! Batch service
//!
//! Walks the latest ingestion job of every table: poll, aggregate, attribute
//! to the table, reconcile against the watermark and persist. Each pair is
//! isolated; one failing table never stops the rest of the batch.

use anyhow::{Context, Result};
use sluice_core::aggregate;
use sluice_core::domain::batch::BatchPair;
use sluice_core::domain::summary::{JobSummary, OverallStatus};
use sluice_core::error::SnapshotError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::repository::LedgerRepository;
use crate::scheduler::{PollError, StatusPoller};

/// Why a single (table, job) pair could not be recorded
#[derive(Debug, Error)]
pub enum PairError {
    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("malformed status snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("failed to persist summary: {0:#}")]
    Persistence(anyhow::Error),
}

/// What happened to a batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: Vec<BatchPair>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct BatchService {
    poller: StatusPoller,
    ledger: Arc<dyn LedgerRepository>,
}

impl BatchService {
    pub fn new(poller: StatusPoller, ledger: Arc<dyn LedgerRepository>) -> Self {
        Self { poller, ledger }
    }

    /// Loads the latest job per table and processes them all
    ///
    /// Only failing to load the batch itself is an error.
    pub async fn run(&self) -> Result<BatchReport> {
        let pairs = self
            .ledger
            .latest_job_pairs()
            .await
            .context("Failed to load ingestion jobs")?;

        info!("Found {} table(s) with ingestion jobs to check", pairs.len());

        Ok(self.run_batch(&pairs).await)
    }

    /// Processes pairs one after another, never aborting early
    pub async fn run_batch(&self, pairs: &[BatchPair]) -> BatchReport {
        let mut report = BatchReport::default();

        for pair in pairs {
            info!(
                "Checking job {} for table {} (timeout {:?})",
                pair.job_id,
                pair.table_name,
                self.poller.settings().timeout
            );

            match self.process_pair(pair).await {
                Ok(summary) => {
                    info!(
                        "Recorded job {} for table {}: {} ({} valid, {} invalid row(s), {}s)",
                        summary.job_id,
                        pair.table_name,
                        summary.overall_status,
                        summary.total_valid_rows,
                        summary.total_invalid_rows,
                        summary.duration_seconds
                    );
                    report.succeeded += 1;
                }
                Err(e) => {
                    error!(
                        "Failed to process job {} for table {}: {}",
                        pair.job_id, pair.table_name, e
                    );
                    report.failed.push(pair.clone());
                }
            }
        }

        info!(
            "Batch finished: {}/{} table(s) recorded",
            report.succeeded,
            report.total()
        );

        report
    }

    async fn process_pair(&self, pair: &BatchPair) -> Result<JobSummary, PairError> {
        let outcome = self.poller.poll(&pair.job_id).await?;
        debug!(
            "Job {} settled as {:?} after {} attempt(s)",
            pair.job_id, outcome.decision, outcome.attempts
        );
        let summary = aggregate(&outcome.tasks)?.for_table(&pair.table_name);

        self.reconcile(&pair.table_name, &summary).await;

        self.ledger
            .insert_summary(&summary)
            .await
            .map_err(PairError::Persistence)?;

        Ok(summary)
    }

    /// Compares reported rows with the extraction watermark; log only
    async fn reconcile(&self, table_name: &str, summary: &JobSummary) {
        if summary.overall_status != OverallStatus::Success {
            return;
        }

        match self.ledger.find_watermark(table_name).await {
            Ok(Some(watermark)) => {
                let reconciliation = watermark.reconcile(summary);
                if reconciliation.matches() {
                    debug!(
                        "Row counts for {} reconcile ({} row(s))",
                        table_name, reconciliation.extracted_rows
                    );
                } else {
                    warn!(
                        "Row count mismatch for {}: extracted {}, service reported {} ({} unaccounted)",
                        table_name,
                        reconciliation.extracted_rows,
                        reconciliation.reported_rows,
                        reconciliation.missing_rows()
                    );
                }
            }
            Ok(None) => debug!("No watermark recorded for {}", table_name),
            Err(e) => warn!("Could not read watermark for {}: {:#}", table_name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fakes::{InMemoryLedger, ScriptedStatusRepository, Step};
    use crate::scheduler::PollSettings;
    use sluice_core::domain::task::{SubTaskRecord, TaskStatus};
    use sluice_core::domain::watermark::WatermarkRecord;
    use sluice_core::policy::CompletionPolicy;
    use std::time::Duration;

    fn snapshot(job_id: &str, statuses: &[TaskStatus]) -> Vec<SubTaskRecord> {
        let names = ["extract", "validate", "stage", "publish", "Formatted_Load"];
        names
            .iter()
            .zip(statuses)
            .map(|(name, status)| SubTaskRecord::new(*name, *status).with_job(job_id, "flow-1"))
            .collect()
    }

    fn finished(job_id: &str) -> Vec<SubTaskRecord> {
        let mut tasks = snapshot(job_id, &[TaskStatus::Success; 5]);
        tasks[4] = tasks[4].clone().with_metrics(Some(100), Some(3));
        tasks
    }

    fn settings() -> PollSettings {
        PollSettings {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(10),
            warm_up: Duration::from_secs(5),
            policy: CompletionPolicy::default(),
            max_consecutive_failures: 3,
            stuck_task_timeout: None,
        }
    }

    fn service(
        status: ScriptedStatusRepository,
        ledger: Arc<InMemoryLedger>,
    ) -> BatchService {
        BatchService::new(StatusPoller::new(Arc::new(status), settings()), ledger)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_does_not_stop_next_pair() {
        let status = ScriptedStatusRepository::new()
            .script(
                "job-slow",
                vec![Step::Tasks(snapshot("job-slow", &[TaskStatus::InProgress; 3]))],
            )
            .script("job-done", vec![Step::Tasks(finished("job-done"))]);
        let ledger = Arc::new(InMemoryLedger::default());

        let report = service(status, ledger.clone())
            .run_batch(&[
                BatchPair::new("Orders", "job-slow"),
                BatchPair::new("Customer", "job-done"),
            ])
            .await;

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, vec![BatchPair::new("Orders", "job-slow")]);

        let stored = ledger.stored();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].job_id, "job-done");
        assert_eq!(stored[0].table_name.as_deref(), Some("Customer"));
        assert_eq!(stored[0].overall_status, OverallStatus::Success);
        assert_eq!(stored[0].total_valid_rows, 100);
        assert_eq!(stored[0].total_invalid_rows, 3);
        assert_eq!(stored[0].total_tasks, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_is_still_recorded() {
        let mut tasks = snapshot("job-bad", &[TaskStatus::InProgress; 5]);
        tasks[2].status = TaskStatus::Failed;
        let status = ScriptedStatusRepository::new().script("job-bad", vec![Step::Tasks(tasks)]);
        let ledger = Arc::new(InMemoryLedger::default());

        let report = service(status, ledger.clone())
            .run_batch(&[BatchPair::new("Orders", "job-bad")])
            .await;

        assert!(report.all_succeeded());
        assert_eq!(ledger.stored()[0].overall_status, OverallStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_and_persistence_errors_are_isolated() {
        let status = ScriptedStatusRepository::new()
            .script("job-gone", vec![Step::Api(404)])
            .script("job-a", vec![Step::Tasks(finished("job-a"))])
            .script("job-b", vec![Step::Tasks(finished("job-b"))]);
        let ledger = Arc::new(InMemoryLedger {
            reject_tables: vec!["Vendor".to_string()],
            ..Default::default()
        });

        let report = service(status, ledger.clone())
            .run_batch(&[
                BatchPair::new("Item", "job-gone"),
                BatchPair::new("Vendor", "job-a"),
                BatchPair::new("Customer", "job-b"),
            ])
            .await;

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.total(), 3);
        assert_eq!(ledger.stored()[0].table_name.as_deref(), Some("Customer"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_snapshot_does_not_stop_next_pair() {
        let anonymous: Vec<_> = finished("job-anon")
            .into_iter()
            .map(|mut task| {
                task.job_id = None;
                task
            })
            .collect();
        let status = ScriptedStatusRepository::new()
            .script("job-anon", vec![Step::Tasks(anonymous)])
            .script("job-ok", vec![Step::Tasks(finished("job-ok"))]);
        let ledger = Arc::new(InMemoryLedger::default());
        let service = service(status, ledger.clone());

        let err = service
            .process_pair(&BatchPair::new("Orders", "job-anon"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PairError::Snapshot(SnapshotError::MissingField { field: "job_id" })
        ));

        let report = service
            .run_batch(&[
                BatchPair::new("Orders", "job-anon"),
                BatchPair::new("Customer", "job-ok"),
            ])
            .await;

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, vec![BatchPair::new("Orders", "job-anon")]);
        let stored = ledger.stored();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].job_id, "job-ok");
        assert_eq!(stored[0].table_name.as_deref(), Some("Customer"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_job_in_two_tables_is_processed_twice() {
        let status =
            ScriptedStatusRepository::new().script("job-x", vec![Step::Tasks(finished("job-x"))]);
        let ledger = Arc::new(InMemoryLedger::default());

        let report = service(status, ledger.clone())
            .run_batch(&[
                BatchPair::new("Customer", "job-x"),
                BatchPair::new("Vendor", "job-x"),
            ])
            .await;

        assert_eq!(report.succeeded, 2);
        let tables: Vec<_> = ledger
            .stored()
            .into_iter()
            .filter_map(|s| s.table_name)
            .collect();
        assert_eq!(tables, vec!["Customer", "Vendor"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loads_pairs_from_ledger() {
        let status =
            ScriptedStatusRepository::new().script("job-1", vec![Step::Tasks(finished("job-1"))]);
        let mut watermarks = std::collections::HashMap::new();
        watermarks.insert(
            "Customer".to_string(),
            WatermarkRecord {
                table_name: "Customer".to_string(),
                timestamp_watermark: 42,
                row_count: 250,
            },
        );
        let ledger = Arc::new(InMemoryLedger {
            pairs: vec![BatchPair::new("Customer", "job-1")],
            watermarks,
            ..Default::default()
        });

        // A watermark mismatch is only logged
        let report = service(status, ledger.clone()).run().await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(ledger.stored().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batch() {
        let ledger = Arc::new(InMemoryLedger::default());
        let report = service(ScriptedStatusRepository::new(), ledger)
            .run()
            .await
            .unwrap();

        assert_eq!(report.total(), 0);
        assert!(report.all_succeeded());
    }
}
