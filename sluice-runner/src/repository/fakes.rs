//! In-memory repository fakes for poller and batch tests

use anyhow::Result;
use async_trait::async_trait;
use sluice_client::ClientError;
use sluice_core::domain::batch::BatchPair;
use sluice_core::domain::summary::JobSummary;
use sluice_core::domain::task::SubTaskRecord;
use sluice_core::domain::watermark::WatermarkRecord;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::{FetchError, LedgerRepository, StatusRepository};

/// One scripted answer of the status fake
#[derive(Debug, Clone)]
pub enum Step {
    Tasks(Vec<SubTaskRecord>),
    /// API error with this status code, classified like a real one
    Api(u16),
}

impl Step {
    fn to_result(&self) -> Result<Vec<SubTaskRecord>, FetchError> {
        match self {
            Step::Tasks(tasks) => Ok(tasks.clone()),
            Step::Api(status) => Err(ClientError::api_error(*status, "scripted").into()),
        }
    }
}

/// Status fake replaying a script per job; the last step repeats forever
#[derive(Default)]
pub struct ScriptedStatusRepository {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedStatusRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, job_id: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(job_id.to_string(), steps.into());
        self
    }

    pub fn calls(&self, job_id: &str) -> usize {
        self.calls.lock().unwrap().get(job_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl StatusRepository for ScriptedStatusRepository {
    async fn fetch_status(&self, job_id: &str) -> Result<Vec<SubTaskRecord>, FetchError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(job_id.to_string())
            .or_default() += 1;

        let mut scripts = self.scripts.lock().unwrap();
        let steps = scripts
            .get_mut(job_id)
            .expect("no script registered for job");

        let step = if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().expect("empty script")
        };
        step.to_result()
    }
}

/// Ledger fake keeping everything in memory
#[derive(Default)]
pub struct InMemoryLedger {
    pub pairs: Vec<BatchPair>,
    pub watermarks: HashMap<String, WatermarkRecord>,
    /// Tables whose summaries fail to insert
    pub reject_tables: Vec<String>,
    pub summaries: Mutex<Vec<JobSummary>>,
}

impl InMemoryLedger {
    pub fn stored(&self) -> Vec<JobSummary> {
        self.summaries.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedger {
    async fn latest_job_pairs(&self) -> Result<Vec<BatchPair>> {
        Ok(self.pairs.clone())
    }

    async fn find_watermark(&self, table_name: &str) -> Result<Option<WatermarkRecord>> {
        Ok(self.watermarks.get(table_name).cloned())
    }

    async fn insert_summary(&self, summary: &JobSummary) -> Result<()> {
        let table = summary.table_name.clone().unwrap_or_default();
        if self.reject_tables.contains(&table) {
            anyhow::bail!("insert rejected for {}", table);
        }
        self.summaries.lock().unwrap().push(summary.clone());
        Ok(())
    }
}
