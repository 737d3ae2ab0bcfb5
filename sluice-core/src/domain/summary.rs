//! Job summary domain types
//!
//! A [`JobSummary`] is built once from a single status snapshot by
//! [`aggregate`](crate::aggregate::aggregate) and written once to the
//! persistence sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::task::{SubTaskRecord, TaskStatus};

/// Overall status of a job, derived from its sub-tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    Success,
    Failed,
    InProgress,
}

impl OverallStatus {
    /// Any failure wins; otherwise the job is successful only when every
    /// sub-task succeeded.
    pub fn derive(tasks: &[SubTaskRecord]) -> Self {
        if tasks.iter().any(|t| t.status == TaskStatus::Failed) {
            OverallStatus::Failed
        } else if tasks.iter().all(|t| t.status == TaskStatus::Success) {
            OverallStatus::Success
        } else {
            OverallStatus::InProgress
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Success => "Success",
            OverallStatus::Failed => "Failed",
            OverallStatus::InProgress => "InProgress",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-task detail kept on a summary for auditing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetail {
    pub name: String,
    pub status: TaskStatus,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub valid_records: Option<i64>,
    pub invalid_records: Option<i64>,
}

impl From<&SubTaskRecord> for TaskDetail {
    fn from(record: &SubTaskRecord) -> Self {
        TaskDetail {
            name: record.task_name.clone(),
            status: record.status,
            start: record.task_start,
            end: record.task_end,
            valid_records: record.metrics.and_then(|m| m.output_valid_records),
            invalid_records: record.metrics.and_then(|m| m.output_invalid_records),
        }
    }
}

/// Aggregated view of one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    pub flow_id: String,
    pub overall_status: OverallStatus,
    pub total_tasks: usize,
    pub total_valid_rows: i64,
    pub total_invalid_rows: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
    /// Source table; not part of the remote response, set by the runner
    pub table_name: Option<String>,
    pub tasks: Vec<TaskDetail>,
}

impl JobSummary {
    /// Returns the same summary attributed to a source table
    pub fn for_table(self, table_name: impl Into<String>) -> Self {
        Self {
            table_name: Some(table_name.into()),
            ..self
        }
    }

    /// Rows the remote service accounted for, valid or not; saturates at
    /// `i64::MAX`
    pub fn reported_rows(&self) -> i64 {
        self.total_valid_rows.saturating_add(self.total_invalid_rows)
    }
}
