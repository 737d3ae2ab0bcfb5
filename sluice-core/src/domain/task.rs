//! Sub-task domain types
//!
//! A job on the remote ingestion service is made of a handful of named
//! sub-tasks (extraction, validation, formatting, ...). Every status poll
//! returns the full list, one [`SubTaskRecord`] per sub-task.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseStatusError;

/// Status of a single sub-task as reported by the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TaskStatus {
    Success,
    Failed,
    InProgress,
    Blocked,
}

impl TaskStatus {
    /// Whether the sub-task has finished, successfully or not
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Success => "Success",
            TaskStatus::Failed => "Failed",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    /// Parses the remote spelling leniently: case is ignored, as are
    /// spaces, underscores and hyphens ("In Progress", "in_progress").
    ///
    /// The set is closed. Any other status (e.g. "Cancelled") is an error,
    /// and because records are decoded as one array a single unknown status
    /// rejects the whole response, even one that also reports a failure.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "success" => Ok(TaskStatus::Success),
            "failed" => Ok(TaskStatus::Failed),
            "inprogress" => Ok(TaskStatus::InProgress),
            "blocked" => Ok(TaskStatus::Blocked),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Row metrics attached to a sub-task
///
/// Only formatting tasks usually carry these, and only once they are done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetrics {
    #[serde(default)]
    pub output_valid_records: Option<i64>,
    #[serde(default)]
    pub output_invalid_records: Option<i64>,
}

impl TaskMetrics {
    /// Both row counts have been computed
    pub fn is_populated(&self) -> bool {
        self.output_valid_records.is_some() && self.output_invalid_records.is_some()
    }
}

/// One sub-task entry of a job status response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTaskRecord {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub flow_id: Option<String>,
    #[serde(default)]
    pub task_name: String,
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub task_start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub task_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metrics: Option<TaskMetrics>,
}

impl SubTaskRecord {
    /// Creates a record with no job identity, timestamps or metrics
    pub fn new(task_name: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            job_id: None,
            flow_id: None,
            task_name: task_name.into(),
            status,
            task_start: None,
            task_end: None,
            metrics: None,
        }
    }

    pub fn with_job(mut self, job_id: impl Into<String>, flow_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self.flow_id = Some(flow_id.into());
        self
    }

    pub fn with_window(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.task_start = start;
        self.task_end = end;
        self
    }

    pub fn with_metrics(mut self, valid: Option<i64>, invalid: Option<i64>) -> Self {
        self.metrics = Some(TaskMetrics {
            output_valid_records: valid,
            output_invalid_records: invalid,
        });
        self
    }

    /// Whether this is an output formatting/validation task
    ///
    /// Formatting tasks are the authoritative source of row validity counts.
    pub fn is_formatted(&self) -> bool {
        is_formatted_task(&self.task_name)
    }

    /// Valid row count, 0 when not reported
    pub fn valid_rows(&self) -> i64 {
        self.metrics
            .and_then(|m| m.output_valid_records)
            .unwrap_or(0)
    }

    /// Invalid row count, 0 when not reported
    pub fn invalid_rows(&self) -> i64 {
        self.metrics
            .and_then(|m| m.output_invalid_records)
            .unwrap_or(0)
    }
}

/// Classifies a task name as a formatting task (case-insensitive)
pub fn is_formatted_task(task_name: &str) -> bool {
    task_name.to_lowercase().contains("formatted")
}

/// Parses an ISO-8601 timestamp as sent by the remote service
///
/// Accepts RFC 3339 with an offset as well as naive date-times, which are
/// taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;

    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", s))),
    }
}
