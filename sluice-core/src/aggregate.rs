//! Job aggregation
//!
//! Folds one status snapshot into a [`JobSummary`]. Pure: no I/O, the input
//! is only borrowed, and the same snapshot always yields the same summary.

use crate::domain::summary::{JobSummary, OverallStatus, TaskDetail};
use crate::domain::task::SubTaskRecord;
use crate::error::SnapshotError;

/// Builds a summary from a snapshot of sub-task records
///
/// `job_id`/`flow_id` come from the first record carrying them; all records
/// of one response share them. The summary has no table name yet.
pub fn aggregate(tasks: &[SubTaskRecord]) -> Result<JobSummary, SnapshotError> {
    if tasks.is_empty() {
        return Err(SnapshotError::Empty);
    }

    let job_id = first_present(tasks, |t| t.job_id.as_deref())
        .ok_or(SnapshotError::MissingField { field: "job_id" })?;
    let flow_id = first_present(tasks, |t| t.flow_id.as_deref())
        .ok_or(SnapshotError::MissingField { field: "flow_id" })?;

    let start_time = tasks.iter().filter_map(|t| t.task_start).min();
    let end_time = tasks.iter().filter_map(|t| t.task_end).max();
    let duration_seconds = match (start_time, end_time) {
        (Some(start), Some(end)) => (end - start).num_seconds(),
        _ => 0,
    };

    let total_valid_rows = sum_rows(tasks, SubTaskRecord::valid_rows, "output_valid_records")?;
    let total_invalid_rows =
        sum_rows(tasks, SubTaskRecord::invalid_rows, "output_invalid_records")?;

    Ok(JobSummary {
        job_id,
        flow_id,
        overall_status: OverallStatus::derive(tasks),
        total_tasks: tasks.len(),
        total_valid_rows,
        total_invalid_rows,
        start_time,
        end_time,
        duration_seconds,
        table_name: None,
        tasks: tasks.iter().map(TaskDetail::from).collect(),
    })
}

fn first_present<'a>(
    tasks: &'a [SubTaskRecord],
    field: impl Fn(&'a SubTaskRecord) -> Option<&'a str>,
) -> Option<String> {
    tasks.iter().find_map(field).map(str::to_string)
}

fn sum_rows(
    tasks: &[SubTaskRecord],
    rows: impl Fn(&SubTaskRecord) -> i64,
    field: &'static str,
) -> Result<i64, SnapshotError> {
    tasks.iter().try_fold(0i64, |total, task| {
        total
            .checked_add(rows(task))
            .ok_or(SnapshotError::RowCountOverflow { field })
    })
}
