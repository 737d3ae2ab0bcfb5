//! Completion policy
//!
//! The remote service's own notion of "done" lags well behind what this
//! pipeline cares about. The policy below looks at one status snapshot and
//! decides whether the poller can stop.
//!
//! Rules, first match wins:
//! 1. fewer sub-tasks than `min_task_count`: the job has not fully
//!    registered yet, keep polling;
//! 2. any sub-task failed: stop, failed;
//! 3. a formatting sub-task succeeded and carries both row counts: stop,
//!    even if other sub-tasks are still running;
//! 4. every non-formatting sub-task is terminal: stop;
//! 5. otherwise keep polling.

use serde::{Deserialize, Serialize};

use crate::domain::task::{SubTaskRecord, TaskStatus};

/// Default number of sub-tasks a fully registered job reports
pub const DEFAULT_MIN_TASK_COUNT: usize = 5;

/// Verdict for a single snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionDecision {
    Continue,
    StopSuccessLike,
    StopFailed,
}

impl CompletionDecision {
    pub fn is_stop(self) -> bool {
        !matches!(self, CompletionDecision::Continue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionPolicy {
    pub min_task_count: usize,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self {
            min_task_count: DEFAULT_MIN_TASK_COUNT,
        }
    }
}

impl CompletionPolicy {
    pub fn new(min_task_count: usize) -> Self {
        Self { min_task_count }
    }

    pub fn evaluate(&self, tasks: &[SubTaskRecord]) -> CompletionDecision {
        if tasks.len() < self.min_task_count {
            return CompletionDecision::Continue;
        }

        if tasks.iter().any(|t| t.status == TaskStatus::Failed) {
            return CompletionDecision::StopFailed;
        }

        let (formatted, upstream): (Vec<&SubTaskRecord>, Vec<&SubTaskRecord>) =
            tasks.iter().partition(|t| t.is_formatted());

        let formatted_done = formatted.iter().any(|t| {
            t.status == TaskStatus::Success && t.metrics.is_some_and(|m| m.is_populated())
        });
        if formatted_done {
            return CompletionDecision::StopSuccessLike;
        }

        if upstream.iter().all(|t| t.status.is_terminal()) {
            return CompletionDecision::StopSuccessLike;
        }

        CompletionDecision::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str, status: TaskStatus) -> SubTaskRecord {
        SubTaskRecord::new(name, status).with_job("job-1", "flow-1")
    }

    fn upstream(status: TaskStatus) -> Vec<SubTaskRecord> {
        ["extract", "validate", "stage", "publish"]
            .iter()
            .map(|name| task(name, status))
            .collect()
    }

    #[test]
    fn test_below_minimum_always_continues() {
        let policy = CompletionPolicy::default();
        let statuses = [
            TaskStatus::Success,
            TaskStatus::Failed,
            TaskStatus::InProgress,
            TaskStatus::Blocked,
        ];

        for status in statuses {
            let tasks: Vec<_> = (0..4).map(|i| task(&format!("t{}", i), status)).collect();
            assert_eq!(policy.evaluate(&tasks), CompletionDecision::Continue);
        }
        assert_eq!(policy.evaluate(&[]), CompletionDecision::Continue);
    }

    #[test]
    fn test_any_failure_stops_failed() {
        let mut tasks = upstream(TaskStatus::Success);
        tasks.push(
            task("Formatted_Load", TaskStatus::Success).with_metrics(Some(10), Some(0)),
        );
        tasks[1].status = TaskStatus::Failed;

        assert_eq!(
            CompletionPolicy::default().evaluate(&tasks),
            CompletionDecision::StopFailed
        );
    }

    #[test]
    fn test_formatted_fast_path_ignores_running_upstream() {
        let mut tasks = upstream(TaskStatus::InProgress);
        tasks.push(
            task("FORMATTED_output", TaskStatus::Success).with_metrics(Some(100), Some(3)),
        );

        assert_eq!(
            CompletionPolicy::default().evaluate(&tasks),
            CompletionDecision::StopSuccessLike
        );
    }

    #[test]
    fn test_formatted_without_metrics_waits_for_upstream() {
        let mut tasks = upstream(TaskStatus::InProgress);
        tasks.push(task("Formatted_Load", TaskStatus::Success).with_metrics(Some(100), None));

        assert_eq!(
            CompletionPolicy::default().evaluate(&tasks),
            CompletionDecision::Continue
        );
    }

    #[test]
    fn test_terminal_upstream_stops_with_pending_formatted() {
        let mut tasks = upstream(TaskStatus::Success);
        tasks.push(task("Formatted_Load", TaskStatus::InProgress));

        assert_eq!(
            CompletionPolicy::default().evaluate(&tasks),
            CompletionDecision::StopSuccessLike
        );
    }

    #[test]
    fn test_terminal_upstream_without_formatted_task() {
        let mut tasks = upstream(TaskStatus::Success);
        tasks.push(task("cleanup", TaskStatus::Success));

        assert_eq!(
            CompletionPolicy::default().evaluate(&tasks),
            CompletionDecision::StopSuccessLike
        );
    }

    #[test]
    fn test_blocked_upstream_continues() {
        let mut tasks = upstream(TaskStatus::Success);
        tasks[0].status = TaskStatus::Blocked;
        tasks.push(task("Formatted_Load", TaskStatus::InProgress));

        assert_eq!(
            CompletionPolicy::default().evaluate(&tasks),
            CompletionDecision::Continue
        );
    }

    #[test]
    fn test_custom_minimum() {
        let tasks = vec![task("extract", TaskStatus::Success)];
        assert_eq!(
            CompletionPolicy::new(1).evaluate(&tasks),
            CompletionDecision::StopSuccessLike
        );
    }

    #[test]
    fn test_is_stop() {
        assert!(!CompletionDecision::Continue.is_stop());
        assert!(CompletionDecision::StopSuccessLike.is_stop());
        assert!(CompletionDecision::StopFailed.is_stop());
    }
}
