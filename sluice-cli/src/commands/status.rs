//! Status command handler
//!
//! One status fetch for a job, printed together with the aggregated summary
//! and what the runner's completion policy would make of it.

use anyhow::Result;
use colored::*;
use sluice_core::aggregate;
use sluice_core::domain::summary::{JobSummary, OverallStatus};
use sluice_core::domain::task::{SubTaskRecord, TaskStatus};
use sluice_core::policy::{CompletionDecision, CompletionPolicy};

use crate::config::Config;

pub async fn show_status(config: &Config, job_id: &str, json: bool, min_tasks: usize) -> Result<()> {
    let client = config.client()?;
    let tasks = client.get_job_status(job_id).await?;

    let decision = CompletionPolicy::new(min_tasks).evaluate(&tasks);
    let summary = aggregate(&tasks).ok();

    if json {
        let output = serde_json::json!({
            "tasks": tasks,
            "summary": summary,
            "decision": decision,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("{}", format!("Job {} reports no sub-tasks yet.", job_id).yellow());
        return Ok(());
    }

    println!("{}", format!("Sub-tasks of job {}:", job_id).bold());
    println!("{}", "─".repeat(80).dimmed());
    for task in &tasks {
        print_task(task);
    }
    println!("{}", "─".repeat(80).dimmed());

    if let Some(summary) = &summary {
        print_summary(summary);
    }

    println!();
    println!("  Verdict:     {}", colorize_decision(decision));

    Ok(())
}

fn print_task(task: &SubTaskRecord) {
    let marker = if task.is_formatted() {
        "◆".cyan()
    } else {
        "▸".cyan()
    };

    println!("  {} {} {}", marker, task.task_name, colorize_status(task.status));

    let start = task
        .task_start
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let end = task
        .task_end
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("    {} → {}", start.dimmed(), end.dimmed());

    if let Some(metrics) = task.metrics {
        println!(
            "    Rows: {} valid, {} invalid",
            format_count(metrics.output_valid_records).green(),
            format_count(metrics.output_invalid_records).red()
        );
    }
}

fn print_summary(summary: &JobSummary) {
    println!("{}", "Summary:".bold());
    println!("  Job ID:      {}", summary.job_id.cyan());
    println!("  Flow ID:     {}", summary.flow_id.dimmed());
    println!("  Status:      {}", colorize_overall(summary.overall_status));
    println!("  Tasks:       {}", summary.total_tasks);
    println!("  Valid rows:  {}", summary.total_valid_rows);
    println!("  Invalid:     {}", summary.total_invalid_rows);

    if let Some(start) = summary.start_time {
        println!("  Started:     {}", start.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(end) = summary.end_time {
        println!("  Finished:    {}", end.format("%Y-%m-%d %H:%M:%S"));
        println!("  Duration:    {}s", summary.duration_seconds);
    }
}

fn format_count(count: Option<i64>) -> String {
    count.map_or_else(|| "?".to_string(), |c| c.to_string())
}

fn colorize_status(status: TaskStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        TaskStatus::Success => status_str.green(),
        TaskStatus::Failed => status_str.red(),
        TaskStatus::InProgress => status_str.cyan(),
        TaskStatus::Blocked => status_str.yellow(),
    }
}

fn colorize_overall(status: OverallStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        OverallStatus::Success => status_str.green(),
        OverallStatus::Failed => status_str.red(),
        OverallStatus::InProgress => status_str.cyan(),
    }
}

fn colorize_decision(decision: CompletionDecision) -> ColoredString {
    match decision {
        CompletionDecision::Continue => "still running, would keep polling".yellow(),
        CompletionDecision::StopSuccessLike => "done".green(),
        CompletionDecision::StopFailed => "failed".red(),
    }
}
