//! Ledger repository
//!
//! Database side of the runner:
//! - Reading the latest ingestion job per table (batch input)
//! - Reading table watermarks for row-count reconciliation
//! - Writing job summaries and their per-task audit rows

use anyhow::{Context, Result};
use async_trait::async_trait;
use sluice_core::domain::batch::BatchPair;
use sluice_core::domain::summary::JobSummary;
use sluice_core::domain::watermark::WatermarkRecord;
use sqlx::PgPool;

/// Repository trait for the status database
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Latest (table, job) pair per table, most recent first
    async fn latest_job_pairs(&self) -> Result<Vec<BatchPair>>;

    /// Watermark recorded for a table, if any
    async fn find_watermark(&self, table_name: &str) -> Result<Option<WatermarkRecord>>;

    /// Persists a summary together with its task details
    async fn insert_summary(&self, summary: &JobSummary) -> Result<()>;
}

/// Postgres implementation of LedgerRepository
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn latest_job_pairs(&self) -> Result<Vec<BatchPair>> {
        let rows = sqlx::query_as::<_, JobLogRow>(
            r#"
            SELECT table_name, job_id
            FROM (
                SELECT DISTINCT ON (table_name) table_name, job_id, created_at
                FROM ingestion_job_log
                ORDER BY table_name, created_at DESC, id DESC
            ) latest
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to query latest ingestion jobs")?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn find_watermark(&self, table_name: &str) -> Result<Option<WatermarkRecord>> {
        let row = sqlx::query_as::<_, WatermarkRow>(
            r#"
            SELECT table_name, timestamp_watermark, row_count
            FROM table_watermarks
            WHERE table_name = $1
            "#,
        )
        .bind(table_name)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to read watermark for {}", table_name))?;

        Ok(row.map(|r| r.into()))
    }

    async fn insert_summary(&self, summary: &JobSummary) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to open transaction")?;

        let (summary_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO ingestion_job_summaries (
                job_id, flow_id, overall_status, total_tasks,
                total_valid_rows, total_invalid_rows,
                start_time, end_time, duration_seconds, table_name
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&summary.job_id)
        .bind(&summary.flow_id)
        .bind(summary.overall_status.as_str())
        .bind(summary.total_tasks as i64)
        .bind(summary.total_valid_rows)
        .bind(summary.total_invalid_rows)
        .bind(summary.start_time)
        .bind(summary.end_time)
        .bind(summary.duration_seconds)
        .bind(summary.table_name.as_deref())
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert job summary")?;

        for (position, task) in summary.tasks.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO ingestion_job_summary_tasks (
                    summary_id, position, task_name, status,
                    task_start, task_end, output_valid_records, output_invalid_records
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(summary_id)
            .bind(position as i32)
            .bind(&task.name)
            .bind(task.status.as_str())
            .bind(task.start)
            .bind(task.end)
            .bind(task.valid_records)
            .bind(task.invalid_records)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert task '{}'", task.name))?;
        }

        tx.commit().await.context("Failed to commit job summary")?;

        tracing::debug!(
            "Stored summary {} for job {} ({} task(s))",
            summary_id,
            summary.job_id,
            summary.tasks.len()
        );

        Ok(())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct JobLogRow {
    table_name: String,
    job_id: String,
}

impl From<JobLogRow> for BatchPair {
    fn from(row: JobLogRow) -> Self {
        BatchPair::new(row.table_name, row.job_id)
    }
}

#[derive(sqlx::FromRow)]
struct WatermarkRow {
    table_name: String,
    timestamp_watermark: i64,
    row_count: i64,
}

impl From<WatermarkRow> for WatermarkRecord {
    fn from(row: WatermarkRow) -> Self {
        WatermarkRecord {
            table_name: row.table_name,
            timestamp_watermark: row.timestamp_watermark,
            row_count: row.row_count,
        }
    }
}
