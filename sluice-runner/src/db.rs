use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

/// The runner is sequential; one writer plus headroom for the batch query.
const MAX_CONNECTIONS: u32 = 2;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Written by the ingestion step: one row per uploaded file
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ingestion_job_log (
            id SERIAL PRIMARY KEY,
            table_name VARCHAR(255) NOT NULL,
            job_id VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Written by the ingestion step: extraction high-water mark per table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS table_watermarks (
            table_name VARCHAR(255) PRIMARY KEY,
            timestamp_watermark BIGINT NOT NULL DEFAULT 0,
            row_count BIGINT NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ingestion_job_summaries (
            id BIGSERIAL PRIMARY KEY,
            job_id VARCHAR(255) NOT NULL,
            flow_id VARCHAR(255) NOT NULL,
            overall_status VARCHAR(50) NOT NULL,
            total_tasks BIGINT NOT NULL,
            total_valid_rows BIGINT NOT NULL,
            total_invalid_rows BIGINT NOT NULL,
            start_time TIMESTAMPTZ,
            end_time TIMESTAMPTZ,
            duration_seconds BIGINT NOT NULL,
            table_name VARCHAR(255),
            recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ingestion_job_summary_tasks (
            summary_id BIGINT NOT NULL REFERENCES ingestion_job_summaries(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            task_name TEXT NOT NULL,
            status VARCHAR(50) NOT NULL,
            task_start TIMESTAMPTZ,
            task_end TIMESTAMPTZ,
            output_valid_records BIGINT,
            output_invalid_records BIGINT,
            PRIMARY KEY (summary_id, position)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_job_log_table_created ON ingestion_job_log(table_name, created_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_job_summaries_job_id ON ingestion_job_summaries(job_id)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
