use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::content::IntegrationLogEntry;
use crate::services::log_sink::LogSink;

/// Persists integration log entries to `integration_logs`.
#[derive(Clone)]
pub struct PgLogSink {
    pool: PgPool,
}

impl PgLogSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogSink for PgLogSink {
    async fn append(&self, entry: IntegrationLogEntry) {
        let result = sqlx::query(
            r#"
            INSERT INTO integration_logs
                (source, job_id, item_id, offer_id, endpoint, duration_ms, status, error, task_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&entry.source)
        .bind(entry.job_id)
        .bind(entry.item_id)
        .bind(&entry.offer_id)
        .bind(&entry.endpoint)
        .bind(entry.duration_ms)
        .bind(entry.status)
        .bind(&entry.error)
        .bind(entry.task_id)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(
                error = %e,
                source = %entry.source,
                endpoint = %entry.endpoint,
                "Failed to persist integration log entry"
            );
        }
    }
}
