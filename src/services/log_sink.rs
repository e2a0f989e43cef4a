use async_trait::async_trait;

use crate::models::content::IntegrationLogEntry;

/// Destination for structured integration log entries.
///
/// Appending is fire-and-forget: implementations swallow their own failures.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn append(&self, entry: IntegrationLogEntry);
}

/// Writes entries to the tracing subscriber only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

#[async_trait]
impl LogSink for TracingLogSink {
    async fn append(&self, entry: IntegrationLogEntry) {
        tracing::info!(
            source = %entry.source,
            offer_id = entry.offer_id.as_deref().unwrap_or("-"),
            endpoint = %entry.endpoint,
            duration_ms = entry.duration_ms,
            status = entry.status,
            error = entry.error.as_deref().unwrap_or(""),
            task_id = ?entry.task_id,
            job_id = ?entry.job_id,
            item_id = ?entry.item_id,
            "integration call"
        );
    }
}
