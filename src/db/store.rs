use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::job::{ItemCounts, ItemStatus, Job, JobItem, JobStatus, NewJob};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Durable storage for jobs and their items.
///
/// Every write is keyed by a single job or item id; only `create_job`
/// spans several rows.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a job and all of its items atomically.
    async fn create_job(&self, job: NewJob) -> Result<Job, StoreError>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError>;

    /// Most recently created jobs first.
    async fn list_jobs(&self, limit: i64) -> Result<Vec<Job>, StoreError>;

    async fn list_items(
        &self,
        job_id: Uuid,
        status: Option<ItemStatus>,
    ) -> Result<Vec<JobItem>, StoreError>;

    /// Oldest pending items across all jobs.
    async fn pending_items(&self, limit: i64) -> Result<Vec<JobItem>, StoreError>;

    /// Move an item from `pending` to `in_progress` and bump its attempts.
    ///
    /// Returns `None` when the item is no longer pending, meaning another
    /// invocation has claimed it.
    async fn claim_item(&self, item_id: Uuid) -> Result<Option<JobItem>, StoreError>;

    /// Record a final outcome (`done`, `failed` or `skipped`).
    async fn finish_item(
        &self,
        item_id: Uuid,
        status: ItemStatus,
        snapshot: Option<serde_json::Value>,
        error: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Put a claimed item back to `pending`, keeping its attempts.
    async fn release_item(&self, item_id: Uuid, error: &str) -> Result<(), StoreError>;

    async fn count_items(&self, job_id: Uuid) -> Result<ItemCounts, StoreError>;

    /// Write recomputed counters and status. `started_at` is stamped once;
    /// `finished_at` is set only for completed jobs.
    async fn update_job_progress(
        &self,
        job_id: Uuid,
        counts: ItemCounts,
        status: JobStatus,
    ) -> Result<(), StoreError>;

    /// Return items stuck `in_progress` since before `cutoff` to `pending`.
    async fn reclaim_stale_items(
        &self,
        cutoff: DateTime<Utc>,
        reason: &str,
    ) -> Result<u64, StoreError>;

    /// Connectivity probe for health checks.
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
