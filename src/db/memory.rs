use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db::store::{JobStore, StoreError};
use crate::models::job::{ItemCounts, ItemStatus, Job, JobItem, JobStatus, NewJob};

/// In-process job store with the same semantics as the PostgreSQL one.
/// Used by tests and local runs without a database.
#[derive(Default)]
pub struct MemoryJobStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    jobs: HashMap<Uuid, Job>,
    // Insertion order doubles as the `seq` tiebreaker.
    items: Vec<JobItem>,
}

impl MemoryState {
    fn item_mut(&mut self, item_id: Uuid) -> Option<&mut JobItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs currently stored.
    pub async fn job_count(&self) -> usize {
        self.state.lock().await.jobs.len()
    }

    /// Look up a single item regardless of job.
    pub async fn get_item(&self, item_id: Uuid) -> Option<JobItem> {
        let state = self.state.lock().await;
        state.items.iter().find(|i| i.id == item_id).cloned()
    }

    /// Overwrite an item's `started_at`, letting tests age in-flight work.
    pub async fn set_started_at(&self, item_id: Uuid, started_at: Option<DateTime<Utc>>) {
        let mut state = self.state.lock().await;
        if let Some(item) = state.item_mut(item_id) {
            item.started_at = started_at;
        }
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create_job(&self, job: NewJob) -> Result<Job, StoreError> {
        let now = Utc::now();
        let created = Job {
            id: Uuid::new_v4(),
            job_type: job.job_type,
            status: JobStatus::Pending,
            enterprise_id: job.enterprise_id,
            created_by_user_id: job.created_by_user_id,
            payload: job.payload,
            total_items: job.items.len() as i32,
            processed_items: 0,
            failed_items: 0,
            error_message: None,
            created_at: now,
            started_at: None,
            finished_at: None,
        };

        let mut state = self.state.lock().await;
        for item in job.items {
            state.items.push(JobItem {
                id: Uuid::new_v4(),
                job_id: created.id,
                seller_id: item.seller_id,
                profile_id: item.profile_id,
                offer_id: item.offer_id,
                status: ItemStatus::Pending,
                attempts: 0,
                last_error: None,
                result_snapshot: None,
                created_at: now,
                started_at: None,
                finished_at: None,
            });
        }
        state.jobs.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.state.lock().await.jobs.get(&job_id).cloned())
    }

    async fn list_jobs(&self, limit: i64) -> Result<Vec<Job>, StoreError> {
        let state = self.state.lock().await;
        let mut jobs: Vec<Job> = state.jobs.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit.max(0) as usize);
        Ok(jobs)
    }

    async fn list_items(
        &self,
        job_id: Uuid,
        status: Option<ItemStatus>,
    ) -> Result<Vec<JobItem>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .items
            .iter()
            .filter(|i| i.job_id == job_id && status.map_or(true, |s| i.status == s))
            .cloned()
            .collect())
    }

    async fn pending_items(&self, limit: i64) -> Result<Vec<JobItem>, StoreError> {
        let state = self.state.lock().await;
        let mut pending: Vec<JobItem> = state
            .items
            .iter()
            .filter(|i| i.status == ItemStatus::Pending)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        pending.sort_by_key(|i| i.created_at);
        pending.truncate(limit.max(0) as usize);
        Ok(pending)
    }

    async fn claim_item(&self, item_id: Uuid) -> Result<Option<JobItem>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(item) = state.item_mut(item_id) else {
            return Ok(None);
        };
        if item.status != ItemStatus::Pending {
            return Ok(None);
        }
        item.status = ItemStatus::InProgress;
        item.attempts += 1;
        item.started_at = Some(Utc::now());
        item.finished_at = None;
        Ok(Some(item.clone()))
    }

    async fn finish_item(
        &self,
        item_id: Uuid,
        status: ItemStatus,
        snapshot: Option<serde_json::Value>,
        error: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if let Some(item) = state.item_mut(item_id) {
            item.status = status;
            item.result_snapshot = snapshot;
            item.last_error = error.map(str::to_string);
            item.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn release_item(&self, item_id: Uuid, error: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if let Some(item) = state.item_mut(item_id) {
            item.status = ItemStatus::Pending;
            item.last_error = Some(error.to_string());
            item.started_at = None;
        }
        Ok(())
    }

    async fn count_items(&self, job_id: Uuid) -> Result<ItemCounts, StoreError> {
        let state = self.state.lock().await;
        let counts = state
            .items
            .iter()
            .filter(|i| i.job_id == job_id)
            .fold(ItemCounts::default(), |mut acc, item| {
                acc.total += 1;
                match item.status {
                    ItemStatus::Done => acc.done += 1,
                    ItemStatus::Failed => acc.failed += 1,
                    ItemStatus::Skipped => acc.skipped += 1,
                    ItemStatus::Pending | ItemStatus::InProgress => {}
                }
                acc
            });
        Ok(counts)
    }

    async fn update_job_progress(
        &self,
        job_id: Uuid,
        counts: ItemCounts,
        status: JobStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let job = state
            .jobs
            .get_mut(&job_id)
            .ok_or(StoreError::JobNotFound(job_id))?;
        let now = Utc::now();
        job.total_items = counts.total;
        job.processed_items = counts.done;
        job.failed_items = counts.failed;
        job.status = status;
        job.started_at.get_or_insert(now);
        job.finished_at = match status {
            JobStatus::Completed => Some(job.finished_at.unwrap_or(now)),
            _ => None,
        };
        Ok(())
    }

    async fn reclaim_stale_items(
        &self,
        cutoff: DateTime<Utc>,
        reason: &str,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        let mut reclaimed = 0;
        for item in state.items.iter_mut() {
            let stale = item.status == ItemStatus::InProgress
                && item.started_at.is_some_and(|t| t < cutoff);
            if stale {
                item.status = ItemStatus::Pending;
                item.last_error = Some(reason.to_string());
                item.started_at = None;
                reclaimed += 1;
            }
        }
        Ok(reclaimed)
    }
}
