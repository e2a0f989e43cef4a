//! One externally triggered pass over pending items.
//!
//! Items are processed strictly one after another. A rate-limit failure puts
//! the item back to `pending` and ends the pass; every other failure is
//! recorded on the item and the pass continues. Job counters are recomputed
//! from the item table once the pass is over.

use std::collections::HashMap;
use std::num::IntErrorKind;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use uuid::Uuid;

use crate::db::store::{JobStore, StoreError};
use crate::models::job::{ItemStatus, Job, JobItem, JobStatus};
use crate::models::request::WorkerRunResponse;
use crate::services::processor::ProcessorRegistry;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

const STALE_REASON: &str = "reclaimed after stale in_progress";

/// Batch size for one invocation, clamped to `[1, MAX_LIMIT]`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Lenient reading of a `limit` query value. Blank or non-numeric input
/// falls back to the default; integers too large for `i64` saturate.
pub fn parse_limit(raw: Option<&str>) -> Option<i64> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse::<i64>() {
        Ok(limit) => Some(limit),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(MAX_LIMIT),
            IntErrorKind::NegOverflow => Some(1),
            _ => None,
        },
    }
}

/// Throttling is signalled by message text, not by error type.
pub fn is_rate_limited(message: &str) -> bool {
    message.to_lowercase().contains("rate limit")
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Pause after each item of a paced job type.
    pub item_delay: Duration,
    /// Age after which an `in_progress` item is returned to `pending`.
    pub stale_after: Option<Duration>,
    pub skipped_is_terminal: bool,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_secs(10),
            stale_after: Some(Duration::from_secs(900)),
            skipped_is_terminal: false,
        }
    }
}

/// What happened to one claimed item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Done,
    Skipped,
    Failed(String),
    RateLimited(String),
}

/// A claimed item after its outcome has been persisted.
struct Step {
    item_id: Uuid,
    job_id: Uuid,
    outcome: ItemOutcome,
    paced: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

/// Accumulated result of a pass, built by folding item outcomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub processed_ids: Vec<Uuid>,
    pub failed_ids: Vec<Uuid>,
    pub touched_jobs: Vec<Uuid>,
    pub rate_limited: bool,
}

impl BatchSummary {
    /// Mark a job for reconciliation at the end of the pass.
    pub fn touch(&mut self, job_id: Uuid) {
        if !self.touched_jobs.contains(&job_id) {
            self.touched_jobs.push(job_id);
        }
    }

    /// Fold one outcome into the summary. A rate-limit outcome halts the pass.
    pub fn absorb(mut self, item_id: Uuid, job_id: Uuid, outcome: &ItemOutcome) -> (Self, Flow) {
        self.touch(job_id);
        let flow = match outcome {
            ItemOutcome::Done | ItemOutcome::Skipped => {
                self.processed_ids.push(item_id);
                Flow::Continue
            }
            ItemOutcome::Failed(_) => {
                self.failed_ids.push(item_id);
                Flow::Continue
            }
            ItemOutcome::RateLimited(_) => {
                self.rate_limited = true;
                Flow::Halt
            }
        };
        (self, flow)
    }
}

impl From<BatchSummary> for WorkerRunResponse {
    fn from(summary: BatchSummary) -> Self {
        WorkerRunResponse {
            processed: summary.processed_ids.len(),
            failed: summary.failed_ids.len(),
            rate_limited: summary.rate_limited,
            processed_ids: summary.processed_ids,
            failed_ids: summary.failed_ids,
        }
    }
}

pub struct Worker {
    store: Arc<dyn JobStore>,
    registry: ProcessorRegistry,
    settings: WorkerSettings,
}

impl Worker {
    pub fn new(store: Arc<dyn JobStore>, registry: ProcessorRegistry, settings: WorkerSettings) -> Self {
        Self {
            store,
            registry,
            settings,
        }
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Run one pass over at most `limit` pending items.
    pub async fn run(&self, limit: Option<i64>) -> Result<WorkerRunResponse, StoreError> {
        let limit = clamp_limit(limit);
        self.reclaim_stale().await?;

        let batch = self.store.pending_items(limit).await?;
        if batch.is_empty() {
            tracing::debug!("No pending items");
            return Ok(WorkerRunResponse::default());
        }

        tracing::info!(batch_size = batch.len(), limit, "Starting worker pass");

        let mut jobs: HashMap<Uuid, Job> = HashMap::new();
        let mut summary = BatchSummary::default();
        let mut failure: Option<StoreError> = None;
        let last_index = batch.len() - 1;

        for (index, pending) in batch.into_iter().enumerate() {
            let step = match self.run_one(pending.id, &mut jobs, &mut summary).await {
                Ok(Some(step)) => step,
                Ok(None) => {
                    tracing::debug!(item_id = %pending.id, "Item already claimed, skipping");
                    continue;
                }
                Err(e) => {
                    tracing::error!(
                        item_id = %pending.id,
                        error = %e,
                        "Store failure, stopping the pass"
                    );
                    failure = Some(e);
                    break;
                }
            };

            let (next, flow) = summary.absorb(step.item_id, step.job_id, &step.outcome);
            summary = next;

            if flow == Flow::Halt {
                tracing::warn!(
                    item_id = %step.item_id,
                    job_id = %step.job_id,
                    "Rate limited, leaving the rest of the batch for the next pass"
                );
                break;
            }

            if step.paced && index < last_index && !self.settings.item_delay.is_zero() {
                tokio::time::sleep(self.settings.item_delay).await;
            }
        }

        // Jobs touched before a store failure are still reconciled.
        for job_id in &summary.touched_jobs {
            if let Err(e) = self.reconcile_job(*job_id).await {
                tracing::error!(job_id = %job_id, error = %e, "Failed to reconcile job");
                failure.get_or_insert(e);
            }
        }

        tracing::info!(
            processed = summary.processed_ids.len(),
            failed = summary.failed_ids.len(),
            rate_limited = summary.rate_limited,
            jobs = summary.touched_jobs.len(),
            "Worker pass finished"
        );

        match failure {
            Some(e) => Err(e),
            None => Ok(summary.into()),
        }
    }

    /// Claim one item and drive it to a persisted outcome. `None` means the
    /// item was claimed by another invocation.
    async fn run_one(
        &self,
        item_id: Uuid,
        jobs: &mut HashMap<Uuid, Job>,
        summary: &mut BatchSummary,
    ) -> Result<Option<Step>, StoreError> {
        let Some(item) = self.store.claim_item(item_id).await? else {
            return Ok(None);
        };
        summary.touch(item.job_id);

        let job = match jobs.get(&item.job_id) {
            Some(job) => job.clone(),
            None => {
                let job = self
                    .store
                    .get_job(item.job_id)
                    .await?
                    .ok_or(StoreError::JobNotFound(item.job_id))?;
                jobs.insert(job.id, job.clone());
                job
            }
        };

        let (outcome, paced) = self.process_item(&job, &item).await?;
        Ok(Some(Step {
            item_id: item.id,
            job_id: job.id,
            outcome,
            paced,
        }))
    }

    /// Drive one claimed item to its outcome and persist it. The returned
    /// flag says whether the job type asks for pacing after this item.
    async fn process_item(
        &self,
        job: &Job,
        item: &JobItem,
    ) -> Result<(ItemOutcome, bool), StoreError> {
        let Some(processor) = self.registry.get(&job.job_type) else {
            tracing::info!(
                item_id = %item.id,
                job_type = %job.job_type,
                "No processor for job type, skipping item"
            );
            self.store
                .finish_item(item.id, ItemStatus::Skipped, None, None)
                .await?;
            metrics::counter!("content_items_skipped_total").increment(1);
            return Ok((ItemOutcome::Skipped, false));
        };

        let start = Instant::now();
        let result = processor.process(job, item).await;
        metrics::histogram!("content_item_processing_seconds", "job_type" => job.job_type.clone())
            .record(start.elapsed().as_secs_f64());

        let outcome = match result {
            Ok(snapshot) => {
                self.store
                    .finish_item(item.id, ItemStatus::Done, Some(snapshot), None)
                    .await?;
                metrics::counter!("content_items_processed_total", "job_type" => job.job_type.clone())
                    .increment(1);
                tracing::info!(
                    item_id = %item.id,
                    job_id = %job.id,
                    offer_id = %item.offer_id,
                    attempts = item.attempts,
                    "Item done"
                );
                ItemOutcome::Done
            }
            Err(e) => {
                let message = e.to_string();
                if is_rate_limited(&message) {
                    self.store.release_item(item.id, &message).await?;
                    metrics::counter!("content_items_rate_limited_total", "job_type" => job.job_type.clone())
                        .increment(1);
                    return Ok((ItemOutcome::RateLimited(message), false));
                }

                self.store
                    .finish_item(item.id, ItemStatus::Failed, None, Some(&message))
                    .await?;
                metrics::counter!("content_items_failed_total", "job_type" => job.job_type.clone())
                    .increment(1);
                tracing::warn!(
                    item_id = %item.id,
                    job_id = %job.id,
                    offer_id = %item.offer_id,
                    attempts = item.attempts,
                    error = %message,
                    "Item failed"
                );
                ItemOutcome::Failed(message)
            }
        };

        Ok((outcome, processor.requires_pacing()))
    }

    /// Recompute a job's counters and status from its items.
    async fn reconcile_job(&self, job_id: Uuid) -> Result<(), StoreError> {
        let counts = self.store.count_items(job_id).await?;
        let status = if counts.is_complete(self.settings.skipped_is_terminal) {
            JobStatus::Completed
        } else {
            JobStatus::Running
        };
        self.store.update_job_progress(job_id, counts, status).await?;

        tracing::debug!(
            job_id = %job_id,
            total = counts.total,
            done = counts.done,
            failed = counts.failed,
            skipped = counts.skipped,
            status = %status,
            "Job reconciled"
        );
        Ok(())
    }

    async fn reclaim_stale(&self) -> Result<(), StoreError> {
        let Some(max_age) = self.settings.stale_after else {
            return Ok(());
        };
        let Ok(max_age) = chrono::Duration::from_std(max_age) else {
            return Ok(());
        };

        let reclaimed = self
            .store
            .reclaim_stale_items(Utc::now() - max_age, STALE_REASON)
            .await?;
        if reclaimed > 0 {
            tracing::warn!(reclaimed, "Reclaimed stale in_progress items");
        }
        Ok(())
    }
}
