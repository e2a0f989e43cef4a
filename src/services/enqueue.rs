use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use garde::Validate;
use serde_json::Value;

use crate::db::store::{JobStore, StoreError};
use crate::models::content::IntegrationLogEntry;
use crate::models::job::{NewJob, NewJobItem};
use crate::models::request::{EnqueueRequest, EnqueueResponse};
use crate::services::log_sink::LogSink;

/// Identity of the caller, supplied by the surrounding auth layer.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub user_id: Option<String>,
    pub enterprise_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("No usable items: every item is missing an offerId")]
    NoUsableItems,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validates bulk requests and persists a job with its pending items.
pub struct EnqueueService {
    store: Arc<dyn JobStore>,
    logs: Arc<dyn LogSink>,
}

impl EnqueueService {
    pub fn new(store: Arc<dyn JobStore>, logs: Arc<dyn LogSink>) -> Self {
        Self { store, logs }
    }

    pub async fn enqueue(
        &self,
        request: EnqueueRequest,
        caller: Caller,
    ) -> Result<EnqueueResponse, EnqueueError> {
        request
            .validate()
            .map_err(|e| EnqueueError::Invalid(e.to_string()))?;

        let items = usable_items(&request.items);
        if items.is_empty() {
            return Err(EnqueueError::NoUsableItems);
        }
        let dropped = request.items.len() - items.len();

        let start = Instant::now();
        let job = self
            .store
            .create_job(NewJob {
                job_type: request.job_type.trim().to_string(),
                enterprise_id: caller.enterprise_id,
                created_by_user_id: caller.user_id,
                payload: request.payload.unwrap_or_else(|| Value::Object(Default::default())),
                items,
            })
            .await?;

        metrics::counter!("content_jobs_enqueued_total", "job_type" => job.job_type.clone())
            .increment(1);
        tracing::info!(
            job_id = %job.id,
            job_type = %job.job_type,
            total_items = job.total_items,
            dropped_items = dropped,
            "Job enqueued"
        );

        self.logs
            .append(IntegrationLogEntry {
                source: "enqueue".to_string(),
                offer_id: None,
                endpoint: "POST /api/v1/jobs".to_string(),
                duration_ms: start.elapsed().as_millis() as i64,
                status: 201,
                error: None,
                task_id: None,
                job_id: Some(job.id),
                item_id: None,
                created_at: Utc::now(),
            })
            .await;

        Ok(EnqueueResponse {
            id: job.id,
            job_type: job.job_type,
            status: job.status,
            total_items: job.total_items,
        })
    }
}

fn field(item: &Value, camel: &str, snake: &str) -> Option<String> {
    let value = item.get(camel).or_else(|| item.get(snake))?;
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Items that resolve a non-empty offer id; the rest are dropped.
pub fn usable_items(items: &[Value]) -> Vec<NewJobItem> {
    items
        .iter()
        .filter_map(|item| {
            Some(NewJobItem {
                offer_id: field(item, "offerId", "offer_id")?,
                seller_id: field(item, "sellerId", "seller_id"),
                profile_id: field(item, "profileId", "profile_id"),
            })
        })
        .collect()
}
