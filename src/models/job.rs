use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Job type tag for AI rich-content generation.
pub const AI_RICH: &str = "ai-rich";

/// Lifecycle of a bulk content job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
}

/// Lifecycle of a single offer within a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    InProgress,
    Done,
    Failed,
    Skipped,
}

/// A bulk content job. Counters are derived from the item table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: JobStatus,
    pub enterprise_id: Option<String>,
    pub created_by_user_id: Option<String>,
    pub payload: serde_json::Value,
    pub total_items: i32,
    pub processed_items: i32,
    pub failed_items: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Whether push-back to the marketplace is enabled. Only an explicit
    /// `false` disables it.
    pub fn applies_to_marketplace(&self) -> bool {
        let flag = self
            .payload
            .get("applyToOzon")
            .or_else(|| self.payload.get("apply_to_ozon"));
        !matches!(flag, Some(serde_json::Value::Bool(false)))
    }

    /// Job-level default for a string option such as `profileId`.
    pub fn payload_str(&self, camel: &str, snake: &str) -> Option<&str> {
        self.payload
            .get(camel)
            .or_else(|| self.payload.get(snake))
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One unit of work: a single marketplace offer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobItem {
    pub id: Uuid,
    pub job_id: Uuid,
    pub seller_id: Option<String>,
    pub profile_id: Option<String>,
    pub offer_id: String,
    pub status: ItemStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub result_snapshot: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Item as listed for dashboards, without the result snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: Uuid,
    pub seller_id: Option<String>,
    pub profile_id: Option<String>,
    pub offer_id: String,
    pub status: ItemStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<JobItem> for ItemView {
    fn from(item: JobItem) -> Self {
        Self {
            id: item.id,
            seller_id: item.seller_id,
            profile_id: item.profile_id,
            offer_id: item.offer_id,
            status: item.status,
            attempts: item.attempts,
            last_error: item.last_error,
            created_at: item.created_at,
            started_at: item.started_at,
            finished_at: item.finished_at,
        }
    }
}

/// Validated job ready to be persisted together with its items.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub job_type: String,
    pub enterprise_id: Option<String>,
    pub created_by_user_id: Option<String>,
    pub payload: serde_json::Value,
    pub items: Vec<NewJobItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewJobItem {
    pub offer_id: String,
    pub seller_id: Option<String>,
    pub profile_id: Option<String>,
}

/// Item counts used to reconcile a job after a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemCounts {
    pub total: i32,
    pub done: i32,
    pub failed: i32,
    pub skipped: i32,
}

impl ItemCounts {
    pub fn is_complete(&self, skipped_is_terminal: bool) -> bool {
        let settled = if skipped_is_terminal {
            self.done + self.failed + self.skipped
        } else {
            self.done + self.failed
        };
        settled == self.total
    }
}
