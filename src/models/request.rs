use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::JobStatus;

/// Bulk request to generate content for a set of offers.
///
/// Items stay untyped so a malformed entry is dropped instead of rejecting
/// the whole request.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct EnqueueRequest {
    #[serde(default, rename = "type")]
    #[garde(custom(not_blank))]
    pub job_type: String,

    #[serde(default)]
    #[garde(length(min = 1))]
    pub items: Vec<serde_json::Value>,

    #[serde(default)]
    #[garde(skip)]
    pub payload: Option<serde_json::Value>,
}

fn not_blank(value: &String, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("must not be blank"));
    }
    Ok(())
}

/// Response after a job has been accepted.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: JobStatus,
    pub total_items: i32,
}

/// Result of one worker invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkerRunResponse {
    pub processed: usize,
    pub failed: usize,
    pub rate_limited: bool,
    #[serde(rename = "processedIds")]
    pub processed_ids: Vec<Uuid>,
    #[serde(rename = "failedIds")]
    pub failed_ids: Vec<Uuid>,
}

/// Query string for the worker trigger. `limit` stays raw text so a
/// malformed value falls back to the default instead of rejecting the call.
#[derive(Debug, Default, Deserialize)]
pub struct WorkerRunQuery {
    pub limit: Option<String>,
}

/// Query string for listing the items of a job.
#[derive(Debug, Default, Deserialize)]
pub struct ItemListQuery {
    pub status: Option<String>,
}

/// Query string for listing recent jobs.
#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    pub limit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_type_fails_validation() {
        let req: EnqueueRequest =
            serde_json::from_value(json!({"type": "  ", "items": [{"offerId": "A"}]})).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn missing_items_fails_validation() {
        let req: EnqueueRequest = serde_json::from_value(json!({"type": "ai-rich"})).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn worker_response_uses_wire_names() {
        let body = serde_json::to_value(WorkerRunResponse::default()).unwrap();
        assert!(body.get("rate_limited").is_some());
        assert!(body.get("processedIds").is_some());
        assert!(body.get("failedIds").is_some());
    }
}
