//! Job creation through the enqueue service
//!
//! Run with: cargo test --test enqueue_test

mod fixtures;
mod helpers;

use std::sync::Arc;

use serde_json::json;

use helpers::RecordingLogSink;
use rich_content_queue::db::memory::MemoryJobStore;
use rich_content_queue::db::store::JobStore;
use rich_content_queue::models::job::{ItemStatus, JobStatus, AI_RICH};
use rich_content_queue::models::request::EnqueueRequest;
use rich_content_queue::services::enqueue::{Caller, EnqueueError, EnqueueService};

fn service() -> (Arc<MemoryJobStore>, Arc<RecordingLogSink>, EnqueueService) {
    let store = Arc::new(MemoryJobStore::new());
    let logs = Arc::new(RecordingLogSink::default());
    let service = EnqueueService::new(store.clone(), logs.clone());
    (store, logs, service)
}

fn request(body: serde_json::Value) -> EnqueueRequest {
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn test_creates_one_pending_item_per_offer() {
    let (store, _, service) = service();

    let response = service
        .enqueue(
            request(json!({
                "type": AI_RICH,
                "items": [
                    { "offerId": "A1", "profileId": "p1" },
                    { "offer_id": "B2", "seller_id": "s2" },
                    { "offerId": "C3" }
                ],
                "payload": { "applyToOzon": false }
            })),
            Caller {
                user_id: Some("user-7".into()),
                enterprise_id: Some("ent-3".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(response.job_type, AI_RICH);
    assert_eq!(response.status, JobStatus::Pending);
    assert_eq!(response.total_items, 3);

    let job = store.get_job(response.id).await.unwrap().unwrap();
    assert_eq!(job.created_by_user_id.as_deref(), Some("user-7"));
    assert_eq!(job.enterprise_id.as_deref(), Some("ent-3"));
    assert_eq!(job.processed_items, 0);
    assert_eq!(job.failed_items, 0);
    assert!(!job.applies_to_marketplace());

    let items = store.list_items(job.id, None).await.unwrap();
    let offers: Vec<&str> = items.iter().map(|i| i.offer_id.as_str()).collect();
    assert_eq!(offers, vec!["A1", "B2", "C3"]);
    assert!(items
        .iter()
        .all(|i| i.status == ItemStatus::Pending && i.attempts == 0));
    assert_eq!(items[0].profile_id.as_deref(), Some("p1"));
    assert_eq!(items[1].seller_id.as_deref(), Some("s2"));
}

#[tokio::test]
async fn test_unusable_items_are_dropped_from_total() {
    let (store, _, service) = service();

    let response = service
        .enqueue(
            request(json!({
                "type": AI_RICH,
                "items": [{ "offerId": "A1" }, { "offerId": "" }, { "sellerId": "s1" }]
            })),
            Caller::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.total_items, 1);
    let items = store.list_items(response.id, None).await.unwrap();
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_no_usable_items_creates_nothing() {
    let (store, logs, service) = service();

    let err = service
        .enqueue(
            request(json!({ "type": AI_RICH, "items": [{ "offerId": "  " }, {}] })),
            Caller::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EnqueueError::NoUsableItems));
    assert_eq!(store.job_count().await, 0);
    assert!(logs.entries().is_empty());
}

#[tokio::test]
async fn test_blank_type_is_rejected() {
    let (store, _, service) = service();

    let err = service
        .enqueue(
            request(json!({ "type": " ", "items": [{ "offerId": "A1" }] })),
            Caller::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EnqueueError::Invalid(_)));
    assert_eq!(store.job_count().await, 0);
}

#[tokio::test]
async fn test_empty_item_list_is_rejected() {
    let (store, _, service) = service();

    let err = service
        .enqueue(request(json!({ "type": AI_RICH, "items": [] })), Caller::default())
        .await
        .unwrap_err();

    assert!(matches!(err, EnqueueError::Invalid(_)));
    assert_eq!(store.job_count().await, 0);
}

#[tokio::test]
async fn test_enqueue_is_audited() {
    let (_, logs, service) = service();

    let response = service
        .enqueue(
            request(json!({ "type": AI_RICH, "items": [{ "offerId": "A1" }] })),
            Caller::default(),
        )
        .await
        .unwrap();

    let entries = logs.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].source, "enqueue");
    assert_eq!(entries[0].status, 201);
    assert_eq!(entries[0].job_id, Some(response.id));
    assert_eq!(entries[0].offer_id, None);
}
