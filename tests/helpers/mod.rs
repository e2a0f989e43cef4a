//! Test doubles for the worker's collaborators

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use rich_content_queue::db::memory::MemoryJobStore;
use rich_content_queue::db::store::{JobStore, StoreError};
use rich_content_queue::models::content::{
    IntegrationLogEntry, NormalizedProduct, SellerCredentials, UpdateReceipt,
};
use rich_content_queue::models::job::{
    ItemCounts, ItemStatus, Job, JobItem, JobStatus, NewJob, NewJobItem,
};
use rich_content_queue::services::ai_rich::AiRichProcessor;
use rich_content_queue::services::credentials::StaticCredentials;
use rich_content_queue::services::generator::{ContentGenerator, GeneratorError};
use rich_content_queue::services::log_sink::LogSink;
use rich_content_queue::services::marketplace::{MarketplaceClient, MarketplaceError};
use rich_content_queue::services::processor::{ItemProcessor, ProcessError};
use rich_content_queue::services::worker::WorkerSettings;

use crate::fixtures;

pub const PROFILE: &str = "profile-1";

pub fn credentials() -> SellerCredentials {
    SellerCredentials {
        client_id: "client-1".to_string(),
        api_key: "api-key-1".to_string(),
    }
}

/// Worker settings without pacing so tests run instantly.
pub fn fast_settings() -> WorkerSettings {
    WorkerSettings {
        item_delay: Duration::ZERO,
        stale_after: None,
        skipped_is_terminal: false,
    }
}

/// Create a job directly in the store with one item per offer.
pub async fn seed_job(
    store: &MemoryJobStore,
    job_type: &str,
    offers: &[&str],
    payload: Value,
) -> Job {
    store
        .create_job(NewJob {
            job_type: job_type.to_string(),
            enterprise_id: None,
            created_by_user_id: Some("user-1".to_string()),
            payload,
            items: offers
                .iter()
                .map(|o| NewJobItem {
                    offer_id: o.to_string(),
                    seller_id: None,
                    profile_id: Some(PROFILE.to_string()),
                })
                .collect(),
        })
        .await
        .unwrap()
}

/// Items of a job keyed by offer id.
pub async fn items_by_offer(store: &MemoryJobStore, job_id: Uuid) -> HashMap<String, JobItem> {
    store
        .list_items(job_id, None)
        .await
        .unwrap()
        .into_iter()
        .map(|i| (i.offer_id.clone(), i))
        .collect()
}

// ---------------------------------------------------------------------------
// Scripted processor

#[derive(Clone)]
pub enum Script {
    Succeed,
    Fail(&'static str),
}

/// Processor whose outcome per offer is fixed up front.
#[derive(Default)]
pub struct ScriptedProcessor {
    scripts: HashMap<String, Script>,
    paced: bool,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paced(mut self) -> Self {
        self.paced = true;
        self
    }

    pub fn on(mut self, offer_id: &str, script: Script) -> Self {
        self.scripts.insert(offer_id.to_string(), script);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItemProcessor for ScriptedProcessor {
    async fn process(&self, _job: &Job, item: &JobItem) -> Result<Value, ProcessError> {
        self.calls.lock().unwrap().push(item.offer_id.clone());
        match self.scripts.get(&item.offer_id).cloned().unwrap_or(Script::Succeed) {
            Script::Succeed => Ok(json!({ "offerId": item.offer_id })),
            Script::Fail(message) => Err(ProcessError::Other(message.to_string())),
        }
    }

    fn requires_pacing(&self) -> bool {
        self.paced
    }
}

// ---------------------------------------------------------------------------
// AI-rich collaborators

/// Marketplace with a fixed product catalogue that records attribute updates.
#[derive(Default)]
pub struct FakeMarketplace {
    catalogue: HashMap<String, (Value, Value)>,
    throttled: HashSet<String>,
    pub updates: Mutex<Vec<(String, i64, String)>>,
}

impl FakeMarketplace {
    pub fn with_products(offers: &[&str]) -> Self {
        let catalogue = offers
            .iter()
            .map(|o| {
                (
                    o.to_string(),
                    (fixtures::product_info(o), fixtures::product_attributes(o)),
                )
            })
            .collect();
        Self {
            catalogue,
            ..Default::default()
        }
    }

    /// Answer reads for this offer with a 429.
    pub fn throttle(mut self, offer_id: &str) -> Self {
        self.throttled.insert(offer_id.to_string());
        self
    }

    pub fn updates(&self) -> Vec<(String, i64, String)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketplaceClient for FakeMarketplace {
    async fn get_info(
        &self,
        _credentials: &SellerCredentials,
        offer_id: &str,
    ) -> Result<Option<Value>, MarketplaceError> {
        if self.throttled.contains(offer_id) {
            return Err(MarketplaceError::RateLimited {
                endpoint: rich_content_queue::services::marketplace::INFO_ENDPOINT,
            });
        }
        Ok(self.catalogue.get(offer_id).map(|(info, _)| info.clone()))
    }

    async fn get_attributes(
        &self,
        _credentials: &SellerCredentials,
        offer_id: &str,
    ) -> Result<Option<Value>, MarketplaceError> {
        Ok(self.catalogue.get(offer_id).map(|(_, attrs)| attrs.clone()))
    }

    async fn update_attributes(
        &self,
        _credentials: &SellerCredentials,
        offer_id: &str,
        attribute_id: i64,
        value: &str,
    ) -> Result<UpdateReceipt, MarketplaceError> {
        self.updates
            .lock()
            .unwrap()
            .push((offer_id.to_string(), attribute_id, value.to_string()));
        Ok(UpdateReceipt {
            task_id: Some(777),
            raw: json!({ "task_id": 777 }),
        })
    }
}

/// Generator returning a fixed document, or throttling selected offers.
pub struct FakeGenerator {
    content: Value,
    throttled: HashSet<String>,
    pub inputs: Mutex<Vec<NormalizedProduct>>,
}

impl FakeGenerator {
    pub fn returning(content: Value) -> Self {
        Self {
            content,
            throttled: HashSet::new(),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn throttle(mut self, offer_id: &str) -> Self {
        self.throttled.insert(offer_id.to_string());
        self
    }

    pub fn inputs(&self) -> Vec<NormalizedProduct> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate(&self, input: &NormalizedProduct) -> Result<Value, GeneratorError> {
        self.inputs.lock().unwrap().push(input.clone());
        if self.throttled.contains(&input.offer_id) {
            return Err(GeneratorError::RateLimited);
        }
        Ok(self.content.clone())
    }
}

/// Log sink that keeps every entry in memory.
#[derive(Default)]
pub struct RecordingLogSink {
    pub entries: Mutex<Vec<IntegrationLogEntry>>,
}

impl RecordingLogSink {
    pub fn entries(&self) -> Vec<IntegrationLogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogSink for RecordingLogSink {
    async fn append(&self, entry: IntegrationLogEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}

/// AI-rich processor wired to fakes, with credentials for [`PROFILE`].
pub fn ai_rich_processor(
    marketplace: Arc<FakeMarketplace>,
    generator: Arc<FakeGenerator>,
    logs: Arc<RecordingLogSink>,
) -> AiRichProcessor {
    AiRichProcessor::new(
        Arc::new(StaticCredentials::new().with(PROFILE, credentials())),
        marketplace,
        generator,
        logs,
    )
}

// ---------------------------------------------------------------------------
// Store with injected interference

/// Delegates to a memory store. Optionally a rival claims the first pending
/// item between selection and claim, and writes for one item can be made
/// to fail.
pub struct InterferingStore {
    pub inner: Arc<MemoryJobStore>,
    rival_claims_first: bool,
    failing_item: Option<Uuid>,
}

impl InterferingStore {
    pub fn new(inner: Arc<MemoryJobStore>) -> Self {
        Self {
            inner,
            rival_claims_first: false,
            failing_item: None,
        }
    }

    pub fn rival_claims_first(mut self) -> Self {
        self.rival_claims_first = true;
        self
    }

    /// Make `finish_item` fail for this item.
    pub fn fail_finish(mut self, item_id: Uuid) -> Self {
        self.failing_item = Some(item_id);
        self
    }
}

#[async_trait]
impl JobStore for InterferingStore {
    async fn create_job(&self, job: NewJob) -> Result<Job, StoreError> {
        self.inner.create_job(job).await
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        self.inner.get_job(job_id).await
    }

    async fn list_jobs(&self, limit: i64) -> Result<Vec<Job>, StoreError> {
        self.inner.list_jobs(limit).await
    }

    async fn list_items(
        &self,
        job_id: Uuid,
        status: Option<ItemStatus>,
    ) -> Result<Vec<JobItem>, StoreError> {
        self.inner.list_items(job_id, status).await
    }

    async fn pending_items(&self, limit: i64) -> Result<Vec<JobItem>, StoreError> {
        let batch = self.inner.pending_items(limit).await?;
        if self.rival_claims_first {
            if let Some(first) = batch.first() {
                self.inner.claim_item(first.id).await?;
            }
        }
        Ok(batch)
    }

    async fn claim_item(&self, item_id: Uuid) -> Result<Option<JobItem>, StoreError> {
        self.inner.claim_item(item_id).await
    }

    async fn finish_item(
        &self,
        item_id: Uuid,
        status: ItemStatus,
        snapshot: Option<Value>,
        error: Option<&str>,
    ) -> Result<(), StoreError> {
        if self.failing_item == Some(item_id) {
            return Err(StoreError::Corrupt("write rejected".to_string()));
        }
        self.inner.finish_item(item_id, status, snapshot, error).await
    }

    async fn release_item(&self, item_id: Uuid, error: &str) -> Result<(), StoreError> {
        self.inner.release_item(item_id, error).await
    }

    async fn count_items(&self, job_id: Uuid) -> Result<ItemCounts, StoreError> {
        self.inner.count_items(job_id).await
    }

    async fn update_job_progress(
        &self,
        job_id: Uuid,
        counts: ItemCounts,
        status: JobStatus,
    ) -> Result<(), StoreError> {
        self.inner.update_job_progress(job_id, counts, status).await
    }

    async fn reclaim_stale_items(
        &self,
        cutoff: DateTime<Utc>,
        reason: &str,
    ) -> Result<u64, StoreError> {
        self.inner.reclaim_stale_items(cutoff, reason).await
    }
}
