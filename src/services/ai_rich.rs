use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::models::content::{IntegrationLogEntry, SellerCredentials, UpdateReceipt};
use crate::models::job::{Job, JobItem};
use crate::services::credentials::CredentialLookup;
use crate::services::generator::{ContentGenerator, GENERATE_ENDPOINT};
use crate::services::log_sink::LogSink;
use crate::services::marketplace::{
    MarketplaceClient, ATTRIBUTES_ENDPOINT, INFO_ENDPOINT, RICH_CONTENT_ATTRIBUTE_ID,
    UPDATE_ENDPOINT,
};
use crate::services::normalize::normalize_product;
use crate::services::processor::{ItemProcessor, ProcessError};

pub const LOG_SOURCE: &str = "ai-rich";

/// Generates rich content for an offer and optionally writes it back to the
/// marketplace's rich-content attribute.
pub struct AiRichProcessor {
    credentials: Arc<dyn CredentialLookup>,
    marketplace: Arc<dyn MarketplaceClient>,
    generator: Arc<dyn ContentGenerator>,
    logs: Arc<dyn LogSink>,
}

/// Endpoint reached and task id returned during one attempt.
#[derive(Default)]
struct Attempt {
    endpoint: &'static str,
    task_id: Option<i64>,
}

impl AiRichProcessor {
    pub fn new(
        credentials: Arc<dyn CredentialLookup>,
        marketplace: Arc<dyn MarketplaceClient>,
        generator: Arc<dyn ContentGenerator>,
        logs: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            credentials,
            marketplace,
            generator,
            logs,
        }
    }

    async fn credentials_for(
        &self,
        job: &Job,
        item: &JobItem,
    ) -> Result<SellerCredentials, ProcessError> {
        let key = item
            .profile_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| job.payload_str("profileId", "profile_id"))
            .or_else(|| item.seller_id.as_deref().filter(|s| !s.is_empty()))
            .or_else(|| job.payload_str("sellerId", "seller_id"))
            .ok_or(ProcessError::NoCredentialKey)?;

        self.credentials
            .resolve(key)
            .await?
            .ok_or_else(|| ProcessError::MissingCredentials(key.to_string()))
    }

    async fn run(
        &self,
        job: &Job,
        item: &JobItem,
        attempt: &mut Attempt,
    ) -> Result<Value, ProcessError> {
        let credentials = self.credentials_for(job, item).await?;
        let offer_id = item.offer_id.as_str();

        attempt.endpoint = INFO_ENDPOINT;
        let info = self
            .marketplace
            .get_info(&credentials, offer_id)
            .await?
            .ok_or_else(|| ProcessError::MissingProductData {
                what: "product info",
                offer_id: offer_id.to_string(),
            })?;

        attempt.endpoint = ATTRIBUTES_ENDPOINT;
        let attributes = self
            .marketplace
            .get_attributes(&credentials, offer_id)
            .await?
            .ok_or_else(|| ProcessError::MissingProductData {
                what: "product attributes",
                offer_id: offer_id.to_string(),
            })?;

        let input = normalize_product(offer_id, &info, &attributes);
        tracing::debug!(
            item_id = %item.id,
            offer_id = %offer_id,
            brand = input.brand.as_deref().unwrap_or("-"),
            images = input.images.len(),
            attributes = input.attributes.len(),
            "Normalized product input"
        );

        attempt.endpoint = GENERATE_ENDPOINT;
        let content = self.generator.generate(&input).await?;

        let marketplace = if job.applies_to_marketplace() {
            if is_empty_content(&content) {
                return Err(ProcessError::MissingContent(offer_id.to_string()));
            }
            attempt.endpoint = UPDATE_ENDPOINT;
            let receipt: UpdateReceipt = self
                .marketplace
                .update_attributes(
                    &credentials,
                    offer_id,
                    RICH_CONTENT_ATTRIBUTE_ID,
                    &content.to_string(),
                )
                .await?;
            attempt.task_id = receipt.task_id;
            serde_json::to_value(&receipt).map_err(|e| ProcessError::Other(e.to_string()))?
        } else {
            Value::Null
        };

        Ok(json!({
            "input": input,
            "content": content,
            "marketplace": marketplace,
        }))
    }
}

fn is_empty_content(content: &Value) -> bool {
    match content {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(list) => list.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[async_trait]
impl ItemProcessor for AiRichProcessor {
    async fn process(&self, job: &Job, item: &JobItem) -> Result<Value, ProcessError> {
        let start = Instant::now();
        let mut attempt = Attempt::default();
        let result = self.run(job, item, &mut attempt).await;

        let (status, error) = match &result {
            Ok(_) => (200, None),
            Err(e) => (e.status(), Some(e.to_string())),
        };
        self.logs
            .append(IntegrationLogEntry {
                source: LOG_SOURCE.to_string(),
                offer_id: Some(item.offer_id.clone()),
                endpoint: if attempt.endpoint.is_empty() {
                    "credentials".to_string()
                } else {
                    attempt.endpoint.to_string()
                },
                duration_ms: start.elapsed().as_millis() as i64,
                status,
                error,
                task_id: attempt.task_id,
                job_id: Some(job.id),
                item_id: Some(item.id),
                created_at: Utc::now(),
            })
            .await;

        result
    }

    fn requires_pacing(&self) -> bool {
        true
    }
}
