use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::models::content::{SellerCredentials, UpdateReceipt};

pub const INFO_ENDPOINT: &str = "/v3/product/info/list";
pub const ATTRIBUTES_ENDPOINT: &str = "/v4/product/info/attributes";
pub const UPDATE_ENDPOINT: &str = "/v1/product/attributes/update";

/// Attribute slot that holds rich-content JSON on Ozon.
pub const RICH_CONTENT_ATTRIBUTE_ID: i64 = 11254;

/// Read and attribute-update calls against the seller marketplace.
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    /// Current product card, `None` when the offer is unknown.
    async fn get_info(
        &self,
        credentials: &SellerCredentials,
        offer_id: &str,
    ) -> Result<Option<Value>, MarketplaceError>;

    /// Product attribute record, `None` when the offer is unknown.
    async fn get_attributes(
        &self,
        credentials: &SellerCredentials,
        offer_id: &str,
    ) -> Result<Option<Value>, MarketplaceError>;

    /// Set a single attribute without replacing the rest of the card.
    async fn update_attributes(
        &self,
        credentials: &SellerCredentials,
        offer_id: &str,
        attribute_id: i64,
        value: &str,
    ) -> Result<UpdateReceipt, MarketplaceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error("Marketplace request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Marketplace rate limit exceeded on {endpoint}")]
    RateLimited { endpoint: &'static str },

    #[error("Marketplace returned {status} on {endpoint}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },
}

impl MarketplaceError {
    /// HTTP-equivalent status for integration logs.
    pub fn status(&self) -> i32 {
        match self {
            MarketplaceError::Http(e) => e.status().map(|s| s.as_u16() as i32).unwrap_or(502),
            MarketplaceError::RateLimited { .. } => 429,
            MarketplaceError::Status { status, .. } => *status as i32,
        }
    }
}

/// Ozon Seller API client.
pub struct OzonClient {
    http: Client,
    base_url: String,
}

impl OzonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post(
        &self,
        credentials: &SellerCredentials,
        endpoint: &'static str,
        body: Value,
    ) -> Result<Value, MarketplaceError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, endpoint))
            .header("Client-Id", &credentials.client_id)
            .header("Api-Key", &credentials.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketplaceError::RateLimited { endpoint });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketplaceError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// First product in a list response, tolerating both `items` and `result` envelopes.
fn first_product(body: &Value) -> Option<Value> {
    let list = body
        .get("items")
        .or_else(|| body.get("result").and_then(|r| r.get("items").or(Some(r))))?;
    list.as_array()?.first().cloned()
}

#[async_trait]
impl MarketplaceClient for OzonClient {
    async fn get_info(
        &self,
        credentials: &SellerCredentials,
        offer_id: &str,
    ) -> Result<Option<Value>, MarketplaceError> {
        let body = self
            .post(credentials, INFO_ENDPOINT, json!({ "offer_id": [offer_id] }))
            .await?;
        Ok(first_product(&body))
    }

    async fn get_attributes(
        &self,
        credentials: &SellerCredentials,
        offer_id: &str,
    ) -> Result<Option<Value>, MarketplaceError> {
        let body = self
            .post(
                credentials,
                ATTRIBUTES_ENDPOINT,
                json!({
                    "filter": { "offer_id": [offer_id], "visibility": "ALL" },
                    "limit": 1,
                }),
            )
            .await?;
        Ok(first_product(&body))
    }

    async fn update_attributes(
        &self,
        credentials: &SellerCredentials,
        offer_id: &str,
        attribute_id: i64,
        value: &str,
    ) -> Result<UpdateReceipt, MarketplaceError> {
        let body = self
            .post(
                credentials,
                UPDATE_ENDPOINT,
                json!({
                    "items": [{
                        "offer_id": offer_id,
                        "attributes": [{
                            "id": attribute_id,
                            "complex_id": 0,
                            "values": [{ "dictionary_value_id": 0, "value": value }],
                        }],
                    }],
                }),
            )
            .await?;

        let task_id = body
            .get("task_id")
            .or_else(|| body.get("result").and_then(|r| r.get("task_id")))
            .and_then(Value::as_i64);

        Ok(UpdateReceipt { task_id, raw: body })
    }
}
