use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marketplace API credentials for one seller profile.
#[derive(Clone, PartialEq)]
pub struct SellerCredentials {
    pub client_id: String,
    pub api_key: String,
}

impl std::fmt::Debug for SellerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SellerCredentials")
            .field("client_id", &self.client_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Generator-agnostic description of a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedProduct {
    pub offer_id: String,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category_name: Option<String>,
    pub type_name: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub attributes: BTreeMap<String, String>,
}

/// Response of a marketplace attribute update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReceipt {
    pub task_id: Option<i64>,
    pub raw: serde_json::Value,
}

/// One structured record of an outbound integration call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationLogEntry {
    pub source: String,
    pub offer_id: Option<String>,
    pub endpoint: String,
    pub duration_ms: i64,
    pub status: i32,
    pub error: Option<String>,
    pub task_id: Option<i64>,
    pub job_id: Option<uuid::Uuid>,
    pub item_id: Option<uuid::Uuid>,
    pub created_at: DateTime<Utc>,
}
