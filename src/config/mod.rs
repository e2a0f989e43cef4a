use serde::Deserialize;
use std::time::Duration;

use crate::services::worker::WorkerSettings;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000"). Optional for worker processes.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Cloudflare account ID
    pub cf_account_id: String,

    /// Cloudflare Workers AI API token
    pub cf_api_token: String,

    /// Workers AI text model used for content generation
    #[serde(default = "default_cf_ai_model")]
    pub cf_ai_model: String,

    /// Ozon Seller API base URL
    #[serde(default = "default_ozon_api_url")]
    pub ozon_api_url: String,

    /// AES-256-GCM key for stored marketplace API keys (base64-encoded, 32 bytes)
    pub encryption_key: String,

    /// Pause between items of paced job types, in seconds
    #[serde(default = "default_item_delay_secs")]
    pub item_delay_secs: u64,

    /// Age after which in_progress items are reclaimed; 0 disables the sweep
    #[serde(default = "default_stale_item_after_secs")]
    pub stale_item_after_secs: u64,

    /// Count skipped items toward job completion
    #[serde(default)]
    pub skipped_is_terminal: bool,

    /// Batch size used by the one-shot worker binary
    #[serde(default = "default_worker_limit")]
    pub worker_limit: i64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_cf_ai_model() -> String {
    "@cf/meta/llama-3.1-8b-instruct".to_string()
}

fn default_ozon_api_url() -> String {
    "https://api-seller.ozon.ru".to_string()
}

fn default_item_delay_secs() -> u64 {
    10
}

fn default_stale_item_after_secs() -> u64 {
    900
}

fn default_worker_limit() -> i64 {
    20
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            item_delay: Duration::from_secs(self.item_delay_secs),
            stale_after: (self.stale_item_after_secs > 0)
                .then(|| Duration::from_secs(self.stale_item_after_secs)),
            skipped_is_terminal: self.skipped_is_terminal,
        }
    }
}
