//! Bulk AI rich-content job queue
//!
//! Sellers submit "generate content for N offers" jobs; an externally
//! triggered worker drives each offer through the AI generator and, when
//! enabled, writes the result back to the marketplace's rich-content
//! attribute. Items are processed one at a time, paced for the upstream
//! throughput ceiling, and a rate-limited item halts the batch.

pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use sqlx::PgPool;

use app_state::AppState;
use config::AppConfig;
use db::{credentials::PgCredentialLookup, logs::PgLogSink, queries::PgJobStore};
use models::job::AI_RICH;
use services::{
    ai_rich::AiRichProcessor,
    encryption::{EncryptionError, SecretCipher},
    generator::WorkersAiGenerator,
    log_sink::LogSink,
    marketplace::OzonClient,
    processor::ProcessorRegistry,
};

/// Wire the PostgreSQL-backed state used by both the server and the worker binary.
pub fn build_state(config: &AppConfig, pool: PgPool) -> Result<AppState, EncryptionError> {
    let cipher = Arc::new(SecretCipher::from_base64_key(&config.encryption_key)?);
    let logs: Arc<dyn LogSink> = Arc::new(PgLogSink::new(pool.clone()));

    let ai_rich = AiRichProcessor::new(
        Arc::new(PgCredentialLookup::new(pool.clone(), cipher)),
        Arc::new(OzonClient::new(config.ozon_api_url.clone())),
        Arc::new(WorkersAiGenerator::new(
            config.cf_account_id.clone(),
            config.cf_api_token.clone(),
            config.cf_ai_model.clone(),
        )),
        logs.clone(),
    );
    let registry = ProcessorRegistry::new().register(AI_RICH, Arc::new(ai_rich));

    Ok(AppState::new(
        Arc::new(PgJobStore::new(pool)),
        logs,
        registry,
        config.worker_settings(),
    ))
}
