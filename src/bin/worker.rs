//! One-shot worker trigger for cron-style schedulers.
//!
//! Runs a single pass over pending items and exits. Overlapping runs are
//! safe because each item is claimed with a conditional update.

use std::process::ExitCode;

use rich_content_queue::{build_state, config::AppConfig, db};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration");

    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let state = build_state(&config, db_pool).expect("Failed to initialize application state");

    tracing::info!(
        limit = config.worker_limit,
        item_delay = ?state.worker.settings().item_delay,
        "Running worker pass"
    );

    match state.worker.run(Some(config.worker_limit)).await {
        Ok(summary) => {
            tracing::info!(
                processed = summary.processed,
                failed = summary.failed,
                rate_limited = summary.rate_limited,
                "Worker pass complete"
            );
            match serde_json::to_string(&summary) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!(error = %e, "Failed to render summary"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Worker pass failed");
            ExitCode::FAILURE
        }
    }
}
