use std::sync::Arc;

use crate::db::store::JobStore;
use crate::services::enqueue::EnqueueService;
use crate::services::log_sink::LogSink;
use crate::services::processor::ProcessorRegistry;
use crate::services::worker::{Worker, WorkerSettings};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub enqueue: Arc<EnqueueService>,
    pub worker: Arc<Worker>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn JobStore>,
        logs: Arc<dyn LogSink>,
        registry: ProcessorRegistry,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            enqueue: Arc::new(EnqueueService::new(store.clone(), logs)),
            worker: Arc::new(Worker::new(store.clone(), registry, settings)),
            store,
        }
    }
}
