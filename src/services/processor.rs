use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::models::job::{Job, JobItem};
use crate::services::credentials::CredentialError;
use crate::services::generator::GeneratorError;
use crate::services::marketplace::MarketplaceError;

/// Type-specific pipeline turning one item into a result snapshot.
#[async_trait]
pub trait ItemProcessor: Send + Sync {
    async fn process(&self, job: &Job, item: &JobItem) -> Result<serde_json::Value, ProcessError>;

    /// Whether the worker must pause between items of this type.
    fn requires_pacing(&self) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Item has no seller profile or seller id to resolve credentials")]
    NoCredentialKey,

    #[error("No usable marketplace credentials for '{0}'")]
    MissingCredentials(String),

    #[error("Marketplace returned no {what} for offer {offer_id}")]
    MissingProductData {
        what: &'static str,
        offer_id: String,
    },

    #[error("Generator returned no content for offer {0}")]
    MissingContent(String),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Marketplace(#[from] MarketplaceError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error("{0}")]
    Other(String),
}

impl ProcessError {
    /// HTTP-equivalent status for integration logs.
    pub fn status(&self) -> i32 {
        match self {
            ProcessError::NoCredentialKey | ProcessError::MissingCredentials(_) => 401,
            ProcessError::MissingProductData { .. } => 404,
            ProcessError::MissingContent(_) => 422,
            ProcessError::Credentials(_) | ProcessError::Other(_) => 500,
            ProcessError::Marketplace(e) => e.status(),
            ProcessError::Generator(e) => e.status(),
        }
    }
}

/// Maps a job type tag to the processor that handles its items.
#[derive(Default, Clone)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn ItemProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, job_type: impl Into<String>, processor: Arc<dyn ItemProcessor>) -> Self {
        self.processors.insert(job_type.into(), processor);
        self
    }

    pub fn get(&self, job_type: &str) -> Option<&Arc<dyn ItemProcessor>> {
        self.processors.get(job_type)
    }
}
