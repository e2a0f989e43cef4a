use std::collections::HashMap;

use async_trait::async_trait;

use crate::models::content::SellerCredentials;
use crate::services::encryption::EncryptionError;

/// Resolves marketplace credentials for a seller profile or seller id.
#[async_trait]
pub trait CredentialLookup: Send + Sync {
    async fn resolve(&self, key: &str) -> Result<Option<SellerCredentials>, CredentialError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Credential store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Stored API key for '{0}' could not be decrypted")]
    Sealed(String, #[source] EncryptionError),
}

/// Fixed credential table, keyed by profile or seller id.
#[derive(Debug, Default, Clone)]
pub struct StaticCredentials {
    entries: HashMap<String, SellerCredentials>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, credentials: SellerCredentials) -> Self {
        self.entries.insert(key.into(), credentials);
        self
    }
}

#[async_trait]
impl CredentialLookup for StaticCredentials {
    async fn resolve(&self, key: &str) -> Result<Option<SellerCredentials>, CredentialError> {
        Ok(self.entries.get(key).cloned())
    }
}
