use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::models::content::SellerCredentials;
use crate::services::credentials::{CredentialError, CredentialLookup};
use crate::services::encryption::SecretCipher;

/// Looks up `seller_profiles` by profile id first, then by seller id.
pub struct PgCredentialLookup {
    pool: PgPool,
    cipher: Arc<SecretCipher>,
}

impl PgCredentialLookup {
    pub fn new(pool: PgPool, cipher: Arc<SecretCipher>) -> Self {
        Self { pool, cipher }
    }
}

#[async_trait]
impl CredentialLookup for PgCredentialLookup {
    async fn resolve(&self, key: &str) -> Result<Option<SellerCredentials>, CredentialError> {
        let row = sqlx::query(
            r#"
            SELECT client_id, api_key_encrypted
            FROM seller_profiles
            WHERE is_active AND (id = $1 OR seller_id = $1)
            ORDER BY (id = $1) DESC, created_at ASC
            LIMIT 1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let client_id: String = row.try_get("client_id")?;
        let sealed: String = row.try_get("api_key_encrypted")?;
        let api_key = self
            .cipher
            .open(&sealed)
            .map_err(|e| CredentialError::Sealed(key.to_string(), e))?;

        if client_id.trim().is_empty() || api_key.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(SellerCredentials { client_id, api_key }))
    }
}
