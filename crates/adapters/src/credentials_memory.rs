//! In-memory credential store for testing and offline mode

use async_trait::async_trait;
use social_relay_domain::{CredentialError, CredentialStore, IntegrationCredential, ProviderKind};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

type CredentialKey = (String, ProviderKind, String);

/// In-memory credential store implementation
pub struct InMemoryCredentialStore {
    credentials: RwLock<HashMap<CredentialKey, IntegrationCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            credentials: RwLock::new(HashMap::new()),
        }
    }

    fn make_key(org_id: &str, provider: ProviderKind, internal_id: &str) -> CredentialKey {
        (org_id.to_string(), provider, internal_id.to_string())
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn upsert(
        &self,
        credential: &IntegrationCredential,
    ) -> Result<IntegrationCredential, CredentialError> {
        let key = Self::make_key(
            &credential.org_id,
            credential.provider,
            &credential.internal_id,
        );
        let mut credentials = self
            .credentials
            .write()
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        let mut stored = credential.clone();
        if let Some(existing) = credentials.get(&key) {
            stored.id = existing.id;
        }
        credentials.insert(key, stored.clone());
        Ok(stored)
    }

    async fn get(
        &self,
        org_id: &str,
        provider: ProviderKind,
        internal_id: &str,
    ) -> Result<Option<IntegrationCredential>, CredentialError> {
        let credentials = self
            .credentials
            .read()
            .map_err(|e| CredentialError::Database(e.to_string()))?;
        Ok(credentials
            .get(&Self::make_key(org_id, provider, internal_id))
            .cloned())
    }

    async fn list(&self, org_id: &str) -> Result<Vec<IntegrationCredential>, CredentialError> {
        let credentials = self
            .credentials
            .read()
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        let mut listed: Vec<_> = credentials
            .values()
            .filter(|c| c.org_id == org_id)
            .cloned()
            .collect();
        listed.sort_by(|a, b| {
            (a.provider.identifier(), &a.name).cmp(&(b.provider.identifier(), &b.name))
        });
        Ok(listed)
    }

    async fn mark_refresh_needed(&self, id: Uuid) -> Result<(), CredentialError> {
        let mut credentials = self
            .credentials
            .write()
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        let credential = credentials
            .values_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CredentialError::NotFound(id.to_string()))?;
        credential.refresh_needed = true;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CredentialError> {
        let mut credentials = self
            .credentials
            .write()
            .map_err(|e| CredentialError::Database(e.to_string()))?;

        let before = credentials.len();
        credentials.retain(|_, c| c.id != id);
        Ok(credentials.len() != before)
    }
}
