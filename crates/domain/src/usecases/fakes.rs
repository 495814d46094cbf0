//! In-crate fakes shared by use case tests

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::{
    AuthTokenDetails, AuthenticateParams, AuthorizationRequest, IntegrationCredential, PostDraft,
    PostResult, ProviderKind,
};
use crate::ports::{Clock, CredentialError, CredentialStore, ProviderError, SocialProvider};

pub fn token_details(id: &str) -> AuthTokenDetails {
    AuthTokenDetails {
        id: id.to_string(),
        access_token: format!("token-{}", id),
        refresh_token: Some(format!("refresh-{}", id)),
        expires_in: Some(3600),
        name: "Test Account".to_string(),
        picture: None,
        username: Some("test".to_string()),
        scopes: vec!["openid".to_string()],
    }
}

pub struct FakeProvider {
    details: Option<AuthTokenDetails>,
    error: Mutex<Option<ProviderError>>,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn succeeding(details: AuthTokenDetails) -> Self {
        Self {
            details: Some(details),
            error: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            details: None,
            error: Mutex::new(Some(error)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self) -> Result<AuthTokenDetails, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.details.clone().expect("fake configured with details"))
    }
}

#[async_trait]
impl SocialProvider for FakeProvider {
    fn identifier(&self) -> &'static str {
        "linkedin"
    }

    fn name(&self) -> &'static str {
        "Fake"
    }

    fn scopes(&self) -> &[&'static str] {
        &["openid"]
    }

    fn generate_auth_url(&self) -> Result<AuthorizationRequest, ProviderError> {
        Ok(AuthorizationRequest {
            url: "https://example.com/auth".to_string(),
            state: "state".to_string(),
            code_verifier: "verifier".to_string(),
        })
    }

    async fn authenticate(
        &self,
        _params: &AuthenticateParams,
    ) -> Result<AuthTokenDetails, ProviderError> {
        self.respond()
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<AuthTokenDetails, ProviderError> {
        self.respond()
    }

    async fn post(
        &self,
        _account_id: &str,
        _access_token: &str,
        _draft: &PostDraft,
    ) -> Result<Vec<PostResult>, ProviderError> {
        Ok(vec![])
    }
}

#[derive(Default)]
pub struct FakeStore {
    credentials: Mutex<Vec<IntegrationCredential>>,
}

impl FakeStore {
    pub fn len(&self) -> usize {
        self.credentials.lock().unwrap().len()
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<IntegrationCredential> {
        self.credentials
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }
}

#[async_trait]
impl CredentialStore for FakeStore {
    async fn upsert(
        &self,
        credential: &IntegrationCredential,
    ) -> Result<IntegrationCredential, CredentialError> {
        let mut credentials = self.credentials.lock().unwrap();
        if let Some(existing) = credentials.iter_mut().find(|c| {
            c.org_id == credential.org_id
                && c.provider == credential.provider
                && c.internal_id == credential.internal_id
        }) {
            let id = existing.id;
            *existing = credential.clone();
            existing.id = id;
            return Ok(existing.clone());
        }
        credentials.push(credential.clone());
        Ok(credential.clone())
    }

    async fn get(
        &self,
        org_id: &str,
        provider: ProviderKind,
        internal_id: &str,
    ) -> Result<Option<IntegrationCredential>, CredentialError> {
        Ok(self
            .credentials
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.org_id == org_id && c.provider == provider && c.internal_id == internal_id)
            .cloned())
    }

    async fn list(&self, org_id: &str) -> Result<Vec<IntegrationCredential>, CredentialError> {
        Ok(self
            .credentials
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.org_id == org_id)
            .cloned()
            .collect())
    }

    async fn mark_refresh_needed(&self, id: Uuid) -> Result<(), CredentialError> {
        let mut credentials = self.credentials.lock().unwrap();
        let credential = credentials
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CredentialError::NotFound(id.to_string()))?;
        credential.refresh_needed = true;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, CredentialError> {
        let mut credentials = self.credentials.lock().unwrap();
        let before = credentials.len();
        credentials.retain(|c| c.id != id);
        Ok(credentials.len() != before)
    }
}

pub struct FakeClock {
    pub time: OffsetDateTime,
}

impl FakeClock {
    pub fn fixed() -> Self {
        Self {
            time: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
        }
    }
}

impl Clock for FakeClock {
    fn now(&self) -> OffsetDateTime {
        self.time
    }
}
