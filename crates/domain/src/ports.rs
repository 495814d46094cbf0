//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to talk to the social platforms, identity
//! providers and credential storage.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::{
    AuthTokenDetails, AuthenticateParams, AuthorizationRequest, IntegrationCredential, LoginUser,
    MediaReference, PostDraft, PostResult, ProviderKind, UploadTarget,
};

/// Error type for provider operations
///
/// Every variant is terminal for the operation that raised it; adapters never
/// retry internally.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Authorization code exchange failed: {0}")]
    AuthExchange(String),
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),
    #[error("Missing required scopes: {}", .missing.join(", "))]
    InsufficientScope { missing: Vec<String> },
    #[error("Media upload of '{file_name}' to {target} account {account_id} failed: {message}")]
    MediaUpload {
        file_name: String,
        account_id: String,
        target: UploadTarget,
        message: String,
    },
    #[error("Publish failed (status {status:?}): {body}")]
    Publish { status: Option<u16>, body: String },
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ProviderError {
    /// Whether the tenant has to reconnect the account to recover
    pub fn requires_reconnect(&self) -> bool {
        matches!(
            self,
            Self::AuthExchange(_) | Self::TokenRefresh(_) | Self::InsufficientScope { .. }
        )
    }
}

/// Port for a social network the tenant publishes to
#[async_trait]
pub trait SocialProvider: Send + Sync {
    /// Stored provider identifier (e.g., "linkedin")
    fn identifier(&self) -> &'static str;

    /// Human-readable platform name
    fn name(&self) -> &'static str;

    /// Scopes the application requires
    fn scopes(&self) -> &[&'static str];

    /// Build the consent URL with fresh state and verifier values
    fn generate_auth_url(&self) -> Result<AuthorizationRequest, ProviderError>;

    /// Exchange an authorization code for tokens and fetch the profile
    async fn authenticate(
        &self,
        params: &AuthenticateParams,
    ) -> Result<AuthTokenDetails, ProviderError>;

    /// Exchange a refresh token for a new access token and re-fetch the profile
    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokenDetails, ProviderError>;

    /// Publish a draft; returns one result per segment in draft order
    async fn post(
        &self,
        account_id: &str,
        access_token: &str,
        draft: &PostDraft,
    ) -> Result<Vec<PostResult>, ProviderError>;
}

/// Port for an identity provider used to sign users in
#[async_trait]
pub trait LoginProvider: Send + Sync {
    fn identifier(&self) -> &'static str;

    /// Build the sign-in link
    fn generate_link(&self) -> Result<AuthorizationRequest, ProviderError>;

    /// Exchange an authorization code for an access token
    async fn get_token(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<String, ProviderError>;

    /// Look up the signed-in user
    async fn get_user(&self, access_token: &str) -> Result<LoginUser, ProviderError>;
}

/// Error type for media loading
#[derive(Debug, Error)]
pub enum MediaLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Fetch error: {0}")]
    Fetch(String),
}

/// Port for resolving a media reference to its bytes
#[async_trait]
pub trait MediaLoader: Send + Sync {
    async fn load(&self, media: &MediaReference) -> Result<Vec<u8>, MediaLoadError>;
}

/// Error type for credential store operations
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting integration credentials
///
/// Credentials are keyed by (org, provider, internal id); `upsert` replaces the
/// tokens of an existing row and keeps its id.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert or update, returning the stored credential
    async fn upsert(
        &self,
        credential: &IntegrationCredential,
    ) -> Result<IntegrationCredential, CredentialError>;

    async fn get(
        &self,
        org_id: &str,
        provider: ProviderKind,
        internal_id: &str,
    ) -> Result<Option<IntegrationCredential>, CredentialError>;

    /// All credentials of an organization
    async fn list(&self, org_id: &str) -> Result<Vec<IntegrationCredential>, CredentialError>;

    /// Flag a credential so the tenant is asked to reconnect
    async fn mark_refresh_needed(&self, id: Uuid) -> Result<(), CredentialError>;

    /// Remove a credential, returns whether it existed
    async fn delete(&self, id: Uuid) -> Result<bool, CredentialError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
