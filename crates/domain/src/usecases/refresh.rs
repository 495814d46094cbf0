//! Refresh use case - renews tokens and invalidates revoked credentials

use std::sync::Arc;

use crate::{
    model::IntegrationCredential,
    ports::{Clock, CredentialStore, ProviderError, SocialProvider},
    usecases::LifecycleError,
};

/// Refreshes a stored credential through its provider
pub struct RefreshCredential<P, S, C>
where
    P: SocialProvider + ?Sized,
    S: CredentialStore + ?Sized,
    C: Clock + ?Sized,
{
    provider: Arc<P>,
    store: Arc<S>,
    clock: Arc<C>,
}

impl<P, S, C> RefreshCredential<P, S, C>
where
    P: SocialProvider + ?Sized,
    S: CredentialStore + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(provider: Arc<P>, store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            provider,
            store,
            clock,
        }
    }

    /// Refresh the credential and persist the new tokens
    ///
    /// On revocation, or when the refreshed token belongs to another platform
    /// account, the credential is flagged `refresh_needed` and the error is
    /// returned.
    pub async fn execute(
        &self,
        credential: &IntegrationCredential,
    ) -> Result<IntegrationCredential, LifecycleError> {
        if credential.disabled {
            return Err(ProviderError::InvalidInput(format!(
                "Credential {} is disabled",
                credential.id
            ))
            .into());
        }

        let Some(refresh_token) = credential.refresh_token.as_deref() else {
            self.store.mark_refresh_needed(credential.id).await?;
            return Err(ProviderError::TokenRefresh("No refresh token stored".to_string()).into());
        };

        tracing::info!(
            credential_id = %credential.id,
            provider = %credential.provider,
            "Refreshing credential"
        );

        let details = match self.provider.refresh_token(refresh_token).await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!(
                    credential_id = %credential.id,
                    error = %e,
                    "Refresh failed"
                );
                if e.requires_reconnect() {
                    self.store.mark_refresh_needed(credential.id).await?;
                }
                return Err(e.into());
            }
        };

        if details.id != credential.internal_id {
            tracing::warn!(
                credential_id = %credential.id,
                stored = %credential.internal_id,
                refreshed = %details.id,
                "Refreshed token belongs to a different account"
            );
            self.store.mark_refresh_needed(credential.id).await?;
            return Err(ProviderError::TokenRefresh(format!(
                "Account identity changed from {} to {}",
                credential.internal_id, details.id
            ))
            .into());
        }

        let mut updated = credential.clone();
        updated.apply_refresh(details, self.clock.now());

        Ok(self.store.upsert(&updated).await?)
    }
}
