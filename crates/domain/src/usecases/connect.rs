//! Connect use case - turns an authorization code into a stored credential

use std::sync::Arc;

use crate::{
    model::{AuthenticateParams, IntegrationCredential, ProviderKind},
    ports::{Clock, CredentialStore, SocialProvider},
    usecases::LifecycleError,
};

/// Exchanges the code with the provider and upserts the credential
pub struct ConnectAccount<P, S, C>
where
    P: SocialProvider + ?Sized,
    S: CredentialStore + ?Sized,
    C: Clock + ?Sized,
{
    provider: Arc<P>,
    store: Arc<S>,
    clock: Arc<C>,
}

impl<P, S, C> ConnectAccount<P, S, C>
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

    /// Connect an account for an organization
    ///
    /// Reconnecting the same platform account replaces the stored tokens
    /// instead of creating a second credential.
    pub async fn execute(
        &self,
        org_id: &str,
        params: &AuthenticateParams,
    ) -> Result<IntegrationCredential, LifecycleError> {
        let kind: ProviderKind = self.provider.identifier().parse()?;

        tracing::info!(org_id = %org_id, provider = %kind, "Connecting account");

        let details = self.provider.authenticate(params).await?;
        let credential =
            IntegrationCredential::from_token_details(org_id, kind, details, self.clock.now());

        let stored = self.store.upsert(&credential).await?;

        tracing::info!(
            org_id = %org_id,
            provider = %kind,
            internal_id = %stored.internal_id,
            credential_id = %stored.id,
            "Account connected"
        );

        Ok(stored)
    }
}
