//! Application use cases / credential lifecycle

pub mod connect;
pub mod refresh;

#[cfg(test)]
mod fakes;

pub use connect::ConnectAccount;
pub use refresh::RefreshCredential;

use crate::ports::{CredentialError, ProviderError};

/// Errors from credential lifecycle use cases
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("Credential store error: {0}")]
    Store(#[from] CredentialError),
}

impl LifecycleError {
    /// Whether the tenant has to reconnect the account to recover
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::Provider(e) if e.requires_reconnect())
    }
}
