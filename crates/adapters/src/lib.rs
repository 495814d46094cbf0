//! social-relay adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `http`: Shared fetch wrapper, redaction and OAuth helpers
//! - `linkedin`: LinkedIn profile and page publishing
//! - `login`: GitHub, Google and OpenID sign-in
//! - `credentials`: SQLite and in-memory credential stores
//! - `media`: Filesystem/URL media loading
//! - `factory`: Provider lookup by identifier

mod credentials_memory;
mod credentials_sqlite;

pub mod factory;
pub mod http;
pub mod linkedin;
pub mod login;
pub mod media;
pub mod stub;

/// Re-exports for credential store adapters
pub mod credentials {
    pub use crate::credentials_memory::InMemoryCredentialStore;
    pub use crate::credentials_sqlite::SqliteCredentialStore;
}

pub use factory::{OpenIdConfig, ProviderFactory, ProvidersConfig};
