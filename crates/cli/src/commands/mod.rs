pub mod accounts;
pub mod auth;
pub mod company;
pub mod config;
pub mod doctor;
pub mod login;
pub mod normalize;
pub mod post;

use anyhow::{Context, Result, anyhow};
use social_relay_adapters::ProviderFactory;
use social_relay_adapters::credentials::SqliteCredentialStore;
use social_relay_adapters::http::build_client;
use social_relay_adapters::media::FsHttpMediaLoader;
use social_relay_domain::{CredentialStore, IntegrationCredential, ProviderKind};
use std::sync::Arc;
use std::time::Duration;

use crate::args::AccountArgs;
use crate::config::AppConfig;

pub(crate) fn build_factory(config: &AppConfig) -> Result<ProviderFactory> {
    let client = build_client(Duration::from_secs(config.general.timeout_secs))
        .context("Failed to build HTTP client")?;
    let media = Arc::new(FsHttpMediaLoader::new(client.clone()));

    Ok(ProviderFactory::new(client, config.providers(), media))
}

pub(crate) async fn open_store(config: &AppConfig) -> Result<Arc<SqliteCredentialStore>> {
    let store = SqliteCredentialStore::new(&config.general.state_db_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open credential store: {}",
                config.general.state_db_path.display()
            )
        })?;
    Ok(Arc::new(store))
}

pub(crate) fn parse_provider(name: &str) -> Result<ProviderKind> {
    Ok(name.parse()?)
}

pub(crate) async fn load_credential(
    store: &SqliteCredentialStore,
    args: &AccountArgs,
) -> Result<IntegrationCredential> {
    let kind = parse_provider(&args.provider)?;
    store
        .get(&args.org, kind, &args.account)
        .await?
        .ok_or_else(|| {
            anyhow!(
                "No {} account '{}' connected for organization '{}'",
                kind,
                args.account,
                args.org
            )
        })
}
