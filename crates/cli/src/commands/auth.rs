//! Account connection commands: auth-url, connect, refresh

use anyhow::{Context, Result};
use serde::Serialize;
use social_relay_domain::usecases::{ConnectAccount, RefreshCredential};
use social_relay_domain::{AuthenticateParams, IntegrationCredential, SocialProvider, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;

use super::{build_factory, load_credential, open_store};
use crate::args::{AccountArgs, AuthUrlArgs, ConnectArgs};
use crate::config::AppConfig;

/// Credential as shown to the user, without tokens
#[derive(Debug, Serialize)]
pub(crate) struct AccountView {
    pub id: String,
    pub provider: String,
    pub account: String,
    pub name: String,
    pub username: Option<String>,
    pub expires_at: Option<String>,
    pub refresh_needed: bool,
    pub disabled: bool,
}

impl From<&IntegrationCredential> for AccountView {
    fn from(credential: &IntegrationCredential) -> Self {
        Self {
            id: credential.id.to_string(),
            provider: credential.provider.to_string(),
            account: credential.internal_id.clone(),
            name: credential.name.clone(),
            username: credential.username.clone(),
            expires_at: credential
                .expires_at
                .and_then(|at| at.format(&Rfc3339).ok()),
            refresh_needed: credential.refresh_needed,
            disabled: credential.disabled,
        }
    }
}

pub async fn auth_url(args: AuthUrlArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let factory = build_factory(&config)?;
    let provider = factory.social_provider_by_name(&args.provider)?;

    let request = provider
        .generate_auth_url()
        .context("Failed to build authorization URL")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&request)?);
    } else {
        println!("{}", request.url);
        println!();
        println!("state:         {}", request.state);
        println!("code verifier: {}", request.code_verifier);
    }

    Ok(())
}

pub async fn connect(args: ConnectArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let factory = build_factory(&config)?;
    let provider: Arc<dyn SocialProvider> =
        Arc::from(factory.social_provider_by_name(&args.provider)?);
    let store = open_store(&config).await?;

    let usecase = ConnectAccount::new(provider, store, Arc::new(SystemClock));
    let credential = usecase
        .execute(
            &args.org,
            &AuthenticateParams {
                code: args.code,
                code_verifier: args.code_verifier,
                refresh: args.refresh,
            },
        )
        .await
        .with_context(|| format!("Failed to connect {} account", args.provider))?;

    print_account("Connected", &credential, args.json)
}

pub async fn refresh(args: AccountArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let factory = build_factory(&config)?;
    let store = open_store(&config).await?;
    let credential = load_credential(&store, &args).await?;

    let provider: Arc<dyn SocialProvider> =
        Arc::from(factory.social_provider(credential.provider)?);
    let usecase = RefreshCredential::new(provider, store, Arc::new(SystemClock));

    let refreshed = match usecase.execute(&credential).await {
        Ok(refreshed) => refreshed,
        Err(e) if e.requires_reconnect() => {
            anyhow::bail!(
                "{}. The account must be reconnected with `social-relay auth-url --provider {}`",
                e,
                credential.provider
            );
        }
        Err(e) => return Err(e).context("Failed to refresh credential"),
    };

    print_account("Refreshed", &refreshed, false)
}

fn print_account(action: &str, credential: &IntegrationCredential, json: bool) -> Result<()> {
    let view = AccountView::from(credential);
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!(
        "{} {} account {} ({})",
        action, view.provider, view.account, view.name
    );
    println!("  credential: {}", view.id);
    if let Some(expires_at) = &view.expires_at {
        println!("  expires at: {}", expires_at);
    }
    Ok(())
}
