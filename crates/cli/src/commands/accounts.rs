//! Accounts command - list connected accounts

use anyhow::Result;
use social_relay_domain::CredentialStore;
use std::path::PathBuf;

use super::auth::AccountView;
use super::open_store;
use crate::args::AccountsArgs;
use crate::config::AppConfig;

pub async fn execute(args: AccountsArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let store = open_store(&config).await?;

    let accounts: Vec<AccountView> = store
        .list(&args.org)
        .await?
        .iter()
        .map(AccountView::from)
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }

    if accounts.is_empty() {
        println!("No accounts connected for organization '{}'", args.org);
        return Ok(());
    }

    println!("Accounts for '{}':", args.org);
    for account in &accounts {
        let status = if account.disabled {
            "disabled"
        } else if account.refresh_needed {
            "reconnect needed"
        } else {
            "active"
        };
        println!(
            "  [{}] {} {} - {}",
            account.provider, account.account, account.name, status
        );
    }

    Ok(())
}
