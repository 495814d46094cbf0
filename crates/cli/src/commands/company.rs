//! Company command - resolve a LinkedIn company page to a mention

use anyhow::{Context, Result};
use std::path::PathBuf;

use super::{build_factory, load_credential, open_store};
use crate::args::CompanyArgs;
use crate::config::AppConfig;

pub async fn execute(args: CompanyArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let factory = build_factory(&config)?;
    let store = open_store(&config).await?;
    let credential = load_credential(&store, &args.account).await?;

    let provider = factory.linkedin(credential.provider)?;
    let mention = provider
        .company_lookup(&credential.access_token, &args.url)
        .await
        .context("Company lookup failed")?;

    println!("{}", mention.label);
    println!("{}", mention.value);

    Ok(())
}
