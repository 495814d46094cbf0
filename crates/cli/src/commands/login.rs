//! Login command - sign in with an identity provider

use anyhow::{Context, Result};
use std::path::PathBuf;

use super::build_factory;
use crate::args::LoginArgs;
use crate::config::AppConfig;

pub async fn execute(args: LoginArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let factory = build_factory(&config)?;
    let provider = factory.login_provider_by_name(&args.provider)?;

    let Some(code) = args.code else {
        let request = provider.generate_link()?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&request)?);
        } else {
            println!("{}", request.url);
            if !request.code_verifier.is_empty() {
                println!();
                println!("code verifier: {}", request.code_verifier);
            }
        }
        return Ok(());
    };

    let token = provider
        .get_token(&code, args.code_verifier.as_deref())
        .await
        .context("Sign-in code exchange failed")?;
    let user = provider
        .get_user(&token)
        .await
        .context("Failed to look up signed-in user")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("Signed in as {} ({})", user.email, user.id);
    }

    Ok(())
}
