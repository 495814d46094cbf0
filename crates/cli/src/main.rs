//! social-relay CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = config::AppConfig::log_level(cli.log_level.as_deref(), cli.config.as_deref());
    init_logging(&log_level)?;

    // Execute command
    match cli.command {
        Commands::AuthUrl(args) => commands::auth::auth_url(args, cli.config).await,
        Commands::Connect(args) => commands::auth::connect(args, cli.config).await,
        Commands::Refresh(args) => commands::auth::refresh(args, cli.config).await,
        Commands::Login(args) => commands::login::execute(args, cli.config).await,
        Commands::Post(args) => commands::post::execute(args, cli.config).await,
        Commands::Accounts(args) => commands::accounts::execute(args, cli.config).await,
        Commands::Company(args) => commands::company::execute(args, cli.config).await,
        Commands::Normalize(args) => commands::normalize::execute(args).await,
        Commands::Config(args) => commands::config::execute(args).await,
        Commands::Doctor(args) => commands::doctor::execute(args, cli.config).await,
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
