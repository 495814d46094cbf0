//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// social-relay: connect social accounts and publish threaded posts
#[derive(Parser, Debug)]
#[command(name = "social-relay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the consent URL for connecting an account
    AuthUrl(AuthUrlArgs),

    /// Exchange an authorization code and store the credential
    Connect(ConnectArgs),

    /// Refresh the tokens of a stored credential
    Refresh(AccountArgs),

    /// Sign in with an identity provider
    Login(LoginArgs),

    /// Publish a draft from a JSON file
    Post(PostArgs),

    /// List connected accounts
    Accounts(AccountsArgs),

    /// Resolve a LinkedIn company page to a mention tag
    Company(CompanyArgs),

    /// Strip markdown the way it is stripped before publishing
    Normalize(NormalizeArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct AuthUrlArgs {
    /// Provider identifier (linkedin, linkedin-page, stub)
    #[arg(long)]
    pub provider: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Provider identifier (linkedin, linkedin-page, stub)
    #[arg(long)]
    pub provider: String,

    /// Organization owning the credential
    #[arg(long)]
    pub org: String,

    /// Authorization code from the redirect
    #[arg(long)]
    pub code: String,

    /// Verifier returned by auth-url
    #[arg(long, default_value = "")]
    pub code_verifier: String,

    /// Credential being reconnected
    #[arg(long)]
    pub refresh: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AccountArgs {
    /// Provider identifier (linkedin, linkedin-page, stub)
    #[arg(long)]
    pub provider: String,

    /// Organization owning the credential
    #[arg(long)]
    pub org: String,

    /// Account id on the platform
    #[arg(long)]
    pub account: String,
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Identity provider (github, google, openid)
    #[arg(long)]
    pub provider: String,

    /// Authorization code; without it the sign-in link is printed
    #[arg(long)]
    pub code: Option<String>,

    /// PKCE verifier returned with the link
    #[arg(long)]
    pub code_verifier: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PostArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    /// Draft file (JSON with a `segments` array)
    #[arg(long)]
    pub draft: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AccountsArgs {
    /// Organization to list
    #[arg(long)]
    pub org: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CompanyArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    /// Company page URL (https://www.linkedin.com/company/<name>/)
    #[arg(long)]
    pub url: String,
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Text to normalize
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// File containing text to normalize (use - for stdin)
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
