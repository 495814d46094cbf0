//! Configuration loading and management

use anyhow::{Context, Result, bail};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use social_relay_adapters::http::OAuthClientConfig;
use social_relay_adapters::linkedin::LinkedInConfig;
use social_relay_adapters::login::OpenIdEndpoints;
use social_relay_adapters::{OpenIdConfig, ProvidersConfig};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub linkedin: Option<LinkedInAppConfig>,

    #[serde(default)]
    pub linkedin_page: Option<LinkedInAppConfig>,

    #[serde(default)]
    pub github: Option<OAuthAppConfig>,

    #[serde(default)]
    pub google: Option<OAuthAppConfig>,

    #[serde(default)]
    pub openid: Option<OpenIdAppConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_state_db_path")]
    pub state_db_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// OAuth application; the secret is read from `client_secret_env`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthAppConfig {
    pub client_id: String,

    pub client_secret_env: String,

    pub redirect_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedInAppConfig {
    #[serde(flatten)]
    pub app: OAuthAppConfig,

    #[serde(default = "default_linkedin_oauth_base_url")]
    pub oauth_base_url: String,

    #[serde(default = "default_linkedin_api_base_url")]
    pub api_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenIdAppConfig {
    #[serde(flatten)]
    pub app: OAuthAppConfig,

    pub auth_url: String,

    pub token_url: String,

    pub user_info_url: String,
}

// Default value functions
fn default_state_db_path() -> PathBuf {
    PathBuf::from("./social-relay.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_linkedin_oauth_base_url() -> String {
    "https://www.linkedin.com".to_string()
}

fn default_linkedin_api_base_url() -> String {
    "https://api.linkedin.com".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            state_db_path: default_state_db_path(),
            log_level: default_log_level(),
            timeout_secs: default_timeout(),
        }
    }
}

impl OAuthAppConfig {
    /// Resolve the client secret from the environment
    pub fn load(&self, provider: &str) -> Result<OAuthClientConfig> {
        Ok(OAuthClientConfig {
            client_id: self.client_id.clone(),
            client_secret: load_secret(&self.client_secret_env, provider)?,
            redirect_uri: self.redirect_uri.clone(),
        })
    }

    /// Whether the secret env var is set and non-empty
    pub fn secret_is_set(&self) -> bool {
        std::env::var(&self.client_secret_env).is_ok_and(|v| !v.trim().is_empty())
    }
}

pub(crate) fn load_secret(env_var: &str, provider: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No client secret env var configured for provider {}", provider);
    }

    let secret = std::env::var(env_var).with_context(|| {
        format!(
            "Missing client secret env var {} for provider {}",
            env_var, provider
        )
    })?;

    if secret.trim().is_empty() {
        bail!(
            "Client secret env var {} is empty for provider {}",
            env_var,
            provider
        );
    }

    Ok(SecretString::new(secret.into()))
}

/// Skip sections whose secret cannot be loaded; the factory then reports them as unconfigured
fn resolve<T>(section: &str, loaded: Option<Result<T>>) -> Option<T> {
    match loaded? {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(section = %section, error = %e, "Provider section skipped");
            None
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("SOCIAL_RELAY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Log level from `--log-level`, else `general.log_level`, else `info`
    ///
    /// Runs before logging is set up, so a config that fails to load falls
    /// back silently and the command reports the error itself.
    pub fn log_level(cli_level: Option<&str>, config_path: Option<&Path>) -> String {
        match cli_level {
            Some(level) => level.to_string(),
            None => Self::load(config_path)
                .map(|config| config.general.log_level)
                .unwrap_or_else(|_| default_log_level()),
        }
    }

    /// Provider settings with secrets resolved
    pub fn providers(&self) -> ProvidersConfig {
        let linkedin = |section: &LinkedInAppConfig, name: &str| {
            section.app.load(name).map(|app| {
                LinkedInConfig::with_base_urls(
                    app,
                    section.oauth_base_url.clone(),
                    section.api_base_url.clone(),
                )
            })
        };

        ProvidersConfig {
            linkedin: resolve(
                "linkedin",
                self.linkedin.as_ref().map(|s| linkedin(s, "linkedin")),
            ),
            linkedin_page: resolve(
                "linkedin_page",
                self.linkedin_page
                    .as_ref()
                    .map(|s| linkedin(s, "linkedin-page")),
            ),
            github: resolve("github", self.github.as_ref().map(|s| s.load("github"))),
            google: resolve("google", self.google.as_ref().map(|s| s.load("google"))),
            openid: resolve(
                "openid",
                self.openid.as_ref().map(|s| {
                    s.app.load("openid").map(|app| OpenIdConfig {
                        app,
                        endpoints: OpenIdEndpoints {
                            auth_url: s.auth_url.clone(),
                            token_url: s.token_url.clone(),
                            user_info_url: s.user_info_url.clone(),
                        },
                    })
                }),
            ),
        }
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# social-relay configuration

[general]
state_db_path = "./social-relay.sqlite"
log_level = "info"
timeout_secs = 30

# Sections may be omitted; a provider without a section cannot be used.

[linkedin]
client_id = "your-linkedin-client-id"
client_secret_env = "LINKEDIN_CLIENT_SECRET"
redirect_uri = "https://app.example.com/integrations/social/linkedin"
# oauth_base_url = "https://www.linkedin.com"
# api_base_url = "https://api.linkedin.com"

[linkedin_page]
client_id = "your-linkedin-client-id"
client_secret_env = "LINKEDIN_CLIENT_SECRET"
redirect_uri = "https://app.example.com/integrations/social/linkedin-page"

[github]
client_id = "your-github-client-id"
client_secret_env = "GITHUB_CLIENT_SECRET"
redirect_uri = "https://app.example.com/auth/github"

[google]
client_id = "your-google-client-id"
client_secret_env = "GOOGLE_CLIENT_SECRET"
redirect_uri = "https://app.example.com/auth/google"

# [openid]
# client_id = "your-oidc-client-id"
# client_secret_env = "OAUTH_CLIENT_SECRET"
# redirect_uri = "https://app.example.com/settings"
# auth_url = "https://id.example.com/authorize"
# token_url = "https://id.example.com/token"
# user_info_url = "https://id.example.com/userinfo"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_level_prefers_flag_then_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\nlog_level = \"debug\"\n").unwrap();

        assert_eq!(AppConfig::log_level(Some("warn"), Some(&path)), "warn");
        assert_eq!(AppConfig::log_level(None, Some(&path)), "debug");
        assert_eq!(
            AppConfig::log_level(None, Some(&dir.path().join("absent.toml"))),
            "info"
        );
    }

    #[test]
    fn test_example_toml_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();

        assert_eq!(config.general.timeout_secs, 30);
        let linkedin = config.linkedin.unwrap();
        assert_eq!(linkedin.app.client_secret_env, "LINKEDIN_CLIENT_SECRET");
        assert_eq!(linkedin.api_base_url, "https://api.linkedin.com");
        assert!(config.openid.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();

        assert_eq!(
            config.general.state_db_path,
            PathBuf::from("./social-relay.sqlite")
        );
        assert!(config.linkedin.is_none());
    }

    #[test]
    fn test_section_without_secret_is_skipped() {
        let config: AppConfig = toml::from_str(
            r#"
[github]
client_id = "id"
client_secret_env = "SOCIAL_RELAY_TEST_UNSET_SECRET"
redirect_uri = "https://app.example.com/cb"
"#,
        )
        .unwrap();

        assert!(config.providers().github.is_none());
    }

    #[test]
    fn test_load_secret_rejects_empty_env_name() {
        assert!(load_secret("  ", "github").is_err());
    }
}
