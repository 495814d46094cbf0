use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use social_relay_domain::{AuthorizationRequest, LoginProvider, LoginUser, ProviderError};

use super::{exchange_code, link, user_error};
use crate::http::{OAuthClientConfig, fetch_json, make_id};

const USER_AGENT: &str = concat!("social-relay/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct GithubUser {
    id: u64,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct GithubEmail {
    email: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    verified: bool,
}

/// Sign in with GitHub
pub struct GithubLoginProvider {
    client: Client,
    app: OAuthClientConfig,
    oauth_base_url: String,
    api_base_url: String,
}

impl GithubLoginProvider {
    pub fn new(client: Client, app: OAuthClientConfig) -> Self {
        Self::with_base_urls(
            client,
            app,
            "https://github.com".to_string(),
            "https://api.github.com".to_string(),
        )
    }

    pub fn with_base_urls(
        client: Client,
        app: OAuthClientConfig,
        oauth_base_url: String,
        api_base_url: String,
    ) -> Self {
        Self {
            client,
            app,
            oauth_base_url,
            api_base_url,
        }
    }

    async fn primary_email(&self, access_token: &str) -> Result<String, ProviderError> {
        let emails: Vec<GithubEmail> = fetch_json(
            self.client
                .get(format!("{}/user/emails", self.api_base_url))
                .bearer_auth(access_token)
                .header("User-Agent", USER_AGENT),
        )
        .await
        .map_err(user_error)?;

        emails
            .into_iter()
            .find(|e| e.primary && e.verified)
            .map(|e| e.email)
            .ok_or_else(|| user_error("no verified primary email"))
    }
}

#[async_trait]
impl LoginProvider for GithubLoginProvider {
    fn identifier(&self) -> &'static str {
        "github"
    }

    fn generate_link(&self) -> Result<AuthorizationRequest, ProviderError> {
        let state = make_id(6);
        let url = link(
            &format!("{}/login/oauth/authorize", self.oauth_base_url),
            &[
                ("client_id", self.app.client_id.as_str()),
                ("scope", "user:email"),
                ("redirect_uri", self.app.redirect_uri.as_str()),
                ("state", state.as_str()),
            ],
        )?;

        Ok(AuthorizationRequest {
            url,
            state,
            code_verifier: String::new(),
        })
    }

    async fn get_token(
        &self,
        code: &str,
        _code_verifier: Option<&str>,
    ) -> Result<String, ProviderError> {
        exchange_code(
            self.client
                .post(format!("{}/login/oauth/access_token", self.oauth_base_url))
                .header("Accept", "application/json")
                .form(&[
                    ("client_id", self.app.client_id.as_str()),
                    ("client_secret", self.app.client_secret.expose_secret()),
                    ("code", code),
                    ("redirect_uri", self.app.redirect_uri.as_str()),
                ]),
        )
        .await
    }

    async fn get_user(&self, access_token: &str) -> Result<LoginUser, ProviderError> {
        let user: GithubUser = fetch_json(
            self.client
                .get(format!("{}/user", self.api_base_url))
                .bearer_auth(access_token)
                .header("User-Agent", USER_AGENT),
        )
        .await
        .map_err(user_error)?;

        let email = match user.email {
            Some(email) if !email.is_empty() => email,
            _ => self.primary_email(access_token).await?,
        };

        Ok(LoginUser {
            id: user.id.to_string(),
            email,
        })
    }
}
