use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use social_relay_domain::{AuthorizationRequest, LoginProvider, LoginUser, ProviderError};

use super::{exchange_code, link, user_error};
use crate::http::{OAuthClientConfig, fetch_json, make_id, pkce_challenge};

#[derive(Deserialize)]
struct GoogleUser {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// Sign in with Google, using PKCE
pub struct GoogleLoginProvider {
    client: Client,
    app: OAuthClientConfig,
    auth_url: String,
    token_url: String,
    user_info_url: String,
}

impl GoogleLoginProvider {
    pub fn new(client: Client, app: OAuthClientConfig) -> Self {
        Self {
            client,
            app,
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            user_info_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
        }
    }

    /// Point every endpoint at `base_url` (for testing)
    pub fn with_base_url(client: Client, app: OAuthClientConfig, base_url: &str) -> Self {
        Self {
            client,
            app,
            auth_url: format!("{}/o/oauth2/v2/auth", base_url),
            token_url: format!("{}/token", base_url),
            user_info_url: format!("{}/oauth2/v3/userinfo", base_url),
        }
    }
}

#[async_trait]
impl LoginProvider for GoogleLoginProvider {
    fn identifier(&self) -> &'static str {
        "google"
    }

    fn generate_link(&self) -> Result<AuthorizationRequest, ProviderError> {
        let state = make_id(6);
        let code_verifier = make_id(30);
        let challenge = pkce_challenge(&code_verifier);

        let url = link(
            &self.auth_url,
            &[
                ("client_id", self.app.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.app.redirect_uri.as_str()),
                ("scope", "openid email profile"),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state.as_str()),
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", "S256"),
            ],
        )?;

        Ok(AuthorizationRequest {
            url,
            state,
            code_verifier,
        })
    }

    async fn get_token(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<String, ProviderError> {
        let mut form = vec![
            ("client_id", self.app.client_id.as_str()),
            ("client_secret", self.app.client_secret.expose_secret()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.app.redirect_uri.as_str()),
        ];
        if let Some(verifier) = code_verifier {
            form.push(("code_verifier", verifier));
        }

        exchange_code(self.client.post(&self.token_url).form(&form)).await
    }

    async fn get_user(&self, access_token: &str) -> Result<LoginUser, ProviderError> {
        let user: GoogleUser = fetch_json(
            self.client
                .get(&self.user_info_url)
                .bearer_auth(access_token),
        )
        .await
        .map_err(user_error)?;

        let email = user
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| user_error("profile carried no email"))?;

        Ok(LoginUser { id: user.sub, email })
    }
}
