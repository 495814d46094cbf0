use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use social_relay_domain::{AuthorizationRequest, LoginProvider, LoginUser, ProviderError};

use super::{exchange_code, link, user_error};
use crate::http::{OAuthClientConfig, fetch_json, id_string, make_id};

/// Endpoints of a generic OpenID Connect provider
#[derive(Debug, Clone)]
pub struct OpenIdEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub user_info_url: String,
}

/// Sign in with any OpenID Connect provider
pub struct OpenIdLoginProvider {
    client: Client,
    app: OAuthClientConfig,
    endpoints: OpenIdEndpoints,
}

impl OpenIdLoginProvider {
    pub fn new(client: Client, app: OAuthClientConfig, endpoints: OpenIdEndpoints) -> Self {
        Self {
            client,
            app,
            endpoints,
        }
    }
}

#[async_trait]
impl LoginProvider for OpenIdLoginProvider {
    fn identifier(&self) -> &'static str {
        "openid"
    }

    fn generate_link(&self) -> Result<AuthorizationRequest, ProviderError> {
        let state = make_id(6);
        let url = link(
            &self.endpoints.auth_url,
            &[
                ("client_id", self.app.client_id.as_str()),
                ("response_type", "code"),
                ("scope", "openid email"),
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
        exchange_code(self.client.post(&self.endpoints.token_url).form(&[
            ("client_id", self.app.client_id.as_str()),
            ("client_secret", self.app.client_secret.expose_secret()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.app.redirect_uri.as_str()),
        ]))
        .await
    }

    async fn get_user(&self, access_token: &str) -> Result<LoginUser, ProviderError> {
        let data: serde_json::Value = fetch_json(
            self.client
                .get(&self.endpoints.user_info_url)
                .bearer_auth(access_token),
        )
        .await
        .map_err(user_error)?;

        let id = ["sub", "id"]
            .iter()
            .find_map(|key| data.get(*key).and_then(id_string))
            .ok_or_else(|| user_error("profile carried no subject"))?;
        let email = data
            .get("email")
            .and_then(|v| v.as_str())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| user_error("profile carried no email"))?
            .to_string();

        Ok(LoginUser { id, email })
    }
}
