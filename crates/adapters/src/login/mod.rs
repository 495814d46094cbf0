//! Identity providers used to sign users in

mod github;
mod google;
mod openid;

pub use github::GithubLoginProvider;
pub use google::GoogleLoginProvider;
pub use openid::{OpenIdEndpoints, OpenIdLoginProvider};

use reqwest::{RequestBuilder, Url};
use serde::Deserialize;
use social_relay_domain::ProviderError;

use crate::http::fetch_json;

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Run a code exchange and pull out the access token
///
/// Some providers answer 200 with an `error` field instead of a failing status.
async fn exchange_code(request: RequestBuilder) -> Result<String, ProviderError> {
    let response: TokenResponse = fetch_json(request)
        .await
        .map_err(|e| ProviderError::AuthExchange(e.to_string()))?;

    match response.access_token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(ProviderError::AuthExchange(
            response
                .error_description
                .or(response.error)
                .unwrap_or_else(|| "Token response carried no access token".to_string()),
        )),
    }
}

fn link(base: &str, params: &[(&str, &str)]) -> Result<String, ProviderError> {
    Url::parse_with_params(base, params)
        .map(|url| url.to_string())
        .map_err(|e| ProviderError::InvalidInput(format!("Invalid authorize URL '{}': {}", base, e)))
}

fn user_error(e: impl std::fmt::Display) -> ProviderError {
    ProviderError::AuthExchange(format!("User lookup failed: {}", e))
}
