//! LinkedIn adapter
//!
//! OAuth authorization-code flow on `www.linkedin.com`, profile, upload and
//! publishing calls on `api.linkedin.com`. The same adapter serves member
//! profiles and organization pages; only the owner URN differs.

mod post;
mod upload;

pub use upload::CHUNK_SIZE;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, RequestBuilder, Url};
use secrecy::ExposeSecret;
use serde::Deserialize;
use social_relay_domain::policy::{check_scopes, parse_scopes};
use social_relay_domain::text::Normalizer;
use social_relay_domain::{
    AuthTokenDetails, AuthenticateParams, AuthorizationRequest, CompanyMention, MediaLoader,
    PostDraft, PostResult, ProviderError, SocialProvider, UploadTarget,
};
use std::sync::{Arc, LazyLock};

use crate::http::{FetchError, OAuthClientConfig, fetch_json, id_string, make_id};

const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";
const LINKEDIN_VERSION: &str = "202402";
const SCOPES: &[&str] = &["openid", "profile", "w_member_social", "r_basicprofile"];

static COMPANY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?linkedin\.com/company/([^/?#]+)/?$")
        .expect("valid company url pattern")
});

/// LinkedIn application settings and endpoints
#[derive(Debug, Clone)]
pub struct LinkedInConfig {
    pub app: OAuthClientConfig,
    /// Host of the consent and token endpoints
    pub oauth_base_url: String,
    /// Host of the REST API
    pub api_base_url: String,
}

impl LinkedInConfig {
    pub fn new(app: OAuthClientConfig) -> Self {
        Self::with_base_urls(
            app,
            "https://www.linkedin.com".to_string(),
            "https://api.linkedin.com".to_string(),
        )
    }

    pub fn with_base_urls(
        app: OAuthClientConfig,
        oauth_base_url: String,
        api_base_url: String,
    ) -> Self {
        Self {
            app,
            oauth_base_url,
            api_base_url,
        }
    }
}

/// LinkedIn provider for member profiles and organization pages
pub struct LinkedInProvider {
    client: Client,
    config: LinkedInConfig,
    media: Arc<dyn MediaLoader>,
    target: UploadTarget,
    normalizer: Normalizer,
}

impl LinkedInProvider {
    /// Provider posting as the authenticated member
    pub fn personal(client: Client, config: LinkedInConfig, media: Arc<dyn MediaLoader>) -> Self {
        Self::new(client, config, media, UploadTarget::Personal)
    }

    /// Provider posting as an organization page
    pub fn page(client: Client, config: LinkedInConfig, media: Arc<dyn MediaLoader>) -> Self {
        Self::new(client, config, media, UploadTarget::Organization)
    }

    fn new(
        client: Client,
        config: LinkedInConfig,
        media: Arc<dyn MediaLoader>,
        target: UploadTarget,
    ) -> Self {
        Self {
            client,
            config,
            media,
            target,
            normalizer: Normalizer::linkedin(),
        }
    }

    /// URN of the member or organization owning posts and media
    fn owner_urn(&self, account_id: &str) -> String {
        match self.target {
            UploadTarget::Personal => format!("urn:li:person:{}", account_id),
            UploadTarget::Organization => format!("urn:li:organization:{}", account_id),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Attach the versioned REST headers
    fn rest(&self, request: RequestBuilder, access_token: &str) -> RequestBuilder {
        request
            .bearer_auth(access_token)
            .header("X-Restli-Protocol-Version", RESTLI_PROTOCOL_VERSION)
            .header("LinkedIn-Version", LINKEDIN_VERSION)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, FetchError> {
        let url = format!("{}/oauth/v2/accessToken", self.config.oauth_base_url);
        fetch_json(self.client.post(url).form(form)).await
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, FetchError> {
        let user_info: UserInfo = fetch_json(
            self.client
                .get(self.api_url("/v2/userinfo"))
                .bearer_auth(access_token),
        )
        .await?;

        let me: MeResponse = fetch_json(
            self.client
                .get(self.api_url("/v2/me"))
                .bearer_auth(access_token),
        )
        .await?;

        Ok(Profile {
            id: user_info.sub,
            name: user_info.name,
            picture: user_info.picture,
            username: me.vanity_name,
        })
    }

    /// Resolve a company page URL to a mention usable in messages
    pub async fn company_lookup(
        &self,
        access_token: &str,
        company_url: &str,
    ) -> Result<CompanyMention, ProviderError> {
        let vanity = COMPANY_URL
            .captures(company_url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                ProviderError::InvalidInput(format!("Invalid LinkedIn company URL: {}", company_url))
            })?;

        let url = Url::parse_with_params(
            &self.api_url("/rest/organizations"),
            &[("q", "vanityName"), ("vanityName", vanity.as_str())],
        )
        .map_err(|e| ProviderError::InvalidInput(e.to_string()))?;

        let response: OrganizationsResponse =
            fetch_json(self.rest(self.client.get(url), access_token))
                .await
                .map_err(|e| ProviderError::InvalidInput(format!("Company lookup failed: {}", e)))?;

        let organization = response
            .elements
            .into_iter()
            .find_map(|e| id_string(&e.id).map(|id| (e.localized_name, id)))
            .ok_or_else(|| {
                ProviderError::InvalidInput(format!("No organization found for '{}'", vanity))
            })?;

        let (name, id) = organization;
        Ok(CompanyMention {
            value: format!("@[{}](urn:li:organization:{})", name, id),
            label: name,
        })
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
    name: String,
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeResponse {
    #[serde(default)]
    vanity_name: Option<String>,
}

#[derive(Deserialize)]
struct OrganizationsResponse {
    #[serde(default)]
    elements: Vec<OrganizationElement>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationElement {
    localized_name: String,
    id: serde_json::Value,
}

struct Profile {
    id: String,
    name: String,
    picture: Option<String>,
    username: Option<String>,
}

fn token_details(token: TokenResponse, profile: Profile, scopes: Vec<String>) -> AuthTokenDetails {
    AuthTokenDetails {
        id: profile.id,
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_in: token.expires_in,
        name: profile.name,
        picture: profile.picture,
        username: profile.username,
        scopes,
    }
}

/// Redirect URI used for the exchange; reconnects carry `refresh=<credential>`
fn redirect_with_refresh(
    redirect_uri: &str,
    refresh: Option<&str>,
) -> Result<String, ProviderError> {
    let Some(refresh) = refresh else {
        return Ok(redirect_uri.to_string());
    };

    let mut url = Url::parse(redirect_uri)
        .map_err(|e| ProviderError::InvalidInput(format!("Invalid redirect URI: {}", e)))?;
    url.query_pairs_mut().append_pair("refresh", refresh);
    Ok(url.to_string())
}

#[async_trait]
impl SocialProvider for LinkedInProvider {
    fn identifier(&self) -> &'static str {
        match self.target {
            UploadTarget::Personal => "linkedin",
            UploadTarget::Organization => "linkedin-page",
        }
    }

    fn name(&self) -> &'static str {
        match self.target {
            UploadTarget::Personal => "LinkedIn",
            UploadTarget::Organization => "LinkedIn Page",
        }
    }

    fn scopes(&self) -> &[&'static str] {
        SCOPES
    }

    fn generate_auth_url(&self) -> Result<AuthorizationRequest, ProviderError> {
        let state = make_id(6);
        let code_verifier = make_id(30);
        let scope = SCOPES.join(" ");

        let url = Url::parse_with_params(
            &format!("{}/oauth/v2/authorization", self.config.oauth_base_url),
            &[
                ("response_type", "code"),
                ("client_id", self.config.app.client_id.as_str()),
                ("redirect_uri", self.config.app.redirect_uri.as_str()),
                ("state", state.as_str()),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|e| ProviderError::InvalidInput(format!("Invalid OAuth base URL: {}", e)))?;

        Ok(AuthorizationRequest {
            url: url.to_string(),
            state,
            code_verifier,
        })
    }

    async fn authenticate(
        &self,
        params: &AuthenticateParams,
    ) -> Result<AuthTokenDetails, ProviderError> {
        let redirect_uri =
            redirect_with_refresh(&self.config.app.redirect_uri, params.refresh.as_deref())?;

        let token = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", params.code.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("client_id", self.config.app.client_id.as_str()),
                (
                    "client_secret",
                    self.config.app.client_secret.expose_secret(),
                ),
            ])
            .await
            .map_err(|e| ProviderError::AuthExchange(e.to_string()))?;

        let granted = token.scope.as_deref().map(parse_scopes).unwrap_or_default();
        check_scopes(SCOPES, &granted)?;

        let profile = self
            .fetch_profile(&token.access_token)
            .await
            .map_err(|e| ProviderError::AuthExchange(e.to_string()))?;

        tracing::info!(
            provider = self.identifier(),
            account_id = %profile.id,
            "Authenticated account"
        );

        Ok(token_details(token, profile, granted))
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokenDetails, ProviderError> {
        let token = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.config.app.client_id.as_str()),
                (
                    "client_secret",
                    self.config.app.client_secret.expose_secret(),
                ),
            ])
            .await
            .map_err(|e| ProviderError::TokenRefresh(e.to_string()))?;

        let granted = match token.scope.as_deref() {
            Some(scope) => {
                let granted = parse_scopes(scope);
                check_scopes(SCOPES, &granted)?;
                granted
            }
            None => vec![],
        };

        let profile = self
            .fetch_profile(&token.access_token)
            .await
            .map_err(|e| ProviderError::TokenRefresh(e.to_string()))?;

        Ok(token_details(token, profile, granted))
    }

    async fn post(
        &self,
        account_id: &str,
        access_token: &str,
        draft: &PostDraft,
    ) -> Result<Vec<PostResult>, ProviderError> {
        self.publish_draft(account_id, access_token, draft).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::media::InMemoryMediaLoader;
    use secrecy::SecretString;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn provider_for(
        server: &MockServer,
        media: InMemoryMediaLoader,
        target: UploadTarget,
    ) -> LinkedInProvider {
        let config = LinkedInConfig::with_base_urls(
            OAuthClientConfig {
                client_id: "client-id".to_string(),
                client_secret: SecretString::new("client-secret".into()),
                redirect_uri: "https://app.example.com/integrations/social/linkedin".to_string(),
            },
            server.uri(),
            server.uri(),
        );
        LinkedInProvider::new(Client::new(), config, Arc::new(media), target)
    }

    async fn mount_profile(server: &MockServer, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/v2/userinfo"))
            .and(header("Authorization", "Bearer access-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": "member-42",
                "name": "Jane Doe",
                "picture": "https://media.example.com/jane.png"
            })))
            .expect(expected_calls)
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "vanityName": "janedoe"
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[test]
    fn test_generate_auth_url() {
        let config = LinkedInConfig::new(OAuthClientConfig {
            client_id: "client-id".to_string(),
            client_secret: SecretString::new("client-secret".into()),
            redirect_uri: "https://app.example.com/integrations/social/linkedin".to_string(),
        });
        let provider = LinkedInProvider::personal(
            Client::new(),
            config,
            Arc::new(InMemoryMediaLoader::new()),
        );

        let request = provider.generate_auth_url().unwrap();
        let url = Url::parse(&request.url).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert!(request.url.starts_with("https://www.linkedin.com/oauth/v2/authorization?"));
        assert_eq!(request.state.len(), 6);
        assert_eq!(request.code_verifier.len(), 30);
        assert_eq!(params["state"], request.state);
        assert_eq!(params["client_id"], "client-id");
        assert_eq!(
            params["scope"],
            "openid profile w_member_social r_basicprofile"
        );
        assert_eq!(
            params["redirect_uri"],
            "https://app.example.com/integrations/social/linkedin"
        );
        assert!(!request.url.contains("client-secret"));
    }

    #[test]
    fn test_refresh_is_encoded_into_redirect() {
        assert_eq!(
            redirect_with_refresh("https://app.example.com/cb", None).unwrap(),
            "https://app.example.com/cb"
        );
        assert_eq!(
            redirect_with_refresh("https://app.example.com/cb?tenant=a", Some("x&y=1")).unwrap(),
            "https://app.example.com/cb?tenant=a&refresh=x%26y%3D1"
        );
        assert!(matches!(
            redirect_with_refresh("not a url", Some("cred-7")),
            Err(ProviderError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/v2/accessToken"))
            .and(header("Content-Type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code"))
            .and(body_string_contains("refresh%3Dcred-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-1",
                "expires_in": 5184000,
                "refresh_token": "refresh-1",
                "scope": "openid,profile,w_member_social,r_basicprofile"
            })))
            .mount(&server)
            .await;
        mount_profile(&server, 1).await;

        let provider = provider_for(&server, InMemoryMediaLoader::new(), UploadTarget::Personal);
        let details = provider
            .authenticate(&AuthenticateParams {
                code: "auth-code".to_string(),
                code_verifier: "verifier".to_string(),
                refresh: Some("cred-7".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(details.id, "member-42");
        assert_eq!(details.name, "Jane Doe");
        assert_eq!(details.username.as_deref(), Some("janedoe"));
        assert_eq!(details.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(details.expires_in, Some(5184000));
        assert_eq!(details.scopes.len(), 4);
    }

    #[tokio::test]
    async fn test_authenticate_missing_scope_skips_profile() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/v2/accessToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-1",
                "expires_in": 5184000,
                "scope": "openid,profile"
            })))
            .mount(&server)
            .await;
        mount_profile(&server, 0).await;

        let provider = provider_for(&server, InMemoryMediaLoader::new(), UploadTarget::Personal);
        let err = provider
            .authenticate(&AuthenticateParams {
                code: "auth-code".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        match err {
            ProviderError::InsufficientScope { missing } => {
                assert_eq!(missing, vec!["w_member_social", "r_basicprofile"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_rejected_code() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/v2/accessToken"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_request",
                "error_description": "Unable to retrieve access token: authorization code not found"
            })))
            .mount(&server)
            .await;
        mount_profile(&server, 0).await;

        let provider = provider_for(&server, InMemoryMediaLoader::new(), UploadTarget::Personal);
        let err = provider
            .authenticate(&AuthenticateParams {
                code: "bad-code".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::AuthExchange(ref msg) if msg.contains("authorization code not found")));
        assert!(err.requires_reconnect());
    }

    #[tokio::test]
    async fn test_refresh_token_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/v2/accessToken"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-1",
                "expires_in": 5184000,
                "refresh_token": "refresh-2",
                "refresh_token_expires_in": 31536000
            })))
            .mount(&server)
            .await;
        mount_profile(&server, 1).await;

        let provider = provider_for(&server, InMemoryMediaLoader::new(), UploadTarget::Personal);
        let details = provider.refresh_token("refresh-1").await.unwrap();

        assert_eq!(details.id, "member-42");
        assert_eq!(details.refresh_token.as_deref(), Some("refresh-2"));
    }

    #[tokio::test]
    async fn test_refresh_token_revoked() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/v2/accessToken"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "The provided authorization grant is revoked"
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, InMemoryMediaLoader::new(), UploadTarget::Personal);
        let err = provider.refresh_token("refresh-1").await.unwrap_err();

        assert!(matches!(err, ProviderError::TokenRefresh(ref msg) if msg.contains("invalid_grant")));
    }

    #[tokio::test]
    async fn test_refresh_with_reduced_scope_fails_before_profile() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth/v2/accessToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-1",
                "scope": "openid"
            })))
            .mount(&server)
            .await;
        mount_profile(&server, 0).await;

        let provider = provider_for(&server, InMemoryMediaLoader::new(), UploadTarget::Personal);
        let err = provider.refresh_token("refresh-1").await.unwrap_err();

        assert!(matches!(err, ProviderError::InsufficientScope { .. }));
    }

    #[tokio::test]
    async fn test_company_lookup() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/organizations"))
            .and(query_param("q", "vanityName"))
            .and(query_param("vanityName", "acme"))
            .and(header("LinkedIn-Version", "202402"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "elements": [{ "localizedName": "Acme Corp", "id": 123 }]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, InMemoryMediaLoader::new(), UploadTarget::Personal);
        let mention = provider
            .company_lookup("access-1", "https://www.linkedin.com/company/acme/")
            .await
            .unwrap();

        assert_eq!(mention.label, "Acme Corp");
        assert_eq!(mention.value, "@[Acme Corp](urn:li:organization:123)");
    }

    #[tokio::test]
    async fn test_company_lookup_rejects_other_urls() {
        let server = MockServer::start().await;
        let provider = provider_for(&server, InMemoryMediaLoader::new(), UploadTarget::Personal);

        let err = provider
            .company_lookup("access-1", "https://www.linkedin.com/in/janedoe/")
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::InvalidInput(_)));
    }

    #[test]
    fn test_identifier_follows_target() {
        let provider = LinkedInProvider::page(
            Client::new(),
            LinkedInConfig::new(OAuthClientConfig {
                client_id: String::new(),
                client_secret: SecretString::new("".into()),
                redirect_uri: String::new(),
            }),
            Arc::new(InMemoryMediaLoader::new()),
        );

        assert_eq!(provider.identifier(), "linkedin-page");
        assert_eq!(provider.owner_urn("7"), "urn:li:organization:7");
    }
}
