//! Shared HTTP plumbing for provider adapters
//!
//! Every outbound call goes through [`fetch`], which turns transport failures
//! and non-2xx answers into a [`FetchError`] carrying the target URL, the
//! status and a truncated, redacted body.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use rand::distributions::Alphanumeric;
use regex::Regex;
use reqwest::{Client, RequestBuilder, Response, Url};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use std::time::Duration;

/// Longest error body kept for diagnostics
pub const MAX_ERROR_BODY: usize = 512;

const REDACTED: &str = "[REDACTED]";

static JSON_SECRET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(access_token|refresh_token|client_secret|id_token|code)"\s*:\s*"[^"]*""#)
        .expect("valid json secret pattern")
});

static FORM_SECRET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(access_token|refresh_token|client_secret|id_token|code)=[^&\s]*")
        .expect("valid form secret pattern")
});

static BEARER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9\-._~+/]+=*").expect("valid bearer pattern")
});

/// OAuth application registered with a platform
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
}

/// Error returned by [`fetch`]
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Network { url: String, message: String },
    #[error("Request to {url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("Invalid response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Redacted platform body, or the failure message when there is none
    pub fn body(&self) -> &str {
        match self {
            Self::Status { body, .. } => body,
            Self::Network { message, .. } | Self::Decode { message, .. } => message,
        }
    }
}

/// Build the HTTP client shared by all adapters
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

/// Send a request, failing on transport errors and non-2xx statuses
pub async fn fetch(request: RequestBuilder) -> Result<Response, FetchError> {
    let (client, request) = request.build_split();
    let request = request.map_err(|e| FetchError::Network {
        url: e.url().map(display_url).unwrap_or_default(),
        message: redact(&e.to_string()),
    })?;

    let url = display_url(request.url());
    tracing::debug!(method = %request.method(), url = %url, "Sending request");

    let response = client
        .execute(request)
        .await
        .map_err(|e| FetchError::Network {
            url: url.clone(),
            message: redact(&e.to_string()),
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let body = truncate(&redact(&body), MAX_ERROR_BODY);
        tracing::warn!(url = %url, status = status.as_u16(), body = %body, "Request failed");
        return Err(FetchError::Status {
            url,
            status: status.as_u16(),
            body,
        });
    }

    Ok(response)
}

/// [`fetch`] and decode a JSON body
pub async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, FetchError> {
    let response = fetch(request).await?;
    let url = display_url(response.url());

    response.json::<T>().await.map_err(|e| FetchError::Decode {
        url,
        message: e.to_string(),
    })
}

/// Replace credential values in a body or message
pub fn redact(text: &str) -> String {
    let text = JSON_SECRET.replace_all(text, format!("\"$1\":\"{}\"", REDACTED).as_str());
    let text = FORM_SECRET.replace_all(&text, format!("$1={}", REDACTED).as_str());
    BEARER
        .replace_all(&text, format!("Bearer {}", REDACTED).as_str())
        .into_owned()
}

/// Random alphanumeric id, used for OAuth state and PKCE verifiers
pub fn make_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// PKCE S256 challenge for a verifier
pub fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Platform ids arrive as strings or numbers depending on the endpoint
pub fn id_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn display_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_redact_json_tokens() {
        let body = r#"{"access_token":"AQX123","expires_in":5184000,"refresh_token": "AQR456"}"#;
        let redacted = redact(body);

        assert!(!redacted.contains("AQX123"));
        assert!(!redacted.contains("AQR456"));
        assert!(redacted.contains("\"expires_in\":5184000"));
    }

    #[test]
    fn test_redact_form_and_bearer() {
        let text = "grant_type=refresh_token&refresh_token=abc&client_secret=shh Authorization: Bearer tok.en-1";
        let redacted = redact(text);

        assert!(!redacted.contains("abc"));
        assert!(!redacted.contains("shh"));
        assert!(!redacted.contains("tok.en-1"));
        assert!(redacted.contains("grant_type=refresh_token"));
    }

    #[test]
    fn test_redact_leaves_error_codes() {
        let text = r#"{"error_code":"E42","message":"bad"}"#;
        assert_eq!(redact(text), text);
    }

    #[test]
    fn test_make_id_length_and_charset() {
        let id = make_id(30);
        assert_eq!(id.len(), 30);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(make_id(30), id);
    }

    #[test]
    fn test_pkce_challenge_known_vector() {
        // RFC 7636 appendix B
        assert_eq!(
            pkce_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "é".repeat(400);
        let truncated = truncate(&text, MAX_ERROR_BODY);
        assert!(truncated.len() <= MAX_ERROR_BODY + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_id_string() {
        assert_eq!(id_string(&serde_json::json!(42)), Some("42".to_string()));
        assert_eq!(id_string(&serde_json::json!("abc")), Some("abc".to_string()));
        assert_eq!(id_string(&serde_json::json!(null)), None);
    }

    #[tokio::test]
    async fn test_fetch_decorates_status_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/fail"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"error":"invalid_request","access_token":"leak"}"#),
            )
            .mount(&mock_server)
            .await;

        let client = Client::new();
        let err = fetch(client.get(format!("{}/fail?secret=1", mock_server.uri())))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert!(err.body().contains("invalid_request"));
        assert!(!err.body().contains("leak"));
        assert!(!err.to_string().contains("secret=1"));
    }

    #[tokio::test]
    async fn test_fetch_network_error() {
        let client = Client::new();
        let err = fetch(client.get("http://127.0.0.1:1/unreachable"))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Network { .. }));
        assert_eq!(err.status(), None);
    }
}
